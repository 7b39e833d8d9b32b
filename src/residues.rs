use nalgebra as na;
use pdbtbx::*;

/// Amino acid of a structure as seen by the variant mapper
#[derive(Debug, Clone, PartialEq)]
pub struct AminoAcid {
    /// Chain identifier
    pub chain: String,
    /// Residue sequence number
    pub seq_num: isize,
    /// Residue insertion code, empty if absent
    pub insertion: String,
    /// Three-letter residue name
    pub name: String,
    /// Position of the alpha carbon, if resolved
    pub ca: Option<na::Vector3<f64>>,
}

impl AminoAcid {
    /// Sequence number followed by the insertion code, e.g. `92` or `92A`.
    pub fn residue_number(&self) -> String {
        format!("{}{}", self.seq_num, self.insertion)
    }

    /// One-letter code, or `None` for non-standard residues.
    pub fn resn(&self) -> Option<&'static str> {
        three_to_one(&self.name)
    }
}

pub trait ResidueExt {
    /// The residue one-letter code, or `None` if it's not an amino acid.
    fn resn(&self) -> Option<&'static str>;

    /// Sequence number followed by the insertion code.
    fn residue_number(&self) -> String;

    /// Coordinates of the first atom with the given name.
    fn atom_pos(&self, name: &str) -> Option<na::Vector3<f64>>;

    /// Backbone N, CA, C and O coordinates if all four atoms are present.
    fn backbone(&self) -> Option<[na::Vector3<f64>; 4]>;
}

impl ResidueExt for Residue {
    fn resn(&self) -> Option<&'static str> {
        three_to_one(self.name().unwrap_or(""))
    }

    fn residue_number(&self) -> String {
        let (resi, insertion) = self.id();
        format!("{resi}{}", insertion.unwrap_or(""))
    }

    fn atom_pos(&self, name: &str) -> Option<na::Vector3<f64>> {
        self.atoms().find(|a| a.name() == name).map(|a| {
            let (x, y, z) = a.pos();
            na::Vector3::new(x, y, z)
        })
    }

    fn backbone(&self) -> Option<[na::Vector3<f64>; 4]> {
        Some([
            self.atom_pos("N")?,
            self.atom_pos("CA")?,
            self.atom_pos("C")?,
            self.atom_pos("O")?,
        ])
    }
}

/// Convert a three-letter amino acid name to its one-letter code.
pub fn three_to_one(name: &str) -> Option<&'static str> {
    let aa_code = match name.trim().to_uppercase().as_str() {
        "ALA" => "A",
        "ARG" => "R",
        "ASN" => "N",
        "ASP" => "D",
        "CYS" => "C",
        "GLN" => "Q",
        "GLU" => "E",
        "GLY" => "G",
        "HIS" => "H",
        "ILE" => "I",
        "LEU" => "L",
        "LYS" => "K",
        "MET" => "M",
        "PHE" => "F",
        "PRO" => "P",
        "SER" => "S",
        "THR" => "T",
        "TRP" => "W",
        "TYR" => "Y",
        "VAL" => "V",
        _ => "X",
    };

    match aa_code {
        "X" => None,
        _ => Some(aa_code),
    }
}

/// One-letter code of a residue name, falling back to the raw text when it is not
/// a standard amino acid.
pub fn one_letter_or_raw(name: &str) -> String {
    three_to_one(name)
        .map(str::to_string)
        .unwrap_or_else(|| name.to_string())
}

/// One-letter code of a residue name, or an empty string.
pub fn one_letter_or_empty(name: &str) -> String {
    three_to_one(name).map(str::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_names_convert() {
        assert_eq!(three_to_one("ALA"), Some("A"));
        assert_eq!(three_to_one("trp"), Some("W"));
        assert_eq!(three_to_one("HOH"), None);
        assert_eq!(three_to_one("Ter"), None);
    }

    #[test]
    fn fallbacks() {
        assert_eq!(one_letter_or_raw("Ter"), "Ter");
        assert_eq!(one_letter_or_raw("Gly"), "G");
        assert_eq!(one_letter_or_empty("Ter"), "");
    }

    #[test]
    fn residue_number_includes_insertion() {
        let mut aa = AminoAcid {
            chain: "A".to_string(),
            seq_num: 92,
            insertion: String::new(),
            name: "LYS".to_string(),
            ca: None,
        };
        assert_eq!(aa.residue_number(), "92");
        aa.insertion = "B".to_string();
        assert_eq!(aa.residue_number(), "92B");
        assert_eq!(aa.resn(), Some("K"));
    }
}
