//! Three-class physicochemical groupings of the standard amino acids.

/// Amino-acid property with a three-group partition of the alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyGroup {
    Charge,
    Hydrophobicity,
    NormalizedVanDerWaalsVolume,
    Polarity,
    Polarizability,
    SecondaryStructure,
    SolventAccessibility,
}

impl PropertyGroup {
    /// All groupings in output column order.
    pub const ALL: [PropertyGroup; 7] = [
        PropertyGroup::Charge,
        PropertyGroup::Hydrophobicity,
        PropertyGroup::NormalizedVanDerWaalsVolume,
        PropertyGroup::Polarity,
        PropertyGroup::Polarizability,
        PropertyGroup::SecondaryStructure,
        PropertyGroup::SolventAccessibility,
    ];

    /// Members of groups 1, 2 and 3.
    fn partition(&self) -> [&'static str; 3] {
        match self {
            PropertyGroup::Charge => ["KR", "ANCQGHILMFPSTWYV", "DE"],
            PropertyGroup::Hydrophobicity => ["RKEDQN", "GASTPHY", "CLVIMFW"],
            PropertyGroup::NormalizedVanDerWaalsVolume => ["GASTPDC", "NVEQIL", "MHKFRYW"],
            PropertyGroup::Polarity => ["LIFWCMVY", "PAGST", "HQRKNED"],
            PropertyGroup::Polarizability => ["GASDT", "CPNVEQIL", "KMHFRYW"],
            PropertyGroup::SecondaryStructure => ["EALMQKRH", "VIYCWFT", "GNPSD"],
            PropertyGroup::SolventAccessibility => ["ALFCGIVW", "RKQEND", "MPSTHY"],
        }
    }

    /// Group number (1 to 3) of a one-letter code, `0` for anything else.
    pub fn group_of(&self, residue: char) -> u8 {
        let residue = residue.to_ascii_uppercase();
        self.partition()
            .iter()
            .position(|members| members.contains(residue))
            .map_or(0, |i| i as u8 + 1)
    }

    /// `group<X>-group<Y>` for a substitution.
    pub fn change(&self, source: &str, target: &str) -> String {
        let first = |s: &str| s.trim().chars().next().unwrap_or(' ');
        format!(
            "group{}-group{}",
            self.group_of(first(source)),
            self.group_of(first(target))
        )
    }

    /// Column name of the group-change field.
    pub fn column(&self) -> &'static str {
        match self {
            PropertyGroup::Charge => "ChargeGroupChange",
            PropertyGroup::Hydrophobicity => "HydroGroupChange",
            PropertyGroup::NormalizedVanDerWaalsVolume => "VanDerWaalsVolumeGroupChange",
            PropertyGroup::Polarity => "PloarityGroupChange",
            PropertyGroup::Polarizability => "PolarizabilityGroupChange",
            PropertyGroup::SecondaryStructure => "SSWTGroupChange",
            PropertyGroup::SolventAccessibility => "AsaGroupChange",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_cover_the_alphabet_once() {
        for group in PropertyGroup::ALL {
            for aa in "ACDEFGHIKLMNPQRSTVWY".chars() {
                let hits = group.partition().iter().filter(|m| m.contains(aa)).count();
                assert_eq!(hits, 1, "{group:?} {aa}");
            }
        }
    }

    #[test]
    fn substitutions() {
        assert_eq!(PropertyGroup::Charge.change("K", "E"), "group1-group3");
        assert_eq!(PropertyGroup::Hydrophobicity.change("G", "W"), "group2-group3");
        assert_eq!(PropertyGroup::Polarity.change("A", "A"), "group2-group2");
        assert_eq!(PropertyGroup::SolventAccessibility.change("X", ""), "group0-group0");
    }
}
