//! Fixed-offset and line-oriented parsers for the text formats consumed by the
//! pipeline. Each parser takes one line and returns `None` when the line does not
//! carry a record, so callers can skip it with a warning.

/// Record of the primary structure index: `(structure_id, resolution, ligand)`.
///
/// The id is in columns `[0, 4)`, the resolution in `[6, 10)` and the ligand code is
/// the text between the first `(` and the first `)`.
pub fn catalog_primary(line: &str) -> Option<(String, String, String)> {
    let structure_id = line.get(0..4)?;
    let resolution = line.get(6..10)?;
    let start = line.find('(')? + 1;
    let end = line.find(')')?;
    let ligand = line.get(start..end)?;
    Some((
        structure_id.to_string(),
        resolution.to_string(),
        ligand.to_string(),
    ))
}

/// Record of the secondary structure index: `(structure_id, uniprot)`.
///
/// The accession occupies columns `[12, 18)`.
pub fn catalog_secondary(line: &str) -> Option<(String, String)> {
    let structure_id = line.get(0..4)?;
    let uniprot = line.get(12..18)?;
    Some((structure_id.to_string(), uniprot.to_string()))
}

/// Residue line of a DSSP table: `(chain, seq_num, insertion, ss_code)`.
///
/// Chain break lines (`!` in the amino-acid column) yield `None`.
pub fn dssp_residue(line: &str) -> Option<(String, isize, String, char)> {
    let amino_acid = line.get(13..14)?;
    if amino_acid == "!" {
        return None;
    }
    let seq_num = line.get(5..10)?.trim().parse::<isize>().ok()?;
    let insertion = line.get(10..11)?.trim().to_string();
    let chain = line.get(11..12)?.trim().to_string();
    let code = line.get(16..17)?.chars().next()?;
    Some((chain, seq_num, insertion, code))
}

/// Parts of a variant code such as `p.Lys92Glu`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCode {
    /// Three-letter source residue
    pub source: String,
    /// Three-letter target residue
    pub target: String,
    /// Canonical position between source and target
    pub residue_num: String,
}

/// Split a variant code after its two-character prefix into source, position and
/// target.
pub fn variant_code(code: &str) -> Option<VariantCode> {
    let residue = code.get(2..)?;
    if residue.len() < 6 {
        return None;
    }
    let source = residue.get(..3)?;
    let target = residue.get(residue.len() - 3..)?;
    let residue_num = residue.get(3..residue.len() - 3)?;
    Some(VariantCode {
        source: source.to_string(),
        target: target.to_string(),
        residue_num: residue_num.to_string(),
    })
}

/// Record of the missense variant catalogue: `(accession, variant_code, rs_id, category)`.
///
/// Lines are whitespace separated: gene name, accession, feature id, variant code,
/// category, dbSNP id, then free text. Header and banner lines yield `None`.
pub fn catalogue_variant(line: &str) -> Option<(String, String, String, String)> {
    let fields = line.split_whitespace().collect::<Vec<&str>>();
    let [_, accession, _, code, category, rs_id, ..] = fields.as_slice() else {
        return None;
    };
    let is_accession = matches!(accession.len(), 6 | 10)
        && accession.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if !is_accession || !code.starts_with("p.") {
        return None;
    }
    Some((
        accession.to_string(),
        code.to_string(),
        rs_id.to_string(),
        category.to_string(),
    ))
}

/// Query molecule of a similarity-search log: the four characters after the
/// leading `>` of the first record line.
pub fn similarity_query(line: &str) -> Option<String> {
    if !line.starts_with('>') {
        return None;
    }
    line.get(1..5).map(str::to_string)
}

/// Hit line of a similarity-search log: `(compound, score)`.
///
/// The compound is the text between `>` and `Tanimoto`; the score is what follows
/// the last `=`.
pub fn similarity_hit(line: &str) -> Option<(String, String)> {
    if !line.starts_with('>') {
        return None;
    }
    let end = line.find("Tanimoto")?;
    let compound = line.get(1..end)?.trim();
    let score = line.get(line.rfind('=')? + 1..)?.trim();
    Some((compound.to_string(), score.to_string()))
}

/// Line of a SMILES export with exactly two tab-separated fields: `(smiles, chembl_id)`.
pub fn smiles_line(line: &str) -> Option<(String, String)> {
    let fields = line.split('\t').collect::<Vec<&str>>();
    match fields.as_slice() {
        [smiles, chembl] => Some((smiles.trim().to_string(), chembl.trim().to_string())),
        _ => None,
    }
}

/// Name of an SDF data item header such as `> <chembl_id>` or `>  <chembl_id>  (1)`.
pub fn sdf_property_name(line: &str) -> Option<&str> {
    if !line.starts_with('>') {
        return None;
    }
    let start = line.find('<')? + 1;
    let end = start + line.get(start..)?.find('>')?;
    line.get(start..end)
}

/// Result table row of a docking log: `(mode, affinity)`.
///
/// Rows are indented and hold exactly four fields, a single-digit mode, a decimal
/// affinity and two RMSD values.
pub fn docking_mode(line: &str) -> Option<(u32, String)> {
    if !line.starts_with(char::is_whitespace) {
        return None;
    }
    let fields = line.split_whitespace().collect::<Vec<&str>>();
    let [mode, affinity, _, _] = fields.as_slice() else {
        return None;
    };
    if mode.len() != 1 || !is_decimal(affinity) {
        return None;
    }
    let mode = mode.parse::<u32>().ok()?;
    Some((mode, affinity.to_string()))
}

/// `[+-]?([0-9]*[.])?[0-9]+`
fn is_decimal(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => ("", digits),
    };
    !frac_part.is_empty()
        && int_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_index_line() {
        let line = "3ao4  1.95  2011  Kd=6.5uM      // 3ao4.pdf (GVA) ";
        let (id, res, lig) = catalog_primary(line).unwrap();
        assert_eq!(id, "3ao4");
        assert_eq!(res, "1.95");
        assert_eq!(lig, "GVA");

        let nmr = "2jxr   NMR  2008  Ki=1.2nM      // 2jxr.pdf (17A-mer) ";
        assert_eq!(catalog_primary(nmr).unwrap().1, " NMR");

        assert!(catalog_primary("3ao4  1.95").is_none());
        assert!(catalog_primary("3ao4  1.95  2011  Kd=6.5uM  no ligand").is_none());
    }

    #[test]
    fn secondary_index_line() {
        let line = "3ao4  2011  P43405  TYROSINE-PROTEIN KINASE SYK";
        assert_eq!(
            catalog_secondary(line),
            Some(("3ao4".to_string(), "P43405".to_string()))
        );
        let unknown = "1abc  2001  ------  UNKNOWN";
        assert_eq!(catalog_secondary(unknown).unwrap().1, "------");
        assert!(catalog_secondary("1abc  2001").is_none());
    }

    #[test]
    fn dssp_lines() {
        let helix = "    2    2 A K  H  > S+     0   0  105      1,-0.2     4,-2.6";
        assert_eq!(
            dssp_residue(helix),
            Some(("A".to_string(), 2, String::new(), 'H'))
        );

        let inserted = "   97  100AB E  E     -a   20   0   17";
        assert_eq!(
            dssp_residue(inserted),
            Some(("B".to_string(), 100, "A".to_string(), 'E'))
        );

        let coil = "    1    1 A M              0   0  211";
        assert_eq!(dssp_residue(coil).unwrap().3, ' ');

        let chain_break = "   45        !              0   0    0";
        assert!(dssp_residue(chain_break).is_none());
        assert!(dssp_residue("    1").is_none());
    }

    #[test]
    fn variant_codes() {
        let code = variant_code("p.Lys92Glu").unwrap();
        assert_eq!(code.source, "Lys");
        assert_eq!(code.residue_num, "92");
        assert_eq!(code.target, "Glu");

        let stop = variant_code("p.Arg1234Ter").unwrap();
        assert_eq!(stop.residue_num, "1234");
        assert_eq!(stop.target, "Ter");

        assert!(variant_code("p.Lys").is_none());
        assert!(variant_code("").is_none());
    }

    #[test]
    fn variant_catalogue_lines() {
        let line = "SYK        P43405     VAR_041853  p.Arg68His     LB/B      rs34831451  -";
        assert_eq!(
            catalogue_variant(line),
            Some((
                "P43405".to_string(),
                "p.Arg68His".to_string(),
                "rs34831451".to_string(),
                "LB/B".to_string()
            ))
        );
        assert!(catalogue_variant("Main gene  Swiss-Prot AC  FTId  AA change  Variant").is_none());
        assert!(catalogue_variant("__________ __________ ___________").is_none());
        assert!(catalogue_variant("SYK P43405 VAR_1 p.Arg68His").is_none());
    }

    #[test]
    fn similarity_log_lines() {
        assert_eq!(similarity_query(">3jvr_ligand"), Some("3jvr".to_string()));
        assert!(similarity_query("3jvr").is_none());

        let hit = ">CHEMBL1234 Tanimoto from 3jvr = 0.8734";
        assert_eq!(
            similarity_hit(hit),
            Some(("CHEMBL1234".to_string(), "0.8734".to_string()))
        );
        assert!(similarity_hit(">CHEMBL1234 score=1").is_none());
    }

    #[test]
    fn smiles_lines() {
        assert_eq!(
            smiles_line("CCO\tCHEMBL545"),
            Some(("CCO".to_string(), "CHEMBL545".to_string()))
        );
        assert!(smiles_line("CCO").is_none());
        assert!(smiles_line("CCO\tCHEMBL545\textra").is_none());
    }

    #[test]
    fn sdf_item_headers() {
        assert_eq!(sdf_property_name("> <chembl_id>"), Some("chembl_id"));
        assert_eq!(sdf_property_name(">  <chembl_id>  (1) "), Some("chembl_id"));
        assert!(sdf_property_name("CHEMBL1234").is_none());
    }

    #[test]
    fn docking_result_rows() {
        assert_eq!(
            docking_mode("   1         -9.3      0.000      0.000"),
            Some((1, "-9.3".to_string()))
        );
        assert_eq!(
            docking_mode("   3         -8.1      2.113      3.420"),
            Some((3, "-8.1".to_string()))
        );
        // header and separator lines
        assert!(docking_mode("mode |   affinity | dist from best mode").is_none());
        assert!(docking_mode("-----+------------+----------+----------").is_none());
        assert!(docking_mode("   1         -9.3      0.000").is_none());
        assert!(docking_mode("  10         -7.0      1.000      2.000").is_none());
        assert!(docking_mode("   1         n/a      0.000      0.000").is_none());
    }

    #[test]
    fn decimals() {
        assert!(is_decimal("-9.3"));
        assert!(is_decimal("+.5"));
        assert!(is_decimal("12"));
        assert!(!is_decimal("1."));
        assert!(!is_decimal("-"));
        assert!(!is_decimal("1e3"));
    }
}
