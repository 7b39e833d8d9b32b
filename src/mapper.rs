//! Mapping of protein variants onto structure residues.
//!
//! A variant is accepted at a residue only when the structure numbering, the
//! canonical numbering and the residue identity all agree.

use crate::catalog::{StructureCatalog, StructureRecord};
use crate::entries::{MappingScope, StructureEntry};
use crate::error::{PipelineError, Result};
use crate::parsers::{catalogue_variant, variant_code};
use crate::report::BatchReport;
use crate::residues::{one_letter_or_empty, one_letter_or_raw, AminoAcid};
use crate::sifts::ResidueCrossReference;
use crate::utils::{header_of, open_text, read_rows, write_rows};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, warn};

/// Leading columns of a variant table
pub const VARIANT_HEADER: [&str; 7] = [
    "uniprot",
    "snp",
    "rs_id",
    "mutation_type",
    "pdb",
    "min_res",
    "ligand",
];

/// Columns of a mapped variant table
pub const MAPPER_HEADER: [&str; 21] = [
    "uniprot",
    "snp",
    "rs_id",
    "mutation_type",
    "pdb",
    "min_res",
    "ligand",
    "sourceAminoAcid",
    "targetAminoAcid",
    "residueNum",
    "chain",
    "PdbResName",
    "PdbResNum",
    "aaPDBName",
    "aaResidueNumber",
    "UniProtResName",
    "UniProtPos",
    "UniProtAccessionId",
    "PdbId",
    "SeqResName",
    "NaturalPos",
];

/// Missense variant of a protein, attached to a catalog structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variant {
    pub uniprot: String,
    /// Variant code such as `p.Lys92Glu`
    pub snp: String,
    pub rs_id: String,
    pub mutation_type: String,
    pub pdb: String,
    pub min_res: String,
    pub ligand: String,
}

impl Variant {
    pub fn from_row(row: &[String]) -> Option<Self> {
        match row {
            [uniprot, snp, rs_id, mutation_type, pdb, min_res, ligand, ..] => Some(Self {
                uniprot: uniprot.clone(),
                snp: snp.clone(),
                rs_id: rs_id.clone(),
                mutation_type: mutation_type.clone(),
                pdb: pdb.clone(),
                min_res: min_res.clone(),
                ligand: ligand.clone(),
            }),
            _ => None,
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.uniprot.clone(),
            self.snp.clone(),
            self.rs_id.clone(),
            self.mutation_type.clone(),
            self.pdb.clone(),
            self.min_res.clone(),
            self.ligand.clone(),
        ]
    }
}

/// Missense variant of the external catalogue, before it is attached to structures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueVariant {
    pub uniprot: String,
    pub snp: String,
    pub rs_id: String,
    pub mutation_type: String,
}

/// Read the (possibly gzipped) missense variant catalogue. Lines that carry no
/// variant are skipped.
pub fn read_variant_catalogue(path: &Path) -> Result<Vec<CatalogueVariant>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let mut variants = Vec::new();
    for line in open_text(path)?.lines() {
        if let Some((uniprot, snp, rs_id, mutation_type)) = catalogue_variant(&line?) {
            variants.push(CatalogueVariant {
                uniprot,
                snp,
                rs_id,
                mutation_type,
            });
        }
    }
    debug!("{} catalogue variants read from {}", variants.len(), path.display());
    Ok(variants)
}

/// Attach catalogue variants to every catalog structure of the same protein.
///
/// Rows follow the catalogue order, then the catalog order within one variant.
/// Variants of proteins absent from the catalog are dropped.
pub fn map_catalogue_variants(
    catalogue: &[CatalogueVariant],
    catalog: &StructureCatalog,
) -> Vec<Variant> {
    let mut by_protein: HashMap<&str, Vec<&StructureRecord>> = HashMap::new();
    for record in catalog.records() {
        by_protein
            .entry(record.uniprot.trim())
            .or_default()
            .push(record);
    }

    let variants = catalogue
        .iter()
        .flat_map(|v| {
            by_protein
                .get(v.uniprot.as_str())
                .into_iter()
                .flatten()
                .map(move |record| Variant {
                    uniprot: v.uniprot.clone(),
                    snp: v.snp.clone(),
                    rs_id: v.rs_id.clone(),
                    mutation_type: v.mutation_type.clone(),
                    pdb: record.structure_id.clone(),
                    min_res: record.resolution.clone(),
                    ligand: record.ligand.clone(),
                })
        })
        .collect::<Vec<Variant>>();
    debug!("{} variants attached to catalog structures", variants.len());
    variants
}

/// Write variants with [`VARIANT_HEADER`].
pub fn write_variants(path: &Path, rows: &[Variant]) -> Result<()> {
    let rows = rows.iter().map(Variant::to_row).collect::<Vec<Vec<String>>>();
    write_rows(path, &header_of(&VARIANT_HEADER), &rows)
}

/// A variant located on one structure residue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedVariant {
    pub variant: Variant,
    /// One-letter source residue, or the raw text when unknown
    pub source_aa: String,
    /// One-letter target residue, empty when unknown
    pub target_aa: String,
    pub residue_num: String,
    pub chain: String,
    pub pdb_res_name: String,
    pub pdb_res_num: String,
    pub aa_pdb_name: String,
    pub aa_residue_number: String,
    pub uniprot_res_name: String,
    pub uniprot_pos: String,
    pub uniprot_accession: String,
    pub pdb_id: String,
    pub seq_res_name: String,
    pub natural_pos: String,
}

impl MappedVariant {
    /// Whether source residue, structure residue and canonical residue agree and
    /// both ends of the substitution are known.
    pub fn is_consistent(&self) -> bool {
        !self.source_aa.is_empty()
            && !self.target_aa.is_empty()
            && self.source_aa == self.pdb_res_name
            && self.source_aa == self.aa_pdb_name
            && self.source_aa == self.uniprot_res_name
    }

    /// Mutation in the notation of the energy tool: `<source><chain><number><target>;`
    pub fn mutation(&self) -> String {
        format!(
            "{}{}{}{};",
            self.source_aa, self.chain, self.pdb_res_num, self.target_aa
        )
    }

    pub fn to_row(&self) -> Vec<String> {
        let v = &self.variant;
        [
            &v.uniprot,
            &v.snp,
            &v.rs_id,
            &v.mutation_type,
            &v.pdb,
            &v.min_res,
            &v.ligand,
            &self.source_aa,
            &self.target_aa,
            &self.residue_num,
            &self.chain,
            &self.pdb_res_name,
            &self.pdb_res_num,
            &self.aa_pdb_name,
            &self.aa_residue_number,
            &self.uniprot_res_name,
            &self.uniprot_pos,
            &self.uniprot_accession,
            &self.pdb_id,
            &self.seq_res_name,
            &self.natural_pos,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub fn from_row(row: &[String]) -> Option<Self> {
        if row.len() < MAPPER_HEADER.len() {
            return None;
        }
        let variant = Variant::from_row(row)?;
        let field = |i: usize| row[i].clone();
        Some(Self {
            variant,
            source_aa: field(7),
            target_aa: field(8),
            residue_num: field(9),
            chain: field(10),
            pdb_res_name: field(11),
            pdb_res_num: field(12),
            aa_pdb_name: field(13),
            aa_residue_number: field(14),
            uniprot_res_name: field(15),
            uniprot_pos: field(16),
            uniprot_accession: field(17),
            pdb_id: field(18),
            seq_res_name: field(19),
            natural_pos: field(20),
        })
    }
}

/// Candidate row for a variant matched to an amino acid through a cross-reference.
fn candidate(
    variant: &Variant,
    source: &str,
    target: &str,
    residue_num: &str,
    aa: &AminoAcid,
    xref: &ResidueCrossReference,
) -> MappedVariant {
    MappedVariant {
        variant: variant.clone(),
        source_aa: one_letter_or_raw(&source.to_uppercase()),
        target_aa: one_letter_or_empty(&target.to_uppercase()),
        residue_num: residue_num.to_string(),
        chain: xref.chain_id.clone(),
        pdb_res_name: one_letter_or_empty(&xref.structure_res_name),
        pdb_res_num: xref.structure_res_num.clone(),
        aa_pdb_name: one_letter_or_empty(&aa.name),
        aa_residue_number: aa.seq_num.to_string(),
        uniprot_res_name: xref.canonical_res_name.clone(),
        uniprot_pos: xref.canonical_pos.clone(),
        uniprot_accession: xref.canonical_accession.clone(),
        pdb_id: xref.structure_id.clone(),
        seq_res_name: xref.natural_res_name.clone(),
        natural_pos: xref.natural_pos.clone(),
    }
}

/// Locate variants on the residues of their structure.
///
/// Every pair of amino acid (within `scope`) and cross-reference that agrees on
/// residue name, structure number and canonical position yields a row; rows that
/// fail [`MappedVariant::is_consistent`] are dropped. Variants whose structure
/// lacks the scope's amino acids or cross-references are skipped.
pub fn map_pocket_residues(
    variants: &[Variant],
    index: &HashMap<String, StructureEntry>,
    scope: MappingScope,
) -> (Vec<MappedVariant>, BatchReport) {
    let mut report = BatchReport::new("variant mapping");
    let mut mapped = Vec::new();

    for variant in variants {
        let key = format!("{} {}", variant.pdb, variant.snp);
        let Some(entry) = index.get(&variant.pdb) else {
            report.skip(key, "structure not in catalog");
            continue;
        };
        let (Some(amino_acids), Some(xrefs)) =
            (entry.amino_acids(scope), entry.cross_references.as_ref())
        else {
            report.skip(key, "structure or cross-references unavailable");
            continue;
        };
        let Some(code) = variant_code(&variant.snp) else {
            warn!("Malformed variant code {}", variant.snp);
            report.fail(key, "malformed variant code");
            continue;
        };

        let before = mapped.len();
        for aa in amino_acids {
            let seq_num = aa.seq_num.to_string();
            for xref in xrefs {
                let matches = xref.structure_res_name == aa.name
                    && xref.structure_res_num == seq_num
                    && xref.has_canonical()
                    && xref.canonical_pos == code.residue_num;
                if !matches {
                    continue;
                }
                let row = candidate(variant, &code.source, &code.target, &code.residue_num, aa, xref);
                if row.is_consistent() {
                    mapped.push(row);
                }
            }
        }

        if mapped.len() > before {
            report.success(key);
        } else {
            report.skip(key, "no consistent residue");
        }
    }
    debug!("{} variant rows mapped", mapped.len());

    (mapped, report)
}

/// Read a variant table with a header row.
pub fn read_variants(path: &Path) -> Result<Vec<Variant>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let (_, rows) = read_rows(path)?;
    Ok(rows.iter().filter_map(|r| Variant::from_row(r)).collect())
}

/// Write mapped variants with [`MAPPER_HEADER`].
pub fn write_mapped(path: &Path, rows: &[MappedVariant]) -> Result<()> {
    let rows = rows.iter().map(MappedVariant::to_row).collect::<Vec<Vec<String>>>();
    write_rows(path, &header_of(&MAPPER_HEADER), &rows)
}

/// Read a table written by [`write_mapped`].
pub fn read_mapped(path: &Path) -> Result<Vec<MappedVariant>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let (_, rows) = read_rows(path)?;
    Ok(rows.iter().filter_map(|r| MappedVariant::from_row(r)).collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::tests::record;
    use crate::entries::tests::entries_config;
    use crate::entries::StructureEntry;
    use crate::structure::PdbToolkit;

    pub(crate) fn variant(pdb: &str, snp: &str) -> Variant {
        Variant {
            uniprot: "P12345".to_string(),
            snp: snp.to_string(),
            rs_id: "rs1".to_string(),
            mutation_type: "Disease".to_string(),
            pdb: pdb.to_string(),
            min_res: "1.80".to_string(),
            ligand: "1abc:LIG;".to_string(),
        }
    }

    fn index(root: &Path) -> HashMap<String, StructureEntry> {
        let config = entries_config(root);
        let entry = StructureEntry::load(&config, &PdbToolkit::default(), "1abc");
        HashMap::from([("1abc".to_string(), entry)])
    }

    #[test]
    fn consistent_variant_is_mapped() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(dir.path());

        let (rows, report) = map_pocket_residues(
            &[variant("1abc", "p.Gly92Asp")],
            &index,
            MappingScope::Pocket,
        );
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.source_aa, "G");
        assert_eq!(row.target_aa, "D");
        assert_eq!(row.residue_num, "92");
        assert_eq!(row.chain, "A");
        assert_eq!(row.pdb_res_num, "2");
        assert_eq!(row.aa_residue_number, "2");
        assert_eq!(row.uniprot_accession, "P12345");
        assert_eq!(row.natural_pos, "2");
        assert_eq!(row.mutation(), "GA2D;");
        assert_eq!(row.to_row().len(), MAPPER_HEADER.len());
        assert_eq!(report.counts(), (1, 0, 0));
    }

    #[test]
    fn residue_identity_mismatch_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(dir.path());
        // canonical 93 is an alanine, so a glycine at 93 fails the identity check
        let (rows, _) = map_pocket_residues(
            &[variant("1abc", "p.Gly93Asp")],
            &index,
            MappingScope::Pocket,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn canonical_position_must_match_variant() {
        let xref = |canonical_pos: &str| ResidueCrossReference {
            structure_id: "1abc".to_string(),
            chain_id: "A".to_string(),
            structure_res_name: "GLY".to_string(),
            structure_res_num: "2".to_string(),
            canonical_res_name: "G".to_string(),
            canonical_pos: canonical_pos.to_string(),
            canonical_accession: "P12345".to_string(),
            natural_res_name: "GLY".to_string(),
            natural_pos: "2".to_string(),
        };
        let entry = |canonical_pos: &str| StructureEntry {
            structure_id: "1abc".to_string(),
            protein: None,
            pocket: Some(vec![AminoAcid {
                chain: "A".to_string(),
                seq_num: 2,
                insertion: String::new(),
                name: "GLY".to_string(),
                ca: None,
            }]),
            cross_references: Some(vec![xref(canonical_pos)]),
        };
        let variants = [variant("1abc", "p.Gly92Asp")];

        let shifted = HashMap::from([("1abc".to_string(), entry("93"))]);
        let (rows, report) = map_pocket_residues(&variants, &shifted, MappingScope::Pocket);
        assert!(rows.is_empty());
        assert_eq!(report.counts(), (0, 1, 0));

        let aligned = HashMap::from([("1abc".to_string(), entry("92"))]);
        let (rows, _) = map_pocket_residues(&variants, &aligned, MappingScope::Pocket);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pdb_res_num, "2");
    }

    #[test]
    fn inconsistent_rows_are_never_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(dir.path());
        let variants = [
            variant("1abc", "p.Ala92Val"),
            variant("1abc", "p.Gly92Ter"),
            variant("1abc", "p.Ala93Val"),
            variant("1abc", "x"),
        ];
        let (rows, report) = map_pocket_residues(&variants, &index, MappingScope::Pocket);
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(MappedVariant::is_consistent));
        assert_eq!(rows[0].variant.snp, "p.Ala93Val");
        assert_eq!(report.counts(), (1, 2, 1));
    }

    #[test]
    fn scope_selects_amino_acids() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(dir.path());
        let variants = [variant("1abc", "p.Gly91Asp"), variant("9zzz", "p.Gly91Asp")];

        let (pocket, report) = map_pocket_residues(&variants, &index, MappingScope::Pocket);
        assert!(pocket.is_empty());
        assert_eq!(report.counts(), (0, 2, 0));

        let (protein, _) = map_pocket_residues(&variants, &index, MappingScope::Protein);
        assert_eq!(protein.len(), 1);
        assert_eq!(protein[0].pdb_res_num, "1");
    }

    #[test]
    fn variant_table_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variants.tsv");
        let row = variant("1abc", "p.Gly92Asp");
        write_variants(&path, &[row.clone()]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("uniprot\tsnp\trs_id\tmutation_type\tpdb\tmin_res\tligand\n"));
        assert_eq!(read_variants(&path).unwrap(), vec![row]);
        assert!(matches!(
            read_variants(&dir.path().join("absent.tsv")),
            Err(PipelineError::MissingInput(_))
        ));
    }

    #[test]
    fn catalogue_variants_join_catalog_by_protein() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("humsavar.txt");
        std::fs::write(
            &path,
            "Main gene name  Swiss-Prot AC  FTId  AA change  Variant category  dbSNP  Disease name\n\
             _________  __________  __________  __________  __________  __________  __________\n\
             ABC1       P12345     VAR_000001  p.Gly92Asp     LP/P      rs1         Some disease\n\
             XYZ2       Q99999     VAR_000002  p.Leu10Phe     LB/B      -           -\n\
             ABC1       P12345     VAR_000003  p.Ala93Val     US        rs3         -\n",
        )
        .unwrap();
        let catalogue = read_variant_catalogue(&path).unwrap();
        assert_eq!(catalogue.len(), 3);

        let catalog = StructureCatalog::from_records(vec![
            record("1abc", "1.80", "1abc:LIG;", "P12345"),
            record("2xyz", "2.10", "ATP", "O11111"),
            record("3def", "2.00", "3def:NAD;", "P12345"),
        ]);
        let variants = map_catalogue_variants(&catalogue, &catalog);
        let keys: Vec<(&str, &str)> = variants
            .iter()
            .map(|v| (v.snp.as_str(), v.pdb.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("p.Gly92Asp", "1abc"),
                ("p.Gly92Asp", "3def"),
                ("p.Ala93Val", "1abc"),
                ("p.Ala93Val", "3def"),
            ]
        );
        assert_eq!(
            variants[0].to_row(),
            vec!["P12345", "p.Gly92Asp", "rs1", "LP/P", "1abc", "1.80", "1abc:LIG;"]
        );

        assert!(matches!(
            read_variant_catalogue(&dir.path().join("absent.txt")),
            Err(PipelineError::MissingInput(_))
        ));
    }

    #[test]
    fn mapped_table_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(dir.path());
        let (rows, _) = map_pocket_residues(
            &[variant("1abc", "p.Gly92Asp")],
            &index,
            MappingScope::Pocket,
        );
        let path = dir.path().join("tsv").join("pdbbind_pocket_variants.tsv");
        write_mapped(&path, &rows).unwrap();

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("uniprot\tsnp\trs_id\tmutation_type\tpdb"));
        assert_eq!(read_mapped(&path).unwrap(), rows);
    }
}
