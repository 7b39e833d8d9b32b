//! Identities of similar ligands found for each structure.
//!
//! Per structure folder under the ligands directory:
//!
//! ```text
//! <ligands>/<pdb>/results/*.sdf        similarity search hits, multi-record SDF
//! <ligands>/<pdb>/logs/*               similarity search logs with Tanimoto scores
//! <ligands>/<pdb>/results-smi/*        SMILES exports, `<smiles>\t<chembl_id>`
//! <ligands>/<pdb>/splitted/<slot>.mol2
//! <ligands>/<pdb>/splitted-smi/<slot>.smi
//! ```

use crate::catalog::StructureCatalog;
use crate::error::{PipelineError, Result};
use crate::parsers::{sdf_property_name, similarity_hit, similarity_query, smiles_line};
use crate::report::BatchReport;
use crate::utils::{dir_files, file_name, header_of, read_rows, sub_dirs, write_rows};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info, warn};

/// SDF data item holding the compound identifier
pub const CHEMBL_PROPERTY: &str = "chembl_id";

/// Columns of the ligand tables; each stage writes a prefix of them
pub const LIGAND_HEADER: [&str; 5] = ["pdb", "ligand_file", "chembl_id", "tanimoto_index", "smiles"];

/// One similar ligand of a structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LigandIdentity {
    pub structure_id: String,
    /// `<file stem>_<record index>`, the name of the split ligand files
    pub ligand_slot: String,
    pub chembl_id: String,
    pub similarity_score: String,
    pub smiles: String,
}

impl LigandIdentity {
    /// The first `columns` fields in [`LIGAND_HEADER`] order.
    pub fn to_row(&self, columns: usize) -> Vec<String> {
        [
            &self.structure_id,
            &self.ligand_slot,
            &self.chembl_id,
            &self.similarity_score,
            &self.smiles,
        ]
        .iter()
        .take(columns)
        .map(|s| s.to_string())
        .collect()
    }

    pub fn from_row(row: &[String]) -> Option<Self> {
        let field = |i: usize| row.get(i).cloned().unwrap_or_default();
        if row.len() < 3 {
            return None;
        }
        Some(Self {
            structure_id: field(0),
            ligand_slot: field(1),
            chembl_id: field(2),
            similarity_score: field(3),
            smiles: field(4),
        })
    }
}

/// Scored hit of a similarity search log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityHit {
    pub structure_id: String,
    /// Query molecule named by the first record of the log
    pub query: String,
    pub compound: String,
    pub score: String,
}

/// SMILES of one exported compound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmilesEntry {
    pub structure_id: String,
    pub query: String,
    pub chembl_id: String,
    pub smiles: String,
}

/// The three ligand tables written by the dataset stage
#[derive(Debug, Clone, Default)]
pub struct LigandTables {
    pub filtered: Vec<LigandIdentity>,
    pub with_scores: Vec<LigandIdentity>,
    pub with_smiles: Vec<LigandIdentity>,
}

/// Compound identifiers of every record of a multi-record SDF text.
///
/// Each record advances the 1-based index, whether or not it carries the property.
pub fn sdf_identities(reader: impl BufRead) -> Result<Vec<(usize, String)>> {
    let mut found = Vec::new();
    let mut index = 1;
    let mut expect_value = false;

    for line in reader.lines() {
        let line = line?;
        if line.starts_with("$$$$") {
            index += 1;
            expect_value = false;
            continue;
        }
        if expect_value {
            found.push((index, line.trim().to_string()));
            expect_value = false;
        } else if sdf_property_name(&line) == Some(CHEMBL_PROPERTY) {
            expect_value = true;
        }
    }
    Ok(found)
}

/// Identities of every similarity search hit under `<root>/<pdb>/results/`.
pub fn extract_identities(root: &Path) -> Result<Vec<LigandIdentity>> {
    let mut identities = Vec::new();
    for folder in sub_dirs(root)? {
        let structure_id = file_name(&folder);
        for file in dir_files(&folder.join("results"))? {
            let name = file_name(&file);
            let stem = name.rfind('.').map_or(name.as_str(), |i| &name[..i]);
            let reader = std::io::BufReader::new(std::fs::File::open(&file)?);
            for (index, chembl_id) in sdf_identities(reader)? {
                identities.push(LigandIdentity {
                    structure_id: structure_id.clone(),
                    ligand_slot: format!("{stem}_{index}"),
                    chembl_id,
                    ..Default::default()
                });
            }
        }
    }
    debug!("{} ligand identities extracted", identities.len());
    Ok(identities)
}

/// Keep the first row per `(pdb, chembl_id)`.
///
/// Groups keep first-encounter order. Returns `(kept, deleted)`; with `keep_all` the
/// duplicates also stay in `kept`, right after their canonical row.
pub fn deduplicate(
    rows: &[LigandIdentity],
    keep_all: bool,
) -> (Vec<LigandIdentity>, Vec<LigandIdentity>) {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut groups: HashMap<(&str, &str), Vec<&LigandIdentity>> = HashMap::new();
    for row in rows {
        let key = (row.structure_id.as_str(), row.chembl_id.as_str());
        if !groups.contains_key(&key) {
            order.push(key);
        }
        groups.entry(key).or_default().push(row);
    }

    let mut kept = Vec::new();
    let mut deleted = Vec::new();
    for key in order {
        let Some((canonical, duplicates)) = groups.get(&key).and_then(|g| g.split_first()) else {
            continue;
        };
        kept.push((*canonical).clone());
        for duplicate in duplicates {
            deleted.push((*duplicate).clone());
            if keep_all {
                kept.push((*duplicate).clone());
            }
        }
    }
    (kept, deleted)
}

/// Remove the split ligand files of dropped duplicates. Returns the number of files
/// removed.
pub fn delete_ligand_files(deleted: &[LigandIdentity], ligands_dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for row in deleted {
        let folder = ligands_dir.join(&row.structure_id);
        for path in [
            folder.join("splitted").join(format!("{}.mol2", row.ligand_slot)),
            folder.join("splitted-smi").join(format!("{}.smi", row.ligand_slot)),
        ] {
            if path.exists() {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
    }
    debug!("{removed} duplicate ligand files removed");
    Ok(removed)
}

/// Scored hits of every log under `<root>/<pdb>/logs/`.
pub fn parse_similarity_logs(root: &Path) -> Result<Vec<SimilarityHit>> {
    let mut hits = Vec::new();
    for folder in sub_dirs(root)? {
        let structure_id = file_name(&folder);
        for log in dir_files(&folder.join("logs"))? {
            let mut query: Option<String> = None;
            let reader = std::io::BufReader::new(std::fs::File::open(&log)?);
            for line in reader.lines() {
                let line = line?;
                if !line.starts_with('>') {
                    continue;
                }
                match &query {
                    None => query = similarity_query(&line),
                    Some(q) => match similarity_hit(&line) {
                        Some((compound, score)) => hits.push(SimilarityHit {
                            structure_id: structure_id.clone(),
                            query: q.clone(),
                            compound,
                            score,
                        }),
                        None => warn!("Skipping malformed line in {}: {line}", log.display()),
                    },
                }
            }
        }
    }
    Ok(hits)
}

/// Compounds of every SMILES export under `<root>/<pdb>/results-smi/`.
pub fn parse_smiles_exports(root: &Path) -> Result<Vec<SmilesEntry>> {
    let mut entries = Vec::new();
    for folder in sub_dirs(root)? {
        let structure_id = file_name(&folder);
        for export in dir_files(&folder.join("results-smi"))? {
            let query = file_name(&export).chars().take(4).collect::<String>();
            let reader = std::io::BufReader::new(std::fs::File::open(&export)?);
            for line in reader.lines() {
                if let Some((smiles, chembl_id)) = smiles_line(&line?) {
                    entries.push(SmilesEntry {
                        structure_id: structure_id.clone(),
                        query: query.clone(),
                        chembl_id,
                        smiles,
                    });
                }
            }
        }
    }
    Ok(entries)
}

/// Attach similarity scores on `(pdb, chembl_id)`, then deduplicate.
///
/// Every matching hit yields a row; identities without a hit keep an empty score.
pub fn join_with_similarity_log(
    identities: &[LigandIdentity],
    hits: &[SimilarityHit],
    keep_all: bool,
) -> Vec<LigandIdentity> {
    let joined = identities
        .iter()
        .flat_map(|id| {
            let matches = hits
                .iter()
                .filter(|h| h.structure_id == id.structure_id && h.compound == id.chembl_id)
                .map(|h| LigandIdentity {
                    similarity_score: h.score.clone(),
                    ..id.clone()
                })
                .collect::<Vec<LigandIdentity>>();
            if matches.is_empty() {
                vec![LigandIdentity {
                    similarity_score: String::new(),
                    ..id.clone()
                }]
            } else {
                matches
            }
        })
        .collect::<Vec<LigandIdentity>>();
    deduplicate(&joined, keep_all).0
}

/// Attach SMILES on `(pdb, chembl_id)`, then deduplicate.
pub fn join_with_smiles(
    identities: &[LigandIdentity],
    smiles: &[SmilesEntry],
    keep_all: bool,
) -> Vec<LigandIdentity> {
    let joined = identities
        .iter()
        .flat_map(|id| {
            let matches = smiles
                .iter()
                .filter(|s| s.structure_id == id.structure_id && s.chembl_id == id.chembl_id)
                .map(|s| LigandIdentity {
                    smiles: s.smiles.clone(),
                    ..id.clone()
                })
                .collect::<Vec<LigandIdentity>>();
            if matches.is_empty() {
                vec![LigandIdentity {
                    smiles: String::new(),
                    ..id.clone()
                }]
            } else {
                matches
            }
        })
        .collect::<Vec<LigandIdentity>>();
    deduplicate(&joined, keep_all).0
}

/// Build the three ligand tables from a ligands folder.
///
/// Split files of duplicate hits are deleted after the first deduplication. `keep_all`
/// only applies to the filtered table; the joined tables hold one row per compound.
pub fn tanimoto_dataset(ligands_dir: &Path, keep_all: bool) -> Result<LigandTables> {
    let identities = extract_identities(ligands_dir)?;
    let (filtered, deleted) = deduplicate(&identities, keep_all);
    delete_ligand_files(&deleted, ligands_dir)?;

    let hits = parse_similarity_logs(ligands_dir)?;
    let with_scores = join_with_similarity_log(&filtered, &hits, false);
    let smiles = parse_smiles_exports(ligands_dir)?;
    let with_smiles = join_with_smiles(&with_scores, &smiles, false);
    info!(
        "{} ligands kept, {} duplicates dropped",
        filtered.len(),
        deleted.len()
    );

    Ok(LigandTables {
        filtered,
        with_scores,
        with_smiles,
    })
}

/// Write identities with the first `columns` columns of [`LIGAND_HEADER`].
pub fn write_identities(path: &Path, rows: &[LigandIdentity], columns: usize) -> Result<()> {
    let header = header_of(&LIGAND_HEADER[..columns]);
    let rows = rows.iter().map(|r| r.to_row(columns)).collect::<Vec<Vec<String>>>();
    write_rows(path, &header, &rows)
}

/// Read a table written by [`write_identities`].
pub fn read_identities(path: &Path) -> Result<Vec<LigandIdentity>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let (_, rows) = read_rows(path)?;
    Ok(rows.iter().filter_map(|r| LigandIdentity::from_row(r)).collect())
}

/// Copy the ligand of every preserved group member of each energy-tool structure
/// into `<ligands>/<pdb>/`.
pub fn prepare_ligand_folders(
    catalog: &StructureCatalog,
    energy_dir: &Path,
    entries_dir: &Path,
    ligands_dir: &Path,
) -> Result<BatchReport> {
    let mut report = BatchReport::new("ligand folders");
    for folder in sub_dirs(energy_dir)? {
        let structure_id = file_name(&folder);
        let Some(record) = catalog.get(&structure_id) else {
            report.skip(&structure_id, "not in catalog");
            continue;
        };
        let target_dir = ligands_dir.join(&structure_id);
        std::fs::create_dir_all(&target_dir)?;

        let mut missing = Vec::new();
        for (member, _) in record.ligand_members() {
            let name = format!("{member}_ligand.sdf");
            let source = entries_dir.join(&member).join(&name);
            if source.exists() {
                std::fs::copy(&source, target_dir.join(&name))?;
                debug!("Ligand copied: {member}");
            } else {
                missing.push(member);
            }
        }
        if missing.is_empty() {
            report.success(&structure_id);
        } else {
            report.fail(&structure_id, format!("missing ligands of {}", missing.join(", ")));
        }
    }
    Ok(report)
}
