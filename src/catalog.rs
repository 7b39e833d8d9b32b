//! Structure catalog: the joined primary and secondary structure indexes together
//! with the filtering, sorting and grouping steps that select one structure per
//! protein.

use crate::config::PipelineConfig;
use crate::download::UrlTemplate;
use crate::error::{PipelineError, Result};
use crate::parsers::{catalog_primary, catalog_secondary};
use crate::utils::{file_name, header_of, read_rows, sub_dirs, write_rows};
use polars::prelude::*;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info, warn};

/// Both index files start with this many header lines
const INDEX_HEADER_LINES: usize = 6;

/// Structures never chosen as the representative of a protein unless they are the
/// only ones available.
pub const EXCLUDED_STRUCTURES: [&str; 2] = ["3e5a", "1z95"];

/// Column names used when a catalog is written to or read from a table
pub const CATALOG_HEADER: [&str; 4] = ["pdb", "resolution", "ligand", "uniprot"];

/// Addressable fields of a [`StructureRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogField {
    StructureId,
    Resolution,
    Ligand,
    Uniprot,
}

/// One structure of the catalog. All fields are kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureRecord {
    pub structure_id: String,
    /// Resolution in Å, or `NMR`
    pub resolution: String,
    /// Ligand code, or `<id>:<ligand>;...` after grouping with preserved ligands
    pub ligand: String,
    /// Canonical protein accession
    pub uniprot: String,
}

impl StructureRecord {
    pub fn field(&self, field: CatalogField) -> &str {
        match field {
            CatalogField::StructureId => &self.structure_id,
            CatalogField::Resolution => &self.resolution,
            CatalogField::Ligand => &self.ligand,
            CatalogField::Uniprot => &self.uniprot,
        }
    }

    /// `(member id, ligand code)` pairs of a preserved ligand string.
    pub fn ligand_members(&self) -> Vec<(String, String)> {
        self.ligand
            .split(';')
            .filter(|part| !part.is_empty())
            .filter_map(|part| {
                part.split_once(':')
                    .map(|(id, ligand)| (id.to_string(), ligand.to_string()))
            })
            .collect()
    }

    fn into_row(self) -> Vec<String> {
        vec![self.structure_id, self.resolution, self.ligand, self.uniprot]
    }
}

/// Aggregate figures of a catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSummary {
    pub records: usize,
    pub proteins: usize,
    /// Mean of the numeric resolutions, if any
    pub mean_resolution: Option<f64>,
}

/// Ordered collection of [`StructureRecord`]s.
///
/// Every transformation consumes the catalog and returns the new one, so steps chain
/// like a builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureCatalog {
    records: Vec<StructureRecord>,
}

impl StructureCatalog {
    pub fn from_records(records: Vec<StructureRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[StructureRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StructureRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record of a structure, if present.
    pub fn get(&self, structure_id: &str) -> Option<&StructureRecord> {
        self.records.iter().find(|r| r.structure_id == structure_id)
    }

    /// Join the primary index (id, resolution, ligand) with the secondary index
    /// (id, accession) on the structure id.
    ///
    /// The first matching secondary line wins and primary lines without a match are
    /// dropped. Lines too short for their offsets are skipped.
    pub fn load(primary: &Path, secondary: &Path) -> Result<Self> {
        let primary_lines = read_index(primary)?;
        let secondary_lines = read_index(secondary)?;

        let mut accessions: HashMap<String, String> = HashMap::new();
        for line in &secondary_lines {
            match catalog_secondary(line) {
                Some((structure_id, uniprot)) => {
                    accessions.entry(structure_id).or_insert(uniprot);
                }
                None => warn!("Skipping malformed line in {}: {line}", secondary.display()),
            }
        }

        let mut records = Vec::with_capacity(primary_lines.len());
        for line in &primary_lines {
            let Some((structure_id, resolution, ligand)) = catalog_primary(line) else {
                warn!("Skipping malformed line in {}: {line}", primary.display());
                continue;
            };
            if let Some(uniprot) = accessions.get(&structure_id) {
                records.push(StructureRecord {
                    structure_id,
                    resolution,
                    ligand,
                    uniprot: uniprot.clone(),
                });
            }
        }
        debug!("Loaded {} catalog records", records.len());

        Ok(Self { records })
    }

    /// Drop records whose trimmed field equals `value`.
    pub fn filter_string_not_equal(mut self, field: CatalogField, value: &str) -> Self {
        self.records.retain(|r| r.field(field).trim() != value);
        self
    }

    /// Keep records whose field parses as a real strictly below `cutoff`.
    pub fn filter_double_cutoff(mut self, field: CatalogField, cutoff: f64) -> Self {
        self.records.retain(|r| {
            r.field(field)
                .trim()
                .parse::<f64>()
                .is_ok_and(|value| value < cutoff)
        });
        self
    }

    /// Stable lexicographic sort on the raw text of a field.
    pub fn sort_by(mut self, field: CatalogField) -> Self {
        self.records.sort_by(|a, b| a.field(field).cmp(b.field(field)));
        self
    }

    /// Keep records with a sub-directory of `dir` named after their structure id
    /// (trimmed, case-insensitive).
    pub fn keep_as_folder_match(mut self, dir: &Path) -> Result<Self> {
        let folders = sub_dirs(dir)?
            .iter()
            .map(|p| file_name(p).trim().to_lowercase())
            .collect::<Vec<String>>();
        if folders.is_empty() {
            warn!("No structure folders found in {}", dir.display());
        }
        self.records
            .retain(|r| folders.contains(&r.structure_id.trim().to_lowercase()));
        Ok(self)
    }

    /// Keep one record per protein: the one with the smallest resolution text.
    ///
    /// Groups are formed in first-encounter order. [`EXCLUDED_STRUCTURES`] are left
    /// out of a group unless nothing else remains. With `preserve_ligand_data` the
    /// chosen record's ligand becomes `<id>:<ligand>;` over all remaining members.
    pub fn group_by_protein_keep_min_resolution(self, preserve_ligand_data: bool) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<StructureRecord>> = HashMap::new();
        for record in self.records {
            if !groups.contains_key(&record.uniprot) {
                order.push(record.uniprot.clone());
            }
            groups.entry(record.uniprot.clone()).or_default().push(record);
        }

        let records = order
            .iter()
            .filter_map(|uniprot| groups.remove(uniprot))
            .filter_map(|members| {
                let kept = members
                    .iter()
                    .filter(|r| !EXCLUDED_STRUCTURES.contains(&r.structure_id.trim()))
                    .cloned()
                    .collect::<Vec<StructureRecord>>();
                let candidates = if kept.is_empty() { members } else { kept };

                let mut best = candidates
                    .iter()
                    .fold(None::<&StructureRecord>, |best, r| match best {
                        Some(b) if b.resolution <= r.resolution => Some(b),
                        _ => Some(r),
                    })?
                    .clone();

                if preserve_ligand_data {
                    best.ligand = candidates
                        .iter()
                        .map(|r| format!("{}:{};", r.structure_id, r.ligand))
                        .collect();
                }
                Some(best)
            })
            .collect();

        Self { records }
    }

    /// One download URL per record.
    pub fn as_download_url_list(&self, template: UrlTemplate) -> Vec<String> {
        self.records.iter().map(|r| template.url(r)).collect()
    }

    /// The selection used by every downstream stage: structures with a local entry
    /// folder and a known protein, solved by diffraction, best per protein, below the
    /// resolution cutoff.
    pub fn init_pipeline(config: &PipelineConfig) -> Result<Self> {
        let catalog = Self::load(&config.pdbbind_data_path_1, &config.pdbbind_data_path_2)?
            .keep_as_folder_match(&config.pdbbind_entries_path)?
            .filter_string_not_equal(CatalogField::Uniprot, "------")
            .filter_string_not_equal(CatalogField::Resolution, "NMR")
            .sort_by(CatalogField::Resolution)
            .group_by_protein_keep_min_resolution(true)
            .filter_double_cutoff(CatalogField::Resolution, config.resolution_cutoff);
        Ok(catalog)
    }

    /// Selection used to gather ligands: the resolution cutoff is applied before
    /// grouping so that preserved ligand strings only list well-resolved members.
    pub fn ligand_pipeline(config: &PipelineConfig) -> Result<Self> {
        let catalog = Self::load(&config.pdbbind_data_path_1, &config.pdbbind_data_path_2)?
            .filter_string_not_equal(CatalogField::Uniprot, "------")
            .filter_string_not_equal(CatalogField::Resolution, "NMR")
            .sort_by(CatalogField::Resolution)
            .filter_double_cutoff(CatalogField::Resolution, config.resolution_cutoff)
            .keep_as_folder_match(&config.pdbbind_entries_path)?
            .group_by_protein_keep_min_resolution(true);
        Ok(catalog)
    }

    /// Record count, distinct proteins and mean resolution.
    pub fn summary(&self) -> Result<CatalogSummary> {
        let uniprot = self
            .records
            .iter()
            .map(|r| r.uniprot.as_str())
            .collect::<Vec<&str>>();
        let resolution = self
            .records
            .iter()
            .map(|r| r.resolution.trim().parse::<f64>().ok())
            .collect::<Vec<Option<f64>>>();
        let df = DataFrame::new(vec![
            Column::new("uniprot".into(), uniprot),
            Column::new("resolution".into(), resolution),
        ])?;

        let stats = df
            .lazy()
            .select([
                col("uniprot").n_unique().alias("proteins"),
                col("resolution").mean().alias("mean_resolution"),
            ])
            .collect()?;

        let proteins = stats
            .column("proteins")?
            .get(0)?
            .extract::<usize>()
            .unwrap_or(0);
        let mean_resolution = stats.column("mean_resolution")?.get(0)?.extract::<f64>();

        Ok(CatalogSummary {
            records: self.records.len(),
            proteins,
            mean_resolution: mean_resolution.filter(|_| !self.records.is_empty()),
        })
    }

    /// Log the summary and the first records.
    pub fn log_summary(&self) -> Result<()> {
        let summary = self.summary()?;
        info!(
            "Catalog: {} structures, {} proteins, mean resolution {}",
            summary.records,
            summary.proteins,
            summary
                .mean_resolution
                .map(|m| format!("{m:.2}"))
                .unwrap_or_else(|| "-".to_string())
        );
        for record in self.records.iter().take(5) {
            debug!(
                "{}\t{}\t{}\t{}",
                record.structure_id, record.resolution, record.ligand, record.uniprot
            );
        }
        Ok(())
    }

    /// Write the catalog as a table with [`CATALOG_HEADER`].
    pub fn write(&self, path: &Path) -> Result<()> {
        let rows = self
            .records
            .iter()
            .cloned()
            .map(StructureRecord::into_row)
            .collect::<Vec<Vec<String>>>();
        write_rows(path, &header_of(&CATALOG_HEADER), &rows)
    }

    /// Read a catalog written by [`StructureCatalog::write`].
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.to_path_buf()));
        }
        let (_, rows) = read_rows(path)?;
        let records = rows
            .into_iter()
            .filter_map(|row| match row.as_slice() {
                [structure_id, resolution, ligand, uniprot, ..] => Some(StructureRecord {
                    structure_id: structure_id.clone(),
                    resolution: resolution.clone(),
                    ligand: ligand.clone(),
                    uniprot: uniprot.clone(),
                }),
                _ => None,
            })
            .collect();
        Ok(Self { records })
    }
}

/// Lines of an index file after its header.
fn read_index(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let lines = reader
        .lines()
        .skip(INDEX_HEADER_LINES)
        .collect::<std::io::Result<Vec<String>>>()?;
    Ok(lines)
}
