//! Pipeline configuration.
//!
//! All stages receive a [`PipelineConfig`] explicitly instead of looking paths up
//! from process-wide state. The file format is TOML:
//!
//! ```toml
//! pdbbind_data_path_1 = "/data/index/INDEX_general_PL.2018"
//! pdbbind_data_path_2 = "/data/index/INDEX_general_PL_name.2018"
//! variants_catalogue_path = "/data/index/humsavar.txt"
//! pdbbind_entries_path = "/data/entries"
//! sifts_path = "/data/sifts"
//! tsv_path = "/data/tsv"
//! ```

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths and constants shared by every pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Primary structure index (id, resolution, ligand)
    pub pdbbind_data_path_1: PathBuf,
    /// Secondary structure index (id, UniProt accession)
    pub pdbbind_data_path_2: PathBuf,
    /// Missense variant catalogue (`humsavar.txt` layout, optionally gzipped)
    pub variants_catalogue_path: PathBuf,
    /// One folder per structure with `<id>_protein.pdb`, `<id>_pocket.pdb`, `<id>_ligand.sdf`
    pub pdbbind_entries_path: PathBuf,
    /// Downloaded `<id>.xml.gz` cross-reference files
    pub sifts_path: PathBuf,
    /// Downloaded `<id>.dssp.gz` files
    pub dssp_path: PathBuf,
    /// Folder for intermediate TSV tables
    pub tsv_path: PathBuf,
    /// Working folder of the mutation-energy tool
    pub foldx_pdb_dir: PathBuf,
    /// Similarity search results per structure
    pub ligands_path: PathBuf,
    /// Docking working folder
    pub vina_docking_dir: PathBuf,
    /// Output folder of the featurization stage
    pub features_path: PathBuf,
    /// Amino-acid property table (CSV, one property per row)
    pub aa_props_path: PathBuf,
    /// Structures with a resolution at or above this value are dropped
    pub resolution_cutoff: f64,
    /// Seed written next to every docking config
    pub docking_seed: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pdbbind_data_path_1: PathBuf::from("index/INDEX_general_PL.2018"),
            pdbbind_data_path_2: PathBuf::from("index/INDEX_general_PL_name.2018"),
            variants_catalogue_path: PathBuf::from("index/humsavar.txt"),
            pdbbind_entries_path: PathBuf::from("entries"),
            sifts_path: PathBuf::from("sifts"),
            dssp_path: PathBuf::from("dssp"),
            tsv_path: PathBuf::from("tsv"),
            foldx_pdb_dir: PathBuf::from("foldx"),
            ligands_path: PathBuf::from("ligands"),
            vina_docking_dir: PathBuf::from("vina-docking"),
            features_path: PathBuf::from("features"),
            aa_props_path: PathBuf::from("config/AAprops.csv"),
            resolution_cutoff: 2.51,
            docking_seed: String::from("1264647227"),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file. Keys that are absent keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Path of a table inside the TSV folder.
    pub fn tsv(&self, file_name: &str) -> PathBuf {
        self.tsv_path.join(file_name)
    }

    /// `<entries>/<id>/<id>_<suffix>`
    pub fn entry_file(&self, structure_id: &str, suffix: &str) -> PathBuf {
        self.pdbbind_entries_path
            .join(structure_id)
            .join(format!("{structure_id}_{suffix}"))
    }

    /// Compressed cross-reference file of a structure.
    pub fn sifts_file(&self, structure_id: &str) -> PathBuf {
        self.sifts_path.join(format!("{structure_id}.xml.gz"))
    }

    /// Compressed DSSP file of a structure.
    pub fn dssp_file(&self, structure_id: &str) -> PathBuf {
        self.dssp_path.join(format!("{structure_id}.dssp.gz"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            tsv_path = "/data/tsv"
            resolution_cutoff = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(config.tsv_path, PathBuf::from("/data/tsv"));
        assert_eq!(config.resolution_cutoff, 2.0);
        assert_eq!(config.docking_seed, "1264647227");
        assert_eq!(config.sifts_path, PathBuf::from("sifts"));
        assert_eq!(
            config.variants_catalogue_path,
            PathBuf::from("index/humsavar.txt")
        );
    }

    #[test]
    fn entry_paths() {
        let config = PipelineConfig {
            pdbbind_entries_path: PathBuf::from("/entries"),
            sifts_path: PathBuf::from("/sifts"),
            ..Default::default()
        };
        assert_eq!(
            config.entry_file("1owh", "pocket.pdb"),
            PathBuf::from("/entries/1owh/1owh_pocket.pdb")
        );
        assert_eq!(config.sifts_file("1owh"), PathBuf::from("/sifts/1owh.xml.gz"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = PipelineConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = PipelineConfig::from_toml("resolution_cutoff = \"high\"").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
