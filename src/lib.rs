//! # pocketsnp
//!
//! Curation of missense variants that fall inside the ligand-binding pockets of
//! protein-ligand structures, and featurization of their structural and energetic
//! effect.
//!
//! The stages mirror the command line: select a structure catalog, map variants
//! on pocket residues through residue-level cross-references, prepare and read the
//! external mutation-energy and docking tools, deduplicate similar ligands, and emit
//! paired wild-type/mutant feature rows and per-pocket summaries. Every table is
//! tab-separated text with a header row.

pub mod catalog;
pub mod config;
pub mod docking;
pub mod download;
pub mod energy;
pub mod entries;
pub mod error;
pub mod features;
pub mod ligands;
pub mod mapper;
pub mod parsers;
pub mod pocket;
pub mod report;
pub mod residues;
pub mod sifts;
pub mod structure;
pub mod utils;

pub use catalog::{StructureCatalog, StructureRecord};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use report::{BatchReport, Outcome};
pub use structure::{PdbToolkit, StructuralToolkit};
