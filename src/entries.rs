//! Per-structure inputs: amino acids of the full protein and of the binding pocket,
//! plus the residue cross-references of the structure.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::residues::AminoAcid;
use crate::sifts::{read_cross_references, ResidueCrossReference};
use crate::structure::StructuralToolkit;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Which amino acids of an entry a variant is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingScope {
    Pocket,
    Protein,
}

/// Inputs available for one structure. Each part is optional.
#[derive(Debug, Clone, Default)]
pub struct StructureEntry {
    pub structure_id: String,
    pub protein: Option<Vec<AminoAcid>>,
    pub pocket: Option<Vec<AminoAcid>>,
    pub cross_references: Option<Vec<ResidueCrossReference>>,
}

impl StructureEntry {
    /// Read `<id>_protein.pdb`, `<id>_pocket.pdb` and the cross-reference file of a
    /// structure. Missing or unreadable parts are left empty.
    pub fn load(
        config: &PipelineConfig,
        toolkit: &dyn StructuralToolkit,
        structure_id: &str,
    ) -> Self {
        let amino_acids = |suffix: &str| {
            let path = config.entry_file(structure_id, suffix);
            optional(&path, || {
                toolkit
                    .load(&path)
                    .map(|pdb| toolkit.amino_acids(&pdb))
            })
        };
        let protein = amino_acids("protein.pdb");
        let pocket = amino_acids("pocket.pdb");

        let sifts = config.sifts_file(structure_id);
        let cross_references = optional(&sifts, || read_cross_references(&sifts));

        Self {
            structure_id: structure_id.to_string(),
            protein,
            pocket,
            cross_references,
        }
    }

    /// Amino acids of the requested scope, if that structure file was available.
    pub fn amino_acids(&self, scope: MappingScope) -> Option<&[AminoAcid]> {
        match scope {
            MappingScope::Pocket => self.pocket.as_deref(),
            MappingScope::Protein => self.protein.as_deref(),
        }
    }
}

fn optional<T>(path: &Path, read: impl FnOnce() -> Result<T>) -> Option<T> {
    if !path.exists() {
        debug!("Not found: {}", path.display());
        return None;
    }
    match read() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}

/// Load the entries of several structures in parallel, keyed by structure id.
pub fn load_index(
    config: &PipelineConfig,
    toolkit: &dyn StructuralToolkit,
    structure_ids: &[String],
) -> HashMap<String, StructureEntry> {
    structure_ids
        .par_iter()
        .map(|id| (id.clone(), StructureEntry::load(config, toolkit, id)))
        .collect()
}
