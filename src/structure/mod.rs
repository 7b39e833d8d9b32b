//! Structural toolkit: loading protein models and deriving per-residue
//! torsions, secondary structure and solvent accessibility.
//!
//! The pipeline stages only talk to the [`StructuralToolkit`] trait so that the
//! underlying implementation can be swapped for precomputed annotations.

mod sasa;
mod secondary;
mod torsion;

pub use sasa::{max_asa, residue_asa, ResidueAsa};
pub use secondary::{
    assign, parse_dssp, read_dssp, state_at, ResidueState, SecondaryState, SsClass,
};
pub use torsion::{dihedral, phi_psi, UNDEFINED_TORSION};

use crate::error::Result;
use crate::residues::{AminoAcid, ResidueExt};
use crate::utils::load_model;
use pdbtbx::PDB;
use std::path::Path;

/// Per-structure operations needed by the variant mapper and the pocket featurizer.
pub trait StructuralToolkit: Sync {
    /// Read the first model of a structure file, keeping amino acids only.
    fn load(&self, path: &Path) -> Result<PDB>;

    /// Amino acids of all chains in file order.
    fn amino_acids(&self, pdb: &PDB) -> Vec<AminoAcid>;

    /// Phi and psi in degrees of the residue with the given number.
    fn phi_psi(&self, pdb: &PDB, residue_number: &str) -> (f64, f64);

    /// Secondary structure state of every residue.
    fn secondary_structure(&self, pdb: &PDB) -> Vec<ResidueState>;

    /// Absolute and relative accessible surface of every amino acid.
    fn residue_asa(&self, pdb: &PDB) -> Vec<ResidueAsa>;
}

/// [`StructuralToolkit`] backed by `pdbtbx` and `rust-sasa`.
#[derive(Debug, Clone)]
pub struct PdbToolkit {
    /// Solvent probe radius in Å
    pub probe_radius: f32,
    /// Number of points on each atom sphere
    pub n_points: usize,
}

impl Default for PdbToolkit {
    fn default() -> Self {
        Self {
            probe_radius: 1.4,
            n_points: 960,
        }
    }
}

impl StructuralToolkit for PdbToolkit {
    fn load(&self, path: &Path) -> Result<PDB> {
        load_model(path)
    }

    fn amino_acids(&self, pdb: &PDB) -> Vec<AminoAcid> {
        pdb.chains()
            .flat_map(|chain| {
                chain.residues().map(move |res| {
                    let (seq_num, insertion) = res.id();
                    AminoAcid {
                        chain: chain.id().to_string(),
                        seq_num,
                        insertion: insertion.unwrap_or("").to_string(),
                        name: res.name().unwrap_or("").to_string(),
                        ca: res.atom_pos("CA"),
                    }
                })
            })
            .collect()
    }

    fn phi_psi(&self, pdb: &PDB, residue_number: &str) -> (f64, f64) {
        phi_psi(pdb, residue_number)
    }

    fn secondary_structure(&self, pdb: &PDB) -> Vec<ResidueState> {
        assign(pdb)
    }

    fn residue_asa(&self, pdb: &PDB) -> Vec<ResidueAsa> {
        residue_asa(pdb, self.probe_radius, self.n_points)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Gly-Gly-Ala with ideal helical torsions (phi -60, psi -45)
    pub(crate) const TRIPEPTIDE_PDB: &str = include_str!("../../tests/data/tripeptide.pdb");

    /// Sixteen alanines in an ideal alpha helix (phi -57, psi -47)
    pub(crate) const HELIX_PDB: &str = include_str!("../../tests/data/helix.pdb");

    fn load_text(text: &str) -> PDB {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.pdb");
        std::fs::write(&path, text).unwrap();
        load_model(&path).unwrap()
    }

    pub(crate) fn tripeptide() -> PDB {
        load_text(TRIPEPTIDE_PDB)
    }

    pub(crate) fn helix() -> PDB {
        load_text(HELIX_PDB)
    }

    #[test]
    fn amino_acids_in_file_order() {
        let toolkit = PdbToolkit::default();
        let aas = toolkit.amino_acids(&tripeptide());

        let names: Vec<&str> = aas.iter().map(|aa| aa.name.as_str()).collect();
        assert_eq!(names, vec!["GLY", "GLY", "ALA"]);
        assert_eq!(aas[2].residue_number(), "3");
        assert_eq!(aas[0].chain, "A");
        let ca = aas[0].ca.unwrap();
        assert!((ca.x - 1.458).abs() < 1e-6);
    }

    #[test]
    fn helix_torsions_are_recovered() {
        let toolkit = PdbToolkit::default();
        let pdb = helix();
        let (phi, psi) = toolkit.phi_psi(&pdb, "8");
        assert!((phi + 57.0).abs() < 1.0, "phi = {phi}");
        assert!((psi + 47.0).abs() < 1.0, "psi = {psi}");
    }

    #[test]
    fn helix_states_and_areas() {
        let toolkit = PdbToolkit {
            n_points: 200,
            ..Default::default()
        };
        let pdb = helix();

        let states = toolkit.secondary_structure(&pdb);
        assert_eq!(states.len(), 16);
        assert_eq!(state_at(&states, 8).map(|s| s.class()), Some(SsClass::Helix));

        let asa = toolkit.residue_asa(&pdb);
        assert_eq!(asa.len(), 16);
        assert!(asa.iter().all(|r| r.relative > 0.0));
    }
}
