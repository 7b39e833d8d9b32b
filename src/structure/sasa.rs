use crate::residues::ResidueExt;
use nalgebra as na;
use pdbtbx::*;
use rust_sasa::{calculate_sasa_internal, Atom as SASAAtom};

/// Van der Waals radius used when the element is unknown to the reader
const FALLBACK_RADIUS: f64 = 1.7;

/// Solvent accessible surface of one amino acid
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueAsa {
    pub chain: String,
    /// Sequence number followed by the insertion code
    pub residue_number: String,
    /// Three-letter residue name
    pub name: String,
    /// Absolute accessible area in Å²
    pub asa: f64,
    /// `asa` divided by the maximum area of the residue type
    pub relative: f64,
}

/// Maximum accessible area of a residue type in a Gly-X-Gly tripeptide
/// (Miller et al., 1987).
pub fn max_asa(name: &str) -> Option<f64> {
    let max = match name.trim().to_uppercase().as_str() {
        "ALA" => 113.0,
        "ARG" => 241.0,
        "ASN" => 158.0,
        "ASP" => 151.0,
        "CYS" => 140.0,
        "GLN" => 189.0,
        "GLU" => 183.0,
        "GLY" => 85.0,
        "HIS" => 194.0,
        "ILE" => 182.0,
        "LEU" => 180.0,
        "LYS" => 211.0,
        "MET" => 204.0,
        "PHE" => 218.0,
        "PRO" => 143.0,
        "SER" => 122.0,
        "THR" => 146.0,
        "TRP" => 259.0,
        "TYR" => 229.0,
        "VAL" => 160.0,
        _ => return None,
    };
    Some(max)
}

/// Calculate absolute and relative SASA for each amino acid of the first model.
///
/// Hydrogens are ignored. Per-atom areas come from the Shrake-Rupley implementation
/// of [`rust_sasa`] and are summed per residue.
pub fn residue_asa(pdb: &PDB, probe_radius: f32, n_points: usize) -> Vec<ResidueAsa> {
    let mut atoms: Vec<SASAAtom> = Vec::new();
    let mut owners: Vec<usize> = Vec::new();
    let mut results: Vec<ResidueAsa> = Vec::new();

    for chain in pdb.chains() {
        for residue in chain.residues() {
            if residue.resn().is_none() {
                continue;
            }
            let owner = results.len();
            results.push(ResidueAsa {
                chain: chain.id().to_string(),
                residue_number: residue.residue_number(),
                name: residue.name().unwrap_or("").to_string(),
                asa: 0.0,
                relative: 0.0,
            });

            residue
                .atoms()
                .filter(|a| !matches!(a.element(), Some(Element::H)))
                .for_each(|a| {
                    let (x, y, z) = a.pos();
                    let radius = a
                        .element()
                        .and_then(|e| e.atomic_radius().van_der_waals)
                        .unwrap_or(FALLBACK_RADIUS);
                    atoms.push(SASAAtom {
                        position: na::Point3::new(x as f32, y as f32, z as f32),
                        radius: radius as f32,
                        id: atoms.len(),
                        parent_id: None,
                    });
                    owners.push(owner);
                });
        }
    }

    if atoms.is_empty() {
        return results;
    }

    let atom_sasa = calculate_sasa_internal(&atoms, Some(probe_radius), Some(n_points));
    for (owner, area) in owners.iter().zip(atom_sasa) {
        results[*owner].asa += area as f64;
    }
    for res in results.iter_mut() {
        res.relative = match max_asa(&res.name) {
            Some(max) => res.asa / max,
            None => 0.0,
        };
    }

    results
}
