use crate::residues::ResidueExt;
use nalgebra as na;
use pdbtbx::*;

/// Reported when a backbone torsion cannot be measured
pub const UNDEFINED_TORSION: f64 = 360.0;

/// Longest C-N distance (Å) still treated as a peptide bond
const PEPTIDE_BOND_CUTOFF: f64 = 2.5;

/// Signed dihedral angle in degrees between the planes (p1, p2, p3) and (p2, p3, p4).
pub fn dihedral(
    p1: &na::Vector3<f64>,
    p2: &na::Vector3<f64>,
    p3: &na::Vector3<f64>,
    p4: &na::Vector3<f64>,
) -> f64 {
    let b1 = p2 - p1;
    let b2 = p3 - p2;
    let b3 = p4 - p3;

    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);

    let x = n1.dot(&n2);
    let y = b2.norm() * b1.dot(&n2);
    y.atan2(x).to_degrees()
}

/// Whether the carbonyl C of `prev` is bonded to the amide N of `next`.
pub fn is_connected(prev: &Residue, next: &Residue) -> bool {
    match (prev.atom_pos("C"), next.atom_pos("N")) {
        (Some(c), Some(n)) => (c - n).norm() < PEPTIDE_BOND_CUTOFF,
        _ => false,
    }
}

/// Phi of `res` given the preceding residue: C(i-1), N, CA, C.
pub fn phi(prev: &Residue, res: &Residue) -> Option<f64> {
    if !is_connected(prev, res) {
        return None;
    }
    Some(dihedral(
        &prev.atom_pos("C")?,
        &res.atom_pos("N")?,
        &res.atom_pos("CA")?,
        &res.atom_pos("C")?,
    ))
}

/// Psi of `res` given the following residue: N, CA, C, N(i+1).
pub fn psi(res: &Residue, next: &Residue) -> Option<f64> {
    if !is_connected(res, next) {
        return None;
    }
    Some(dihedral(
        &res.atom_pos("N")?,
        &res.atom_pos("CA")?,
        &res.atom_pos("C")?,
        &next.atom_pos("N")?,
    ))
}

/// Phi and psi of the residue whose number (sequence number and insertion code)
/// equals `residue_number`.
///
/// Residues are taken in chain order over all chains. Torsions that cannot be
/// measured, at chain termini or across breaks, are [`UNDEFINED_TORSION`].
pub fn phi_psi(pdb: &PDB, residue_number: &str) -> (f64, f64) {
    let residues = pdb
        .chains()
        .flat_map(|chain| chain.residues())
        .collect::<Vec<&Residue>>();

    let Some(idx) = residues
        .iter()
        .position(|r| r.residue_number() == residue_number)
    else {
        return (UNDEFINED_TORSION, UNDEFINED_TORSION);
    };

    let phi_angle = match idx.checked_sub(1) {
        Some(prev) => phi(residues[prev], residues[idx]),
        None => None,
    };
    let psi_angle = residues
        .get(idx + 1)
        .and_then(|next| psi(residues[idx], next));

    (
        phi_angle.unwrap_or(UNDEFINED_TORSION),
        psi_angle.unwrap_or(UNDEFINED_TORSION),
    )
}
