//! Secondary structure of protein residues.
//!
//! States are either assigned from backbone coordinates with the Kabsch-Sander
//! hydrogen-bond criterion or read from a precomputed DSSP file.

use crate::error::Result;
use crate::parsers::dssp_residue;
use crate::residues::ResidueExt;
use crate::structure::torsion::is_connected;
use crate::utils::open_text;
use nalgebra as na;
use pdbtbx::*;
use rayon::prelude::*;
use rstar::{primitives::GeomWithData, RTree};
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

/// Kabsch-Sander electrostatic energy constant (kcal/mol · Å)
const KS_FACTOR: f64 = 27.888;

/// H-bond energy threshold (kcal/mol). Bonds with E < this are accepted.
const HBOND_THRESHOLD: f64 = -0.5;

/// Only residue pairs with alpha carbons closer than this are scored
const CA_CUTOFF: f64 = 9.0;

/// Minimum CA(i-2)-CA(i)-CA(i+2) direction change for a bend, in degrees
const BEND_ANGLE: f64 = 70.0;

/// DSSP-style residue states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryState {
    AlphaHelix,
    Extended,
    Bridge,
    Helix310,
    PiHelix,
    Polyproline,
    Turn,
    Bend,
    Coil,
}

/// Three-state reduction of [`SecondaryState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SsClass {
    Helix,
    Strand,
    Other,
}

impl SsClass {
    pub fn name(&self) -> &'static str {
        match self {
            SsClass::Helix => "Helix",
            SsClass::Strand => "Strand",
            SsClass::Other => "Other",
        }
    }
}

impl SecondaryState {
    /// Human readable name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            SecondaryState::AlphaHelix => "alpha Helix",
            SecondaryState::Extended => "Extended",
            SecondaryState::Bridge => "Bridge",
            SecondaryState::Helix310 => "3-10 Helix",
            SecondaryState::PiHelix => "pi Helix",
            SecondaryState::Polyproline => "Polyproline",
            SecondaryState::Turn => "Turn",
            SecondaryState::Bend => "Bend",
            SecondaryState::Coil => "Coil",
        }
    }

    /// One-letter DSSP code; coil is a blank.
    pub fn code(&self) -> char {
        match self {
            SecondaryState::AlphaHelix => 'H',
            SecondaryState::Extended => 'E',
            SecondaryState::Bridge => 'B',
            SecondaryState::Helix310 => 'G',
            SecondaryState::PiHelix => 'I',
            SecondaryState::Polyproline => 'P',
            SecondaryState::Turn => 'T',
            SecondaryState::Bend => 'S',
            SecondaryState::Coil => ' ',
        }
    }

    /// Parse a one-letter DSSP code. Unknown codes are coil.
    pub fn from_code(code: char) -> Self {
        match code {
            'H' => SecondaryState::AlphaHelix,
            'E' => SecondaryState::Extended,
            'B' => SecondaryState::Bridge,
            'G' => SecondaryState::Helix310,
            'I' => SecondaryState::PiHelix,
            'P' => SecondaryState::Polyproline,
            'T' => SecondaryState::Turn,
            'S' => SecondaryState::Bend,
            _ => SecondaryState::Coil,
        }
    }

    pub fn class(&self) -> SsClass {
        match self {
            SecondaryState::AlphaHelix | SecondaryState::Helix310 | SecondaryState::PiHelix => {
                SsClass::Helix
            }
            SecondaryState::Extended | SecondaryState::Bridge => SsClass::Strand,
            _ => SsClass::Other,
        }
    }
}

/// Secondary structure state of one residue
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueState {
    pub chain: String,
    pub seq_num: isize,
    pub insertion: String,
    pub state: SecondaryState,
}

/// State of the last residue with the given sequence number, if any.
///
/// Residues are matched on the sequence number alone, like the pocket and
/// variant annotations that consume these states.
pub fn state_at(states: &[ResidueState], seq_num: isize) -> Option<SecondaryState> {
    states
        .iter()
        .rev()
        .find(|s| s.seq_num == seq_num)
        .map(|s| s.state)
}

/// Assign secondary structure from backbone coordinates.
///
/// Residues lacking any of N, CA, C or O take part only as coil.
pub fn assign(pdb: &PDB) -> Vec<ResidueState> {
    let residues = pdb
        .chains()
        .flat_map(|chain| chain.residues().map(move |res| (chain.id(), res)))
        .collect::<Vec<(&str, &Residue)>>();
    let n = residues.len();
    if n == 0 {
        return Vec::new();
    }

    // Consecutive, peptide-bonded residues of one chain share a segment
    let mut segments = vec![0usize; n];
    for i in 1..n {
        let (prev_chain, prev) = residues[i - 1];
        let (chain, res) = residues[i];
        let linked = prev_chain == chain && is_connected(prev, res);
        segments[i] = segments[i - 1] + usize::from(!linked);
    }

    let backbone = residues
        .iter()
        .map(|(_, res)| res.backbone())
        .collect::<Vec<Option<[na::Vector3<f64>; 4]>>>();
    let ca = backbone
        .iter()
        .map(|bb| bb.map(|[_, ca, _, _]| ca))
        .collect::<Vec<Option<na::Vector3<f64>>>>();

    // Amide hydrogens placed opposite the preceding carbonyl
    let hydrogens = (0..n)
        .map(|i| {
            if i == 0 || segments[i] != segments[i - 1] || residues[i].1.name() == Some("PRO") {
                return None;
            }
            match (backbone[i - 1], backbone[i]) {
                (Some([_, _, c_prev, o_prev]), Some([n_pos, _, _, _])) => {
                    Some(n_pos + (c_prev - o_prev).normalize())
                }
                _ => None,
            }
        })
        .collect::<Vec<Option<na::Vector3<f64>>>>();

    let tree: RTree<GeomWithData<[f64; 3], usize>> = RTree::bulk_load(
        ca.iter()
            .enumerate()
            .filter_map(|(i, pos)| pos.map(|p| GeomWithData::new([p.x, p.y, p.z], i)))
            .collect(),
    );

    let hbonds = (0..n)
        .into_par_iter()
        .flat_map_iter(|donor| {
            let mut found = Vec::new();
            if let (Some(h), Some([n_pos, ca_pos, _, _])) = (hydrogens[donor], backbone[donor]) {
                for candidate in
                    tree.locate_within_distance([ca_pos.x, ca_pos.y, ca_pos.z], CA_CUTOFF.powi(2))
                {
                    let acceptor = candidate.data;
                    if donor.abs_diff(acceptor) < 2 {
                        continue;
                    }
                    if let Some([_, _, c, o]) = backbone[acceptor] {
                        if hbond_energy(&n_pos, &h, &c, &o) < HBOND_THRESHOLD {
                            found.push((donor, acceptor));
                        }
                    }
                }
            }
            found
        })
        .collect::<HashSet<(usize, usize)>>();

    assign_from_hbonds(&segments, &hbonds, &ca)
        .into_iter()
        .zip(residues)
        .map(|(state, (chain, res))| {
            let (seq_num, insertion) = res.id();
            ResidueState {
                chain: chain.to_string(),
                seq_num,
                insertion: insertion.unwrap_or("").to_string(),
                state,
            }
        })
        .collect()
}

/// Electrostatic energy of the bond N-H (donor) to O=C (acceptor).
fn hbond_energy(
    n: &na::Vector3<f64>,
    h: &na::Vector3<f64>,
    c: &na::Vector3<f64>,
    o: &na::Vector3<f64>,
) -> f64 {
    let r_on = (o - n).norm();
    let r_ch = (c - h).norm();
    let r_oh = (o - h).norm();
    let r_cn = (c - n).norm();
    if r_on < 0.5 || r_ch < 0.5 || r_oh < 0.5 || r_cn < 0.5 {
        return 0.0;
    }
    KS_FACTOR * (1.0 / r_on + 1.0 / r_ch - 1.0 / r_oh - 1.0 / r_cn)
}

/// Pattern recognition over accepted hydrogen bonds, stored as `(donor, acceptor)`.
///
/// Priority follows DSSP: alpha helix, then bridges, then 3-10 and pi helices,
/// then turns and bends.
fn assign_from_hbonds(
    segments: &[usize],
    hbonds: &HashSet<(usize, usize)>,
    ca: &[Option<na::Vector3<f64>>],
) -> Vec<SecondaryState> {
    let n = segments.len();
    // CO of `acceptor` bonded to NH of `donor`
    let hb = |acceptor: usize, donor: usize| hbonds.contains(&(donor, acceptor));
    let linked = |a: usize, b: usize| a < n && b < n && segments[a] == segments[b];
    let turn = |k: usize, i: usize| linked(i, i + k) && hb(i, i + k);

    let mut states = vec![SecondaryState::Coil; n];

    for i in 1..n {
        if turn(4, i - 1) && turn(4, i) {
            for state in states.iter_mut().skip(i).take(4) {
                *state = SecondaryState::AlphaHelix;
            }
        }
    }

    let mut bridged = vec![false; n];
    for i in 1..n.saturating_sub(1) {
        for j in (i + 3)..n.saturating_sub(1) {
            if !linked(i - 1, i + 1) || !linked(j - 1, j + 1) {
                continue;
            }
            let parallel = (hb(i - 1, j) && hb(j, i + 1)) || (hb(j - 1, i) && hb(i, j + 1));
            let antiparallel =
                (hb(i, j) && hb(j, i)) || (hb(i - 1, j + 1) && hb(j - 1, i + 1));
            if parallel || antiparallel {
                bridged[i] = true;
                bridged[j] = true;
            }
        }
    }
    for i in 0..n {
        if !bridged[i] || states[i] != SecondaryState::Coil {
            continue;
        }
        let ladder = (i > 0 && bridged[i - 1] && linked(i - 1, i))
            || (i + 1 < n && bridged[i + 1] && linked(i, i + 1));
        states[i] = if ladder {
            SecondaryState::Extended
        } else {
            SecondaryState::Bridge
        };
    }

    for (k, helix) in [(3, SecondaryState::Helix310), (5, SecondaryState::PiHelix)] {
        for i in 1..n {
            let free = (i..i + k).all(|r| r < n && states[r] == SecondaryState::Coil);
            if turn(k, i - 1) && turn(k, i) && free {
                for state in states.iter_mut().skip(i).take(k) {
                    *state = helix;
                }
            }
        }
    }

    for k in [3, 4, 5] {
        for i in 0..n {
            if !turn(k, i) {
                continue;
            }
            for state in states.iter_mut().skip(i + 1).take(k - 1) {
                if *state == SecondaryState::Coil {
                    *state = SecondaryState::Turn;
                }
            }
        }
    }

    for i in 2..n.saturating_sub(2) {
        if states[i] != SecondaryState::Coil || !linked(i - 2, i + 2) {
            continue;
        }
        if let (Some(a), Some(b), Some(c)) = (ca[i - 2], ca[i], ca[i + 2]) {
            if (b - a).angle(&(c - b)).to_degrees() > BEND_ANGLE {
                states[i] = SecondaryState::Bend;
            }
        }
    }

    states
}

/// Read states from a DSSP file, plain or gzip-compressed.
pub fn read_dssp(path: &Path) -> Result<Vec<ResidueState>> {
    parse_dssp(open_text(path)?)
}

/// Parse the residue table of a DSSP file. Chain break markers are skipped.
pub fn parse_dssp(reader: impl BufRead) -> Result<Vec<ResidueState>> {
    let mut states = Vec::new();
    let mut in_table = false;
    for line in reader.lines() {
        let line = line?;
        if !in_table {
            in_table = line.starts_with("  #  RESIDUE");
            continue;
        }
        if let Some((chain, seq_num, insertion, code)) = dssp_residue(&line) {
            states.push(ResidueState {
                chain,
                seq_num,
                insertion,
                state: SecondaryState::from_code(code),
            });
        }
    }
    Ok(states)
}
