//! Secondary structure composition and solvent exposure of binding pockets.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::report::BatchReport;
use crate::residues::AminoAcid;
use crate::structure::{read_dssp, state_at, ResidueAsa, ResidueState, SsClass, StructuralToolkit};
use crate::utils::{file_name, fmt_round4, sub_dirs};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Relative accessibility below which a residue is buried
pub const BURIED_THRESHOLD: f64 = 0.2;

/// Columns of the pocket feature table
pub const POCKET_HEADER: [&str; 9] = [
    "pdb",
    "HelixSS",
    "StrandSS",
    "OtherSS",
    "DominantSS",
    "BuriedASA",
    "ExposedASA",
    "RatioASA",
    "PocketASA",
];

/// Pocket statistics of one structure
#[derive(Debug, Clone, PartialEq)]
pub struct PocketSummary {
    pub structure_id: String,
    pub helix: f64,
    pub strand: f64,
    pub other: f64,
    pub dominant: SsClass,
    pub buried: f64,
    pub exposed: f64,
    /// Buried over exposed residue count
    pub ratio: f64,
    /// Summed absolute accessible area of the pocket residues in Å²
    pub pocket_asa: f64,
}

impl PocketSummary {
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.structure_id.clone(),
            fmt_round4(self.helix),
            fmt_round4(self.strand),
            fmt_round4(self.other),
            self.dominant.name().to_string(),
            fmt_round4(self.buried),
            fmt_round4(self.exposed),
            fmt_round4(self.ratio),
            fmt_round4(self.pocket_asa),
        ]
    }
}

/// Class with the largest fraction; ties go to Helix, then Strand.
pub fn dominant_class(helix: f64, strand: f64, other: f64) -> SsClass {
    if helix >= strand && helix >= other {
        SsClass::Helix
    } else if strand >= other {
        SsClass::Strand
    } else {
        SsClass::Other
    }
}

/// Summarize a pocket from the states and accessibility of its protein.
///
/// Pocket residues are matched to states by sequence number and to accessibility
/// entries by residue number. Zero denominators give non-finite values.
pub fn summarize(
    structure_id: &str,
    pocket: &[AminoAcid],
    states: &[ResidueState],
    asa: &[ResidueAsa],
) -> PocketSummary {
    let (mut helix, mut strand, mut other) = (0usize, 0usize, 0usize);
    for aa in pocket {
        match state_at(states, aa.seq_num).map(|s| s.class()) {
            Some(SsClass::Helix) => helix += 1,
            Some(SsClass::Strand) => strand += 1,
            Some(SsClass::Other) => other += 1,
            None => {}
        }
    }
    let assigned = (helix + strand + other) as f64;
    let (helix, strand, other) = (
        helix as f64 / assigned,
        strand as f64 / assigned,
        other as f64 / assigned,
    );

    let pocket_numbers = pocket
        .iter()
        .map(AminoAcid::residue_number)
        .collect::<Vec<String>>();
    let (mut buried, mut exposed, mut pocket_asa) = (0usize, 0usize, 0.0);
    for entry in asa.iter().filter(|a| pocket_numbers.contains(&a.residue_number)) {
        pocket_asa += entry.asa;
        if entry.relative < BURIED_THRESHOLD {
            buried += 1;
        } else {
            exposed += 1;
        }
    }
    let total = (buried + exposed) as f64;

    PocketSummary {
        structure_id: structure_id.to_string(),
        helix,
        strand,
        other,
        dominant: dominant_class(helix, strand, other),
        buried: buried as f64 / total,
        exposed: exposed as f64 / total,
        ratio: buried as f64 / exposed as f64,
        pocket_asa,
    }
}

/// Summary of the pocket of one structure entry.
///
/// States come from the precomputed DSSP file of the structure when present,
/// otherwise they are assigned on the protein.
pub fn pocket_summary(
    config: &PipelineConfig,
    toolkit: &dyn StructuralToolkit,
    structure_id: &str,
) -> Result<PocketSummary> {
    let protein = toolkit.load(&config.entry_file(structure_id, "protein.pdb"))?;
    let pocket_file = config.entry_file(structure_id, "pocket.pdb");
    if !pocket_file.exists() {
        return Err(PipelineError::MissingInput(pocket_file));
    }
    let pocket = toolkit.amino_acids(&toolkit.load(&pocket_file)?);

    let dssp_file = config.dssp_file(structure_id);
    let states = match dssp_file.exists().then(|| read_dssp(&dssp_file)) {
        Some(Ok(states)) => states,
        Some(Err(e)) => {
            warn!("{e}");
            toolkit.secondary_structure(&protein)
        }
        None => toolkit.secondary_structure(&protein),
    };
    let asa = toolkit.residue_asa(&protein);
    debug!("Pocket of {structure_id}: {} residues", pocket.len());

    Ok(summarize(structure_id, &pocket, &states, &asa))
}

/// Pocket summaries of every structure folder of the energy tool, optionally
/// restricted to one structure.
pub fn pocket_features(
    config: &PipelineConfig,
    toolkit: &dyn StructuralToolkit,
    only: Option<&str>,
) -> Result<(Vec<PocketSummary>, BatchReport)> {
    let ids = sub_dirs(&config.foldx_pdb_dir)?
        .iter()
        .map(|p| file_name(p))
        .filter(|id| only.map_or(true, |o| o == id.as_str()))
        .collect::<Vec<String>>();

    let results = ids
        .par_iter()
        .map(|id| (id, pocket_summary(config, toolkit, id)))
        .collect::<Vec<_>>();

    let mut report = BatchReport::new("pocket features");
    let mut summaries = Vec::with_capacity(results.len());
    for (id, result) in results {
        match result {
            Ok(summary) => {
                report.success(id);
                summaries.push(summary);
            }
            Err(PipelineError::MissingInput(path)) => {
                report.skip(id, format!("missing {}", path.display()))
            }
            Err(e) => report.fail(id, e.to_string()),
        }
    }
    Ok((summaries, report))
}

/// `<features>/<pdb>/pdbbind_pocket_features_<pdb>.tsv`
pub fn pocket_file(features_dir: &Path, structure_id: &str) -> PathBuf {
    features_dir
        .join(structure_id)
        .join(format!("pdbbind_pocket_features_{structure_id}.tsv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::tests::entries_config;
    use crate::structure::{PdbToolkit, SecondaryState};

    fn aa(seq_num: isize) -> AminoAcid {
        AminoAcid {
            chain: "A".to_string(),
            seq_num,
            insertion: String::new(),
            name: "ALA".to_string(),
            ca: None,
        }
    }

    fn state(seq_num: isize, state: SecondaryState) -> ResidueState {
        ResidueState {
            chain: "A".to_string(),
            seq_num,
            insertion: String::new(),
            state,
        }
    }

    fn asa(residue_number: &str, asa: f64, relative: f64) -> ResidueAsa {
        ResidueAsa {
            chain: "A".to_string(),
            residue_number: residue_number.to_string(),
            name: "ALA".to_string(),
            asa,
            relative,
        }
    }

    #[test]
    fn dominant_ties_prefer_helix_then_strand() {
        assert_eq!(dominant_class(0.5, 0.25, 0.25), SsClass::Helix);
        assert_eq!(dominant_class(0.4, 0.4, 0.2), SsClass::Helix);
        assert_eq!(dominant_class(0.5, 0.0, 0.5), SsClass::Helix);
        assert_eq!(dominant_class(0.2, 0.4, 0.4), SsClass::Strand);
        assert_eq!(dominant_class(0.2, 0.3, 0.5), SsClass::Other);
        assert_eq!(dominant_class(f64::NAN, f64::NAN, f64::NAN), SsClass::Other);
    }

    #[test]
    fn pocket_statistics() {
        let pocket = [aa(10), aa(11), aa(12), aa(13)];
        let states = [
            state(9, SecondaryState::Extended),
            state(10, SecondaryState::AlphaHelix),
            state(11, SecondaryState::Helix310),
            state(12, SecondaryState::Extended),
            state(13, SecondaryState::Turn),
        ];
        let areas = [
            asa("10", 5.0, 0.05),
            asa("11", 50.0, 0.4),
            asa("12", 10.0, 0.1),
            asa("13", 100.0, 0.6),
            asa("14", 999.0, 0.9),
        ];
        let summary = summarize("1abc", &pocket, &states, &areas);
        assert_eq!(
            summary.to_row(),
            vec!["1abc", "0.5", "0.25", "0.25", "Helix", "0.5", "0.5", "1.0", "165.0"]
        );
    }

    #[test]
    fn zero_denominators_render_empty() {
        let summary = summarize("1abc", &[aa(10)], &[], &[asa("10", 5.0, 0.05)]);
        let row = summary.to_row();
        assert_eq!(&row[1..5], &["", "", "", "Other"]);
        assert_eq!(row[5], "1.0");
        assert_eq!(row[7], "");
    }

    #[test]
    fn structures_from_energy_folders() {
        let dir = tempfile::tempdir().unwrap();
        let config = entries_config(dir.path());
        std::fs::create_dir_all(config.foldx_pdb_dir.join("1abc")).unwrap();
        std::fs::create_dir_all(config.foldx_pdb_dir.join("9zzz")).unwrap();

        let (summaries, report) =
            pocket_features(&config, &PdbToolkit::default(), None).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].structure_id, "1abc");
        assert!(summaries[0].pocket_asa > 0.0);
        assert_eq!(report.counts(), (1, 1, 0));

        let (only, _) = pocket_features(&config, &PdbToolkit::default(), Some("9zzz")).unwrap();
        assert!(only.is_empty());
    }
}
