//! Paired mutant and wild-type feature rows for mapped pocket variants.
//!
//! Each accepted variant yields two consecutive rows sharing the mapped columns:
//! first the mutant reconstruction, then the repaired wild type.

mod aaprops;
mod groups;

pub use aaprops::{neighbours, AaProperty, AaPropertyTable, NEIGHBOUR_CUTOFF, PROPERTY_COLUMNS};
pub use groups::PropertyGroup;

use crate::config::PipelineConfig;
use crate::energy::{
    averaged_report_path, mutant_name, wild_type_name, AveragedReport, ENERGY_TERMS,
    ENERGY_TERM_NAMES,
};
use crate::mapper::{MappedVariant, MAPPER_HEADER};
use crate::report::{BatchReport, Outcome};
use crate::residues::AminoAcid;
use crate::structure::{read_dssp, state_at, ResidueAsa, ResidueState, StructuralToolkit};
use crate::utils::{fmt_real, fmt_round4, round4};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Denominator used when the wild-type residue has no accessible surface
const ASA_FLOOR: f64 = 0.0001;

/// Columns between the mapped variant and the group changes
const LEADING_COLUMNS: [&str; 7] = [
    "FoldXname",
    "FoldXmutation",
    "secStruct",
    "secStructSimple",
    "CysteineMutation",
    "GlycineMutation",
    "ProlineMutation",
];

/// Columns between the group changes and the property block
const TRAILING_COLUMNS: [&str; 3] = ["AsaChange", "mutationPhi", "mutationPsi"];

/// Position of `AsaChange` in a feature row
const ASA_CHANGE_INDEX: usize =
    MAPPER_HEADER.len() + LEADING_COLUMNS.len() + PropertyGroup::ALL.len();

/// Which reconstruction a feature row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionKind {
    WildType,
    /// 1-based occurrence of the variant within its structure
    Mutant(usize),
}

impl ReconstructionKind {
    pub fn name(&self, structure_id: &str) -> String {
        match self {
            ReconstructionKind::WildType => wild_type_name(structure_id),
            ReconstructionKind::Mutant(n) => mutant_name(structure_id, *n),
        }
    }
}

/// `<docking>/<pdb>/proteins/<name>/<name>_final.pdb`
pub fn reconstruction_path(docking_dir: &Path, structure_id: &str, name: &str) -> PathBuf {
    docking_dir
        .join(structure_id)
        .join("proteins")
        .join(name)
        .join(format!("{name}_final.pdb"))
}

/// Annotations of one reconstructed structure
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub name: String,
    pub amino_acids: Vec<AminoAcid>,
    pub asa: Vec<ResidueAsa>,
    pub states: Vec<ResidueState>,
    torsions: Vec<(String, (f64, f64))>,
}

impl Reconstruction {
    /// Load a reconstruction and compute what the feature rows need at the given
    /// residue numbers. `None` when the file is absent or unreadable.
    pub fn load(
        toolkit: &dyn StructuralToolkit,
        path: &Path,
        name: &str,
        residue_numbers: &[&str],
    ) -> Option<Self> {
        if !path.exists() {
            debug!("No reconstruction {}", path.display());
            return None;
        }
        let pdb = match toolkit.load(path) {
            Ok(pdb) => pdb,
            Err(e) => {
                warn!("{e}");
                return None;
            }
        };
        Some(Self {
            name: name.to_string(),
            amino_acids: toolkit.amino_acids(&pdb),
            asa: toolkit.residue_asa(&pdb),
            states: toolkit.secondary_structure(&pdb),
            torsions: residue_numbers
                .iter()
                .map(|n| (n.to_string(), toolkit.phi_psi(&pdb, n)))
                .collect(),
        })
    }

    /// Relative accessibility of a residue, 0.0 when it is absent.
    pub fn relative_asa(&self, residue_number: &str) -> f64 {
        self.asa
            .iter()
            .find(|a| a.residue_number == residue_number)
            .map_or(0.0, |a| a.relative)
    }

    pub fn phi_psi(&self, residue_number: &str) -> Option<(f64, f64)> {
        self.torsions
            .iter()
            .find(|(n, _)| n == residue_number)
            .map(|(_, t)| *t)
    }
}

/// Inputs shared by every variant of one structure
#[derive(Debug, Default)]
pub struct StructureInputs {
    pub wild_type: Option<Reconstruction>,
    pub dssp: Option<Vec<ResidueState>>,
    pub energy: Option<AveragedReport>,
}

/// Feature rows of one structure
#[derive(Debug, Clone)]
pub struct StructureFeatures {
    pub structure_id: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn yes_no(value: bool) -> String {
    String::from(if value { "YES" } else { "NO" })
}

/// Header of a feature table.
pub fn feature_header(properties: &AaPropertyTable, energy_header: Option<Vec<String>>) -> Vec<String> {
    let energy = energy_header.unwrap_or_else(|| {
        ENERGY_TERM_NAMES
            .iter()
            .map(|n| n.replace(' ', "_"))
            .collect()
    });
    MAPPER_HEADER
        .iter()
        .chain(LEADING_COLUMNS.iter())
        .copied()
        .chain(PropertyGroup::ALL.iter().map(PropertyGroup::column))
        .chain(TRAILING_COLUMNS.iter().copied())
        .map(str::to_string)
        .chain(properties.header())
        .chain(energy)
        .collect()
}

/// One feature row.
///
/// `mutant` is the reconstruction carrying the substitution; it is only used for
/// [`ReconstructionKind::Mutant`] rows.
pub fn feature_row(
    kind: ReconstructionKind,
    variant: &MappedVariant,
    inputs: &StructureInputs,
    mutant: Option<&Reconstruction>,
    properties: &AaPropertyTable,
) -> Vec<String> {
    let pdb = &variant.variant.pdb;
    let source = variant.source_aa.as_str();
    let target = match kind {
        ReconstructionKind::WildType => source,
        ReconstructionKind::Mutant(_) => variant.target_aa.as_str(),
    };
    let residue_number = variant.pdb_res_num.as_str();
    let structure = match kind {
        ReconstructionKind::WildType => inputs.wild_type.as_ref(),
        ReconstructionKind::Mutant(_) => mutant,
    };

    let mut row = variant.to_row();
    row.push(kind.name(pdb));
    row.push(variant.mutation());

    // Secondary structure at the structure residue number
    let state = residue_number.parse::<isize>().ok().and_then(|seq_num| {
        structure
            .and_then(|s| state_at(&s.states, seq_num))
            .or_else(|| inputs.dssp.as_deref().and_then(|d| state_at(d, seq_num)))
    });
    row.push(state.map(|s| s.name().to_string()).unwrap_or_default());
    row.push(state.map(|s| s.class().name().to_string()).unwrap_or_default());

    for code in ["C", "G", "P"] {
        row.push(yes_no(source == code || target == code));
    }
    for group in PropertyGroup::ALL {
        row.push(group.change(source, target));
    }

    // Accessibility change and torsions need the repaired wild type
    match (kind, inputs.wild_type.as_ref(), structure) {
        (ReconstructionKind::WildType, Some(wild_type), _) => {
            row.push(fmt_real(1.0));
            push_torsions(&mut row, wild_type, residue_number);
        }
        (ReconstructionKind::Mutant(_), Some(wild_type), Some(mutated)) => {
            let mut asa_wt = round4(wild_type.relative_asa(residue_number));
            if asa_wt == 0.0 {
                asa_wt = ASA_FLOOR;
            }
            let asa_mut = round4(mutated.relative_asa(residue_number));
            row.push(fmt_round4(asa_mut / asa_wt));
            push_torsions(&mut row, mutated, residue_number);
        }
        _ => row.extend(vec![String::new(); 3]),
    }

    let wild_type_code = source.chars().next().unwrap_or(' ');
    let property_values = structure.and_then(|s| {
        properties.residue_and_surrounding(&s.amino_acids, residue_number, wild_type_code)
    });
    match property_values {
        Some(values) => row.extend(values.into_iter().map(fmt_round4)),
        None => row.extend(vec![String::new(); properties.len() * 2]),
    }

    match kind {
        ReconstructionKind::WildType => {
            row.extend(vec![fmt_real(0.0); ENERGY_TERMS])
        }
        ReconstructionKind::Mutant(_) => {
            let name = kind.name(pdb);
            match inputs.energy.as_ref().and_then(|e| e.terms(&name)) {
                Some(terms) => row.extend(terms),
                None => row.extend(vec![String::new(); ENERGY_TERMS]),
            }
        }
    }

    row
}

fn push_torsions(row: &mut Vec<String>, structure: &Reconstruction, residue_number: &str) {
    match structure.phi_psi(residue_number) {
        Some((phi, psi)) => {
            row.push(fmt_round4(phi));
            row.push(fmt_round4(psi));
        }
        None => row.extend(vec![String::new(); 2]),
    }
}

/// Build the feature rows of every variant of one structure, in input order.
pub fn structure_features(
    config: &PipelineConfig,
    toolkit: &dyn StructuralToolkit,
    properties: &AaPropertyTable,
    structure_id: &str,
    variants: &[&MappedVariant],
) -> StructureFeatures {
    let docking_dir = &config.vina_docking_dir;
    let residue_numbers = variants
        .iter()
        .map(|v| v.pdb_res_num.as_str())
        .collect::<Vec<&str>>();

    let wild_type_name = ReconstructionKind::WildType.name(structure_id);
    let dssp_file = config.dssp_file(structure_id);
    let averaged = averaged_report_path(&config.foldx_pdb_dir, structure_id);
    let inputs = StructureInputs {
        wild_type: Reconstruction::load(
            toolkit,
            &reconstruction_path(docking_dir, structure_id, &wild_type_name),
            &wild_type_name,
            &residue_numbers,
        ),
        dssp: dssp_file
            .exists()
            .then(|| read_dssp(&dssp_file))
            .and_then(|r| r.map_err(|e| warn!("{e}")).ok()),
        energy: averaged
            .exists()
            .then(|| AveragedReport::read(&averaged))
            .and_then(|r| r.map_err(|e| warn!("{e}")).ok()),
    };

    let mut rows = Vec::with_capacity(variants.len() * 2);
    for (i, variant) in variants.iter().enumerate() {
        let kind = ReconstructionKind::Mutant(i + 1);
        let name = kind.name(structure_id);
        let mutant = Reconstruction::load(
            toolkit,
            &reconstruction_path(docking_dir, structure_id, &name),
            &name,
            &[variant.pdb_res_num.as_str()],
        );
        rows.push(feature_row(kind, variant, &inputs, mutant.as_ref(), properties));
        rows.push(feature_row(
            ReconstructionKind::WildType,
            variant,
            &inputs,
            None,
            properties,
        ));
    }

    StructureFeatures {
        structure_id: structure_id.to_string(),
        header: feature_header(properties, inputs.energy.as_ref().and_then(|e| e.header())),
        rows,
    }
}

/// Feature rows for every structure of the mapped variants, optionally restricted
/// to one structure. Structures are processed in parallel and returned in
/// first-encounter order.
pub fn build_features(
    config: &PipelineConfig,
    toolkit: &dyn StructuralToolkit,
    properties: &AaPropertyTable,
    variants: &[MappedVariant],
    only: Option<&str>,
) -> (Vec<StructureFeatures>, BatchReport) {
    let mut groups: Vec<(&str, Vec<&MappedVariant>)> = Vec::new();
    for variant in variants {
        let id = variant.variant.pdb.as_str();
        if only.is_some_and(|o| o != id) {
            continue;
        }
        match groups.iter_mut().find(|(g, _)| *g == id) {
            Some((_, members)) => members.push(variant),
            None => groups.push((id, vec![variant])),
        }
    }

    let features = groups
        .par_iter()
        .map(|(id, members)| structure_features(config, toolkit, properties, id, members))
        .collect::<Vec<StructureFeatures>>();

    let mut report = BatchReport::new("featurize");
    for f in &features {
        let complete = f
            .rows
            .iter()
            .all(|row| row.get(ASA_CHANGE_INDEX).is_some_and(|v| !v.is_empty()));
        let outcome = if complete {
            Outcome::Success
        } else {
            Outcome::Skipped("missing reconstructions, some fields left empty".to_string())
        };
        report.record(&f.structure_id, outcome);
    }

    (features, report)
}

/// `<features>/<pdb>/pdbbind_pocket_variants_features_<pdb>.tsv`
pub fn features_file(features_dir: &Path, structure_id: &str) -> PathBuf {
    features_dir
        .join(structure_id)
        .join(format!("pdbbind_pocket_variants_features_{structure_id}.tsv"))
}

#[cfg(test)]
mod tests {
    use super::aaprops::tests::props_csv;
    use super::*;
    use crate::energy::tests::averaged_text;
    use crate::mapper::tests::variant;
    use crate::structure::tests::TRIPEPTIDE_PDB;
    use crate::structure::PdbToolkit;

    fn mapped() -> MappedVariant {
        MappedVariant {
            variant: variant("1abc", "p.Gly92Asp"),
            source_aa: "G".to_string(),
            target_aa: "D".to_string(),
            residue_num: "92".to_string(),
            chain: "A".to_string(),
            pdb_res_name: "G".to_string(),
            pdb_res_num: "2".to_string(),
            aa_pdb_name: "G".to_string(),
            aa_residue_number: "2".to_string(),
            uniprot_res_name: "G".to_string(),
            ..Default::default()
        }
    }

    fn config(root: &Path) -> PipelineConfig {
        PipelineConfig {
            dssp_path: root.join("dssp"),
            foldx_pdb_dir: root.join("foldx"),
            vina_docking_dir: root.join("vina"),
            features_path: root.join("features"),
            ..Default::default()
        }
    }

    fn place_reconstruction(config: &PipelineConfig, name: &str) {
        let path = reconstruction_path(&config.vina_docking_dir, "1abc", name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, TRIPEPTIDE_PDB).unwrap();
    }

    fn properties() -> AaPropertyTable {
        AaPropertyTable::parse(&props_csv(), "AAprops.csv").unwrap()
    }

    #[test]
    fn header_layout() {
        let header = feature_header(&properties(), None);
        assert_eq!(header.len(), 21 + 17 + 4 + ENERGY_TERMS);
        assert_eq!(header[21], "FoldXname");
        assert_eq!(header[28], "ChargeGroupChange");
        assert_eq!(header[ASA_CHANGE_INDEX], "AsaChange");
        assert_eq!(header[38], "Index");
        assert_eq!(header[41], "UnitSurrounding");
        assert_eq!(header[42], "total_energy");
    }

    #[test]
    fn rows_degrade_without_reconstructions() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let variants = [mapped()];
        let (features, report) =
            build_features(&config, &PdbToolkit::default(), &properties(), &variants, None);

        let f = &features[0];
        assert_eq!(f.rows.len(), 2);
        let width = f.header.len();
        assert!(f.rows.iter().all(|r| r.len() == width));

        let mutant = &f.rows[0];
        assert_eq!(mutant[21], "1abc_protein_Repair_1");
        assert_eq!(mutant[22], "GA2D;");
        assert_eq!(mutant[23], "");
        assert_eq!(&mutant[25..28], &["NO", "YES", "NO"]);
        assert_eq!(mutant[28], "group2-group3");
        assert_eq!(&mutant[35..38], &["", "", ""]);
        assert!(mutant[38..].iter().all(String::is_empty));

        let wild_type = &f.rows[1];
        assert_eq!(wild_type[21], "1abc_protein_Repair_WT");
        assert!(wild_type[28..35].iter().all(|g| {
            let (a, b) = g.split_once('-').unwrap();
            a == b
        }));
        assert!(wild_type[42..].iter().all(|v| v == "0.0"));
        assert_eq!(report.counts(), (0, 1, 0));
    }

    #[test]
    fn rows_with_reconstructions_and_energy() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        place_reconstruction(&config, "1abc_protein_Repair_WT");
        place_reconstruction(&config, "1abc_protein_Repair_1");
        let averaged = averaged_report_path(&config.foldx_pdb_dir, "1abc");
        std::fs::create_dir_all(averaged.parent().unwrap()).unwrap();
        std::fs::write(&averaged, averaged_text()).unwrap();

        let variants = [mapped()];
        let (features, report) = build_features(
            &config,
            &PdbToolkit::default(),
            &properties(),
            &variants,
            Some("1abc"),
        );
        assert_eq!(report.counts(), (1, 0, 0));
        let f = &features[0];
        let (mutant, wild_type) = (&f.rows[0], &f.rows[1]);

        // identical structures: unchanged accessibility
        assert_eq!(mutant[35], "1.0");
        assert_eq!(wild_type[35], "1.0");
        let phi = mutant[36].parse::<f64>().unwrap();
        assert!((phi + 60.0).abs() < 1.0, "{phi}");
        assert_eq!(mutant[36], wild_type[36]);

        // residue 2 is a glycine in the reconstruction; wild type is G
        assert_eq!(&mutant[38..40], &["0.0", "0.0"]);
        // G(6) + G(6) + A(1) - G(6) within 8 Å
        assert_eq!(mutant[40], "7.0");

        assert_eq!(mutant[42], "1.0");
        assert_eq!(f.header[42], "total_energy");
        assert_eq!(wild_type[42], "0.0");
    }

    #[test]
    fn zero_wild_type_accessibility_uses_floor() {
        let wild_type = Reconstruction {
            name: "wt".to_string(),
            amino_acids: Vec::new(),
            asa: vec![ResidueAsa {
                chain: "A".to_string(),
                residue_number: "2".to_string(),
                name: "GLY".to_string(),
                asa: 0.0,
                relative: 0.0,
            }],
            states: Vec::new(),
            torsions: vec![("2".to_string(), (-60.0, -45.0))],
        };
        let mut mutated = wild_type.clone();
        mutated.asa[0].relative = 0.0002;

        let inputs = StructureInputs {
            wild_type: Some(wild_type),
            ..Default::default()
        };
        let row = feature_row(
            ReconstructionKind::Mutant(1),
            &mapped(),
            &inputs,
            Some(&mutated),
            &AaPropertyTable::default(),
        );
        // 0.0002 / 0.0001
        assert_eq!(row[35], "2.0");
        assert_eq!(row[36], "-60.0");
        assert_eq!(row[37], "-45.0");
    }
}
