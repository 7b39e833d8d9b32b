//! Preparation and reports of the external mutation-energy tool.
//!
//! Layout of a structure folder:
//!
//! ```text
//! <energy>/<pdb>/<pdb>_protein.pdb
//! <energy>/<pdb>/input/individual_list.txt
//! <energy>/<pdb>/input/log.txt
//! <energy>/<pdb>/output/log.txt
//! <energy>/<pdb>/output/Average_<pdb>_protein_Repair.fxout
//! ```

use crate::error::Result;
use crate::mapper::MappedVariant;
use crate::report::BatchReport;
use crate::utils::{file_name, fmt_round4, open_text, sub_dirs};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Number of energy terms copied from an averaged report
pub const ENERGY_TERMS: usize = 22;

/// Header of the mutation energy table
pub const MUTATION_REPORT_HEADER: [&str; 4] = ["PDB", "Mutation", "Energy", "SD"];

/// Header of the log status table
pub const LOG_STATUS_HEADER: [&str; 3] = ["pdb", "repair", "build_model"];

/// Energy terms of the averaged report in column order, used when no report header
/// is available
pub const ENERGY_TERM_NAMES: [&str; ENERGY_TERMS] = [
    "total energy",
    "Backbone Hbond",
    "Sidechain Hbond",
    "Van der Waals",
    "Electrostatics",
    "Solvation Polar",
    "Solvation Hydrophobic",
    "Van der Waals clashes",
    "entropy sidechain",
    "entropy mainchain",
    "sloop_entropy",
    "mloop_entropy",
    "cis_bond",
    "torsional clash",
    "backbone clash",
    "helix dipole",
    "water bridge",
    "disulfide",
    "electrostatic kon",
    "partial covalent bonds",
    "energy Ionisation",
    "Entropy Complex",
];

const REPAIR_DONE: &str = "Cleaning RepairPDB...DONE";
const BUILD_MODEL_DONE: &str = "Cleaning BuildModel...DONE";

/// Mutations of one structure in the order they were mapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationList {
    pub structure_id: String,
    pub mutations: Vec<String>,
}

/// Group mapped variants by structure in first-encounter order.
pub fn mutation_lists(rows: &[MappedVariant]) -> Vec<MutationList> {
    let mut lists: Vec<MutationList> = Vec::new();
    for row in rows {
        let mutation = row.mutation();
        match lists
            .iter_mut()
            .find(|l| l.structure_id == row.variant.pdb)
        {
            Some(list) => list.mutations.push(mutation),
            None => lists.push(MutationList {
                structure_id: row.variant.pdb.clone(),
                mutations: vec![mutation],
            }),
        }
    }
    lists
}

/// Create the working folder of every structure that has an entry folder, copy its
/// protein and write `input/individual_list.txt`.
pub fn prepare_energy_folders(
    lists: &[MutationList],
    entries_dir: &Path,
    energy_dir: &Path,
) -> Result<BatchReport> {
    let mut report = BatchReport::new("energy preparation");

    for list in lists {
        let id = &list.structure_id;
        if !entries_dir.join(id).is_dir() {
            report.skip(id, "no entry folder");
            continue;
        }
        let folder = energy_dir.join(id);
        std::fs::create_dir_all(folder.join("input"))?;
        std::fs::create_dir_all(folder.join("output"))?;

        let protein = format!("{id}_protein.pdb");
        let source = entries_dir.join(id).join(&protein);
        let target = folder.join(&protein);
        if !target.exists() {
            if source.exists() {
                std::fs::copy(&source, &target)?;
            } else {
                warn!("{} not copied", source.display());
            }
        }

        let mut content = list.mutations.join("\n");
        content.push('\n');
        std::fs::write(folder.join("input").join("individual_list.txt"), content)?;
        debug!("{id} mutation list is ready ({} mutations)", list.mutations.len());
        report.success(id);
    }

    Ok(report)
}

/// Completion of both tool steps for one structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStatus {
    pub structure_id: String,
    pub repair: bool,
    pub build_model: bool,
}

impl LogStatus {
    pub fn to_row(&self) -> Vec<String> {
        let status = |done: bool| String::from(if done { "success" } else { "failure" });
        vec![
            self.structure_id.clone(),
            status(self.repair),
            status(self.build_model),
        ]
    }
}

fn log_has_line(path: &Path, expected: &str) -> bool {
    match open_text(path) {
        Ok(reader) => reader.lines().map_while(|l| l.ok()).any(|l| l == expected),
        Err(_) => false,
    }
}

/// Status of the repair and build-model steps of every structure folder.
pub fn log_status(energy_dir: &Path) -> Result<Vec<LogStatus>> {
    Ok(sub_dirs(energy_dir)?
        .iter()
        .map(|folder| LogStatus {
            structure_id: file_name(folder),
            repair: log_has_line(&folder.join("input").join("log.txt"), REPAIR_DONE),
            build_model: log_has_line(&folder.join("output").join("log.txt"), BUILD_MODEL_DONE),
        })
        .collect())
}

/// Name of a reconstruction produced for the `n`-th mutation of a structure.
pub fn mutant_name(structure_id: &str, n: usize) -> String {
    format!("{structure_id}_protein_Repair_{n}")
}

/// Name of the repaired wild-type reconstruction of a structure.
pub fn wild_type_name(structure_id: &str) -> String {
    format!("{structure_id}_protein_Repair_WT")
}

/// `<energy>/<pdb>/output/Average_<pdb>_protein_Repair.fxout`
pub fn averaged_report_path(energy_dir: &Path, structure_id: &str) -> PathBuf {
    energy_dir
        .join(structure_id)
        .join("output")
        .join(format!("Average_{structure_id}_protein_Repair.fxout"))
}

/// Tab-separated averaged report of the build-model step.
#[derive(Debug, Clone, Default)]
pub struct AveragedReport {
    lines: Vec<Vec<String>>,
}

impl AveragedReport {
    pub fn read(path: &Path) -> Result<Self> {
        let lines = open_text(path)?
            .lines()
            .map_while(|l| l.ok())
            .map(|l| l.split('\t').map(str::to_string).collect())
            .collect();
        Ok(Self { lines })
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .map(|l| l.split('\t').map(str::to_string).collect())
                .collect(),
        }
    }

    fn row(&self, first: &str) -> Option<&Vec<String>> {
        self.lines.iter().find(|fields| {
            fields.first().is_some_and(|f| {
                let f = f.trim();
                f == first || f.strip_suffix(".pdb") == Some(first)
            })
        })
    }

    /// Names of the energy terms, spaces replaced by `_`.
    pub fn header(&self) -> Option<Vec<String>> {
        let fields = self.row("Pdb")?;
        let terms = fields.get(2..2 + ENERGY_TERMS)?;
        Some(terms.iter().map(|t| t.trim().replace(' ', "_")).collect())
    }

    /// Rounded energy terms of a reconstruction.
    pub fn terms(&self, reconstruction: &str) -> Option<Vec<String>> {
        let fields = self.row(reconstruction)?;
        let terms = fields.get(2..2 + ENERGY_TERMS)?;
        Some(
            terms
                .iter()
                .map(|t| {
                    t.trim()
                        .parse::<f64>()
                        .map(fmt_round4)
                        .unwrap_or_default()
                })
                .collect(),
        )
    }

    /// `(total energy, standard deviation)` of a reconstruction as written.
    pub fn energy(&self, reconstruction: &str) -> Option<(String, String)> {
        let fields = self.row(reconstruction)?;
        Some((
            fields.get(2)?.trim().to_string(),
            fields.get(1)?.trim().to_string(),
        ))
    }
}

/// Energy change of every listed mutation, matching line `N` of the mutation list
/// with the averaged report row of reconstruction `N`.
pub fn mutation_energy_report(energy_dir: &Path) -> Result<(Vec<Vec<String>>, BatchReport)> {
    let mut report = BatchReport::new("energy report");
    let mut rows = Vec::new();

    for folder in sub_dirs(energy_dir)? {
        let id = file_name(&folder);
        let list = folder.join("input").join("individual_list.txt");
        let averaged = averaged_report_path(energy_dir, &id);
        if !list.exists() || !averaged.exists() {
            report.skip(&id, "no mutation list or averaged report");
            continue;
        }
        let averaged = match AveragedReport::read(&averaged) {
            Ok(averaged) => averaged,
            Err(e) => {
                report.fail(&id, e.to_string());
                continue;
            }
        };
        let mutations = std::fs::read_to_string(&list)?;
        for (i, mutation) in mutations.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            let (energy, sd) = averaged
                .energy(&mutant_name(&id, i + 1))
                .unwrap_or_default();
            rows.push(vec![id.clone(), mutation.trim().to_string(), energy, sd]);
        }
        report.success(&id);
    }

    Ok((rows, report))
}
