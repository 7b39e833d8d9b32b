//! Folder layout, search boxes and reports of the docking tool.
//!
//! ```text
//! <docking>/<pdb>/proteins/<variant>/<variant>_final.pdb
//! <docking>/<pdb>/proteins/<variant>/<variant>_config.txt
//! <docking>/<pdb>/proteins/<variant>/<variant>_seed.txt
//! <docking>/<pdb>/proteins/<variant>/vina/<ligand>/<ligand>_min_log.txt
//! <docking>/<pdb>/proteins/<variant>/vina/<ligand>/<ligand>_min_docking.pdbqt
//! <docking>/<pdb>/ligands/<ligand>_min.mol2
//! ```

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::parsers::docking_mode;
use crate::report::BatchReport;
use crate::residues::ResidueExt;
use crate::structure::StructuralToolkit;
use crate::utils::{dir_files, file_name, header_of, sub_dirs, write_rows};
use pdbtbx::PDB;
use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Columns of the long docking table
pub const DOCKING_HEADER: [&str; 4] = ["pdb", "variant", "ligand", "conformers"];

/// Placeholder of a missing affinity in the wide table
pub const NO_AFFINITY: &str = "-";

const SEARCH_SETTINGS: &str = "cpu = 12\nnum_modes = 3\nenergy_range = 2\nexhaustiveness = 12\n";

/// `<docking>/<pdb>/proteins/<variant>/`
pub fn variant_dir(docking_dir: &Path, structure_id: &str, variant: &str) -> PathBuf {
    docking_dir.join(structure_id).join("proteins").join(variant)
}

/// Copy every reconstruction of the energy tool into the docking layout.
pub fn prepare_docking_folders(energy_dir: &Path, docking_dir: &Path) -> Result<BatchReport> {
    let mut report = BatchReport::new("docking folders");
    for folder in sub_dirs(energy_dir)? {
        let structure_id = file_name(&folder);
        for output in sub_dirs(&folder.join("output"))? {
            let variant = file_name(&output);
            let name = format!("{variant}_final.pdb");
            let source = output.join(&name);
            let key = format!("{structure_id}/{variant}");
            if !source.exists() {
                report.skip(key, "no reconstruction");
                continue;
            }
            let target = variant_dir(docking_dir, &structure_id, &variant);
            std::fs::create_dir_all(&target)?;
            std::fs::copy(&source, target.join(&name))?;
            report.success(key);
        }
    }
    Ok(report)
}

/// Create a docking folder per ligand under every variant and copy the ligands into
/// `<docking>/<pdb>/ligands/`.
///
/// With `minimized` only split files named `*_min.mol2` are used; otherwise the
/// remaining `*.mol2` files are copied under their minimized name.
pub fn prepare_ligand_slots(
    docking_dir: &Path,
    ligands_dir: &Path,
    minimized: bool,
) -> Result<BatchReport> {
    let mut report = BatchReport::new("docking ligands");
    for folder in sub_dirs(docking_dir)? {
        let structure_id = file_name(&folder);
        let ligand_files = dir_files(&ligands_dir.join(&structure_id).join("splitted"))?;
        let target_dir = folder.join("ligands");
        std::fs::create_dir_all(&target_dir)?;

        let slots = ligand_files
            .iter()
            .filter_map(|path| {
                let name = file_name(path);
                if name.contains("_min") != minimized {
                    return None;
                }
                let suffix = if minimized { "_min.mol2".len() } else { ".mol2".len() };
                let slot = name.get(..name.len().checked_sub(suffix)?)?.to_string();
                let target = if minimized { name.clone() } else { format!("{slot}_min.mol2") };
                Some((path, slot, target))
            })
            .collect::<Vec<_>>();

        for variant in sub_dirs(&folder.join("proteins"))? {
            for (_, slot, _) in &slots {
                std::fs::create_dir_all(variant.join("vina").join(slot))?;
            }
        }
        for (source, slot, target) in &slots {
            std::fs::copy(source, target_dir.join(target))?;
            debug!("Ligand copied: {slot}");
        }
        if slots.is_empty() {
            report.skip(&structure_id, "no split ligands");
        } else {
            report.success(&structure_id);
        }
    }
    Ok(report)
}

/// Docking search box
#[derive(Debug, Clone, PartialEq)]
pub struct GridBox {
    /// Box center, rounded to 3 decimals
    pub center: [f64; 3],
    /// Edge lengths in whole Å, rounded up
    pub size: [i64; 3],
}

impl GridBox {
    /// Config file text of the docking tool.
    pub fn config_text(&self) -> String {
        let [cx, cy, cz] = self.center;
        let [sx, sy, sz] = self.size;
        format!(
            "center_x = {cx:?}\ncenter_y = {cy:?}\ncenter_z = {cz:?}\n\n\
             size_x = {sx}\nsize_y = {sy}\nsize_z = {sz}\n\n{SEARCH_SETTINGS}"
        )
    }
}

/// Bounding box of the atoms of the pocket residues in a reconstruction.
///
/// Each pocket residue number picks the first residue of the reconstruction with that
/// number. `None` when no atom matches.
pub fn grid_box(pocket_numbers: &[String], reconstruction: &PDB) -> Option<GridBox> {
    let residues = reconstruction
        .chains()
        .flat_map(|c| c.residues())
        .collect::<Vec<_>>();
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    let mut found = false;

    for number in pocket_numbers {
        let Some(residue) = residues.iter().find(|r| &r.residue_number() == number) else {
            continue;
        };
        for atom in residue.atoms() {
            let (x, y, z) = atom.pos();
            for (i, v) in [x, y, z].into_iter().enumerate() {
                min[i] = min[i].min(v);
                max[i] = max[i].max(v);
            }
            found = true;
        }
    }
    if !found {
        return None;
    }

    let center = [0usize, 1, 2].map(|i| (((max[i] + min[i]) / 2.0) * 1000.0).round() / 1000.0);
    let size = [0usize, 1, 2].map(|i| (max[i] - min[i]).ceil() as i64);
    Some(GridBox { center, size })
}

/// Write `text` unless the file exists and `replace` is off. Returns whether the file
/// was written.
fn write_unless_present(path: &Path, text: &str, replace: bool) -> Result<bool> {
    if path.exists() && !replace {
        return Ok(false);
    }
    std::fs::write(path, text)?;
    Ok(true)
}

/// Write `<variant>_config.txt` into a variant folder.
pub fn write_config(dir: &Path, variant: &str, grid: &GridBox, replace: bool) -> Result<bool> {
    write_unless_present(
        &dir.join(format!("{variant}_config.txt")),
        &grid.config_text(),
        replace,
    )
}

/// Write `<variant>_seed.txt` into a variant folder.
pub fn write_seed(dir: &Path, variant: &str, seed: &str, replace: bool) -> Result<bool> {
    write_unless_present(&dir.join(format!("{variant}_seed.txt")), seed, replace)
}

/// Config and seed files of every variant folder.
///
/// Pocket residues are those of `<entries>/<pdb>/<pdb>_pocket.pdb`.
pub fn prepare_search_configs(
    config: &PipelineConfig,
    toolkit: &dyn StructuralToolkit,
    replace: bool,
) -> Result<BatchReport> {
    let mut report = BatchReport::new("docking configs");
    for folder in sub_dirs(&config.vina_docking_dir)? {
        let structure_id = file_name(&folder);
        let pocket_numbers = match toolkit.load(&config.entry_file(&structure_id, "pocket.pdb")) {
            Ok(pocket) => toolkit
                .amino_acids(&pocket)
                .iter()
                .map(|aa| aa.residue_number())
                .collect::<Vec<String>>(),
            Err(e) => {
                warn!("{e}");
                report.skip(&structure_id, "no pocket");
                continue;
            }
        };

        for dir in sub_dirs(&folder.join("proteins"))? {
            let variant = file_name(&dir);
            let key = format!("{structure_id}/{variant}");
            let config_file = dir.join(format!("{variant}_config.txt"));
            if replace || !config_file.exists() {
                let grid = toolkit
                    .load(&dir.join(format!("{variant}_final.pdb")))
                    .ok()
                    .and_then(|pdb| grid_box(&pocket_numbers, &pdb));
                match grid {
                    Some(grid) => {
                        write_config(&dir, &variant, &grid, replace)?;
                    }
                    None => {
                        report.fail(key, "no pocket atoms in reconstruction");
                        continue;
                    }
                }
            }
            write_seed(&dir, &variant, &config.docking_seed, replace)?;
            report.success(key);
        }
    }
    Ok(report)
}

/// Result table of one docking log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DockingLog {
    /// `(mode, affinity)` in log order
    pub conformers: Vec<(u32, String)>,
}

impl DockingLog {
    /// Affinity of the best mode.
    pub fn affinity(&self) -> Option<&str> {
        self.conformers
            .iter()
            .find(|(mode, _)| *mode == 1)
            .map(|(_, a)| a.as_str())
    }

    /// `Conformer 1: -7.2;Conformer 2: -6.9`
    pub fn conformer_text(&self) -> String {
        self.conformers
            .iter()
            .map(|(mode, affinity)| format!("Conformer {mode}: {affinity}"))
            .collect::<Vec<String>>()
            .join(";")
    }
}

pub fn parse_docking_log(reader: impl BufRead) -> Result<DockingLog> {
    let mut conformers = Vec::new();
    for line in reader.lines() {
        if let Some(mode) = docking_mode(&line?) {
            conformers.push(mode);
        }
    }
    Ok(DockingLog { conformers })
}

/// Docking outcome of one ligand against one variant
#[derive(Debug, Clone, PartialEq)]
pub struct DockingResult {
    pub structure_id: String,
    pub variant: String,
    pub ligand: String,
    pub log: DockingLog,
}

/// Affinities of one structure, one row per variant
#[derive(Debug, Clone, PartialEq)]
pub struct AffinityTable {
    pub structure_id: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read the docking log of one ligand folder. `None` unless both the poses and the
/// log exist and the log holds at least one conformer.
fn read_ligand_log(ligand_dir: &Path) -> Result<Option<DockingLog>> {
    let ligand = file_name(ligand_dir);
    let poses = ligand_dir.join(format!("{ligand}_min_docking.pdbqt"));
    let log = ligand_dir.join(format!("{ligand}_min_log.txt"));
    if !poses.exists() || !log.exists() {
        return Ok(None);
    }
    let log = parse_docking_log(std::io::BufReader::new(std::fs::File::open(&log)?))?;
    Ok((!log.conformers.is_empty()).then_some(log))
}

/// Docking results of every structure under the docking folder.
///
/// Returns the long results and one wide table per structure. Wide table columns are
/// every ligand seen for the structure, sorted by name.
pub fn docking_report(docking_dir: &Path) -> Result<(Vec<DockingResult>, Vec<AffinityTable>)> {
    let mut results = Vec::new();
    let mut tables = Vec::new();

    for folder in sub_dirs(docking_dir)? {
        let structure_id = file_name(&folder);
        let mut per_variant = Vec::new();
        let mut ligands = BTreeSet::new();

        for dir in sub_dirs(&folder.join("proteins"))? {
            let variant = file_name(&dir);
            let mut logs = Vec::new();
            for ligand_dir in sub_dirs(&dir.join("vina"))? {
                let ligand = file_name(&ligand_dir);
                ligands.insert(ligand.clone());
                if let Some(log) = read_ligand_log(&ligand_dir)? {
                    logs.push((ligand, log));
                }
            }
            per_variant.push((variant, logs));
        }

        let header = std::iter::once("Variant".to_string())
            .chain(ligands.iter().cloned())
            .collect::<Vec<String>>();
        let mut rows = Vec::with_capacity(per_variant.len());
        for (variant, logs) in per_variant {
            let mut row = vec![variant.clone()];
            for ligand in &ligands {
                let affinity = logs
                    .iter()
                    .find(|(l, _)| l == ligand)
                    .and_then(|(_, log)| log.affinity());
                row.push(affinity.unwrap_or(NO_AFFINITY).to_string());
            }
            rows.push(row);
            results.extend(logs.into_iter().map(|(ligand, log)| DockingResult {
                structure_id: structure_id.clone(),
                variant: variant.clone(),
                ligand,
                log,
            }));
        }
        debug!("{structure_id}: {} variants, {} ligands", rows.len(), ligands.len());
        tables.push(AffinityTable {
            structure_id,
            header,
            rows,
        });
    }
    Ok((results, tables))
}

/// `<out>/<pdb>/bindingAffinity-official-<pdb>_df.tsv`
pub fn affinity_file(out_dir: &Path, structure_id: &str) -> PathBuf {
    out_dir
        .join(structure_id)
        .join(format!("bindingAffinity-official-{structure_id}_df.tsv"))
}

/// Write the long table to `<out>/docking-results-all.tsv` and every wide table.
pub fn write_docking_report(
    out_dir: &Path,
    results: &[DockingResult],
    tables: &[AffinityTable],
) -> Result<()> {
    let rows = results
        .iter()
        .map(|r| {
            vec![
                r.structure_id.clone(),
                r.variant.clone(),
                r.ligand.clone(),
                r.log.conformer_text(),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    let all = out_dir.join("docking-results-all.tsv");
    write_rows(&all, &header_of(&DOCKING_HEADER), &rows)?;
    info!("Docking results saved to {}", all.display());

    for table in tables {
        write_rows(&affinity_file(out_dir, &table.structure_id), &table.header, &table.rows)?;
    }
    Ok(())
}
