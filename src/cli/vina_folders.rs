use super::log_report;
use clap::Parser;
use pocketsnp::config::PipelineConfig;
use pocketsnp::docking::{prepare_docking_folders, prepare_ligand_slots, prepare_search_configs};
use pocketsnp::structure::PdbToolkit;
use tracing::trace;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Lay out docking folders, ligands, search boxes and seeds")]
pub(crate) struct Args {
    /// Use the split ligands as they are instead of their minimized versions
    #[arg(long = "unminimized")]
    unminimized: bool,

    /// Overwrite existing config and seed files
    #[arg(long)]
    replace: bool,
}

pub(crate) fn run(args: &Args, config: &PipelineConfig) {
    trace!("{args:?}");

    log_report(prepare_docking_folders(
        &config.foldx_pdb_dir,
        &config.vina_docking_dir,
    ));
    log_report(prepare_ligand_slots(
        &config.vina_docking_dir,
        &config.ligands_path,
        !args.unminimized,
    ));
    log_report(prepare_search_configs(
        config,
        &PdbToolkit::default(),
        args.replace,
    ));
}
