use super::log_report;
use clap::Parser;
use pocketsnp::catalog::StructureCatalog;
use pocketsnp::config::PipelineConfig;
use pocketsnp::ligands::prepare_ligand_folders;
use tracing::{error, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Gather the ligands of every grouped structure")]
pub(crate) struct Args {}

pub(crate) fn run(args: &Args, config: &PipelineConfig) {
    trace!("{args:?}");

    let catalog = match StructureCatalog::ligand_pipeline(config) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    log_report(prepare_ligand_folders(
        &catalog,
        &config.foldx_pdb_dir,
        &config.pdbbind_entries_path,
        &config.ligands_path,
    ));
}
