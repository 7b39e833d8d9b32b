use clap::Parser;
use pocketsnp::config::PipelineConfig;
use pocketsnp::docking::{docking_report, write_docking_report};
use std::path::PathBuf;
use tracing::{debug, error, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Collect binding affinities from the docking logs")]
pub(crate) struct Args {
    /// Output directory, `<tsv>/docking-results` if not given
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(args: &Args, config: &PipelineConfig) {
    trace!("{args:?}");

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.tsv("docking-results"));
    let (results, tables) = match docking_report(&config.vina_docking_dir) {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    debug!("{} dockings over {} structures", results.len(), tables.len());

    if let Err(e) = write_docking_report(&output, &results, &tables) {
        error!("{e}");
    }
}
