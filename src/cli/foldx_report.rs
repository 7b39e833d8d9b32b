use clap::Parser;
use pocketsnp::config::PipelineConfig;
use pocketsnp::energy::{log_status, mutation_energy_report, LOG_STATUS_HEADER, MUTATION_REPORT_HEADER};
use pocketsnp::utils::{header_of, write_rows};
use tracing::{error, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Collect the status and energies of the mutation-energy tool")]
pub(crate) struct Args {}

pub(crate) fn run(args: &Args, config: &PipelineConfig) {
    trace!("{args:?}");

    match log_status(&config.foldx_pdb_dir) {
        Ok(status) => {
            let rows = status.iter().map(|s| s.to_row()).collect::<Vec<Vec<String>>>();
            let output = config.tsv("foldx_results.tsv");
            match write_rows(&output, &header_of(&LOG_STATUS_HEADER), &rows) {
                Ok(()) => info!("Tool status saved to {}", output.display()),
                Err(e) => error!("{e}"),
            }
        }
        Err(e) => error!("{e}"),
    }

    match mutation_energy_report(&config.foldx_pdb_dir) {
        Ok((rows, report)) => {
            report.log_summary();
            let output = config.tsv("foldx_mutation_results.tsv");
            match write_rows(&output, &header_of(&MUTATION_REPORT_HEADER), &rows) {
                Ok(()) => info!("Mutation energies saved to {}", output.display()),
                Err(e) => error!("{e}"),
            }
        }
        Err(e) => error!("{e}"),
    }
}
