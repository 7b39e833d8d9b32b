use super::init_thread_pool;
use clap::Parser;
use pocketsnp::config::PipelineConfig;
use pocketsnp::pocket::{pocket_features, pocket_file, POCKET_HEADER};
use pocketsnp::structure::PdbToolkit;
use pocketsnp::utils::{header_of, write_rows};
use tracing::{error, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Secondary structure and exposure summary of every binding pocket")]
pub(crate) struct Args {
    /// Only summarize this structure
    #[arg(short, long)]
    pdb: Option<String>,

    /// Number of threads to use for parallel processing
    #[arg(short = 'j', long = "num-threads", default_value_t = 1)]
    num_threads: usize,
}

pub(crate) fn run(args: &Args, config: &PipelineConfig) {
    trace!("{args:?}");
    init_thread_pool(args.num_threads);

    let (summaries, report) =
        match pocket_features(config, &PdbToolkit::default(), args.pdb.as_deref()) {
            Ok(result) => result,
            Err(e) => {
                error!("{e}");
                return;
            }
        };
    report.log_summary();

    let header = header_of(&POCKET_HEADER);
    for summary in &summaries {
        let output = pocket_file(&config.features_path, &summary.structure_id);
        match write_rows(&output, &header, &[summary.to_row()]) {
            Ok(()) => info!("Pocket features saved to {}", output.display()),
            Err(e) => error!("{e}"),
        }
    }
}
