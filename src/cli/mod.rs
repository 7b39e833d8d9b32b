pub(crate) mod dockings_results;
pub(crate) mod featurize;
pub(crate) mod foldx_report;
pub(crate) mod init;
pub(crate) mod ligand_folders;
pub(crate) mod pocket_features;
pub(crate) mod pocket_snps;
pub(crate) mod tanimoto;
pub(crate) mod vina_folders;

use pocketsnp::report::BatchReport;
use tracing::{debug, warn};

/// Create the global rayon pool. A pool that already exists is kept.
pub(crate) fn init_thread_pool(num_threads: usize) {
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        warn!("{e}");
    }
    debug!("Using {} thread(s)", rayon::current_num_threads());
}

/// Log the outcome of a stage, or the error that stopped it.
pub(crate) fn log_report(result: pocketsnp::error::Result<BatchReport>) {
    match result {
        Ok(report) => report.log_summary(),
        Err(e) => tracing::error!("{e}"),
    }
}
