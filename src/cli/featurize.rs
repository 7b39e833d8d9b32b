use super::init_thread_pool;
use clap::Parser;
use pocketsnp::config::PipelineConfig;
use pocketsnp::features::{build_features, features_file, AaPropertyTable};
use pocketsnp::mapper::read_mapped;
use pocketsnp::structure::PdbToolkit;
use pocketsnp::utils::write_rows;
use tracing::{debug, error, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Paired wild-type and mutant feature rows of every pocket variant")]
pub(crate) struct Args {
    /// Only featurize this structure
    #[arg(short, long)]
    pdb: Option<String>,

    /// Number of threads to use for parallel processing
    #[arg(short = 'j', long = "num-threads", default_value_t = 1)]
    num_threads: usize,
}

pub(crate) fn run(args: &Args, config: &PipelineConfig) {
    trace!("{args:?}");
    init_thread_pool(args.num_threads);

    let (properties, variants) = match (
        AaPropertyTable::read(&config.aa_props_path),
        read_mapped(&config.tsv("pdbbind_pocket_variants.tsv")),
    ) {
        (Ok(properties), Ok(variants)) => (properties, variants),
        (Err(e), _) | (_, Err(e)) => {
            error!("{e}");
            return;
        }
    };
    debug!(
        "{} properties, {} pocket variants",
        properties.len(),
        variants.len()
    );

    let (features, report) = build_features(
        config,
        &PdbToolkit::default(),
        &properties,
        &variants,
        args.pdb.as_deref(),
    );
    report.log_summary();

    for structure in &features {
        let output = features_file(&config.features_path, &structure.structure_id);
        match write_rows(&output, &structure.header, &structure.rows) {
            Ok(()) => info!("Features saved to {}", output.display()),
            Err(e) => error!("{e}"),
        }
    }
}
