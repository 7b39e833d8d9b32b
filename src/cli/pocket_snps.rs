use super::{init_thread_pool, log_report};
use clap::Parser;
use pocketsnp::catalog::StructureCatalog;
use pocketsnp::config::PipelineConfig;
use pocketsnp::energy::{mutation_lists, prepare_energy_folders};
use pocketsnp::entries::{load_index, MappingScope};
use pocketsnp::mapper::{map_pocket_residues, read_variants, write_mapped};
use pocketsnp::structure::PdbToolkit;
use tracing::{debug, error, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about = "Locate protein variants inside binding pockets and prepare the energy tool"
)]
pub(crate) struct Args {
    /// Map variants on the whole protein instead of the pocket only
    #[arg(long = "whole-protein")]
    whole_protein: bool,

    /// Number of threads to use for parallel processing
    #[arg(short = 'j', long = "num-threads", default_value_t = 1)]
    num_threads: usize,
}

pub(crate) fn run(args: &Args, config: &PipelineConfig) {
    trace!("{args:?}");
    init_thread_pool(args.num_threads);

    let (variants, catalog) = match (
        read_variants(&config.tsv("pdbbind_protein_variants.tsv")),
        StructureCatalog::read(&config.tsv("pdbbind_entries_data.tsv")),
    ) {
        (Ok(variants), Ok(catalog)) => (variants, catalog),
        (Err(e), _) | (_, Err(e)) => {
            error!("{e}");
            return;
        }
    };
    debug!("{} variants over {} structures", variants.len(), catalog.len());

    let ids = catalog
        .records()
        .iter()
        .map(|r| r.structure_id.clone())
        .collect::<Vec<String>>();
    let index = load_index(config, &PdbToolkit::default(), &ids);

    let scope = if args.whole_protein {
        MappingScope::Protein
    } else {
        MappingScope::Pocket
    };
    let (mapped, report) = map_pocket_residues(&variants, &index, scope);
    report.log_summary();

    let output = config.tsv("pdbbind_pocket_variants.tsv");
    if let Err(e) = write_mapped(&output, &mapped) {
        error!("{e}");
        return;
    }
    info!("{} pocket variants saved to {}", mapped.len(), output.display());

    log_report(prepare_energy_folders(
        &mutation_lists(&mapped),
        &config.pdbbind_entries_path,
        &config.foldx_pdb_dir,
    ));
}
