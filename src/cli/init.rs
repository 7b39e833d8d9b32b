use clap::Parser;
use pocketsnp::catalog::StructureCatalog;
use pocketsnp::config::PipelineConfig;
use pocketsnp::download::{download_all, write_url_list, UrlTemplate};
use pocketsnp::mapper::{map_catalogue_variants, read_variant_catalogue, write_variants};
use tracing::{error, info, trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about = "Select the structure catalog, fetch its cross-references and attach protein variants"
)]
pub(crate) struct Args {
    /// Write the download lists without fetching the files
    #[arg(long = "no-download")]
    no_download: bool,

    /// Also fetch precomputed secondary structure files into the DSSP folder
    #[arg(long = "with-dssp")]
    with_dssp: bool,
}

pub(crate) fn run(args: &Args, config: &PipelineConfig) {
    trace!("{args:?}");

    let catalog = match StructureCatalog::init_pipeline(config) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    if let Err(e) = catalog.log_summary() {
        warn!("{e}");
    }

    let entries = config.tsv("pdbbind_entries_data.tsv");
    if let Err(e) = catalog.write(&entries) {
        error!("{e}");
        return;
    }
    info!("Catalog saved to {}", entries.display());

    let mut lists = vec![(
        UrlTemplate::Sifts,
        config.tsv("pdbbind_sifts_urls.tsv"),
        &config.sifts_path,
        "SIFTS",
    )];
    if args.with_dssp {
        lists.push((
            UrlTemplate::Dssp,
            config.tsv("pdbbind_dssp_urls.tsv"),
            &config.dssp_path,
            "DSSP",
        ));
    }

    for (template, list, output_dir, label) in lists {
        if let Err(e) = write_url_list(&list, &catalog.as_download_url_list(template)) {
            error!("{e}");
            return;
        }
        info!("{label} URL list saved to {}", list.display());
        if !args.no_download {
            download_all(&list, output_dir, label);
        }
    }

    let catalogue = match read_variant_catalogue(&config.variants_catalogue_path) {
        Ok(catalogue) => catalogue,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    let variants = map_catalogue_variants(&catalogue, &catalog);
    let output = config.tsv("pdbbind_protein_variants.tsv");
    match write_variants(&output, &variants) {
        Ok(()) => info!("{} protein variants saved to {}", variants.len(), output.display()),
        Err(e) => error!("{e}"),
    }
}
