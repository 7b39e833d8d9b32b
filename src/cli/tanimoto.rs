use clap::Parser;
use pocketsnp::config::PipelineConfig;
use pocketsnp::ligands::{tanimoto_dataset, write_identities};
use tracing::{error, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Deduplicate similar ligands and attach scores and SMILES")]
pub(crate) struct Args {
    /// Keep duplicate compounds in the filtered table
    #[arg(long = "keep-all")]
    keep_all: bool,
}

pub(crate) fn run(args: &Args, config: &PipelineConfig) {
    trace!("{args:?}");

    let tables = match tanimoto_dataset(&config.ligands_path, args.keep_all) {
        Ok(tables) => tables,
        Err(e) => {
            error!("{e}");
            return;
        }
    };

    for (name, rows, columns) in [
        ("chembl_ligands_filtered.tsv", &tables.filtered, 3),
        ("chembl_ligands_filtered_combined_tanimoto.tsv", &tables.with_scores, 4),
        ("chembl_ligands_filtered_combined_tanimoto_smiles.tsv", &tables.with_smiles, 5),
    ] {
        let output = config.tsv(name);
        match write_identities(&output, rows, columns) {
            Ok(()) => info!("{} ligands saved to {}", rows.len(), output.display()),
            Err(e) => error!("{e}"),
        }
    }
}
