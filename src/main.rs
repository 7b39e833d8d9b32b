mod cli;

use clap::{Parser, Subcommand};
use pocketsnp::config::PipelineConfig;
use pocketsnp::error::PipelineError;
use std::path::PathBuf;
use tracing::{error, warn, Level};

/// Curate binding-pocket variants of protein-ligand structures into feature tables
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pipeline configuration file (TOML)
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Verbosity of the program:
    /// -v for info, -vv for debug, and -vvv for trace
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Select the structure catalog, fetch its cross-references and attach protein variants
    Init(cli::init::Args),
    /// Locate protein variants inside binding pockets and prepare the energy tool
    PocketSnpsMappingAndFoldxPrep(cli::pocket_snps::Args),
    /// Collect the status and energies of the mutation-energy tool
    FoldxReport(cli::foldx_report::Args),
    /// Gather the ligands of every grouped structure
    PrepareLigandsFolders(cli::ligand_folders::Args),
    /// Deduplicate similar ligands and attach scores and SMILES
    LigandsTanimotoDataset(cli::tanimoto::Args),
    /// Lay out docking folders, ligands, search boxes and seeds
    PrepareVinaFoldersConfig(cli::vina_folders::Args),
    /// Collect binding affinities from the docking logs
    GenerateDockingsResults(cli::dockings_results::Args),
    /// Paired wild-type and mutant feature rows of every pocket variant
    Featurize(cli::featurize::Args),
    /// Secondary structure and exposure summary of every binding pocket
    PocketFeatures(cli::pocket_features::Args),
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match PipelineConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(PipelineError::MissingInput(path)) => {
            warn!("No configuration at {}, using defaults", path.display());
            PipelineConfig::default()
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    match &cli.command {
        Commands::Init(args) => cli::init::run(args, &config),
        Commands::PocketSnpsMappingAndFoldxPrep(args) => cli::pocket_snps::run(args, &config),
        Commands::FoldxReport(args) => cli::foldx_report::run(args, &config),
        Commands::PrepareLigandsFolders(args) => cli::ligand_folders::run(args, &config),
        Commands::LigandsTanimotoDataset(args) => cli::tanimoto::run(args, &config),
        Commands::PrepareVinaFoldersConfig(args) => cli::vina_folders::run(args, &config),
        Commands::GenerateDockingsResults(args) => cli::dockings_results::run(args, &config),
        Commands::Featurize(args) => cli::featurize::run(args, &config),
        Commands::PocketFeatures(args) => cli::pocket_features::run(args, &config),
    }
}
