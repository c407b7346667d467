use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};

use crate::{
    config::Settings,
    etl::run_etl,
    extract::extract,
    io::discovery::RunId,
    load::load_latest,
    pipeline::TransformPipeline,
    providers::alpha_vantage::AlphaVantageProvider,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Intraday OHLCV extract, transform and load")]
pub struct Cli {
    /// Path to the config file (etl.toml)
    #[arg(short, long, default_value = "config/etl.toml")]
    pub config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides it
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the configured series and save it to the raw-data directory
    Extract,

    /// Normalize the newest raw artifact into a processed artifact
    Transform {
        /// Suffix for the artifact names (ASCII letters, digits, '-' or '_')
        #[arg(long)]
        run_id: Option<RunId>,
    },

    /// Insert the newest processed artifact into the database
    Load,

    /// Extract, transform and load in one go
    Run {
        #[arg(long)]
        run_id: Option<RunId>,
    },
}

/// Runs one subcommand. Artifact paths go to stdout, summaries to stderr.
pub async fn execute(command: Commands, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Commands::Extract => {
            let provider = AlphaVantageProvider::new(&settings.api)?;
            let summary = extract(&provider, settings).await?;
            println!("{}", summary.raw_artifact.display());
            eprintln!("SUMMARY: {} entries extracted", summary.entries);
        }

        Commands::Transform { run_id } => {
            let mut pipeline = TransformPipeline::new(settings)?;
            if let Some(run_id) = run_id {
                pipeline = pipeline.with_run_id(run_id);
            }
            let summary = pipeline.run().context("transform run failed")?;
            println!("{}", summary.processed_artifact.display());
            eprintln!(
                "SUMMARY: {} accepted, {} rejected",
                summary.accepted, summary.rejected
            );
        }

        Commands::Load => {
            let summary = load_latest(settings)?;
            eprintln!(
                "SUMMARY: {} read, {} inserted, {} duplicates",
                summary.read, summary.inserted, summary.duplicates
            );
        }

        Commands::Run { run_id } => {
            let provider = AlphaVantageProvider::new(&settings.api)?;
            let report = run_etl(&provider, settings, run_id).await?;
            println!("{}", report.transform.processed_artifact.display());
            eprintln!(
                "SUMMARY: {} extracted, {} accepted, {} rejected, {} inserted",
                report.extract.entries,
                report.transform.accepted,
                report.transform.rejected,
                report.load.inserted
            );
        }
    }
    Ok(())
}
