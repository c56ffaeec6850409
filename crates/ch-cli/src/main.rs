//! Combine Harvester CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod config;
mod harvest;

#[derive(Parser)]
#[command(name = "ch-cli")]
#[command(about = "Combine Harvester - assemble statistical-model inputs")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a model from a harvest config and write it as JSON
    Harvest {
        /// Harvest config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file for the model (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only print the summary, not the full model.
        #[arg(long)]
        summary_only: bool,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Harvest { config, output, summary_only } => {
            cmd_harvest(&config, output.as_ref(), summary_only)
        }
        Commands::Version => {
            println!("ch-cli {}", ch_core::VERSION);
            Ok(())
        }
    }
}

fn cmd_harvest(config_path: &Path, output: Option<&PathBuf>, summary_only: bool) -> Result<()> {
    tracing::info!(path = %config_path.display(), "loading harvest config");
    let cfg = config::read_harvest_config(config_path)?;
    let (cb, summary) = harvest::run_harvest(&cfg)?;
    tracing::info!(
        processes = summary.processes,
        systematics = summary.systematics,
        bbb = summary.bbb_added,
        "harvest complete"
    );

    let value = if summary_only {
        serde_json::to_value(&summary)?
    } else {
        serde_json::to_value(harvest::HarvestOutput { summary, model: cb.to_document() })?
    };
    write_json(output, value)
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
