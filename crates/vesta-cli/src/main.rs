//! Vesta command-line interface
//!
//! Replays JSON-lines operation scripts against an in-memory node so the
//! virtual delete behavior can be inspected without a real store.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{common, replay};

#[derive(Parser)]
#[command(name = "vesta")]
#[command(about = "Vesta - replicated document store tombstones", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "vesta.toml")]
    config: PathBuf,

    /// Override the local node id
    #[arg(long, global = true)]
    node_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines script of put/delete/get operations
    Replay {
        /// Script to replay
        script: PathBuf,

        /// Skip the final dump of every stored document
        #[arg(long)]
        no_dump: bool,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = common::load_config(&cli.config, cli.node_id.as_deref())?;

    match cli.command {
        Commands::Replay { script, no_dump } => {
            let mut stdout = std::io::stdout().lock();
            replay::run(&script, config, !no_dump, &mut stdout).await?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
