//! Sift CLI
//!
//! Main entry point for the sift command-line tool.
//! Ingests private document collections and answers semantic queries over them.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CleanCommand, IngestCommand, QueryCommand, StatsCommand};
use sift_core::config::{AppConfig, CliOverrides};
use sift_core::{logging, AppResult};
use std::path::PathBuf;
use tracing::Instrument;

/// Sift - semantic retrieval over private document corpora
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(about = "Semantic retrieval over private document corpora", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "SIFT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "SIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest a directory into a corpus
    Ingest(IngestCommand),

    /// Query a corpus
    Query(QueryCommand),

    /// Show corpus snapshot statistics
    Stats(StatsCommand),

    /// Delete a corpus' persisted snapshot
    Clean(CleanCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_with(CliOverrides {
        workspace: cli.workspace,
        config_file: cli.config,
        log_level: cli.log_level,
        verbose: cli.verbose,
        no_color: cli.no_color,
    })?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Sift CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);

    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Query(_) => "query",
        Commands::Stats(_) => "stats",
        Commands::Clean(_) => "clean",
    };
    let result = async {
        match cli.command {
            Commands::Ingest(cmd) => cmd.execute(&config).await,
            Commands::Query(cmd) => cmd.execute(&config).await,
            Commands::Stats(cmd) => cmd.execute(&config).await,
            Commands::Clean(cmd) => cmd.execute(&config).await,
        }
    }
    .instrument(tracing::info_span!("command", name = command_name))
    .await;

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
