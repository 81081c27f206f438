//! Precache CLI - command-line interface
//!
//! Pre-warms a local caching server: resolves it, builds the asset catalog
//! from the update feeds, and streams the selected assets through it.

mod commands;
mod error;
mod output;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use precache::config::ConfigFile;
use precache::logging::init_logging;
use tracing::info;

use commands::{list, server, sync};
use error::CliError;

#[derive(Parser)]
#[command(name = "precache")]
#[command(version = precache::VERSION)]
#[command(
    about = "Pre-warm a local caching server with OS updates, installers and firmware",
    long_about = None
)]
struct Cli {
    /// Configuration file (default: ~/.precache/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter for the log file, e.g. debug or precache=trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream the selected assets through the caching server
    Sync(sync::SyncArgs),

    /// List the identifiers available in the catalog
    List(list::ListArgs),

    /// Resolve the caching server and print its address
    Server(server::ServerArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(config.logging.level.as_str());
    let _guard = init_logging(&config.logging.directory, &config.logging.file, level)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;
    info!(version = precache::VERSION, "Precache starting");

    match cli.command {
        Commands::Sync(args) => sync::run(args, &config),
        Commands::List(args) => list::run(args, &config),
        Commands::Server(args) => server::run(args, &config),
    }
}

fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}
