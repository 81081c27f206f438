//! `precache server`: resolve the caching server and print its address.

use clap::Args;
use precache::config::ConfigFile;
use precache::sync::SyncError;
use tracing::debug;

use super::common::build_resolver;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Check this address instead of running discovery
    #[arg(short = 'c', long)]
    pub caching_server: Option<String>,
}

pub fn run(args: ServerArgs, config: &ConfigFile) -> Result<(), CliError> {
    let resolver = build_resolver(&config.server)?;
    debug!(sources = ?resolver.source_names(), "Resolving caching server");

    let explicit = args.caching_server.or_else(|| config.server.url.clone());
    let server = resolver
        .resolve(explicit.as_deref())
        .map_err(SyncError::from)?;

    println!("{}", server.base_url());
    Ok(())
}
