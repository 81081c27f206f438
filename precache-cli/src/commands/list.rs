//! `precache list`: print the catalog's identifiers grouped by kind.
//!
//! Builds the catalog without resolving a caching server.

use clap::Args;
use console::style;
use precache::catalog::{AssetKind, Catalog};
use precache::config::ConfigFile;
use tracing::info;

use super::common::build_provider;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Also read the firmware feed of these device models
    #[arg(short = 'i', long = "ipsw", num_args = 1..)]
    pub ipsw: Vec<String>,

    /// Only list one kind: ota, ipsw, macos-installer, app-store-app or combo-update
    #[arg(short = 'k', long)]
    pub kind: Option<AssetKind>,
}

/// Sorted identifiers per kind, skipping kinds with none.
pub fn listing(catalog: &Catalog, only: Option<AssetKind>) -> Vec<(AssetKind, Vec<String>)> {
    AssetKind::ALL
        .iter()
        .filter(|kind| only.map_or(true, |k| k == **kind))
        .map(|kind| {
            let ids = catalog
                .identifiers(*kind)
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>();
            (*kind, ids)
        })
        .filter(|(_, ids)| !ids.is_empty())
        .collect()
}

pub fn run(args: ListArgs, config: &ConfigFile) -> Result<(), CliError> {
    let provider = build_provider(&config.feeds, &args.ipsw)?;
    let catalog = provider.build_catalog();
    info!(assets = catalog.len(), "Catalog built for listing");

    for warning in catalog.warnings() {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }

    for (kind, ids) in listing(&catalog, args.kind) {
        println!("{} ({})", style(kind).bold(), ids.len());
        for id in ids {
            println!("  {}", id);
        }
    }
    Ok(())
}
