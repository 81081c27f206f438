//! `precache sync`: stream the selected assets through the caching server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use precache::config::{ConfigFile, SyncSettings};
use precache::probe::CacheProbe;
use precache::select::SelectionCriteria;
use precache::sync::{strategy_for, CancelFlag, SyncOrchestrator};
use tracing::{info, warn};

use super::common::{build_fetcher, build_provider, build_resolver, check_concurrency, http_client};
use crate::error::CliError;
use crate::output::{print_summary, ConsoleSink};

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Caching server URL, e.g. http://cache.lan:49672 (skips discovery)
    #[arg(short = 'c', long)]
    pub caching_server: Option<String>,

    /// Device model identifiers to pre-warm, e.g. iPhone9,1
    #[arg(short = 'm', long = "model", num_args = 1..)]
    pub models: Vec<String>,

    /// Device models whose IPSW firmware should be cached
    #[arg(short = 'i', long = "ipsw", num_args = 1..)]
    pub ipsw: Vec<String>,

    /// macOS installers to cache, e.g. Sierra
    #[arg(short = 'o', long = "os-installer", num_args = 1..)]
    pub installers: Vec<String>,

    /// Group tags to cache, e.g. iPad, AppleTV or installer
    #[arg(short = 'g', long = "group", num_args = 1..)]
    pub groups: Vec<String>,

    /// Only consider firmware images
    #[arg(long)]
    pub ipsw_only: bool,

    /// Include pre-release assets
    #[arg(long)]
    pub include_beta: bool,

    /// Directory for retained assets (overrides [sync] output_dir)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Concurrent transfers, 1 to 4 (overrides [sync] concurrency)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Fail when nothing matches the selection
    #[arg(long)]
    pub require_selection: bool,
}

impl SyncArgs {
    /// Selection criteria for these arguments on top of the `[sync]` settings.
    ///
    /// `--ipsw` models are selected like `--model` ones. When they are the
    /// only selector, the run is limited to firmware.
    pub fn criteria(&self, settings: &SyncSettings) -> SelectionCriteria {
        let ipsw_alone = !self.ipsw.is_empty()
            && self.models.is_empty()
            && self.installers.is_empty()
            && self.groups.is_empty();

        SelectionCriteria::new()
            .with_models(
                self.models
                    .iter()
                    .chain(&self.ipsw)
                    .chain(&self.installers),
            )
            .with_groups(&self.groups)
            .ipsw_only(self.ipsw_only || ipsw_alone)
            .exclude_beta(settings.exclude_beta && !self.include_beta)
    }
}

pub fn run(args: SyncArgs, config: &ConfigFile) -> Result<(), CliError> {
    let concurrency = check_concurrency(args.concurrency.unwrap_or(config.sync.concurrency))?;
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.sync.output_dir.clone());
    let explicit_server = args
        .caching_server
        .clone()
        .or_else(|| config.server.url.clone());
    let criteria = args.criteria(&config.sync);

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        if handler_flag.is_cancelled() {
            eprintln!("Interrupted again, exiting");
            std::process::exit(130);
        }
        eprintln!();
        eprintln!("Received interrupt, cancelling remaining assets (Ctrl+C again to exit)...");
        handler_flag.cancel();
    })
    .map_err(|e| CliError::SignalHandler(e.to_string()))?;

    let orchestrator = SyncOrchestrator::new(
        build_resolver(&config.server)?,
        build_provider(&config.feeds, &args.ipsw)?,
        CacheProbe::new(http_client(config.feeds.timeout)?),
        build_fetcher(&config.sync)?,
    )
    .with_strategy(strategy_for(concurrency))
    .with_sink(Arc::new(ConsoleSink::new()))
    .with_cancel(cancel)
    .require_selection(args.require_selection);

    info!(
        output_dir = %output_dir.display(),
        concurrency,
        "Starting sync"
    );
    let summary = orchestrator.run(explicit_server.as_deref(), &criteria, &output_dir)?;
    print_summary(&summary);

    if summary.is_success() {
        Ok(())
    } else {
        let failed = summary.counts().failed;
        warn!(failed, "Every selected asset failed");
        Err(CliError::AllFailed { failed })
    }
}
