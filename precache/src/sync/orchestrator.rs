//! Run orchestration.
//!
//! resolve server → build catalog → select → per asset: probe, then fetch or
//! skip → summary. Server resolution is the only step that can abort the run
//! before any asset work.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::cancel::CancelFlag;
use super::error::SyncError;
use super::events::{EventSink, SyncEvent, TracingSink};
use super::strategy::{SequentialStrategy, SyncStrategy};
use super::summary::RunSummary;
use crate::catalog::{Asset, CatalogProvider};
use crate::fetch::{AssetFetcher, FetchOutcome, Progress};
use crate::probe::CacheProbe;
use crate::select::{select, SelectionCriteria};
use crate::server::{CacheServer, ServerResolver};

/// Drives one synchronization run.
pub struct SyncOrchestrator {
    resolver: ServerResolver,
    provider: CatalogProvider,
    probe: CacheProbe,
    fetcher: AssetFetcher,
    strategy: Box<dyn SyncStrategy>,
    sink: Arc<dyn EventSink>,
    cancel: CancelFlag,
    require_selection: bool,
}

impl SyncOrchestrator {
    /// Sequential orchestrator logging its events through `tracing`.
    pub fn new(
        resolver: ServerResolver,
        provider: CatalogProvider,
        probe: CacheProbe,
        fetcher: AssetFetcher,
    ) -> Self {
        let cancel = CancelFlag::new();
        Self {
            resolver,
            provider,
            probe,
            fetcher: fetcher.with_cancel(cancel.clone()),
            strategy: Box::new(SequentialStrategy::new()),
            sink: Arc::new(TracingSink),
            cancel,
            require_selection: false,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn SyncStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Share `cancel` with the caller's interrupt handler.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.fetcher = self.fetcher.with_cancel(cancel.clone());
        self.cancel = cancel;
        self
    }

    /// Treat an empty selection as [`SyncError::EmptySelection`].
    pub fn require_selection(mut self, required: bool) -> Self {
        self.require_selection = required;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Run once.
    ///
    /// # Errors
    ///
    /// Only run-level failures: an unusable or unreachable server (raised
    /// before any feed is requested) and, when required, an empty selection.
    /// Per-asset failures are recorded in the summary.
    pub fn run(
        &self,
        explicit_server: Option<&str>,
        criteria: &SelectionCriteria,
        output_dir: &Path,
    ) -> Result<RunSummary, SyncError> {
        let server = self.resolver.resolve(explicit_server)?;
        self.sink.emit(&SyncEvent::ServerResolved { server: &server });

        let catalog = self.provider.build_catalog();
        for warning in catalog.warnings() {
            self.sink.emit(&SyncEvent::FeedWarning { warning });
        }
        self.sink.emit(&SyncEvent::CatalogBuilt {
            assets: catalog.len(),
            warnings: catalog.warnings().len(),
        });

        let selected = select(&catalog, criteria);
        self.sink.emit(&SyncEvent::SelectionMade {
            selected: selected.len(),
        });
        if selected.is_empty() {
            if self.require_selection {
                return Err(SyncError::EmptySelection);
            }
            info!("Nothing selected");
        }

        info!(
            server = %server,
            assets = selected.len(),
            strategy = self.strategy.name(),
            "Processing selection"
        );
        let total = selected.len();
        let job = |index: usize, asset: &Asset| self.process(&server, asset, index, total, output_dir);
        let outcomes = self.strategy.execute(&selected, &job);

        let mut summary = RunSummary::new(server.clone(), catalog.warnings().to_vec());
        summary.outcomes = selected.into_iter().zip(outcomes).collect();
        let counts = summary.counts();
        info!(
            cached = counts.cached,
            downloaded = counts.downloaded,
            skipped = counts.skipped,
            failed = counts.failed,
            "Run complete"
        );
        Ok(summary)
    }

    fn process(
        &self,
        server: &CacheServer,
        asset: &Asset,
        index: usize,
        total: usize,
        output_dir: &Path,
    ) -> FetchOutcome {
        let outcome = if self.cancel.is_cancelled() {
            debug!(asset = %asset, "Cancelled before start");
            FetchOutcome::skipped("cancelled")
        } else {
            let status = self.probe.probe(server, asset);
            debug!(asset = %asset, status = %status, acting_as = %status.effective(), "Probe result");
            self.sink.emit(&SyncEvent::ProbeCompleted { asset, status });
            self.sink.emit(&SyncEvent::FetchStarted { asset, index, total });

            let on_progress = |progress: &Progress| {
                self.sink.emit(&SyncEvent::Progress {
                    asset,
                    progress: *progress,
                })
            };
            self.fetcher
                .fetch(server, asset, output_dir, status, &on_progress)
        };

        self.sink.emit(&SyncEvent::AssetFinished {
            asset,
            outcome: &outcome,
        });
        outcome
    }
}
