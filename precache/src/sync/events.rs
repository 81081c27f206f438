//! Structured run events.
//!
//! The engine never formats user-facing text. It emits [`SyncEvent`]s to an
//! [`EventSink`]; the CLI renders them, [`TracingSink`] logs them.

use tracing::{debug, info, warn};

use crate::catalog::{Asset, FeedError};
use crate::fetch::{FetchOutcome, Progress};
use crate::probe::CacheStatus;
use crate::server::CacheServer;

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent<'a> {
    ServerResolved {
        server: &'a CacheServer,
    },
    /// A feed contributed nothing.
    FeedWarning {
        warning: &'a FeedError,
    },
    CatalogBuilt {
        assets: usize,
        warnings: usize,
    },
    SelectionMade {
        selected: usize,
    },
    ProbeCompleted {
        asset: &'a Asset,
        status: CacheStatus,
    },
    /// `index` is zero-based within the selection of `total` assets.
    FetchStarted {
        asset: &'a Asset,
        index: usize,
        total: usize,
    },
    Progress {
        asset: &'a Asset,
        progress: Progress,
    },
    AssetFinished {
        asset: &'a Asset,
        outcome: &'a FetchOutcome,
    },
}

/// Receiver of run events. Called from worker threads when transfers run in
/// parallel.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &SyncEvent<'_>);
}

impl<F> EventSink for F
where
    F: Fn(&SyncEvent<'_>) + Send + Sync,
{
    fn emit(&self, event: &SyncEvent<'_>) {
        self(event)
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &SyncEvent<'_>) {
        match event {
            SyncEvent::ServerResolved { server } => info!(server = %server, "Caching server resolved"),
            SyncEvent::FeedWarning { warning } => warn!(feed = warning.feed(), "{}", warning),
            SyncEvent::CatalogBuilt { assets, warnings } => {
                info!(assets, warnings, "Catalog ready")
            }
            SyncEvent::SelectionMade { selected } => info!(selected, "Assets selected"),
            SyncEvent::ProbeCompleted { asset, status } => {
                debug!(asset = %asset, status = %status, "Probed")
            }
            SyncEvent::FetchStarted { asset, index, total } => {
                info!(asset = %asset, item = index + 1, total, "Fetching")
            }
            SyncEvent::Progress { asset, progress } => debug!(
                asset = %asset,
                bytes = progress.bytes_so_far,
                total = ?progress.total_bytes,
                "Transfer progress"
            ),
            SyncEvent::AssetFinished { asset, outcome } => {
                if outcome.is_failed() {
                    warn!(asset = %asset, outcome = %outcome, "Asset failed")
                } else {
                    info!(asset = %asset, outcome = %outcome, "Asset finished")
                }
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &SyncEvent<'_>) {}
}
