//! Run summary.

use crate::catalog::{Asset, AssetKind, FeedError};
use crate::fetch::FetchOutcome;
use crate::server::CacheServer;

/// Number of assets per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub skipped: usize,
    pub cached: usize,
    pub downloaded: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    pub fn total(&self) -> usize {
        self.skipped + self.cached + self.downloaded + self.failed
    }
}

/// What a run did, one entry per selected asset in selection order.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub server: CacheServer,
    pub outcomes: Vec<(Asset, FetchOutcome)>,
    /// Feeds that contributed nothing.
    pub warnings: Vec<FeedError>,
}

impl RunSummary {
    pub fn new(server: CacheServer, warnings: Vec<FeedError>) -> Self {
        Self {
            server,
            outcomes: Vec::new(),
            warnings,
        }
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.outcomes
            .iter()
            .fold(OutcomeCounts::default(), |mut counts, (_, outcome)| {
                match outcome {
                    FetchOutcome::Skipped { .. } => counts.skipped += 1,
                    FetchOutcome::Cached { .. } => counts.cached += 1,
                    FetchOutcome::Downloaded { .. } => counts.downloaded += 1,
                    FetchOutcome::Failed { .. } => counts.failed += 1,
                }
                counts
            })
    }

    /// Outcome recorded for the asset with this identifier and kind.
    pub fn outcome_for(&self, identifier: &str, kind: AssetKind) -> Option<&FetchOutcome> {
        self.outcomes
            .iter()
            .find(|(asset, _)| asset.identifier == identifier && asset.kind == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &(Asset, FetchOutcome)> {
        self.outcomes.iter().filter(|(_, o)| o.is_failed())
    }

    /// Bytes moved through the caching server, cached or not.
    pub fn bytes_transferred(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                FetchOutcome::Cached { bytes_verified } => *bytes_verified,
                FetchOutcome::Downloaded {
                    bytes_transferred, ..
                } => *bytes_transferred,
                _ => 0,
            })
            .sum()
    }

    /// True unless every selected asset failed.
    ///
    /// An empty run is a success; partial failure is a success with
    /// itemized failures.
    pub fn is_success(&self) -> bool {
        self.outcomes.is_empty() || self.outcomes.iter().any(|(_, o)| !o.is_failed())
    }
}
