//! Asset transfer through the caching server.
//!
//! [`AssetFetcher`] streams one asset, reports throttled [`Progress`] and
//! returns a [`FetchOutcome`]. It never returns an error: every problem is an
//! outcome, so one asset's failure cannot stop the others.

mod fetcher;
mod outcome;
mod progress;

pub use fetcher::{AssetFetcher, PARTIAL_SUFFIX};
pub use outcome::{FailureKind, FetchOutcome};
pub use progress::{Progress, ProgressThrottle, DEFAULT_PROGRESS_INTERVAL};
