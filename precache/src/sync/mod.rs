//! Synchronization runs.
//!
//! [`SyncOrchestrator`] ties the components together for one run and returns
//! a [`RunSummary`]. Assets are scheduled by a [`SyncStrategy`]: sequential by
//! default, or a bounded worker pool. A [`CancelFlag`] stops new work and
//! interrupts the transfer in flight.

mod cancel;
mod error;
mod events;
mod orchestrator;
mod strategy;
mod summary;


pub use cancel::CancelFlag;
pub use error::SyncError;
pub use events::{EventSink, NullSink, SyncEvent, TracingSink};
pub use orchestrator::SyncOrchestrator;
pub use strategy::{strategy_for, AssetJob, ParallelStrategy, SequentialStrategy, SyncStrategy};
pub use summary::{OutcomeCounts, RunSummary};
