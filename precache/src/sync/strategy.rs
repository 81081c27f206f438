//! Execution strategies for the selected assets.
//!
//! Strategy pattern for sequential vs bounded-parallel processing. Either
//! way each asset is processed independently and outcomes come back in
//! selection order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use tracing::debug;

use crate::catalog::Asset;
use crate::config::MAX_CONCURRENCY;
use crate::fetch::FetchOutcome;

/// Per-asset work: `(index in selection, asset) -> outcome`.
pub type AssetJob<'a> = dyn Fn(usize, &Asset) -> FetchOutcome + Sync + 'a;

/// How the selected assets are scheduled.
pub trait SyncStrategy: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &'static str;

    /// Run `job` for every asset. The result has one outcome per asset, in
    /// the same order.
    fn execute(&self, assets: &[Asset], job: &AssetJob<'_>) -> Vec<FetchOutcome>;
}

/// One asset at a time, in order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialStrategy;

impl SequentialStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl SyncStrategy for SequentialStrategy {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn execute(&self, assets: &[Asset], job: &AssetJob<'_>) -> Vec<FetchOutcome> {
        assets
            .iter()
            .enumerate()
            .map(|(index, asset)| job(index, asset))
            .collect()
    }
}

/// A small pool of worker threads pulling assets from a shared cursor.
#[derive(Debug, Clone, Copy)]
pub struct ParallelStrategy {
    workers: usize,
}

impl ParallelStrategy {
    /// Create a pool of `workers` threads, clamped to `1..=MAX_CONCURRENCY`.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.clamp(1, MAX_CONCURRENCY),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for ParallelStrategy {
    fn default() -> Self {
        Self::new(2)
    }
}

impl SyncStrategy for ParallelStrategy {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn execute(&self, assets: &[Asset], job: &AssetJob<'_>) -> Vec<FetchOutcome> {
        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<FetchOutcome>>> = Mutex::new(vec![None; assets.len()]);
        let workers = self.workers.min(assets.len()).max(1);

        thread::scope(|scope| {
            for worker in 0..workers {
                let next = &next;
                let slots = &slots;
                scope.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(asset) = assets.get(index) else {
                        debug!(worker, "Worker idle");
                        break;
                    };
                    let outcome = job(index, asset);
                    slots.lock()[index] = Some(outcome);
                });
            }
        });

        slots
            .into_inner()
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| FetchOutcome::skipped("not processed")))
            .collect()
    }
}

/// Sequential for one worker, parallel otherwise.
pub fn strategy_for(concurrency: usize) -> Box<dyn SyncStrategy> {
    if concurrency <= 1 {
        Box::new(SequentialStrategy::new())
    } else {
        Box::new(ParallelStrategy::new(concurrency))
    }
}
