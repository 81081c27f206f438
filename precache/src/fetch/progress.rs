//! Transfer progress and rate limiting.
//!
//! Reads arrive far more often than anyone wants to hear about them, so
//! progress is reported at most once per interval, plus a final report when
//! the transfer ends.

use std::time::{Duration, Instant};

/// Default minimum spacing between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Snapshot of a running transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub bytes_so_far: u64,
    /// Expected size, when the server or the feed states it.
    pub total_bytes: Option<u64>,
    /// 0.0 to 100.0; `None` when the total is unknown.
    pub percent: Option<f64>,
}

impl Progress {
    pub fn new(bytes_so_far: u64, total_bytes: Option<u64>) -> Self {
        let percent = total_bytes
            .filter(|total| *total > 0)
            .map(|total| (bytes_so_far as f64 / total as f64 * 100.0).min(100.0));
        Self {
            bytes_so_far,
            total_bytes,
            percent,
        }
    }
}

/// Gate that opens at most once per interval.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a report may be emitted now.
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    /// Whether a report may be emitted at `now`. Opening the gate records `now`.
    pub fn ready_at(&mut self, now: Instant) -> bool {
        let open = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if open {
            self.last = Some(now);
        }
        open
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}
