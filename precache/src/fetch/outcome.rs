//! Per-asset fetch outcomes.

use std::fmt;

/// Why an asset could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The transfer started but did not complete.
    Interrupted,
    /// The local copy could not be written.
    WriteFailure,
    /// The request could not be made or the server answered with an error.
    Unavailable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Interrupted => "interrupted",
            FailureKind::WriteFailure => "write failure",
            FailureKind::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Terminal result for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not attempted.
    Skipped { reason: String },
    /// The caching server already held the asset.
    Cached { bytes_verified: u64 },
    /// The asset was pulled through the caching server.
    Downloaded {
        bytes_transferred: u64,
        duration_ms: u64,
    },
    /// The attempt failed. Other assets are unaffected.
    Failed { kind: FailureKind, detail: String },
}

impl FetchOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        FetchOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        FetchOutcome::Failed {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }

    /// Short lowercase label for tables and logs.
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Skipped { .. } => "skipped",
            FetchOutcome::Cached { .. } => "cached",
            FetchOutcome::Downloaded { .. } => "downloaded",
            FetchOutcome::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Skipped { reason } => write!(f, "skipped ({})", reason),
            FetchOutcome::Cached { bytes_verified } => {
                write!(f, "cached ({} bytes)", bytes_verified)
            }
            FetchOutcome::Downloaded {
                bytes_transferred,
                duration_ms,
            } => write!(
                f,
                "downloaded ({} bytes in {} ms)",
                bytes_transferred, duration_ms
            ),
            FetchOutcome::Failed { kind, detail } => write!(f, "failed, {}: {}", kind, detail),
        }
    }
}
