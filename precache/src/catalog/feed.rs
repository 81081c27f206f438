//! Feed source abstraction.
//!
//! Each upstream document format sits behind one [`FeedSource`]: the
//! provider fetches the bytes at [`FeedSource::url`] and hands them to
//! [`FeedSource::parse`]. Adding a format means adding a source, nothing else.

use thiserror::Error;

use super::asset::Asset;

/// Non-fatal feed failures. A failing feed contributes no assets.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The feed could not be retrieved.
    #[error("feed '{feed}' unavailable: {reason}")]
    Unavailable { feed: String, reason: String },

    /// The feed was retrieved but could not be parsed.
    #[error("feed '{feed}' malformed: {reason}")]
    Malformed { feed: String, reason: String },
}

impl FeedError {
    /// Name of the feed that failed.
    pub fn feed(&self) -> &str {
        match self {
            FeedError::Unavailable { feed, .. } | FeedError::Malformed { feed, .. } => feed,
        }
    }
}

/// A remote document enumerating cacheable assets.
pub trait FeedSource: Send + Sync {
    /// Name used in logs and warnings.
    fn name(&self) -> &str;

    /// Where the document is fetched from.
    fn url(&self) -> &str;

    /// Parse the document into assets.
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Asset>, FeedError>;
}
