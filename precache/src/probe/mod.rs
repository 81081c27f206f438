//! Cache presence probe.
//!
//! A HEAD request for the proxied URL asks the caching server about an asset
//! without moving its payload. The server marks a stored artifact either with
//! an `X-Cache`/`X-Cache-Status` hit marker or by answering without a
//! `Content-Type` (it has not contacted the origin). Anything the probe cannot
//! read decisively is [`CacheStatus::Unknown`].

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::Asset;
use crate::http::{HttpClient, ResponseHead};
use crate::server::CacheServer;

/// Headers that carry the caching server's hit/miss verdict.
const CACHE_MARKER_HEADERS: [&str; 2] = ["x-cache", "x-cache-status"];

/// Result of a cache probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    /// The server holds the whole artifact.
    Cached,
    /// The server does not hold the artifact.
    NotCached,
    /// The answer was ambiguous or missing.
    Unknown,
}

/// How an [`CacheStatus::Unknown`] probe is acted on.
///
/// Ambiguity is resolved towards fetching; the caching server short-circuits
/// the transfer itself when it already holds the data.
pub const UNKNOWN_PROBE_POLICY: CacheStatus = CacheStatus::NotCached;

impl CacheStatus {
    /// The status to act on, with [`UNKNOWN_PROBE_POLICY`] applied.
    pub fn effective(self) -> CacheStatus {
        match self {
            CacheStatus::Unknown => UNKNOWN_PROBE_POLICY,
            decisive => decisive,
        }
    }

    /// Whether the probe gave a definite answer.
    pub fn is_decisive(self) -> bool {
        self != CacheStatus::Unknown
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CacheStatus::Cached => "cached",
            CacheStatus::NotCached => "not cached",
            CacheStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Whether a response carries a cache-hit marker.
pub fn has_hit_marker(head: &ResponseHead) -> bool {
    CACHE_MARKER_HEADERS.iter().any(|name| {
        head.header(name)
            .map(|v| v.trim_start().to_ascii_uppercase().starts_with("HIT"))
            .unwrap_or(false)
    })
}

/// Classify a probe response.
pub fn classify_head(head: &ResponseHead) -> CacheStatus {
    if !head.is_success() {
        return CacheStatus::Unknown;
    }
    if has_hit_marker(head) || head.content_type().is_none() {
        CacheStatus::Cached
    } else {
        CacheStatus::NotCached
    }
}

/// Asks the caching server whether it already holds an asset.
pub struct CacheProbe {
    client: Arc<dyn HttpClient>,
}

impl CacheProbe {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// Probe `asset` through `server`. Never fails.
    pub fn probe(&self, server: &CacheServer, asset: &Asset) -> CacheStatus {
        let Some(url) = server.proxied_url(&asset.source_url) else {
            debug!(asset = %asset, "Source URL cannot be proxied; probe inconclusive");
            return CacheStatus::Unknown;
        };

        let status = match self.client.head(&url) {
            Ok(head) => classify_head(&head),
            Err(e) => {
                debug!(asset = %asset, error = %e, "Probe request failed");
                CacheStatus::Unknown
            }
        };
        debug!(asset = %asset, status = %status, "Probe complete");
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssetKind;
    use crate::http::MockHttpClient;

    const PROXIED: &str = "http://cache.test:49672/ios10.1/iPad.ipsw?source=appldnld.apple.com";

    fn setup() -> (Arc<MockHttpClient>, CacheServer, Asset) {
        let mock = Arc::new(MockHttpClient::new());
        let server = CacheServer::new("http", "cache.test", 49672);
        let asset = Asset::new(
            "iPad6,7",
            AssetKind::Ipsw,
            "10.1",
            "http://appldnld.apple.com/ios10.1/iPad.ipsw",
        );
        (mock, server, asset)
    }

    #[test]
    fn test_unknown_policy_is_not_cached() {
        assert_eq!(UNKNOWN_PROBE_POLICY, CacheStatus::NotCached);
        assert_eq!(CacheStatus::Unknown.effective(), CacheStatus::NotCached);
        assert_eq!(CacheStatus::Cached.effective(), CacheStatus::Cached);
        assert!(!CacheStatus::Unknown.is_decisive());
    }

    #[test]
    fn test_hit_marker_is_cached() {
        let (mock, server, asset) = setup();
        mock.on_head(
            PROXIED,
            ResponseHead::new(200)
                .with_header("Content-Type", "application/octet-stream")
                .with_header("X-Cache", "HIT from cache.test"),
        );
        let probe = CacheProbe::new(mock.clone());
        assert_eq!(probe.probe(&server, &asset), CacheStatus::Cached);
        assert_eq!(mock.requests(), vec![format!("HEAD {}", PROXIED)]);
    }

    #[test]
    fn test_missing_content_type_is_cached() {
        let (mock, server, asset) = setup();
        mock.on_head(PROXIED, ResponseHead::new(200).with_header("Content-Length", "10"));
        assert_eq!(CacheProbe::new(mock).probe(&server, &asset), CacheStatus::Cached);
    }

    #[test]
    fn test_miss_is_not_cached() {
        let (mock, server, asset) = setup();
        mock.on_head(
            PROXIED,
            ResponseHead::new(200)
                .with_header("Content-Type", "application/octet-stream")
                .with_header("X-Cache-Status", "MISS"),
        );
        assert_eq!(CacheProbe::new(mock).probe(&server, &asset), CacheStatus::NotCached);
    }

    #[test]
    fn test_error_status_and_transport_failure_are_unknown() {
        let (mock, server, asset) = setup();
        let probe = CacheProbe::new(mock.clone());
        assert_eq!(probe.probe(&server, &asset), CacheStatus::Unknown);

        mock.on_head(PROXIED, ResponseHead::new(502));
        assert_eq!(probe.probe(&server, &asset), CacheStatus::Unknown);
    }

    #[test]
    fn test_unproxiable_source_is_unknown() {
        let (mock, server, _) = setup();
        let asset = Asset::new("x", AssetKind::Ota, "1", "not a url");
        assert_eq!(CacheProbe::new(mock.clone()).probe(&server, &asset), CacheStatus::Unknown);
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_hit_marker_case_insensitive() {
        let head = ResponseHead::new(200)
            .with_header("Content-Type", "text/plain")
            .with_header("x-cache-status", "hit");
        assert!(has_hit_marker(&head));
        assert_eq!(classify_head(&head), CacheStatus::Cached);
    }
}
