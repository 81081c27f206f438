//! Caching server address and resolution errors.

use std::fmt;

use reqwest::Url;
use thiserror::Error;

/// Errors raised while resolving the caching server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServerError {
    /// The supplied address is not an absolute http(s) URL with a host.
    #[error("invalid caching server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No candidate answered the liveness probe.
    #[error("no caching server reachable (tried: {})", tried.join(", "))]
    Unreachable { tried: Vec<String> },
}

/// Address of the caching server used for a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheServer {
    scheme: String,
    host: String,
    port: u16,
}

impl CacheServer {
    /// Create a server address from its parts.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// Parse `scheme://host[:port]`.
    ///
    /// A missing port takes the scheme's default. Paths and queries are ignored.
    pub fn parse(url: &str) -> Result<Self, ServerError> {
        let invalid = |reason: &str| ServerError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(url.trim()).map_err(|e| invalid(&e.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(invalid("scheme must be http or https"));
        }
        let host = parsed.host_str().ok_or_else(|| invalid("missing host"))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port"))?;

        Ok(Self::new(parsed.scheme(), host, port))
    }

    /// URL scheme (`http` or `https`).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `scheme://host:port`, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Absolute URL for a path on the server.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url(), path)
        } else {
            format!("{}/{}", self.base_url(), path)
        }
    }

    /// Rewrite an upstream URL so the request flows through this server.
    ///
    /// The caching server expects `{base}{upstream path}?source={upstream host}`.
    /// Returns `None` when `source_url` is not an absolute URL with a host.
    pub fn proxied_url(&self, source_url: &str) -> Option<String> {
        let source = Url::parse(source_url).ok()?;
        let host = source.host_str()?;
        let origin = match source.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Some(format!(
            "{}{}?source={}",
            self.base_url(),
            source.path(),
            origin
        ))
    }
}

impl fmt::Display for CacheServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_port() {
        let server = CacheServer::parse("http://cache.local:49672").unwrap();
        assert_eq!(server.scheme(), "http");
        assert_eq!(server.host(), "cache.local");
        assert_eq!(server.port(), 49672);
        assert_eq!(server.base_url(), "http://cache.local:49672");
    }

    #[test]
    fn test_parse_default_port() {
        let server = CacheServer::parse("https://cache.local/").unwrap();
        assert_eq!(server.port(), 443);
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        let err = CacheServer::parse("ftp://cache.local:21").unwrap_err();
        assert!(matches!(err, ServerError::InvalidUrl { .. }));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CacheServer::parse("cache.local:49672x").is_err());
        assert!(CacheServer::parse("").is_err());
    }

    #[test]
    fn test_url_for_normalizes_slash() {
        let server = CacheServer::new("http", "localhost", 49672);
        assert_eq!(server.url_for("/"), "http://localhost:49672/");
        assert_eq!(server.url_for("status"), "http://localhost:49672/status");
    }

    #[test]
    fn test_proxied_url() {
        let server = CacheServer::new("http", "localhost", 49672);
        let url = server
            .proxied_url("http://appldnld.apple.com/ios10.1/iPad_Pro_10.1_Restore.ipsw")
            .unwrap();
        assert_eq!(
            url,
            "http://localhost:49672/ios10.1/iPad_Pro_10.1_Restore.ipsw?source=appldnld.apple.com"
        );
    }

    #[test]
    fn test_proxied_url_keeps_source_port_and_drops_query() {
        let server = CacheServer::new("http", "10.0.0.2", 8080);
        let url = server
            .proxied_url("http://updates.example.com:8000/a/b.zip?token=1")
            .unwrap();
        assert_eq!(
            url,
            "http://10.0.0.2:8080/a/b.zip?source=updates.example.com:8000"
        );
    }

    #[test]
    fn test_proxied_url_rejects_relative() {
        let server = CacheServer::new("http", "localhost", 49672);
        assert!(server.proxied_url("/just/a/path").is_none());
    }

    #[test]
    fn test_unreachable_display_lists_candidates() {
        let err = ServerError::Unreachable {
            tried: vec!["http://a:1".to_string(), "http://b:2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no caching server reachable (tried: http://a:1, http://b:2)"
        );
    }
}
