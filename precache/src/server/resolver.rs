//! Caching server resolution.
//!
//! An explicit address is authoritative: it is probed and either used or the
//! run fails, with no fallback. Otherwise the candidate sources are tried in
//! order and the first live candidate wins.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::sources::CandidateSource;
use super::types::{CacheServer, ServerError};
use crate::http::{HttpClient, HttpError};

/// Path requested by the liveness probe.
pub const DEFAULT_LIVENESS_PATH: &str = "/";

/// Resolves the caching server for a run.
pub struct ServerResolver {
    client: Arc<dyn HttpClient>,
    sources: Vec<Box<dyn CandidateSource>>,
    liveness_path: String,
}

impl ServerResolver {
    /// Create a resolver with the given fallback chain.
    pub fn new(client: Arc<dyn HttpClient>, sources: Vec<Box<dyn CandidateSource>>) -> Self {
        Self {
            client,
            sources,
            liveness_path: DEFAULT_LIVENESS_PATH.to_string(),
        }
    }

    /// Set the path requested by the liveness probe.
    pub fn with_liveness_path(mut self, path: impl Into<String>) -> Self {
        self.liveness_path = path.into();
        self
    }

    /// Names of the fallback sources, in the order they are tried.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Liveness probe: any HTTP answer means the server is up.
    pub fn check_alive(&self, server: &CacheServer) -> Result<(), HttpError> {
        let url = server.url_for(&self.liveness_path);
        let head = self.client.head(&url)?;
        debug!(server = %server, status = head.status, "Liveness probe answered");
        Ok(())
    }

    /// Determine the caching server to use.
    ///
    /// # Errors
    ///
    /// [`ServerError::InvalidUrl`] if `explicit` cannot be parsed,
    /// [`ServerError::Unreachable`] if no candidate answers.
    pub fn resolve(&self, explicit: Option<&str>) -> Result<CacheServer, ServerError> {
        if let Some(url) = explicit {
            let server = CacheServer::parse(url)?;
            return match self.check_alive(&server) {
                Ok(()) => {
                    info!(server = %server, "Using caching server (explicit)");
                    Ok(server)
                }
                Err(e) => {
                    warn!(server = %server, error = %e, "Explicit caching server unreachable");
                    Err(ServerError::Unreachable {
                        tried: vec![server.base_url()],
                    })
                }
            };
        }

        let mut tried = Vec::new();
        for source in &self.sources {
            let Some(server) = source.candidate() else {
                debug!(source = source.name(), "No candidate");
                continue;
            };

            match self.check_alive(&server) {
                Ok(()) => {
                    info!(server = %server, source = source.name(), "Using caching server");
                    return Ok(server);
                }
                Err(e) => {
                    warn!(
                        server = %server,
                        source = source.name(),
                        error = %e,
                        "Discarding unreachable caching server candidate"
                    );
                    tried.push(server.base_url());
                }
            }
        }

        Err(ServerError::Unreachable { tried })
    }
}
