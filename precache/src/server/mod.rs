//! Caching server discovery and validation.
//!
//! The fallback chain is expressed as an ordered list of
//! [`CandidateSource`] strategies sharing one liveness check:
//!
//! ```text
//! explicit URL ──► probe ──► use it, or fail (no fallback)
//!
//! HostCachingService ──► NetworkDiscovery ──► DefaultAddress
//!        │                      │                   │
//!        └──────── probe each; first live one wins ─┘
//! ```

mod resolver;
mod sources;
mod types;

pub use resolver::{ServerResolver, DEFAULT_LIVENESS_PATH};
pub use sources::{
    default_sources, parse_host_config, parse_locator_output, CandidateSource, DefaultAddress,
    HostCachingService, NetworkDiscovery, DEFAULT_HOST_CONFIG, DEFAULT_LOCATOR_COMMAND,
    DEFAULT_SERVER_URL,
};
pub use types::{CacheServer, ServerError};
