//! Precache - caching-server pre-warming for OS updates and firmware
//!
//! This library resolves the address of a local caching server, builds a
//! catalog of cacheable assets from vendor feeds and static tables, selects
//! the assets the operator asked for, and streams each one through the
//! caching server so that client devices on the network can fetch it locally.
//!
//! # Architecture
//!
//! ```text
//! SyncOrchestrator
//!         │
//!         ├── ServerResolver ──► CandidateSource (trait)
//!         │                          ├── HostCachingService
//!         │                          ├── NetworkDiscovery
//!         │                          └── DefaultAddress
//!         │
//!         ├── CatalogProvider ─► FeedSource (trait)
//!         │                          ├── OtaFeed
//!         │                          └── IpswFeed
//!         │                      StaticTable
//!         │
//!         ├── select() (pure)
//!         │
//!         ├── CacheProbe
//!         │
//!         ├── AssetFetcher ────► ProgressThrottle
//!         │
//!         └── SyncStrategy (trait)
//!                 ├── SequentialStrategy
//!                 └── ParallelStrategy
//! ```

pub mod catalog;
pub mod config;
pub mod fetch;
pub mod http;
pub mod logging;
pub mod probe;
pub mod select;
pub mod server;
pub mod sync;

/// Library version, as published in the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
