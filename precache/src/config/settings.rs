//! Settings structs, one per `[section]` of the config file.

use std::path::PathBuf;

use crate::catalog::AssetKind;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub feeds: FeedSettings,
    pub sync: SyncSettings,
    pub logging: LoggingSettings,
}

/// Caching server discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Explicit server URL; disables the fallback chain.
    pub url: Option<String>,
    pub liveness_path: String,
    /// Liveness probe timeout in seconds.
    pub timeout: u64,
    /// Property list of a caching service running on this host.
    pub host_config: PathBuf,
    /// Command that lists caching servers on the network.
    pub locator_command: String,
    /// Last-resort address.
    pub default_url: String,
}

/// Upstream feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub ota_base: String,
    /// OTA channels to read (`ios`, `tv`, `watch`).
    pub channels: Vec<String>,
    pub ipsw_api: String,
    /// Devices whose firmware feed is always read.
    pub ipsw_devices: Vec<String>,
    /// Optional JSON static table.
    pub table: Option<PathBuf>,
    /// Feed request timeout in seconds.
    pub timeout: u64,
}

/// Transfer behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub output_dir: PathBuf,
    pub exclude_beta: bool,
    /// Concurrent transfers, 1 to 4.
    pub concurrency: usize,
    pub progress_interval_ms: u64,
    /// Asset kinds written to `output_dir`.
    pub retain: Vec<AssetKind>,
    /// Per-transfer timeout in seconds.
    pub request_timeout: u64,
}

/// Log file settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
}
