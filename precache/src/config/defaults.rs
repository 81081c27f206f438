//! Default values for every configuration key.

use std::path::PathBuf;

use super::settings::*;
use crate::catalog::{AssetKind, DEFAULT_IPSW_API, DEFAULT_OTA_BASE, OTA_CHANNELS};
use crate::fetch::DEFAULT_PROGRESS_INTERVAL;
use crate::server::{
    DEFAULT_HOST_CONFIG, DEFAULT_LIVENESS_PATH, DEFAULT_LOCATOR_COMMAND, DEFAULT_SERVER_URL,
};

/// Liveness probe timeout (seconds).
pub const DEFAULT_SERVER_TIMEOUT_SECS: u64 = 5;

/// Feed request timeout (seconds).
pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 30;

/// Transfer timeout (seconds). Installers run to several gigabytes.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3600;

pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/precache";

pub const DEFAULT_CONCURRENCY: usize = 1;

/// Upper bound on concurrent transfers through one caching server.
pub const MAX_CONCURRENCY: usize = 4;

pub const DEFAULT_LOG_FILE: &str = "precache.log";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Directory holding config.ini and the log file.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".precache")
}

/// Path of config.ini.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: None,
            liveness_path: DEFAULT_LIVENESS_PATH.to_string(),
            timeout: DEFAULT_SERVER_TIMEOUT_SECS,
            host_config: PathBuf::from(DEFAULT_HOST_CONFIG),
            locator_command: DEFAULT_LOCATOR_COMMAND.to_string(),
            default_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            ota_base: DEFAULT_OTA_BASE.to_string(),
            channels: OTA_CHANNELS.iter().map(|c| c.to_string()).collect(),
            ipsw_api: DEFAULT_IPSW_API.to_string(),
            ipsw_devices: Vec::new(),
            table: None,
            timeout: DEFAULT_FEED_TIMEOUT_SECS,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            exclude_beta: true,
            concurrency: DEFAULT_CONCURRENCY,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL.as_millis() as u64,
            retain: vec![AssetKind::Ipsw],
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: config_directory(),
            file: DEFAULT_LOG_FILE.to_string(),
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            feeds: FeedSettings::default(),
            sync: SyncSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
