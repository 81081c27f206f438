//! Configuration file.
//!
//! Settings live in `~/.precache/config.ini`, one `[section]` per concern:
//!
//! ```ini
//! [server]
//! url = http://cache.lan:49672
//!
//! [feeds]
//! channels = ios, tv
//! ipsw_devices = iPad6,7 iPhone9,1
//!
//! [sync]
//! output_dir = /srv/precache
//! concurrency = 2
//! retain = ipsw
//!
//! [logging]
//! level = debug
//! ```
//!
//! Settings structs live in `settings`, defaults in `defaults`, INI key
//! mapping in `parser`.

mod defaults;
mod file;
mod parser;
mod settings;

pub use defaults::{
    config_directory, config_file_path, DEFAULT_CONCURRENCY, DEFAULT_FEED_TIMEOUT_SECS,
    DEFAULT_LOG_FILE, DEFAULT_LOG_LEVEL, DEFAULT_OUTPUT_DIR, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SERVER_TIMEOUT_SECS, MAX_CONCURRENCY,
};
pub use file::ConfigFileError;
pub use settings::{ConfigFile, FeedSettings, LoggingSettings, ServerSettings, SyncSettings};
