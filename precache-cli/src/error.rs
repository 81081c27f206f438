//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use precache::config::ConfigFileError;
use precache::http::HttpError;
use precache::sync::SyncError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read or holds an invalid value
    Config(ConfigFileError),
    /// Invalid command-line argument
    InvalidArgument(String),
    /// HTTP client could not be built
    HttpClient(HttpError),
    /// Failed to install the Ctrl+C handler
    SignalHandler(String),
    /// The run was aborted before any asset work
    Sync(SyncError),
    /// Every selected asset failed
    AllFailed { failed: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Sync(SyncError::ServerUnreachable { .. }) => {
                eprintln!();
                eprintln!("No caching server answered. Make sure:");
                eprintln!("  1. The caching service is running on this host or network");
                eprintln!("  2. The address is right: --caching-server http://host:port");
                eprintln!("  3. [server] url in config.ini is current, if set");
            }
            CliError::Sync(SyncError::EmptySelection) => {
                eprintln!();
                eprintln!("Run 'precache list' to see the identifiers in the catalog.");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!(
                    "Check {} or pass another file with --config",
                    precache::config::config_file_path().display()
                );
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::HttpClient(e) => write!(f, "{}", e),
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Sync(e) => write!(f, "Sync aborted: {}", e),
            CliError::AllFailed { failed } => {
                write!(f, "All {} selected assets failed", failed)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Sync(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<SyncError> for CliError {
    fn from(e: SyncError) -> Self {
        CliError::Sync(e)
    }
}

impl From<HttpError> for CliError {
    fn from(e: HttpError) -> Self {
        CliError::HttpClient(e)
    }
}
