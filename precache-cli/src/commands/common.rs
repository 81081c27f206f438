//! Wiring shared across CLI commands: HTTP clients and engine components
//! built from the configuration file.

use std::sync::Arc;
use std::time::Duration;

use precache::catalog::{CatalogProvider, StaticTable};
use precache::config::{FeedSettings, ServerSettings, SyncSettings, MAX_CONCURRENCY};
use precache::fetch::AssetFetcher;
use precache::http::{HttpClient, ReqwestClient};
use precache::server::{default_sources, ServerResolver};

use crate::error::CliError;

/// Blocking HTTP client with the given timeout in seconds.
pub fn http_client(timeout_secs: u64) -> Result<Arc<dyn HttpClient>, CliError> {
    let client = ReqwestClient::with_timeout(Duration::from_secs(timeout_secs))?;
    Ok(Arc::new(client))
}

/// Server resolver using the standard fallback chain.
pub fn build_resolver(settings: &ServerSettings) -> Result<ServerResolver, CliError> {
    let client = http_client(settings.timeout)?;
    let sources = default_sources(
        settings.host_config.clone(),
        settings.locator_command.clone(),
        settings.default_url.clone(),
    );
    Ok(ServerResolver::new(client, sources).with_liveness_path(settings.liveness_path.clone()))
}

/// Catalog provider for the configured feeds plus `extra_devices`' firmware.
pub fn build_provider(
    settings: &FeedSettings,
    extra_devices: &[String],
) -> Result<CatalogProvider, CliError> {
    let client = http_client(settings.timeout)?;

    let table = match &settings.table {
        Some(path) => StaticTable::with_file(path.clone()),
        None => StaticTable::builtin(),
    };

    Ok(CatalogProvider::new(client)
        .with_ota_channels(&settings.ota_base, &settings.channels)
        .with_ipsw_devices(&settings.ipsw_api, ipsw_devices(settings, extra_devices))
        .with_table(table))
}

/// Configured devices followed by `extra` ones not already listed.
pub fn ipsw_devices(settings: &FeedSettings, extra: &[String]) -> Vec<String> {
    let mut devices = settings.ipsw_devices.clone();
    for device in extra {
        if !devices.contains(device) {
            devices.push(device.clone());
        }
    }
    devices
}

/// Fetcher configured with the retain list, progress interval and transfer
/// timeout.
pub fn build_fetcher(settings: &SyncSettings) -> Result<AssetFetcher, CliError> {
    let client = http_client(settings.request_timeout)?;
    Ok(AssetFetcher::new(client)
        .with_retain(settings.retain.iter().copied())
        .with_progress_interval(Duration::from_millis(settings.progress_interval_ms)))
}

/// Validate a concurrency value from the command line.
pub fn check_concurrency(value: usize) -> Result<usize, CliError> {
    if (1..=MAX_CONCURRENCY).contains(&value) {
        Ok(value)
    } else {
        Err(CliError::InvalidArgument(format!(
            "--concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, value
        )))
    }
}
