//! Candidate sources for the caching server address.
//!
//! Each source produces at most one candidate. The resolver tries them in
//! order and keeps the first one that answers the liveness probe.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tracing::debug;

use super::types::CacheServer;

/// Configuration written by the macOS caching service on the host itself.
pub const DEFAULT_HOST_CONFIG: &str = "/Library/Server/Caching/Config/Config.plist";

/// Host utility that lists caching servers advertised on the network.
pub const DEFAULT_LOCATOR_COMMAND: &str = "AssetCacheLocatorUtil";

/// Address used when nothing else is found.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:49672";

/// A strategy that may produce a caching server candidate.
pub trait CandidateSource: Send + Sync {
    /// Short name used in logs and events.
    fn name(&self) -> &'static str;

    /// The candidate this source proposes, if any.
    fn candidate(&self) -> Option<CacheServer>;
}

/// Asks the host whether it runs a caching service itself, and on which port.
#[derive(Debug, Clone)]
pub struct HostCachingService {
    config_path: PathBuf,
}

impl HostCachingService {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for HostCachingService {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_CONFIG)
    }
}

/// Extract the listening port from a caching service property list.
pub fn parse_host_config(bytes: &[u8]) -> Option<u16> {
    let value = plist::Value::from_reader(Cursor::new(bytes)).ok()?;
    let port = value.as_dictionary()?.get("Port")?;

    port.as_unsigned_integer()
        .or_else(|| port.as_signed_integer().and_then(|p| u64::try_from(p).ok()))
        .or_else(|| port.as_string().and_then(|s| s.trim().parse().ok()))
        .and_then(|p| u16::try_from(p).ok())
        .filter(|p| *p != 0)
}

impl CandidateSource for HostCachingService {
    fn name(&self) -> &'static str {
        "host-service"
    }

    fn candidate(&self) -> Option<CacheServer> {
        let bytes = std::fs::read(&self.config_path).ok()?;
        match parse_host_config(&bytes) {
            Some(port) => {
                debug!(port, "Local machine appears to be a caching server");
                Some(CacheServer::new("http", "localhost", port))
            }
            None => {
                debug!(
                    path = %self.config_path.display(),
                    "Caching service config has no usable port"
                );
                None
            }
        }
    }
}

/// Asks the host's discovery utility for a caching server on the network.
#[derive(Debug, Clone)]
pub struct NetworkDiscovery {
    command: String,
}

impl NetworkDiscovery {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for NetworkDiscovery {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATOR_COMMAND)
    }
}

/// Pick a server from the locator utility's JSON report.
///
/// Servers can appear under several keys (system, current user, saved
/// servers), so every object carrying a `hostport` is considered. Servers
/// reported unhealthy are skipped; a `favored` server wins over the rest.
pub fn parse_locator_output(bytes: &[u8]) -> Option<CacheServer> {
    let value: Value = serde_json::from_slice(bytes).ok()?;

    let mut found = Vec::new();
    collect_servers(&value, &mut found);

    let healthy: Vec<&Value> = found
        .into_iter()
        .filter(|s| s.get("healthy").and_then(Value::as_bool) != Some(false))
        .collect();

    let chosen = healthy
        .iter()
        .find(|s| s.get("favored").and_then(Value::as_bool) == Some(true))
        .or_else(|| healthy.first())?;

    let hostport = chosen.get("hostport")?.as_str()?;
    let (host, port) = hostport.rsplit_once(':')?;
    let port = port.parse::<u16>().ok()?;
    Some(CacheServer::new("http", host, port))
}

fn collect_servers<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if map.get("hostport").and_then(Value::as_str).is_some() {
                out.push(value);
            }
            for child in map.values() {
                collect_servers(child, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_servers(child, out);
            }
        }
        _ => {}
    }
}

impl CandidateSource for NetworkDiscovery {
    fn name(&self) -> &'static str {
        "network-discovery"
    }

    fn candidate(&self) -> Option<CacheServer> {
        let output = match Command::new(&self.command).arg("--json").output() {
            Ok(output) => output,
            Err(e) => {
                debug!(command = %self.command, error = %e, "Discovery utility unavailable");
                return None;
            }
        };
        if !output.status.success() {
            debug!(command = %self.command, status = %output.status, "Discovery utility failed");
            return None;
        }
        parse_locator_output(&output.stdout)
    }
}

/// A fixed, well-known address.
#[derive(Debug, Clone)]
pub struct DefaultAddress {
    url: String,
}

impl DefaultAddress {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for DefaultAddress {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

impl CandidateSource for DefaultAddress {
    fn name(&self) -> &'static str {
        "default"
    }

    fn candidate(&self) -> Option<CacheServer> {
        CacheServer::parse(&self.url).ok()
    }
}

/// The standard fallback chain: host service, network discovery, default.
pub fn default_sources(
    host_config: impl Into<PathBuf>,
    locator_command: impl Into<String>,
    default_url: impl Into<String>,
) -> Vec<Box<dyn CandidateSource>> {
    vec![
        Box::new(HostCachingService::new(host_config)),
        Box::new(NetworkDiscovery::new(locator_command)),
        Box::new(DefaultAddress::new(default_url)),
    ]
}
