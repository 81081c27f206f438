//! INI parsing: the single place where key names map to struct fields.

use std::path::PathBuf;

use ini::{Ini, Properties};

use super::defaults::MAX_CONCURRENCY;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::catalog::{AssetKind, OTA_CHANNELS};
use crate::server::CacheServer;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Non-empty trimmed value of `key`.
fn value<'a>(props: &'a Properties, key: &str) -> Option<&'a str> {
    props.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_u64(section: &str, key: &str, v: &str, unit: &str) -> Result<u64, ConfigFileError> {
    match v.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(
            section,
            key,
            v,
            &format!("must be a positive integer ({})", unit),
        )),
    }
}

fn parse_bool(section: &str, key: &str, v: &str) -> Result<bool, ConfigFileError> {
    match v.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, v, "must be true or false")),
    }
}

fn parse_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whitespace-separated list. Model identifiers contain commas.
fn parse_words(v: &str) -> Vec<String> {
    v.split_whitespace().map(str::to_string).collect()
}

fn check_url(section: &str, key: &str, v: &str) -> Result<String, ConfigFileError> {
    CacheServer::parse(v)
        .map(|_| v.to_string())
        .map_err(|e| invalid(section, key, v, &e.to_string()))
}

/// Parse an `Ini` into a `ConfigFile`, overlaying defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server]
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = value(section, "url") {
            config.server.url = Some(check_url("server", "url", v)?);
        }
        if let Some(v) = value(section, "liveness_path") {
            if !v.starts_with('/') {
                return Err(invalid("server", "liveness_path", v, "must start with '/'"));
            }
            config.server.liveness_path = v.to_string();
        }
        if let Some(v) = value(section, "timeout") {
            config.server.timeout = parse_u64("server", "timeout", v, "seconds")?;
        }
        if let Some(v) = value(section, "host_config") {
            config.server.host_config = expand_tilde(v);
        }
        if let Some(v) = value(section, "locator_command") {
            config.server.locator_command = v.to_string();
        }
        if let Some(v) = value(section, "default_url") {
            config.server.default_url = check_url("server", "default_url", v)?;
        }
    }

    // [feeds]
    if let Some(section) = ini.section(Some("feeds")) {
        if let Some(v) = value(section, "ota_base") {
            config.feeds.ota_base = v.to_string();
        }
        if let Some(v) = section.get("channels") {
            let channels = parse_list(v);
            if let Some(bad) = channels.iter().find(|c| !OTA_CHANNELS.contains(&c.as_str())) {
                return Err(invalid("feeds", "channels", bad, "must be a list of: ios, tv, watch"));
            }
            config.feeds.channels = channels;
        }
        if let Some(v) = value(section, "ipsw_api") {
            config.feeds.ipsw_api = v.to_string();
        }
        if let Some(v) = section.get("ipsw_devices") {
            config.feeds.ipsw_devices = parse_words(v);
        }
        if let Some(v) = value(section, "table") {
            config.feeds.table = Some(expand_tilde(v));
        }
        if let Some(v) = value(section, "timeout") {
            config.feeds.timeout = parse_u64("feeds", "timeout", v, "seconds")?;
        }
    }

    // [sync]
    if let Some(section) = ini.section(Some("sync")) {
        if let Some(v) = value(section, "output_dir") {
            config.sync.output_dir = expand_tilde(v);
        }
        if let Some(v) = value(section, "exclude_beta") {
            config.sync.exclude_beta = parse_bool("sync", "exclude_beta", v)?;
        }
        if let Some(v) = value(section, "concurrency") {
            config.sync.concurrency = match v.parse::<usize>() {
                Ok(n) if (1..=MAX_CONCURRENCY).contains(&n) => n,
                _ => {
                    return Err(invalid(
                        "sync",
                        "concurrency",
                        v,
                        &format!("must be between 1 and {}", MAX_CONCURRENCY),
                    ))
                }
            };
        }
        if let Some(v) = value(section, "progress_interval_ms") {
            config.sync.progress_interval_ms =
                parse_u64("sync", "progress_interval_ms", v, "milliseconds")?;
        }
        if let Some(v) = section.get("retain") {
            config.sync.retain = parse_list(v)
                .iter()
                .map(|kind| {
                    kind.parse::<AssetKind>()
                        .map_err(|reason| invalid("sync", "retain", kind, &reason))
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = value(section, "request_timeout") {
            config.sync.request_timeout = parse_u64("sync", "request_timeout", v, "seconds")?;
        }
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = value(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = value(section, "file") {
            config.logging.file = v.to_string();
        }
        if let Some(v) = value(section, "level") {
            config.logging.level = v.to_string();
        }
    }

    Ok(config)
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
