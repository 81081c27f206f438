//! Software update (OTA) feed for iOS, tvOS and watchOS.
//!
//! The feed is an XML property list whose `Assets` array lists one entry per
//! update payload. Entries name the devices they apply to, the OS version and
//! either a full `RealUpdateURL` or a base URL plus relative path.

use serde::Deserialize;
use tracing::debug;

use super::asset::{device_family, Asset, AssetKind};
use super::feed::{FeedError, FeedSource};

/// Default root of the software update feeds.
pub const DEFAULT_OTA_BASE: &str = "http://mesu.apple.com/assets";

/// Channels with a published feed.
pub const OTA_CHANNELS: [&str; 3] = ["ios", "tv", "watch"];

const ASSET_PATH: &str = "com_apple_MobileAsset_SoftwareUpdate";
const FEED_FILE: &str = "com_apple_MobileAsset_SoftwareUpdate.xml";

#[derive(Debug, Deserialize)]
struct OtaDocument {
    #[serde(rename = "Assets", default)]
    assets: Vec<OtaEntry>,
}

#[derive(Debug, Deserialize)]
struct OtaEntry {
    #[serde(rename = "SupportedDevices", default)]
    supported_devices: Vec<String>,
    #[serde(rename = "OSVersion")]
    os_version: Option<String>,
    #[serde(rename = "RealUpdateAttributes")]
    real_update: Option<RealUpdateAttributes>,
    #[serde(rename = "__BaseURL")]
    base_url: Option<String>,
    #[serde(rename = "__RelativePath")]
    relative_path: Option<String>,
    #[serde(rename = "__CanUseLocalCacheServer", default)]
    can_use_local_cache: bool,
    #[serde(rename = "ReleaseType")]
    release_type: Option<String>,
    #[serde(rename = "_DownloadSize")]
    download_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RealUpdateAttributes {
    #[serde(rename = "RealUpdateURL")]
    url: Option<String>,
}

impl OtaEntry {
    fn source_url(&self) -> Option<String> {
        if let Some(url) = self.real_update.as_ref().and_then(|r| r.url.clone()) {
            return Some(url);
        }
        match (&self.base_url, &self.relative_path) {
            (Some(base), Some(path)) => Some(format!("{}{}", base, path)),
            _ => None,
        }
    }

    fn is_beta(&self) -> bool {
        self.release_type.as_deref() == Some("Beta")
    }
}

/// One channel of the software update feed.
#[derive(Debug, Clone)]
pub struct OtaFeed {
    name: String,
    channel: String,
    url: String,
}

impl OtaFeed {
    /// Feed for `channel` under `base`.
    ///
    /// The `ios` feed lives at the root; other channels have their own
    /// subdirectory.
    pub fn for_channel(base: &str, channel: &str) -> Self {
        let base = base.trim_end_matches('/');
        let url = if channel == "ios" {
            format!("{}/{}/{}", base, ASSET_PATH, FEED_FILE)
        } else {
            format!("{}/{}/{}/{}", base, channel, ASSET_PATH, FEED_FILE)
        };
        Self {
            name: format!("ota-{}", channel),
            channel: channel.to_string(),
            url,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl FeedSource for OtaFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn parse(&self, bytes: &[u8]) -> Result<Vec<Asset>, FeedError> {
        let document: OtaDocument =
            plist::from_bytes(bytes).map_err(|e| FeedError::Malformed {
                feed: self.name.clone(),
                reason: e.to_string(),
            })?;

        let mut assets = Vec::new();
        for entry in &document.assets {
            let (Some(version), Some(url)) = (entry.os_version.as_ref(), entry.source_url()) else {
                debug!(feed = %self.name, "Skipping entry without version or URL");
                continue;
            };

            for device in &entry.supported_devices {
                // Watch payloads are served through the cache even when the
                // feed does not flag them.
                let is_watch = device.contains("Watch");
                if !is_watch && !entry.can_use_local_cache {
                    continue;
                }

                let mut asset = Asset::new(device.as_str(), AssetKind::Ota, version.as_str(), url.as_str())
                    .with_size(entry.download_size)
                    .with_prerelease(entry.is_beta())
                    .with_group(self.channel.as_str());
                if let Some(family) = device_family(device) {
                    asset = asset.with_group(family);
                }
                assets.push(asset);
            }
        }

        debug!(feed = %self.name, assets = assets.len(), "Parsed update feed");
        Ok(assets)
    }
}
