//! Firmware (IPSW) feed.
//!
//! One JSON document per device, listing the firmware images published for
//! it. The document shape follows the public ipsw.me v4 device endpoint.

use serde::Deserialize;
use tracing::debug;

use super::asset::{device_family, Asset, AssetKind};
use super::feed::{FeedError, FeedSource};

/// Default firmware API root.
pub const DEFAULT_IPSW_API: &str = "https://api.ipsw.me/v4";

#[derive(Debug, Deserialize)]
struct DeviceDocument {
    identifier: String,
    #[serde(default)]
    firmwares: Vec<Firmware>,
}

#[derive(Debug, Deserialize)]
struct Firmware {
    identifier: Option<String>,
    version: String,
    url: String,
    filesize: Option<u64>,
}

/// Firmware list for a single device.
#[derive(Debug, Clone)]
pub struct IpswFeed {
    name: String,
    device: String,
    url: String,
}

impl IpswFeed {
    pub fn for_device(api_base: &str, device: &str) -> Self {
        Self {
            name: format!("ipsw-{}", device),
            device: device.to_string(),
            url: format!(
                "{}/device/{}?type=ipsw",
                api_base.trim_end_matches('/'),
                device
            ),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl FeedSource for IpswFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn parse(&self, bytes: &[u8]) -> Result<Vec<Asset>, FeedError> {
        let document: DeviceDocument =
            serde_json::from_slice(bytes).map_err(|e| FeedError::Malformed {
                feed: self.name.clone(),
                reason: e.to_string(),
            })?;

        let assets: Vec<Asset> = document
            .firmwares
            .into_iter()
            .map(|fw| {
                let identifier = fw.identifier.unwrap_or_else(|| document.identifier.clone());
                let family = device_family(&identifier);
                Asset::new(identifier.as_str(), AssetKind::Ipsw, fw.version, fw.url)
                    .with_size(fw.filesize)
                    .with_group("ipsw")
                    .with_groups(family)
            })
            .collect();

        debug!(feed = %self.name, assets = assets.len(), "Parsed firmware feed");
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "iPad Pro (9.7-inch) (WiFi)",
        "identifier": "iPad6,7",
        "firmwares": [
            {
                "identifier": "iPad6,7",
                "version": "10.1",
                "buildid": "14B72",
                "url": "http://appldnld.apple.com/ios10.1/iPad_Pro_HFR_10.1_14B72_Restore.ipsw",
                "filesize": 2147483648,
                "signed": true
            },
            {
                "version": "10.0.2",
                "url": "http://appldnld.apple.com/ios10.0.2/iPad_Pro_HFR_10.0.2_Restore.ipsw"
            }
        ]
    }"#;

    #[test]
    fn test_device_url() {
        let feed = IpswFeed::for_device("https://api.ipsw.me/v4/", "iPad6,7");
        assert_eq!(feed.url(), "https://api.ipsw.me/v4/device/iPad6,7?type=ipsw");
        assert_eq!(feed.name(), "ipsw-iPad6,7");
        assert_eq!(feed.device(), "iPad6,7");
    }

    #[test]
    fn test_parse_firmwares() {
        let feed = IpswFeed::for_device(DEFAULT_IPSW_API, "iPad6,7");
        let assets = feed.parse(SAMPLE.as_bytes()).unwrap();

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].identifier, "iPad6,7");
        assert_eq!(assets[0].kind, AssetKind::Ipsw);
        assert_eq!(assets[0].version, "10.1");
        assert_eq!(assets[0].size_bytes, Some(2_147_483_648));
        assert!(assets[0].groups.contains("ipsw"));
        assert!(assets[0].groups.contains("iPad"));

        // Falls back to the device identifier
        assert_eq!(assets[1].identifier, "iPad6,7");
        assert_eq!(assets[1].size_bytes, None);
    }

    #[test]
    fn test_parse_malformed() {
        let feed = IpswFeed::for_device(DEFAULT_IPSW_API, "iPad6,7");
        let err = feed.parse(b"{\"firmwares\": 12}").unwrap_err();
        assert!(matches!(err, FeedError::Malformed { .. }));
    }
}
