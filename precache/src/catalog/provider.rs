//! Catalog assembly from feeds and the static table.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::asset::{Asset, Catalog};
use super::feed::{FeedError, FeedSource};
use super::ipsw::IpswFeed;
use super::ota::OtaFeed;
use super::table::StaticTable;
use crate::http::HttpClient;

/// Builds the per-run [`Catalog`].
///
/// Feeds are fetched in registration order and the static table is merged in
/// last. A feed that cannot be fetched or parsed contributes nothing and is
/// recorded as a warning on the catalog.
pub struct CatalogProvider {
    client: Arc<dyn HttpClient>,
    feeds: Vec<Box<dyn FeedSource>>,
    table: Option<StaticTable>,
}

impl CatalogProvider {
    /// Provider with no feeds and no table.
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            feeds: Vec::new(),
            table: None,
        }
    }

    /// Register a feed source.
    pub fn with_feed(mut self, feed: impl FeedSource + 'static) -> Self {
        self.feeds.push(Box::new(feed));
        self
    }

    /// Register the software update feed for each channel.
    pub fn with_ota_channels<I, S>(mut self, base: &str, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for channel in channels {
            self.feeds
                .push(Box::new(OtaFeed::for_channel(base, channel.as_ref())));
        }
        self
    }

    /// Register the firmware feed for each device.
    pub fn with_ipsw_devices<I, S>(mut self, api_base: &str, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for device in devices {
            self.feeds
                .push(Box::new(IpswFeed::for_device(api_base, device.as_ref())));
        }
        self
    }

    /// Merge the static table into every catalog.
    pub fn with_table(mut self, table: StaticTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Names of the registered feeds, in fetch order.
    pub fn feed_names(&self) -> Vec<&str> {
        self.feeds.iter().map(|f| f.name()).collect()
    }

    /// Fetch every feed, merge the table and de-duplicate.
    ///
    /// Never fails; see [`Catalog::warnings`] for what went wrong.
    pub fn build_catalog(&self) -> Catalog {
        let mut assets: Vec<Asset> = Vec::new();
        let mut warnings: Vec<FeedError> = Vec::new();

        for feed in &self.feeds {
            match self.load_feed(feed.as_ref()) {
                Ok(found) => {
                    debug!(feed = feed.name(), assets = found.len(), "Feed loaded");
                    assets.extend(found);
                }
                Err(err) => {
                    warn!(feed = feed.name(), error = %err, "Feed skipped");
                    warnings.push(err);
                }
            }
        }

        if let Some(table) = &self.table {
            let (rows, warning) = table.load();
            debug!(assets = rows.len(), "Static table loaded");
            assets.extend(rows);
            if let Some(err) = warning {
                warn!(error = %err, "Static table file skipped");
                warnings.push(err);
            }
        }

        let catalog = Catalog::from_assets(assets).with_warnings(warnings);
        info!(
            assets = catalog.len(),
            warnings = catalog.warnings().len(),
            "Catalog built"
        );
        catalog
    }

    fn load_feed(&self, feed: &dyn FeedSource) -> Result<Vec<Asset>, FeedError> {
        let bytes = self
            .client
            .get(feed.url())
            .map_err(|e| FeedError::Unavailable {
                feed: feed.name().to_string(),
                reason: e.to_string(),
            })?;
        feed.parse(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssetKind;
    use crate::http::{MockHttpClient, MockResponse};

    const IPSW_API: &str = "http://ipsw.test/v4";

    fn ipsw_doc() -> &'static str {
        r#"{"identifier": "iPad6,7", "firmwares": [
            {"version": "10.1", "url": "http://appldnld.apple.com/ios10.1/iPad_10.1_Restore.ipsw", "filesize": 64}
        ]}"#
    }

    #[test]
    fn test_build_catalog_merges_feeds_and_table() {
        let mock = Arc::new(MockHttpClient::new());
        mock.on_get(
            "http://ipsw.test/v4/device/iPad6,7?type=ipsw",
            MockResponse::ok(ipsw_doc()),
        );

        let provider = CatalogProvider::new(mock.clone())
            .with_ipsw_devices(IPSW_API, ["iPad6,7"])
            .with_table(StaticTable::builtin());
        let catalog = provider.build_catalog();

        assert!(catalog.warnings().is_empty());
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.assets()[0].identifier, "iPad6,7");
        assert_eq!(catalog.assets()[0].kind, AssetKind::Ipsw);
        assert_eq!(catalog.identifiers(AssetKind::MacosInstaller).len(), 5);
    }

    #[test]
    fn test_unreachable_feed_is_a_warning() {
        let mock = Arc::new(MockHttpClient::new());
        let provider = CatalogProvider::new(mock.clone())
            .with_ota_channels("http://mesu.test/assets", ["ios", "tv"])
            .with_table(StaticTable::builtin());

        let catalog = provider.build_catalog();

        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.warnings().len(), 2);
        assert!(matches!(
            &catalog.warnings()[0],
            FeedError::Unavailable { feed, .. } if feed == "ota-ios"
        ));
        assert_eq!(mock.count_matching("mesu.test"), 2);
    }

    #[test]
    fn test_malformed_feed_is_a_warning() {
        let mock = Arc::new(MockHttpClient::new());
        mock.on_get(
            "http://ipsw.test/v4/device/iPad6,7?type=ipsw",
            MockResponse::ok("<html>oops</html>"),
        );
        let provider = CatalogProvider::new(mock).with_ipsw_devices(IPSW_API, ["iPad6,7"]);

        let catalog = provider.build_catalog();

        assert!(catalog.is_empty());
        assert!(matches!(catalog.warnings()[0], FeedError::Malformed { .. }));
    }

    #[test]
    fn test_error_status_is_unavailable() {
        let mock = Arc::new(MockHttpClient::new());
        mock.on_get(
            "http://ipsw.test/v4/device/iPad6,7?type=ipsw",
            MockResponse::status(404),
        );
        let provider = CatalogProvider::new(mock).with_ipsw_devices(IPSW_API, ["iPad6,7"]);

        let catalog = provider.build_catalog();
        assert!(matches!(
            &catalog.warnings()[0],
            FeedError::Unavailable { reason, .. } if reason.contains("404")
        ));
    }

    #[test]
    fn test_feed_names_in_order() {
        let provider = CatalogProvider::new(Arc::new(MockHttpClient::new()))
            .with_ota_channels("http://mesu.test/assets", ["ios", "watch"])
            .with_ipsw_devices(IPSW_API, ["iPad6,7"]);
        assert_eq!(provider.feed_names(), vec!["ota-ios", "ota-watch", "ipsw-iPad6,7"]);
    }
}
