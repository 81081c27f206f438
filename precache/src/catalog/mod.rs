//! Asset catalog.
//!
//! The catalog is the ordered, de-duplicated list of every asset the run
//! could cache. It is assembled once per run by [`CatalogProvider`] from:
//!
//! - the software update feeds ([`OtaFeed`], one per channel),
//! - the firmware feed ([`IpswFeed`], one per device),
//! - the [`StaticTable`] of installers and apps that have no feed.
//!
//! Feed failures degrade the catalog rather than failing the run.

mod asset;
mod feed;
mod ipsw;
mod ota;
mod provider;
mod table;
mod version;

pub use asset::{device_family, Asset, AssetKey, AssetKind, Catalog};
pub use feed::{FeedError, FeedSource};
pub use ipsw::{IpswFeed, DEFAULT_IPSW_API};
pub use ota::{OtaFeed, DEFAULT_OTA_BASE, OTA_CHANNELS};
pub use provider::CatalogProvider;
pub use table::StaticTable;
pub use version::{compare_versions, parse_lenient};
