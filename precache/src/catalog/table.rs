//! Static metadata table.
//!
//! Full macOS installers are not published through a feed, so a fixed set is
//! compiled in. Deployments can extend it with a JSON table file listing
//! further installers, App Store apps or combo updates.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::asset::{Asset, AssetKind};
use super::feed::FeedError;

const MAS_ROOT: &str = "http://osxapps.itunes.apple.com/apple-assets-us-std-000001";

/// Built-in installers: (name, version, path under the App Store asset root).
const BUILTIN_INSTALLERS: [(&str, &str, &str); 5] = [
    (
        "MountainLion",
        "10.8.5",
        "Purple69/v4/5f/05/f7/5f05f76f-e0f8-62ef-5510-86cd3aed985d/encrypted3324837209255448993.pkg",
    ),
    (
        "Mavericks",
        "10.9.5",
        "Purple49/v4/a5/ef/b4/a5efb468-7f48-1395-d8e4-2194ba4d688a/encrypted5063122388219779779.pkg",
    ),
    (
        "Yosemite",
        "10.10.5",
        "Purple69/v4/61/cb/04/61cb0419-ba73-70c1-02ce-b1cee2f2269c/encrypted8769637421434146660.pkg",
    ),
    (
        "ElCapitan",
        "10.11.6",
        "Purple20/v4/dc/94/05/dc940501-f06f-2a91-555e-3dc272653af5/izt4803713449411067066.pkg",
    ),
    (
        "Sierra",
        "10.12.0",
        "Purple62/v4/af/5f/9d/af5f9d8e-cf9c-8147-c51c-c3c1fececb99/jze1425880974225146329.pkg",
    ),
];

#[derive(Debug, Deserialize)]
struct TableRow {
    name: String,
    kind: AssetKind,
    version: String,
    url: String,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default)]
    size: Option<u64>,
}

impl From<TableRow> for Asset {
    fn from(row: TableRow) -> Self {
        let mut asset = Asset::new(row.name, row.kind, row.version, row.url)
            .with_size(row.size)
            .with_groups(row.groups);
        if asset.kind == AssetKind::MacosInstaller {
            asset = asset.with_group("installer");
        }
        asset
    }
}

/// Read-only lookup table of assets that have no feed.
#[derive(Debug, Clone, Default)]
pub struct StaticTable {
    extra: Option<PathBuf>,
}

impl StaticTable {
    /// Built-in installers only.
    pub fn builtin() -> Self {
        Self { extra: None }
    }

    /// Built-in installers plus the rows of a JSON table file.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            extra: Some(path.into()),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.extra.as_deref()
    }

    /// All table assets, built-ins first.
    ///
    /// A missing or unreadable table file yields the built-ins plus a
    /// warning; it never fails the catalog.
    pub fn load(&self) -> (Vec<Asset>, Option<FeedError>) {
        let mut assets = builtin_installers();
        let Some(path) = &self.extra else {
            return (assets, None);
        };

        match read_table(path) {
            Ok(rows) => {
                assets.extend(rows);
                (assets, None)
            }
            Err(err) => (assets, Some(err)),
        }
    }
}

fn builtin_installers() -> Vec<Asset> {
    BUILTIN_INSTALLERS
        .iter()
        .map(|(name, version, path)| {
            Asset::new(*name, AssetKind::MacosInstaller, *version, format!("{}/{}", MAS_ROOT, path))
                .with_group("installer")
        })
        .collect()
}

fn read_table(path: &Path) -> Result<Vec<Asset>, FeedError> {
    let feed = format!("table:{}", path.display());
    let bytes = std::fs::read(path).map_err(|e| FeedError::Unavailable {
        feed: feed.clone(),
        reason: e.to_string(),
    })?;
    let rows: Vec<TableRow> = serde_json::from_slice(&bytes).map_err(|e| FeedError::Malformed {
        feed,
        reason: e.to_string(),
    })?;
    Ok(rows.into_iter().map(Asset::from).collect())
}
