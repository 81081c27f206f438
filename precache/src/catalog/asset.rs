//! Asset and catalog types.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::feed::FeedError;
use super::version::compare_versions;

/// Kind of cacheable artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    /// Over-the-air software update.
    Ota,
    /// Full device firmware image.
    Ipsw,
    /// Full macOS installer.
    MacosInstaller,
    /// Mac App Store application.
    AppStoreApp,
    /// macOS combo update.
    ComboUpdate,
}

impl AssetKind {
    /// All kinds, in display order.
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Ota,
        AssetKind::Ipsw,
        AssetKind::MacosInstaller,
        AssetKind::AppStoreApp,
        AssetKind::ComboUpdate,
    ];

    /// Stable lowercase name used in config files and tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Ota => "ota",
            AssetKind::Ipsw => "ipsw",
            AssetKind::MacosInstaller => "macos-installer",
            AssetKind::AppStoreApp => "app-store-app",
            AssetKind::ComboUpdate => "combo-update",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        AssetKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown asset kind '{}'", s))
    }
}

/// Uniqueness key of an asset within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey {
    pub identifier: String,
    pub kind: AssetKind,
    pub version: String,
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.identifier, self.version, self.kind)
    }
}

/// One cacheable artifact.
///
/// `identifier` is a model code, app name or installer name, compared
/// case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    pub identifier: String,
    pub kind: AssetKind,
    pub version: String,
    /// Upstream location before proxying.
    pub source_url: String,
    /// Payload size, when the feed states it.
    pub size_bytes: Option<u64>,
    pub groups: BTreeSet<String>,
    /// Flagged pre-release by the feed.
    pub prerelease: bool,
}

impl Asset {
    pub fn new(
        identifier: impl Into<String>,
        kind: AssetKind,
        version: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            version: version.into(),
            source_url: source_url.into(),
            size_bytes: None,
            groups: BTreeSet::new(),
            prerelease: false,
        }
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size_bytes = size;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn with_prerelease(mut self, prerelease: bool) -> Self {
        self.prerelease = prerelease;
        self
    }

    pub fn key(&self) -> AssetKey {
        AssetKey {
            identifier: self.identifier.clone(),
            kind: self.kind,
            version: self.version.clone(),
        }
    }

    /// Local file name: the last path segment of the source URL.
    pub fn file_name(&self) -> Option<String> {
        let without_query = self.source_url.split(['?', '#']).next()?;
        let name = without_query.rsplit('/').next()?;
        if name.is_empty() || name == "." || name == ".." {
            None
        } else {
            Some(name.to_string())
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.identifier, self.version, self.kind)
    }
}

/// Device family tag derived from a model identifier prefix.
pub fn device_family(identifier: &str) -> Option<&'static str> {
    const FAMILIES: [&str; 6] = ["iPhone", "iPad", "iPod", "AppleTV", "Watch", "AudioAccessory"];
    FAMILIES
        .into_iter()
        .find(|family| identifier.starts_with(*family))
}

/// Ordered, de-duplicated assets built once per run.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    assets: Vec<Asset>,
    warnings: Vec<FeedError>,
}

impl Catalog {
    /// Build a catalog from assets in source order.
    ///
    /// Entries sharing identifier, kind and release channel collapse to one:
    /// the newer version wins and takes the slot of the first occurrence;
    /// on equal versions the first-seen entry stays and absorbs the other's
    /// group tags. A pre-release entry with the same version as the stable
    /// one is then folded into the stable entry.
    pub fn from_assets<I>(assets: I) -> Self
    where
        I: IntoIterator<Item = Asset>,
    {
        let mut slots: HashMap<(String, AssetKind, bool), usize> = HashMap::new();
        let mut merged: Vec<Asset> = Vec::new();

        for asset in assets {
            let slot_key = (asset.identifier.clone(), asset.kind, asset.prerelease);
            match slots.get(&slot_key).copied() {
                None => {
                    slots.insert(slot_key, merged.len());
                    merged.push(asset);
                }
                Some(index) => {
                    let existing = &mut merged[index];
                    match compare_versions(&asset.version, &existing.version) {
                        std::cmp::Ordering::Greater => *existing = asset,
                        std::cmp::Ordering::Equal => {
                            existing.groups.extend(asset.groups);
                            if existing.size_bytes.is_none() {
                                existing.size_bytes = asset.size_bytes;
                            }
                        }
                        std::cmp::Ordering::Less => {}
                    }
                }
            }
        }

        // A pre-release entry matching a stable version is the same asset.
        let mut folded = vec![false; merged.len()];
        for index in 0..merged.len() {
            if !merged[index].prerelease {
                continue;
            }
            let stable_key = (merged[index].identifier.clone(), merged[index].kind, false);
            let Some(&stable) = slots.get(&stable_key) else {
                continue;
            };
            if compare_versions(&merged[index].version, &merged[stable].version)
                != std::cmp::Ordering::Equal
            {
                continue;
            }
            let groups = std::mem::take(&mut merged[index].groups);
            let size = merged[index].size_bytes;
            let target = &mut merged[stable];
            target.groups.extend(groups);
            if target.size_bytes.is_none() {
                target.size_bytes = size;
            }
            folded[index] = true;
        }

        let assets = merged
            .into_iter()
            .zip(folded)
            .filter_map(|(asset, folded)| (!folded).then_some(asset))
            .collect();

        Self {
            assets,
            warnings: Vec::new(),
        }
    }

    /// Attach non-fatal feed warnings.
    pub fn with_warnings(mut self, warnings: Vec<FeedError>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Asset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Feed failures recorded while the catalog was built.
    pub fn warnings(&self) -> &[FeedError] {
        &self.warnings
    }

    /// Sorted, distinct identifiers of the given kind.
    pub fn identifiers(&self, kind: AssetKind) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .assets
            .iter()
            .filter(|a| a.kind == kind)
            .map(|a| a.identifier.as_str())
            .collect();
        set.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Asset;
    type IntoIter = std::slice::Iter<'a, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}
