//! Asset selection.
//!
//! Selection is a pure function of the catalog and the criteria. Explicit
//! identifiers and group tags are unioned; the kind and pre-release filters
//! are then applied to that union. Empty criteria select everything.

use std::collections::{BTreeSet, HashSet};

use crate::catalog::{Asset, AssetKind, Catalog};

/// What the operator asked to cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Identifiers to keep (model codes, installer or app names).
    pub models: BTreeSet<String>,
    /// Group tags to keep.
    pub groups: BTreeSet<String>,
    /// Keep firmware images only.
    pub ipsw_only: bool,
    /// Drop assets the feed flags as pre-release.
    pub exclude_beta: bool,
}

impl SelectionCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models.extend(models.into_iter().map(Into::into));
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

    pub fn ipsw_only(mut self, enabled: bool) -> Self {
        self.ipsw_only = enabled;
        self
    }

    pub fn exclude_beta(mut self, enabled: bool) -> Self {
        self.exclude_beta = enabled;
        self
    }

    /// True when neither identifiers nor groups were given.
    pub fn is_unrestricted(&self) -> bool {
        self.models.is_empty() && self.groups.is_empty()
    }

    fn wants(&self, asset: &Asset) -> bool {
        let named = self.is_unrestricted()
            || self.models.contains(&asset.identifier)
            || asset.groups.iter().any(|g| self.groups.contains(g));
        if !named {
            return false;
        }
        if self.ipsw_only && asset.kind != AssetKind::Ipsw {
            return false;
        }
        !(self.exclude_beta && asset.prerelease)
    }
}

/// Assets in `catalog` matching `criteria`, in catalog order.
pub fn select(catalog: &Catalog, criteria: &SelectionCriteria) -> Vec<Asset> {
    let mut seen = HashSet::new();
    catalog
        .iter()
        .filter(|asset| criteria.wants(asset))
        .filter(|asset| seen.insert(*asset))
        .cloned()
        .collect()
}
