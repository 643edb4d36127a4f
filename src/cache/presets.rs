//! Named option presets for the storefront's entity groups.

use std::time::Duration;

use crate::cache::CacheOptions;

// == Cache Preset ==
/// A reusable `ttl + tag + stale-while-revalidate` combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePreset {
    pub name: &'static str,
    pub ttl: Duration,
    pub tag: &'static str,
    pub revalidate_on_stale: bool,
}

impl CachePreset {
    /// Catalog listings and product detail pages.
    pub const PRODUCTS: CachePreset = CachePreset {
        name: "products",
        ttl: Duration::from_secs(5 * 60),
        tag: "products",
        revalidate_on_stale: true,
    };

    /// Category tree and navigation; changes rarely.
    pub const CATEGORIES: CachePreset = CachePreset {
        name: "categories",
        ttl: Duration::from_secs(30 * 60),
        tag: "categories",
        revalidate_on_stale: true,
    };

    /// Store settings; only refreshed by explicit invalidation.
    pub const SETTINGS: CachePreset = CachePreset {
        name: "settings",
        ttl: Duration::from_secs(60 * 60),
        tag: "settings",
        revalidate_on_stale: false,
    };

    /// Order summaries in the back office.
    pub const ORDERS: CachePreset = CachePreset {
        name: "orders",
        ttl: Duration::from_secs(60),
        tag: "orders",
        revalidate_on_stale: false,
    };

    pub const ALL: [CachePreset; 4] = [
        Self::PRODUCTS,
        Self::CATEGORIES,
        Self::SETTINGS,
        Self::ORDERS,
    ];

    /// Looks a preset up by name.
    pub fn by_name(name: &str) -> Option<CachePreset> {
        Self::ALL.into_iter().find(|preset| preset.name == name)
    }

    /// Builds call options for this preset.
    pub fn options(&self) -> CacheOptions {
        CacheOptions::new()
            .with_ttl(self.ttl)
            .with_tags([self.tag])
            .revalidate_on_stale(self.revalidate_on_stale)
    }

    /// Options for this preset with extra tags, e.g. a per-entity tag.
    pub fn options_with<I, S>(&self, extra_tags: I) -> CacheOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = self.options();
        options.tags.extend(extra_tags.into_iter().map(Into::into));
        options
    }
}
