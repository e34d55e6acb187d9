//! Rendered-page cache configuration.

use std::num::NonZeroUsize;

use serde::Deserialize;

const DEFAULT_PAGE_LIMIT: usize = 200;

/// Controls the rendered-page cache layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the rendered-page cache.
    pub enabled: bool,
    /// Maximum cached responses before LRU eviction.
    pub page_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            page_limit: settings.page_limit,
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Page limit as `NonZeroUsize`, clamping zero to one.
    pub fn page_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.page_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
