//! Revalidation trigger.
//!
//! The thin seam between the webhook endpoints and the rendered-page cache:
//! given an already-validated path, mark it stale so the next request
//! regenerates it.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info};

use super::config::CacheConfig;
use super::store::PageStore;

/// Marks rendered pages stale on behalf of revalidation webhooks.
pub struct RevalidateTrigger {
    config: CacheConfig,
    pages: Arc<PageStore>,
}

impl RevalidateTrigger {
    pub fn new(config: CacheConfig, pages: Arc<PageStore>) -> Self {
        Self { config, pages }
    }

    /// Drop every cached response for `path`. Returns the number of entries
    /// evicted; zero is normal when the page was never cached or the cache
    /// is disabled.
    pub fn revalidate(&self, path: &str) -> usize {
        if !self.config.is_enabled() {
            debug!(path, "revalidation skipped: cache disabled");
            return 0;
        }

        let evicted = self.pages.invalidate_path(path);
        counter!("foglio_revalidate_total").increment(1);
        info!(path, evicted, "page revalidated");
        evicted
    }
}
