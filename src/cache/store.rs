//! Rendered-page cache storage.
//!
//! One LRU map keyed by request path and query, holding fully materialized
//! HTTP responses for public GET routes.

use std::sync::{PoisonError, RwLock};

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use tracing::warn;

use super::config::CacheConfig;

/// Recover a poisoned lock. The cache holds only regenerable data; a stale
/// view after a panic in another thread is acceptable.
fn recover<G>(result: Result<G, PoisonError<G>>, op: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(op, "page cache lock poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Key for one cached response: the request path plus its raw query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub path: String,
    pub query: String,
}

impl PageKey {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
        }
    }
}

/// A fully materialized cached response.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// LRU store for rendered pages.
pub struct PageStore {
    pages: RwLock<LruCache<PageKey, CachedPage>>,
}

impl PageStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            pages: RwLock::new(LruCache::new(config.page_limit_non_zero())),
        }
    }

    pub fn get(&self, key: &PageKey) -> Option<CachedPage> {
        let hit = recover(self.pages.write(), "get").get(key).cloned();
        match hit {
            Some(page) => {
                counter!("foglio_page_cache_hit_total").increment(1);
                Some(page)
            }
            None => {
                counter!("foglio_page_cache_miss_total").increment(1);
                None
            }
        }
    }

    pub fn set(&self, key: PageKey, page: CachedPage) {
        let mut pages = recover(self.pages.write(), "set");
        if pages.len() == pages.cap().get() && !pages.contains(&key) {
            counter!("foglio_page_cache_evict_total").increment(1);
        }
        pages.put(key, page);
    }

    /// Drop every cached response whose path equals `path`, regardless of
    /// query string. Returns the number of evicted entries.
    pub fn invalidate_path(&self, path: &str) -> usize {
        let mut pages = recover(self.pages.write(), "invalidate_path");
        let stale: Vec<PageKey> = pages
            .iter()
            .filter(|(key, _)| key.path == path)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            pages.pop(key);
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        recover(self.pages.read(), "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
