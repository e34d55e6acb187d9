//! Request-scoped fetch memoization.
//!
//! One page render touches the same article twice: once to shape the SEO
//! head and once for the body. `FetchCache` keys outcomes by
//! `(slug, endpoint)` so the second touch joins the first instead of
//! issuing another backend call. A cache is constructed at the top of each
//! inbound request and dropped with it; nothing leaks across requests.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::domain::article::ArticleContent;

use super::content::StoreError;

/// Shared outcome of a memoized fetch. Both arms are `Arc`ed so every caller
/// within the request observes the same allocation.
pub type SharedFetch = Result<Arc<ArticleContent>, Arc<StoreError>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FetchKey {
    slug: String,
    endpoint: String,
}

/// Per-request memoizer for backend fetches.
#[derive(Default)]
pub struct FetchCache {
    entries: Mutex<HashMap<FetchKey, Arc<OnceCell<SharedFetch>>>>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized outcome for `(slug, endpoint)`, running `fetch`
    /// at most once. Concurrent callers for the same key join the in-flight
    /// fetch rather than starting their own.
    pub async fn get_or_fetch<F, Fut>(&self, slug: &str, endpoint: &str, fetch: F) -> SharedFetch
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ArticleContent, StoreError>>,
    {
        let key = FetchKey {
            slug: slug.to_string(),
            endpoint: endpoint.to_string(),
        };

        let cell = {
            let mut entries = self.entries.lock().await;
            entries.entry(key).or_default().clone()
        };

        cell.get_or_init(|| async { fetch().await.map(Arc::new).map_err(Arc::new) })
            .await
            .clone()
    }
}
