//! Remote CMS content store.
//!
//! Articles live in a spreadsheet published through a script-hosted HTTP
//! endpoint. One GET with `{endpoint, source, slug}` query parameters
//! returns the article body and metadata in a single envelope.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::domain::article::{ArticleContent, ArticleMetadata};
use crate::domain::slug::is_valid_cms_slug;

use super::{ContentStore, StoreError};

/// Endpoint selector for a single-article fetch.
pub const DEFAULT_ARTICLE_ENDPOINT: &str = "blog";
/// Endpoint selector for the article listing.
pub const DEFAULT_LIST_ENDPOINT: &str = "blogs";

/// Content store backed by the script-hosted CMS endpoint.
#[derive(Debug, Clone)]
pub struct CmsStore {
    client: reqwest::Client,
    script_url: Url,
    sheet_id: String,
}

/// Envelope returned by the script endpoint for a single article.
#[derive(Debug, Deserialize, Default)]
struct ArticleEnvelope {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    metadata: Option<ArticleMetadata>,
    #[serde(default)]
    content: Option<String>,
}

/// Envelope returned by the script endpoint for the listing.
#[derive(Debug, Deserialize, Default)]
struct ListEnvelope {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    items: Option<Vec<ArticleMetadata>>,
}

impl CmsStore {
    /// Build a store talking to `script_url` for the given data source.
    ///
    /// `timeout` bounds every outbound call; expiry surfaces as
    /// [`StoreError::BackendUnavailable`].
    pub fn new(script_url: Url, sheet_id: String, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            script_url,
            sheet_id,
        })
    }

    /// Fetch one article through the given endpoint selector.
    pub async fn fetch_from(
        &self,
        slug: &str,
        endpoint: &str,
    ) -> Result<ArticleContent, StoreError> {
        if !is_valid_cms_slug(slug) {
            return Err(StoreError::InvalidSlug);
        }

        let response = self
            .client
            .get(self.script_url.clone())
            .query(&[
                ("endpoint", endpoint),
                ("source", self.sheet_id.as_str()),
                ("slug", slug),
            ])
            .send()
            .await
            .map_err(StoreError::unavailable)?;

        let body = response.bytes().await.map_err(StoreError::unavailable)?;
        // An absent or empty response means the upstream has nothing for the
        // slug; treat it the same as an explicit error field.
        if body_is_empty(&body) {
            return Err(StoreError::NotFound);
        }

        let envelope: ArticleEnvelope = serde_json::from_slice(&body)
            .map_err(|err| StoreError::malformed(format!("cms response was not json: {err}")))?;

        if envelope.error.is_some() {
            debug!(slug, endpoint, "cms reported the article as absent");
            return Err(StoreError::NotFound);
        }

        let metadata = envelope
            .metadata
            .ok_or_else(|| StoreError::malformed("cms response carried no metadata object"))?;
        let html = envelope
            .content
            .ok_or_else(|| StoreError::malformed("cms response carried no content body"))?;

        if !metadata.has_required_fields() {
            return Err(StoreError::malformed(
                "title and description must be present and non-empty",
            ));
        }

        Ok(ArticleContent { html, metadata })
    }

    /// Fetch the article listing. An upstream error field or an empty
    /// response yields an empty list, mirroring how the listing is used:
    /// purely advisory navigation, never authoritative.
    pub async fn list(&self, endpoint: &str) -> Result<Vec<ArticleMetadata>, StoreError> {
        let response = self
            .client
            .get(self.script_url.clone())
            .query(&[("endpoint", endpoint), ("source", self.sheet_id.as_str())])
            .send()
            .await
            .map_err(StoreError::unavailable)?;

        let body = response.bytes().await.map_err(StoreError::unavailable)?;
        if body_is_empty(&body) {
            return Ok(Vec::new());
        }

        let envelope: ListEnvelope = serde_json::from_slice(&body)
            .map_err(|err| StoreError::malformed(format!("cms response was not json: {err}")))?;

        if envelope.error.is_some() {
            return Ok(Vec::new());
        }

        Ok(envelope.items.unwrap_or_default())
    }
}

#[async_trait]
impl ContentStore for CmsStore {
    /// Deliberately fetch-free: the store cannot probe existence without
    /// paying the full fetch cost, so once the slug is valid the article is
    /// believed to exist until `fetch` says otherwise. Configuration
    /// presence was already established when the store was constructed.
    async fn exists(&self, slug: &str) -> bool {
        is_valid_cms_slug(slug)
    }

    async fn fetch(&self, slug: &str) -> Result<ArticleContent, StoreError> {
        self.fetch_from(slug, DEFAULT_ARTICLE_ENDPOINT).await
    }
}

fn body_is_empty(body: &[u8]) -> bool {
    let trimmed = body.trim_ascii();
    trimmed.is_empty() || trimmed == b"null"
}
