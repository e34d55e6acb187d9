//! Content store contract shared by the filesystem and remote CMS backends.
//!
//! The backend is chosen once at composition time from configuration; the
//! rest of the crate only sees `dyn ContentStore`.

mod cms;
mod fs;

use std::error::Error as StdError;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::article::ArticleContent;

pub use cms::{CmsStore, DEFAULT_ARTICLE_ENDPOINT, DEFAULT_LIST_ENDPOINT};
pub use fs::FsStore;

/// Failures surfaced by content stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid slug")]
    InvalidSlug,
    #[error("article path escapes the content root")]
    PathEscape,
    #[error("article not found")]
    NotFound,
    #[error("article metadata is malformed: {reason}")]
    MalformedMetadata { reason: String },
    #[error("content backend unavailable")]
    BackendUnavailable {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl StoreError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            reason: reason.into(),
        }
    }

    pub(crate) fn unavailable(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::BackendUnavailable {
            source: Box::new(source),
        }
    }
}

/// A source of article content addressed by slug.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Advisory existence probe. Implementations swallow backend errors into
    /// `false`; a `true` answer may still be contradicted by `fetch`.
    async fn exists(&self, slug: &str) -> bool;

    /// Fetch the article body and metadata for `slug`.
    async fn fetch(&self, slug: &str) -> Result<ArticleContent, StoreError>;
}
