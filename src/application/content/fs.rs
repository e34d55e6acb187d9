//! Filesystem-backed content store.
//!
//! Each article lives in a directory named after its slug under the content
//! root, holding exactly two files: `content.html` (the pre-rendered body)
//! and `meta.json` (the metadata record).

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::article::{ArticleContent, ArticleMetadata};
use crate::domain::slug::is_valid_slug;

use super::{ContentStore, StoreError};

const CONTENT_FILE: &str = "content.html";
const METADATA_FILE: &str = "meta.json";

/// Content store reading articles from a local directory tree.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`.
    ///
    /// The root is canonicalized up front so that the containment check in
    /// [`FsStore::article_path`] compares two normalized absolute paths; a
    /// missing root is a deployment error and is reported at startup.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = std::fs::canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    /// Resolve the absolute directory for `slug`, enforcing that it stays
    /// inside the content root.
    ///
    /// The prefix test is the sole traversal barrier, so it runs on top of
    /// (not instead of) slug validation and a component scan. `starts_with`
    /// compares whole path components, which also normalizes separator
    /// conventions on platforms that have more than one.
    pub fn article_path(&self, slug: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_slug(slug) {
            return Err(StoreError::InvalidSlug);
        }

        let relative = Path::new(slug);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(StoreError::PathEscape);
        }

        let candidate = self.root.join(relative);
        if !candidate.starts_with(&self.root) {
            return Err(StoreError::PathEscape);
        }

        Ok(candidate)
    }

    fn read_failure(slug: &str, file: &str, err: io::Error) -> StoreError {
        if err.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound
        } else {
            debug!(slug, file, error = %err, "article file read failed");
            StoreError::unavailable(err)
        }
    }
}

#[async_trait]
impl ContentStore for FsStore {
    /// Best-effort probe: any resolution or filesystem error collapses to
    /// `false` rather than propagating detail.
    async fn exists(&self, slug: &str) -> bool {
        let Ok(path) = self.article_path(slug) else {
            return false;
        };

        match fs::metadata(&path).await {
            Ok(metadata) => metadata.is_dir(),
            Err(_) => false,
        }
    }

    async fn fetch(&self, slug: &str) -> Result<ArticleContent, StoreError> {
        let dir = self.article_path(slug)?;

        // The two files are independent; read them concurrently.
        let (html, raw_metadata) = tokio::try_join!(
            async {
                fs::read_to_string(dir.join(CONTENT_FILE))
                    .await
                    .map_err(|err| Self::read_failure(slug, CONTENT_FILE, err))
            },
            async {
                fs::read_to_string(dir.join(METADATA_FILE))
                    .await
                    .map_err(|err| Self::read_failure(slug, METADATA_FILE, err))
            },
        )?;

        let metadata: ArticleMetadata = serde_json::from_str(&raw_metadata)
            .map_err(|err| StoreError::malformed(err.to_string()))?;

        if !metadata.has_required_fields() {
            return Err(StoreError::malformed(
                "title and description must be present and non-empty",
            ));
        }

        Ok(ArticleContent { html, metadata })
    }
}
