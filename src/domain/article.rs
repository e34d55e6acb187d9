//! Article content and metadata records.

use serde::{Deserialize, Serialize};

/// Metadata describing one article.
///
/// `title` and `description` are required and must be non-empty after a
/// fetch; an article without them is a malformed article, not one with
/// defaults. The remaining fields are optional SEO/byline enrichments. The
/// CMS backend additionally supplies `slug` and `keywords`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// ISO-8601 publish timestamp, kept verbatim as supplied by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl ArticleMetadata {
    /// Whether the required fields carry actual content.
    pub fn has_required_fields(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }

    /// Preferred social title, falling back to the page title.
    pub fn social_title(&self) -> &str {
        self.og_title.as_deref().unwrap_or(&self.title)
    }

    /// Preferred social description, falling back to the page description.
    pub fn social_description(&self) -> &str {
        self.og_description.as_deref().unwrap_or(&self.description)
    }
}

/// One fetched article: the raw HTML body paired with its metadata.
///
/// The body is trusted as pre-sanitized by the content source; nothing in
/// this crate re-sanitizes it. Instances are created fresh per fetch and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContent {
    pub html: String,
    pub metadata: ArticleMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_deserializes_camel_case_fields() {
        let metadata: ArticleMetadata = serde_json::from_str(
            r#"{
                "title": "Hello",
                "description": "World",
                "ogTitle": "Hello (social)",
                "ogImage": "https://example.com/cover.png",
                "publishedAt": "2024-03-01T12:00:00Z"
            }"#,
        )
        .expect("valid metadata json");

        assert_eq!(metadata.title, "Hello");
        assert_eq!(metadata.og_title.as_deref(), Some("Hello (social)"));
        assert_eq!(
            metadata.og_image.as_deref(),
            Some("https://example.com/cover.png")
        );
        assert_eq!(
            metadata.published_at.as_deref(),
            Some("2024-03-01T12:00:00Z")
        );
        assert!(metadata.has_required_fields());
    }

    #[test]
    fn social_fields_fall_back_to_required_fields() {
        let metadata: ArticleMetadata =
            serde_json::from_str(r#"{"title": "T", "description": "D"}"#).expect("valid metadata");

        assert_eq!(metadata.social_title(), "T");
        assert_eq!(metadata.social_description(), "D");
    }

    #[test]
    fn blank_required_fields_are_detected() {
        let metadata: ArticleMetadata =
            serde_json::from_str(r#"{"title": "  ", "description": "D"}"#).expect("parses");
        assert!(!metadata.has_required_fields());
    }
}
