//! Slug validation for both content backends.
//!
//! Validity is re-checked at every entry point (handlers, stores, webhooks);
//! it is never cached alongside the slug.

/// Validate a slug for the filesystem backend.
///
/// Accepts only alphanumerics, hyphens, and underscores. The traversal
/// rejection below is redundant with the character class, but is kept as an
/// independent check: the class may be loosened later without anyone
/// remembering to re-add it.
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() {
        return false;
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return false;
    }

    // Explicit traversal guard, independent of the character class.
    if slug.contains("..") || slug.contains('/') || slug.contains('\\') {
        return false;
    }

    true
}

/// Validate a slug for the remote CMS backend.
///
/// CMS slugs may be nested (`guides/getting-started`), so `/` is permitted;
/// `..` and `\` are still rejected.
pub fn is_valid_cms_slug(slug: &str) -> bool {
    if slug.is_empty() {
        return false;
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '/')
    {
        return false;
    }

    if slug.contains("..") || slug.contains('\\') {
        return false;
    }

    true
}
