//! Webhook authentication.
//!
//! Two schemes guard the revalidation endpoints: a keyed SHA-256 callback
//! hash (mandatory secret) and a direct shared secret (optional; absence
//! disables the check entirely). Both comparisons are constant-time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Validates inbound revalidation callbacks against configured secrets.
#[derive(Debug, Clone)]
pub struct WebhookAuthenticator {
    callback_secret: Option<String>,
    revalidate_secret: Option<String>,
}

impl WebhookAuthenticator {
    /// Empty secrets are normalized to "not configured" so the hash check
    /// fails closed rather than keying the digest with an empty string.
    pub fn new(callback_secret: Option<String>, revalidate_secret: Option<String>) -> Self {
        Self {
            callback_secret: callback_secret.filter(|s| !s.is_empty()),
            revalidate_secret: revalidate_secret.filter(|s| !s.is_empty()),
        }
    }

    /// Check a callback hash: SHA-256 over `"<secret>:<input>"`, hex-encoded,
    /// compared constant-time against the supplied value.
    ///
    /// Returns `false` unconditionally when no callback secret is configured.
    pub fn is_callback_hash_valid(&self, input: &str, supplied_hash: &str) -> bool {
        let Some(secret) = self.callback_secret.as_deref() else {
            return false;
        };

        let local_hash = compose_callback_hash(secret, input);
        local_hash
            .as_bytes()
            .ct_eq(supplied_hash.as_bytes())
            .into()
    }

    /// Check the direct shared secret. When none is configured every request
    /// passes; when one is configured the supplied value must match.
    pub fn is_direct_secret_valid(&self, supplied: Option<&str>) -> bool {
        match self.revalidate_secret.as_deref() {
            None => true,
            Some(secret) => match supplied {
                Some(value) => secret.as_bytes().ct_eq(value.as_bytes()).into(),
                None => false,
            },
        }
    }
}

/// Compute the hex digest a trusted caller must supply for `input`.
pub fn compose_callback_hash(secret: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> WebhookAuthenticator {
        WebhookAuthenticator::new(Some("cb-secret".to_string()), Some("direct".to_string()))
    }

    #[test]
    fn valid_callback_hash_is_accepted() {
        let auth = authenticator();
        let hash = compose_callback_hash("cb-secret", "my-post");
        assert!(auth.is_callback_hash_valid("my-post", &hash));
    }

    #[test]
    fn mutated_hash_or_input_is_rejected() {
        let auth = authenticator();
        let hash = compose_callback_hash("cb-secret", "my-post");

        let mut flipped = hash.clone().into_bytes();
        flipped[0] = if flipped[0] == b'0' { b'1' } else { b'0' };
        let flipped = String::from_utf8(flipped).expect("hex stays utf-8");

        assert!(!auth.is_callback_hash_valid("my-post", &flipped));
        assert!(!auth.is_callback_hash_valid("my-posx", &hash));
        assert!(!auth.is_callback_hash_valid("my-post", ""));
    }

    #[test]
    fn missing_callback_secret_fails_closed() {
        let auth = WebhookAuthenticator::new(None, None);
        let hash = compose_callback_hash("cb-secret", "my-post");
        assert!(!auth.is_callback_hash_valid("my-post", &hash));

        let auth = WebhookAuthenticator::new(Some(String::new()), None);
        assert!(!auth.is_callback_hash_valid("my-post", &hash));
    }

    #[test]
    fn direct_secret_is_optional() {
        let open = WebhookAuthenticator::new(None, None);
        assert!(open.is_direct_secret_valid(None));
        assert!(open.is_direct_secret_valid(Some("anything")));

        let guarded = authenticator();
        assert!(guarded.is_direct_secret_valid(Some("direct")));
        assert!(!guarded.is_direct_secret_valid(Some("wrong")));
        assert!(!guarded.is_direct_secret_valid(None));
    }
}
