//! HTTP cache control module
//!
//! `ETag` generation and `If-None-Match` validation for static assets.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Generate a quoted `ETag` from the response bytes.
///
/// The assets are immutable for the process lifetime, so a fast content hash
/// is enough; there is no need for a cryptographic digest.
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check the client's `If-None-Match` header against the computed `ETag`.
///
/// Handles a single value, a comma-separated list, and the `*` wildcard.
/// Returns true when the client copy is current (respond 304).
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .any(|e| e.trim() == etag || e.trim() == "*")
    })
}
