//! Cache key normalization.
//!
//! Keys keep only the path-and-query suffix of the request target, so
//! `http://host/p` and `/p` share an entry. The host is ignored: two origins
//! serving different content at the same path collide on one key.

/// Scheme prefix stripped from absolute-form targets
pub const HTTP_SCHEME: &str = "http://";

/// Normalizes a request target into a cache key.
///
/// Targets without any `/` after the scheme map to `/`.
pub fn normalize_key(target: &str) -> &str {
    let rest = target.strip_prefix(HTTP_SCHEME).unwrap_or(target);
    match rest.find('/') {
        Some(index) => &rest[index..],
        None => "/",
    }
}
