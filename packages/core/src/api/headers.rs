use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header};
use chrono::{DateTime, Utc};

/// Compute a quoted ETag from the serialized event list.
pub fn compute_etag(body: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("\"{:x}\"", hasher.finish())
}

/// `max-age` follows the cache TTL, `stale-while-revalidate` the refresh
/// interval, so clients never hold data longer than the server would.
pub fn cache_control(max_age: Duration, stale_while_revalidate: Duration) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "public, max-age={}, stale-while-revalidate={}",
        max_age.as_secs(),
        stale_while_revalidate.as_secs()
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
}

/// Build an RFC 7231 HTTP-date for Last-Modified.
pub fn last_modified(timestamp: DateTime<Utc>) -> HeaderValue {
    HeaderValue::from_str(&timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("Thu, 01 Jan 1970 00:00:00 GMT"))
}

/// Returns true when `If-None-Match` contains `*` or the exact current ETag.
pub fn if_none_match_matches(headers: &HeaderMap, current_etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(|raw| {
            raw.split(',')
                .map(|tag| tag.trim())
                .any(|tag| tag == "*" || tag == current_etag)
        })
        .unwrap_or(false)
}
