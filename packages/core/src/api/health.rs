use axum::{
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Json},
};
use serde_json::json;

use super::ApiState;

/// Liveness plus a summary of what the cache currently holds.
///
/// Always `200`: an empty or stale cache is degraded, not down.
pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let cache = state.service.cache().read().await;
    let status = if cache.is_fresh() {
        "fresh"
    } else if cache.get_stale().is_some() {
        "stale"
    } else {
        "empty"
    };

    (
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Json(json!({
            "status": "ok",
            "cache": status,
            "lastRefresh": cache.refreshed_at(),
        })),
    )
}
