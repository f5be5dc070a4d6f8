//! Events endpoints

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{Json, Response},
};
use chrono::Utc;
use serde_json::{json, Value};

use super::headers::{cache_control, compute_etag, if_none_match_matches, last_modified};
use super::ApiState;

type ApiError = (StatusCode, Json<Value>);

/// `GET /events`: the merged, sorted collection from the cache.
pub async fn list_events(
    State(state): State<ApiState>,
    request_headers: HeaderMap,
) -> Result<Response, ApiError> {
    let (events, refreshed_at) = state.service.list_events_with_timestamp().await;
    let body = serde_json::to_vec(&events).map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Failed to serialize events: {}", err) })),
        )
    })?;

    let etag = compute_etag(&body);
    let refreshed_at = refreshed_at.unwrap_or_else(Utc::now);
    let cache_control_value = cache_control(state.service.ttl(), state.refresh_interval);

    if if_none_match_matches(&request_headers, &etag) {
        return Ok(Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::CACHE_CONTROL, cache_control_value)
            .header(header::ETAG, etag.as_str())
            .header(header::LAST_MODIFIED, last_modified(refreshed_at))
            .body(Body::empty())
            .expect("304 events response should be valid"));
    }

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CACHE_CONTROL, cache_control_value)
        .header(header::ETAG, etag.as_str())
        .header(header::LAST_MODIFIED, last_modified(refreshed_at))
        .body(Body::from(body))
        .expect("events response should be valid"))
}

/// `POST /events/refresh`: run one aggregation now.
pub async fn refresh_events(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    match state.service.refresh().await {
        Ok(count) => Ok(Json(json!({ "events": count }))),
        Err(err) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )),
    }
}
