//! HTTP query interface.
//!
//! Reads are served from the event service's cache, stale if necessary.
//! Upstream sources are only reached by `POST /events/refresh`, and by the
//! first `GET /events` while nothing has been cached yet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::metrics::AppMetrics;
use crate::service::EventService;

pub mod events;
pub mod headers;
pub mod health;

/// Shared state for all routes.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<EventService>,
    pub metrics: Arc<AppMetrics>,
    /// Advertised as `stale-while-revalidate` on cached responses.
    pub refresh_interval: Duration,
}

/// Assemble the full application router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/events", get(events::list_events))
        .route("/events/refresh", post(events::refresh_events))
        .route("/metrics", get(render_metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .route("/health", get(health::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn render_metrics(State(state): State<ApiState>) -> Response {
    match state.metrics.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(Body::from(body))
            .expect("metrics response should be valid"),
        Err(err) => {
            tracing::error!("Failed to render metrics: {}", err);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::from("metrics error"))
                .expect("metrics error response should be valid")
        }
    }
}

async fn track_requests(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    state
        .metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), path.as_str(), response.status().as_str()])
        .inc();
    state
        .metrics
        .http_request_duration
        .observe(started.elapsed().as_secs_f64());

    response
}
