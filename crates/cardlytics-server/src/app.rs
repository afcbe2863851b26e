use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — the track endpoints are called from card pages on
///    arbitrary origins, so CORS defaults to permissive; an explicit
///    origin allowlist via `CARDLYTICS_CORS_ORIGINS` narrows it.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = if state.config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/track/view", post(routes::track::track_view))
        .route("/api/track/click", post(routes::track::track_click))
        .route("/api/track/save", post(routes::track::track_save))
        .route("/api/cards/{card_id}/stats", get(routes::stats::card_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
