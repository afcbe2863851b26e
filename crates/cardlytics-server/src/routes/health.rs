use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /health` — liveness check.
///
/// Always `200 OK` while the process is up; the store is in-process, so
/// reachability is process liveness. `dropped_events` surfaces the
/// swallowed-failure diagnostic counter so operators can see silent loss.
///
/// Response shape:
/// ```json
/// { "status": "ok", "version": "0.1.0", "dropped_events": 0 }
/// ```
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "dropped_events": state.aggregator.dropped_events()
        })),
    )
}
