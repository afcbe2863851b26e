use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use serde_json::json;

use cardlytics_core::{
    event::{EventKind, TrackEvent, TrackPayload},
    viewer::{derive_viewer_id, ViewerId},
};

use crate::{error::AppError, state::AppState};

/// `POST /api/track/view` — record a card view.
///
/// Fire-and-forget: the handler validates the payload, detaches the stats
/// write, and replies `202 Accepted` without waiting for the store. Events
/// that do not qualify for tracking (card without an owner, the owner
/// viewing their own card, no resolvable viewer identity) are still `202` —
/// a no-op, not an error.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn track_view(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<TrackPayload>,
) -> Result<impl IntoResponse, AppError> {
    handle(state, headers, payload, EventKind::View)
}

/// `POST /api/track/click` — record a content click.
///
/// Same contract as view tracking, plus `content_type` is required (the
/// caller-supplied label of what was clicked, e.g. `"Phone Number"`).
#[tracing::instrument(skip(state, headers, payload))]
pub async fn track_click(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<TrackPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !payload
        .content_type
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty())
    {
        return Err(AppError::BadRequest(
            "content_type is required for click events".to_string(),
        ));
    }
    handle(state, headers, payload, EventKind::Click)
}

/// `POST /api/track/save` — record a contact save.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn track_save(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<TrackPayload>,
) -> Result<impl IntoResponse, AppError> {
    handle(state, headers, payload, EventKind::Save)
}

fn handle(
    state: Arc<AppState>,
    headers: HeaderMap,
    payload: TrackPayload,
    kind: EventKind,
) -> Result<impl IntoResponse, AppError> {
    if payload.card_id.trim().is_empty() {
        return Err(AppError::BadRequest("card_id must not be empty".to_string()));
    }

    let viewer_id = resolve_viewer(&headers, &payload);
    let event = TrackEvent {
        kind,
        card_id: payload.card_id,
        card_owner_id: payload.card_owner_id,
        viewer_id,
        content_type: payload.content_type,
        card_type: payload.card_type,
        card_owner_name: payload.card_owner_name,
    };

    // Side channel first so a slow primary write can never delay it; both
    // paths detach before this handler returns.
    state.forwarder.forward(&event);

    let aggregator = Arc::clone(&state.aggregator);
    tokio::spawn(async move {
        aggregator.record(&event).await;
    });

    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(json!({ "ok": true })),
    ))
}

/// Resolve the viewer identity for this request.
///
/// The client's locally persisted id wins; otherwise fall back to deriving a
/// stable id from IP + User-Agent. An empty result means do-not-track and
/// the aggregator no-ops.
fn resolve_viewer(headers: &HeaderMap, payload: &TrackPayload) -> ViewerId {
    if let Some(id) = payload.viewer_id.as_deref() {
        let id = id.trim();
        if !id.is_empty() {
            return ViewerId::new(id);
        }
    }

    let ip = extract_client_ip(headers);
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    derive_viewer_id(&ip, user_agent)
}

/// Extract the real client IP from `X-Forwarded-For` (first entry).
///
/// Falls back to the empty string when the header is absent; identity
/// derivation then rests on the User-Agent alone.
fn extract_client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
