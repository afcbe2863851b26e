use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use cardlytics_core::store::StatsStore;

use crate::{error::AppError, state::AppState};

/// `GET /api/cards/{card_id}/stats` — owner-facing read of the engagement
/// record backing the dashboard.
///
/// Returns `404` when the card has never received a qualifying event (the
/// record is created lazily on the first one).
#[tracing::instrument(skip(state))]
pub async fn card_stats(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .store
        .get(&card_id)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound(format!("no stats for card {card_id}")))?;

    Ok(Json(record))
}
