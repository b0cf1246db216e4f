//! Spreadsheet sync operations
//!
//! All three endpoints answer 503 when no sheet is configured and 502 when the
//! sheet service fails.

use axum::{extract::State, routing::{get, post}, Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::sync::{PullReport, PushReport, SyncBridge, SyncError, SyncStatus};
use crate::{ApiResult, AppState};

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sync/status", get(status))
        .route("/api/sync/push", post(push))
        .route("/api/sync/pull", post(pull))
}

#[derive(Debug, Default, Deserialize)]
pub struct PushRequest {
    /// Push every review, ignoring the watermark
    #[serde(default)]
    pub force: bool,
}

fn bridge(state: &AppState) -> Result<&Arc<SyncBridge>, SyncError> {
    state.sync.as_ref().ok_or(SyncError::Disabled)
}

/// GET /api/sync/status
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<SyncStatus>> {
    let status = bridge(&state)?.status(&state.db).await?;
    Ok(Json(status))
}

/// POST /api/sync/push
///
/// Body `{"force": true}` is optional.
pub async fn push(
    State(state): State<AppState>,
    request: Option<Json<PushRequest>>,
) -> ApiResult<Json<PushReport>> {
    let force = request.map(|Json(r)| r.force).unwrap_or(false);
    let report = bridge(&state)?.push(&state.db, force).await?;
    Ok(Json(report))
}

/// POST /api/sync/pull
pub async fn pull(State(state): State<AppState>) -> ApiResult<Json<PullReport>> {
    let report = bridge(&state)?.pull().await?;
    Ok(Json(report))
}
