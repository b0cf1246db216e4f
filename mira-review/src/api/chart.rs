//! Rendered chart image of a session

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::astro::session_chart;
use crate::chart::ChartRenderer;
use crate::db::sessions;
use crate::{ApiError, ApiResult, AppState};

/// GET /sessions/:session_id/chart.png
///
/// 404 when the session is unknown or carries no chart payload.
pub async fn session_chart_png(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let session = sessions::get_session(&state.db, &session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", session_id)))?;
    let chart = session_chart(&session)
        .ok_or_else(|| ApiError::NotFound(format!("No chart data for session {}", session_id)))?;

    let png = ChartRenderer::default().render_png(&chart)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
