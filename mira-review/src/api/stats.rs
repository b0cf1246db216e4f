//! Review progress totals

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::reviews::{review_counts, ReviewCounts};
use crate::{ApiResult, AppState};

/// Build stats routes
pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub counts: ReviewCounts,
    /// Sessions not yet completed
    pub pending: i64,
}

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let counts = review_counts(&state.db).await?;
    Ok(Json(StatsResponse {
        pending: counts.pending(),
        counts,
    }))
}
