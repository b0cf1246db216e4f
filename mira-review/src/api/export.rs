//! CSV export download

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::exporter::{export_csv, ExportFilter};
use crate::{ApiResult, AppState};

/// Build export routes
pub fn export_routes() -> Router<AppState> {
    Router::new().route("/export", get(export))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub status: Option<String>,
}

/// Attachment name, e.g. `mira_reviews_completed_20240501_093000.csv`
pub fn export_filename(filter: ExportFilter) -> String {
    format!(
        "mira_reviews_{}_{}.csv",
        filter,
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}

/// GET /export?status=
pub async fn export(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter: ExportFilter = query.status.as_deref().unwrap_or_default().parse()?;
    let body = export_csv(&state.db, filter).await?;

    let filename = export_filename(filter);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    ))
}
