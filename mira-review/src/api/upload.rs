//! Spreadsheet upload

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::importer::{import_spreadsheet, ImportSummary};
use crate::{ApiError, ApiResult, AppState};

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// POST /upload
///
/// Multipart form with a `file` field; other fields are ignored.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<ImportSummary>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("No file selected".to_string()))?;
        let bytes = field.bytes().await.map_err(multipart_error)?;

        tracing::info!(filename = %filename, size = bytes.len(), "Upload received");
        let summary = import_spreadsheet(&state.db, &state.config, &filename, bytes.to_vec()).await?;
        return Ok(Json(summary));
    }

    Err(ApiError::BadRequest("Multipart field 'file' is required".to_string()))
}
