//! Session list and detail

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use mira_common::db::{Review, Session};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::astro::{astro_details, AstroDetails};
use crate::db::{reviews, sessions, sessions::SessionFilter};
use crate::exporter::ExportFilter;
use crate::pagination::{SessionPage, PAGE_SIZE};
use crate::sync::RemoteReview;
use crate::{ApiError, ApiResult, AppState};

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/:session_id", get(get_session))
        .route("/sessions/:session_id/chart.png", get(super::chart::session_chart_png))
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionListQuery {
    pub page: Option<i64>,
    /// `all` or a review status
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionEntry {
    pub session: Session,
    pub review: Option<Review>,
    /// Review as currently shown in the shared sheet
    pub remote_review: Option<RemoteReview>,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionEntry>,
    #[serde(flatten)]
    pub page: SessionPage,
    pub sync_enabled: bool,
}

/// GET /sessions?page=&status=&search=
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> ApiResult<Json<SessionListResponse>> {
    let status = query
        .status
        .as_deref()
        .unwrap_or_default()
        .parse::<ExportFilter>()?
        .status();
    let filter = SessionFilter {
        status,
        search: query.search,
    };

    let total = sessions::count_sessions(&state.db, &filter).await?;
    let page = SessionPage::locate(total, query.page.unwrap_or(1));
    let rows = sessions::list_sessions(&state.db, &filter, Some(PAGE_SIZE), page.offset).await?;

    let mut remote = match &state.sync {
        Some(bridge) => bridge.cached_reviews().await,
        None => HashMap::new(),
    };

    let entries = rows
        .into_iter()
        .map(|(session, review)| SessionEntry {
            remote_review: remote.remove(&session.session_id),
            session,
            review,
        })
        .collect();

    Ok(Json(SessionListResponse {
        sessions: entries,
        page,
        sync_enabled: state.sync.is_some(),
    }))
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    pub session: Session,
    pub astro: AstroDetails,
    pub review: Option<Review>,
    pub remote_review: Option<RemoteReview>,
}

/// GET /sessions/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionDetailResponse>> {
    let session = sessions::get_session(&state.db, &session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", session_id)))?;
    let review = reviews::get_review(&state.db, &session_id).await?;

    let remote_review = match &state.sync {
        Some(bridge) => bridge.cached_reviews().await.remove(&session_id),
        None => None,
    };

    Ok(Json(SessionDetailResponse {
        astro: astro_details(&session),
        session,
        review,
        remote_review,
    }))
}
