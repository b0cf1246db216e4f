//! Review submission endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use mira_common::db::Review;
use mira_common::reviewer::{reviewer_from_cookie_header, sign_reviewer, REVIEWER_COOKIE};
use serde::Serialize;

use crate::review::{submit_and_sync, ReviewSubmission};
use crate::sync::SyncOutcome;
use crate::{ApiResult, AppState};

/// One year
const COOKIE_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

/// Build review routes
pub fn review_routes() -> Router<AppState> {
    Router::new().route("/review", post(submit))
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub review: Review,
    pub sync: SyncOutcome,
}

fn remembered_reviewer(headers: &HeaderMap, secret: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| reviewer_from_cookie_header(value, secret))
}

/// POST /review
///
/// The reviewer name is taken from the body, else from the signed cookie, and
/// the cookie is refreshed with whatever name ends up on the review.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ReviewSubmission>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(mut submission) = payload?;
    let named = submission
        .astrologer_name
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty());
    if !named {
        submission.astrologer_name = remembered_reviewer(&headers, &state.config.secret_key);
    }

    let (review, sync) = submit_and_sync(&state.db, state.sync.as_deref(), &submission).await?;

    if let SyncOutcome::Failed { error } = &sync {
        tracing::warn!(session_id = %review.session_id, error = %error, "Review saved but not synced");
    }

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        REVIEWER_COOKIE,
        sign_reviewer(&review.astrologer_name, &state.config.secret_key),
        COOKIE_MAX_AGE_SECS
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(ReviewResponse {
            success: true,
            review,
            sync,
        }),
    ))
}
