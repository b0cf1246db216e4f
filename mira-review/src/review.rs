//! Review submission
//!
//! A submission merges into the stored review (absent fields keep their
//! previous value), is validated, and is written with a single upsert. When
//! the sync bridge is configured the session is pushed afterwards; a push
//! failure is reported alongside the saved review and never undoes it.

use crate::db::{reviews, sessions};
use crate::sync::{SyncBridge, SyncOutcome};
use mira_common::db::{Review, ReviewStatus, Verdict};
use mira_common::time::{not_before, now_timestamp};
use mira_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

/// Reviewer name used when neither the request nor the cookie supplies one
pub const DEFAULT_ASTROLOGER: &str = "System Reviewer";

/// Incoming review form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub session_id: String,
    #[serde(default)]
    pub verdict: Option<Verdict>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Defaults to `in_progress`
    #[serde(default)]
    pub status: Option<ReviewStatus>,
    #[serde(default)]
    pub astrologer_name: Option<String>,
}

/// Merge a submission into the stored review without writing it
pub fn merge_submission(existing: Option<&Review>, submission: &ReviewSubmission, now: String) -> Result<Review> {
    let astrologer_name = submission
        .astrologer_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| existing.map(|r| r.astrologer_name.clone()).filter(|n| !n.is_empty()))
        .unwrap_or_else(|| DEFAULT_ASTROLOGER.to_string());

    let review = Review {
        session_id: submission.session_id.trim().to_string(),
        astrologer_name,
        verdict: submission
            .verdict
            .or(existing.map(|r| r.verdict))
            .unwrap_or(Verdict::Unset),
        comment: submission
            .comment
            .clone()
            .or_else(|| existing.map(|r| r.comment.clone()))
            .unwrap_or_default(),
        status: submission.status.unwrap_or(ReviewStatus::InProgress),
        created_at: existing.map(|r| r.created_at.clone()).unwrap_or_else(|| now.clone()),
        updated_at: not_before(existing.map(|r| r.updated_at.as_str()), now),
    };

    if review.status == ReviewStatus::Completed && review.verdict == Verdict::Unset {
        return Err(Error::InvalidInput(
            "A review cannot be completed without a verdict".to_string(),
        ));
    }

    Ok(review)
}

/// Validate, merge and store a submission; returns the stored review
pub async fn submit_review(pool: &SqlitePool, submission: &ReviewSubmission) -> Result<Review> {
    let session_id = submission.session_id.trim();
    if session_id.is_empty() {
        return Err(Error::InvalidInput("session_id is required".to_string()));
    }
    if !sessions::session_exists(pool, session_id).await? {
        return Err(Error::UnknownSession(session_id.to_string()));
    }

    let existing = reviews::get_review(pool, session_id).await?;
    let review = merge_submission(existing.as_ref(), submission, now_timestamp())?;
    reviews::save_review(pool, &review).await?;

    let stored = reviews::get_review(pool, session_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Review for {} vanished after save", session_id)))?;

    info!(
        session_id,
        verdict = %stored.verdict,
        status = %stored.status,
        astrologer = %stored.astrologer_name,
        "Review saved"
    );
    Ok(stored)
}

/// Store a submission, then push the session when sync is configured
pub async fn submit_and_sync(
    pool: &SqlitePool,
    sync: Option<&SyncBridge>,
    submission: &ReviewSubmission,
) -> Result<(Review, SyncOutcome)> {
    let review = submit_review(pool, submission).await?;

    let outcome = match sync {
        None => SyncOutcome::Disabled,
        Some(bridge) => match bridge.push_session(pool, &review.session_id).await {
            Ok(report) => SyncOutcome::from_report(&report),
            Err(err) => SyncOutcome::Failed { error: err.to_string() },
        },
    };

    Ok((review, outcome))
}
