//! Review store operations

use super::sync_state::Watermark;
use mira_common::db::Review;
use mira_common::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Load the review for a session, if one was ever saved
pub async fn get_review(pool: &SqlitePool, session_id: &str) -> Result<Option<Review>> {
    let row = sqlx::query("SELECT * FROM reviews WHERE session_id = ?")
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(review_from_row).transpose()
}

/// Insert or update a review in one statement
///
/// `updated_at` is kept at the later of the stored and supplied values, so
/// concurrent writers can never move it backwards.
pub async fn save_review(pool: &SqlitePool, review: &Review) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO reviews (
            session_id, astrologer_name, verdict, comment, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(session_id) DO UPDATE SET
            astrologer_name = excluded.astrologer_name,
            verdict = excluded.verdict,
            comment = excluded.comment,
            status = excluded.status,
            updated_at = MAX(reviews.updated_at, excluded.updated_at)
        "#,
    )
    .bind(&review.session_id)
    .bind(&review.astrologer_name)
    .bind(review.verdict.as_str())
    .bind(&review.comment)
    .bind(review.status.as_str())
    .bind(&review.created_at)
    .bind(&review.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Reviews positioned after the watermark (all when `None`), oldest change first
///
/// Order is `(updated_at, session_id)`, matching how the watermark compares.
pub async fn list_reviews_after(pool: &SqlitePool, watermark: Option<&Watermark>) -> Result<Vec<Review>> {
    let (updated_at, session_id) = match watermark {
        Some(w) => (Some(w.updated_at.as_str()), w.session_id.as_str()),
        None => (None, ""),
    };

    let rows = sqlx::query(
        r#"
        SELECT * FROM reviews
        WHERE ? IS NULL
           OR updated_at > ?
           OR (updated_at = ? AND session_id > ?)
        ORDER BY updated_at ASC, session_id ASC
        "#,
    )
    .bind(updated_at)
    .bind(updated_at)
    .bind(updated_at)
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(review_from_row).collect()
}

/// Aggregate counts for the stats endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewCounts {
    pub total_sessions: i64,
    /// Sessions whose effective status is not `not_started`
    pub reviewed: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub correct: i64,
    pub incorrect: i64,
    pub cannot_judge: i64,
}

impl ReviewCounts {
    pub fn pending(&self) -> i64 {
        self.total_sessions - self.completed
    }
}

pub async fn review_counts(pool: &SqlitePool) -> Result<ReviewCounts> {
    let row = sqlx::query(
        r#"
        SELECT
            (SELECT COUNT(*) FROM sessions) AS total_sessions,
            COALESCE(SUM(status <> 'not_started'), 0) AS reviewed,
            COALESCE(SUM(status = 'in_progress'), 0) AS in_progress,
            COALESCE(SUM(status = 'completed'), 0) AS completed,
            COALESCE(SUM(verdict = 'correct'), 0) AS correct,
            COALESCE(SUM(verdict = 'incorrect'), 0) AS incorrect,
            COALESCE(SUM(verdict = 'cannot_judge'), 0) AS cannot_judge
        FROM reviews
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(ReviewCounts {
        total_sessions: row.try_get("total_sessions")?,
        reviewed: row.try_get("reviewed")?,
        in_progress: row.try_get("in_progress")?,
        completed: row.try_get("completed")?,
        correct: row.try_get("correct")?,
        incorrect: row.try_get("incorrect")?,
        cannot_judge: row.try_get("cannot_judge")?,
    })
}

fn review_from_row(row: &SqliteRow) -> Result<Review> {
    let verdict: String = row.try_get("verdict")?;
    let status: String = row.try_get("status")?;

    Ok(Review {
        session_id: row.try_get("session_id")?,
        astrologer_name: row.try_get("astrologer_name")?,
        verdict: verdict.parse()?,
        comment: row.try_get("comment")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
