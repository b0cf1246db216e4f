//! Session store operations
//!
//! Sessions are written only by the importer (upsert keyed by `session_id`)
//! and read by the list, detail, export and sync paths. List queries left-join
//! the review row so callers get the effective review status in one pass.

use mira_common::db::{ChatTurn, Review, ReviewStatus, Session};
use mira_common::{Error, Result};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Filter for session listing and export
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// Effective review status; sessions without a review count as `not_started`
    pub status: Option<ReviewStatus>,
    /// Substring match on session or user id
    pub search: Option<String>,
}

impl SessionFilter {
    pub fn with_status(status: Option<ReviewStatus>) -> Self {
        Self { status, search: None }
    }

    fn status_param(&self) -> Option<&'static str> {
        self.status.map(|s| s.as_str())
    }

    /// LIKE pattern with the user's `%`, `_` and `\` taken literally
    fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Some(pattern)
    }
}

const FILTER_CLAUSE: &str = r#"
    WHERE (? IS NULL OR COALESCE(r.status, 'not_started') = ?)
      AND (? IS NULL OR s.session_id LIKE ? ESCAPE '\' OR s.user_id LIKE ? ESCAPE '\')
"#;

/// Insert or replace a session by identifier
///
/// Keeps the row's insertion position and `created_at`; returns `true` when an
/// existing row was replaced.
pub async fn upsert_session(conn: &mut SqliteConnection, session: &Session, now: &str) -> Result<bool> {
    let kundli_json = encode_payload(&session.kundli_json)?;
    let dasha_json = encode_payload(&session.dasha_json)?;
    let dosha_json = encode_payload(&session.dosha_json)?;
    let chat = serde_json::to_string(&session.chat).map_err(Error::stored_json("chat"))?;

    let existed: Option<i64> = sqlx::query_scalar("SELECT id FROM sessions WHERE session_id = ?")
        .bind(&session.session_id)
        .fetch_optional(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO sessions (
            session_id, user_id, age, gender, rating, summary,
            kundli, kundli_json, major_dasha, minor_dasha, sub_minor_dasha, dasha_json,
            manglik_dosha, pitra_dosha, dosha_json, chat, marking, analysis,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(session_id) DO UPDATE SET
            user_id = excluded.user_id,
            age = excluded.age,
            gender = excluded.gender,
            rating = excluded.rating,
            summary = excluded.summary,
            kundli = excluded.kundli,
            kundli_json = excluded.kundli_json,
            major_dasha = excluded.major_dasha,
            minor_dasha = excluded.minor_dasha,
            sub_minor_dasha = excluded.sub_minor_dasha,
            dasha_json = excluded.dasha_json,
            manglik_dosha = excluded.manglik_dosha,
            pitra_dosha = excluded.pitra_dosha,
            dosha_json = excluded.dosha_json,
            chat = excluded.chat,
            marking = excluded.marking,
            analysis = excluded.analysis,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&session.session_id)
    .bind(&session.user_id)
    .bind(session.age)
    .bind(&session.gender)
    .bind(session.rating)
    .bind(&session.summary)
    .bind(&session.kundli)
    .bind(&kundli_json)
    .bind(&session.major_dasha)
    .bind(&session.minor_dasha)
    .bind(&session.sub_minor_dasha)
    .bind(&dasha_json)
    .bind(session.manglik_dosha)
    .bind(session.pitra_dosha)
    .bind(&dosha_json)
    .bind(&chat)
    .bind(&session.marking)
    .bind(&session.analysis)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(existed.is_some())
}

/// Load one session by identifier
pub async fn get_session(pool: &SqlitePool, session_id: &str) -> Result<Option<Session>> {
    let row = sqlx::query("SELECT * FROM sessions WHERE session_id = ?")
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(session_from_row).transpose()
}

pub async fn session_exists(pool: &SqlitePool, session_id: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM sessions WHERE session_id = ?")
        .bind(session_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Count sessions matching the filter
pub async fn count_sessions(pool: &SqlitePool, filter: &SessionFilter) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM sessions s LEFT JOIN reviews r ON r.session_id = s.session_id {}",
        FILTER_CLAUSE
    );
    let status = filter.status_param();
    let pattern = filter.search_pattern();

    let count: i64 = sqlx::query_scalar(&sql)
        .bind(status)
        .bind(status)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Sessions left-joined with their review, in insertion order
///
/// `limit = None` returns every matching row (export path).
pub async fn list_sessions(
    pool: &SqlitePool,
    filter: &SessionFilter,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<(Session, Option<Review>)>> {
    let sql = format!(
        r#"
        SELECT s.*,
               r.session_id AS r_session_id,
               r.astrologer_name AS r_astrologer_name,
               r.verdict AS r_verdict,
               r.comment AS r_comment,
               r.status AS r_status,
               r.created_at AS r_created_at,
               r.updated_at AS r_updated_at
        FROM sessions s
        LEFT JOIN reviews r ON r.session_id = s.session_id
        {}
        ORDER BY s.id ASC
        LIMIT ? OFFSET ?
        "#,
        FILTER_CLAUSE
    );
    let status = filter.status_param();
    let pattern = filter.search_pattern();

    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        // SQLite treats a negative LIMIT as unbounded
        .bind(limit.unwrap_or(-1))
        .bind(offset)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| Ok((session_from_row(row)?, joined_review_from_row(row)?)))
        .collect()
}

fn session_from_row(row: &SqliteRow) -> Result<Session> {
    let chat_text: String = row.try_get("chat")?;
    let chat: Vec<ChatTurn> = if chat_text.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&chat_text).map_err(Error::stored_json("chat"))?
    };

    Ok(Session {
        session_id: row.try_get("session_id")?,
        user_id: row.try_get("user_id")?,
        age: row.try_get("age")?,
        gender: row.try_get("gender")?,
        rating: row.try_get("rating")?,
        summary: row.try_get("summary")?,
        kundli: row.try_get("kundli")?,
        kundli_json: decode_payload(row.try_get("kundli_json")?)?,
        major_dasha: row.try_get("major_dasha")?,
        minor_dasha: row.try_get("minor_dasha")?,
        sub_minor_dasha: row.try_get("sub_minor_dasha")?,
        dasha_json: decode_payload(row.try_get("dasha_json")?)?,
        manglik_dosha: row.try_get::<i64, _>("manglik_dosha")? != 0,
        pitra_dosha: row.try_get::<i64, _>("pitra_dosha")? != 0,
        dosha_json: decode_payload(row.try_get("dosha_json")?)?,
        chat,
        marking: row.try_get("marking")?,
        analysis: row.try_get("analysis")?,
    })
}

fn joined_review_from_row(row: &SqliteRow) -> Result<Option<Review>> {
    let session_id: Option<String> = row.try_get("r_session_id")?;
    let Some(session_id) = session_id else {
        return Ok(None);
    };

    let verdict: String = row.try_get("r_verdict")?;
    let status: String = row.try_get("r_status")?;

    Ok(Some(Review {
        session_id,
        astrologer_name: row.try_get("r_astrologer_name")?,
        verdict: verdict.parse()?,
        comment: row.try_get("r_comment")?,
        status: status.parse()?,
        created_at: row.try_get("r_created_at")?,
        updated_at: row.try_get("r_updated_at")?,
    }))
}

fn encode_payload(value: &Option<Value>) -> Result<Option<String>> {
    value
        .as_ref()
        .map(|v| serde_json::to_string(v).map_err(Error::stored_json("payload")))
        .transpose()
}

fn decode_payload(text: Option<String>) -> Result<Option<Value>> {
    text.filter(|t| !t.trim().is_empty())
        .map(|t| serde_json::from_str(&t).map_err(Error::stored_json("payload")))
        .transpose()
}
