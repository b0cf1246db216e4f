//! Sync watermark persistence
//!
//! The watermark is the `(updated_at, session_id)` pair of the last review
//! pushed, so reviews sharing a timestamp are still pushed one by one.

use mira_common::time::now_timestamp;
use mira_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;

const LAST_PUSH_AT_KEY: &str = "last_push_at";
const LAST_PUSH_SESSION_KEY: &str = "last_push_session";

/// Position of the last review successfully pushed to the remote sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Watermark {
    pub updated_at: String,
    pub session_id: String,
}

impl Watermark {
    pub fn new(updated_at: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            updated_at: updated_at.into(),
            session_id: session_id.into(),
        }
    }
}

pub async fn get_watermark(pool: &SqlitePool) -> Result<Option<Watermark>> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT key, value FROM sync_state WHERE key IN (?, ?)")
            .bind(LAST_PUSH_AT_KEY)
            .bind(LAST_PUSH_SESSION_KEY)
            .fetch_all(pool)
            .await?;

    let value = |key: &str| rows.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());

    // A bare timestamp (no session key yet) sorts before every id at that instant
    Ok(value(LAST_PUSH_AT_KEY).map(|updated_at| Watermark {
        updated_at,
        session_id: value(LAST_PUSH_SESSION_KEY).unwrap_or_default(),
    }))
}

/// Move the watermark forward to `pushed`; an older position is ignored
pub async fn advance_watermark(pool: &SqlitePool, pushed: &Watermark) -> Result<()> {
    let mut tx = pool.begin().await?;

    let current: Vec<(String, String)> =
        sqlx::query_as("SELECT key, value FROM sync_state WHERE key IN (?, ?)")
            .bind(LAST_PUSH_AT_KEY)
            .bind(LAST_PUSH_SESSION_KEY)
            .fetch_all(&mut *tx)
            .await?;
    let value = |key: &str| current.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());

    if let Some(updated_at) = value(LAST_PUSH_AT_KEY) {
        let stored = Watermark {
            updated_at,
            session_id: value(LAST_PUSH_SESSION_KEY).unwrap_or_default(),
        };
        if *pushed <= stored {
            return Ok(());
        }
    }

    let now = now_timestamp();
    for (key, value) in [
        (LAST_PUSH_AT_KEY, &pushed.updated_at),
        (LAST_PUSH_SESSION_KEY, &pushed.session_id),
    ] {
        sqlx::query(
            r#"
            INSERT INTO sync_state (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mira_common::db::init_memory_database;

    #[tokio::test]
    async fn test_watermark_only_moves_forward() {
        let pool = init_memory_database().await.unwrap();
        assert_eq!(get_watermark(&pool).await.unwrap(), None);

        advance_watermark(&pool, &Watermark::new("2024-05-01T00:00:00.000Z", "S1")).await.unwrap();
        advance_watermark(&pool, &Watermark::new("2024-01-01T00:00:00.000Z", "S9")).await.unwrap();

        assert_eq!(
            get_watermark(&pool).await.unwrap(),
            Some(Watermark::new("2024-05-01T00:00:00.000Z", "S1"))
        );
    }

    #[tokio::test]
    async fn test_same_timestamp_orders_by_session() {
        let pool = init_memory_database().await.unwrap();
        advance_watermark(&pool, &Watermark::new("2024-05-01T00:00:00.000Z", "S2")).await.unwrap();
        advance_watermark(&pool, &Watermark::new("2024-05-01T00:00:00.000Z", "S1")).await.unwrap();
        assert_eq!(get_watermark(&pool).await.unwrap().unwrap().session_id, "S2");

        advance_watermark(&pool, &Watermark::new("2024-05-01T00:00:00.000Z", "S3")).await.unwrap();
        assert_eq!(get_watermark(&pool).await.unwrap().unwrap().session_id, "S3");
    }
}
