//! Database initialization
//!
//! Creates the database file and schema on first run. Every statement is
//! idempotent, so startup against an existing database is a no-op.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// A single connection is used because each SQLite in-memory connection is
/// its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_sessions_table(pool).await?;
    create_reviews_table(pool).await?;
    create_sync_state_table(pool).await?;
    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL DEFAULT '',
            age INTEGER,
            gender TEXT NOT NULL DEFAULT '',
            rating REAL,
            summary TEXT NOT NULL DEFAULT '',
            kundli TEXT NOT NULL DEFAULT '',
            kundli_json TEXT,
            major_dasha TEXT NOT NULL DEFAULT '',
            minor_dasha TEXT NOT NULL DEFAULT '',
            sub_minor_dasha TEXT NOT NULL DEFAULT '',
            dasha_json TEXT,
            manglik_dosha INTEGER NOT NULL DEFAULT 0,
            pitra_dosha INTEGER NOT NULL DEFAULT 0,
            dosha_json TEXT,
            chat TEXT NOT NULL DEFAULT '[]',
            marking TEXT NOT NULL DEFAULT '',
            analysis TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK (session_id <> '')
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_reviews_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL UNIQUE REFERENCES sessions(session_id),
            astrologer_name TEXT NOT NULL DEFAULT '',
            verdict TEXT NOT NULL DEFAULT 'unset'
                CHECK (verdict IN ('correct', 'incorrect', 'cannot_judge', 'unset')),
            comment TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'not_started'
                CHECK (status IN ('not_started', 'in_progress', 'completed')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK (status <> 'completed' OR verdict <> 'unset')
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_session_id ON reviews(session_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_status ON reviews(status)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_updated_at ON reviews(updated_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_sync_state_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sync_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
