//! Spreadsheet importer
//!
//! Upload → boundary checks → table read → header resolution → per-row
//! coercion → one transaction of upserts keyed by `session_id`. Bad rows are
//! skipped and reported; a missing required column aborts before any write.

pub mod coerce;
pub mod columns;
pub mod reader;

pub use coerce::SkipReason;
pub use columns::{Column, HeaderMap};
pub use reader::{read_table, SheetTable, SpreadsheetFormat};

use crate::db::sessions;
use mira_common::config::{file_extension, ReviewConfig};
use mira_common::time::now_timestamp;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Import failures that abort the whole file
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File type not allowed: '{0}'")]
    UnsupportedExtension(String),

    #[error("File is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Could not read spreadsheet: {0}")]
    Unreadable(String),

    #[error("Spreadsheet has no header row")]
    EmptySheet,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error(transparent)]
    Storage(#[from] mira_common::Error),
}

impl From<sqlx::Error> for ImportError {
    fn from(err: sqlx::Error) -> Self {
        ImportError::Storage(mira_common::Error::Database(err))
    }
}

/// One skipped data row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSkip {
    /// Spreadsheet row number (the header is row 1)
    pub row: usize,
    pub session_id: Option<String>,
    pub reason: SkipReason,
    pub message: String,
}

/// Outcome of one import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    /// Non-empty data rows seen
    pub total_rows: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub skips: Vec<RowSkip>,
}

/// Check an upload before reading it
pub fn check_upload(config: &ReviewConfig, filename: &str, size: usize) -> Result<SpreadsheetFormat, ImportError> {
    if size > config.max_upload_bytes {
        return Err(ImportError::TooLarge {
            size,
            limit: config.max_upload_bytes,
        });
    }

    let ext = file_extension(filename).unwrap_or_default();
    if !config.is_allowed_extension(filename) {
        return Err(ImportError::UnsupportedExtension(ext));
    }

    SpreadsheetFormat::from_extension(&ext).ok_or(ImportError::UnsupportedExtension(ext))
}

/// Import an uploaded spreadsheet
pub async fn import_spreadsheet(
    pool: &SqlitePool,
    config: &ReviewConfig,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<ImportSummary, ImportError> {
    let format = check_upload(config, filename, bytes.len())?;
    let table = read_table(format, bytes)?;
    debug!(filename, rows = table.rows.len(), "Spreadsheet read");

    let summary = import_table(pool, &table).await?;
    info!(
        filename,
        total = summary.total_rows,
        inserted = summary.inserted,
        replaced = summary.replaced,
        skipped = summary.skipped,
        "Import complete"
    );
    Ok(summary)
}

/// Validate every row of a table and upsert the good ones in one transaction
pub async fn import_table(pool: &SqlitePool, table: &SheetTable) -> Result<ImportSummary, ImportError> {
    let headers = HeaderMap::resolve(&table.headers).map_err(ImportError::MissingColumns)?;

    let mut summary = ImportSummary::default();
    let mut seen = HashSet::new();
    let mut valid = Vec::new();

    for (idx, row) in table.rows.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        summary.total_rows += 1;
        let row_number = idx + 2;

        let outcome = coerce::parse_row(&headers, row).and_then(|session| {
            if seen.insert(session.session_id.clone()) {
                Ok(session)
            } else {
                Err(SkipReason::DuplicateSessionId)
            }
        });

        match outcome {
            Ok(session) => valid.push(session),
            Err(reason) => {
                let session_id = Some(headers.cell(row, Column::SessionId).trim())
                    .filter(|id| !id.is_empty())
                    .map(str::to_string);
                warn!(row = row_number, session_id = ?session_id, %reason, "Skipping row");
                summary.skips.push(RowSkip {
                    row: row_number,
                    session_id,
                    message: reason.to_string(),
                    reason,
                });
            }
        }
    }
    summary.skipped = summary.skips.len();

    let now = now_timestamp();
    let mut tx = pool.begin().await?;
    for session in &valid {
        if sessions::upsert_session(&mut *tx, session, &now).await? {
            summary.replaced += 1;
        } else {
            summary.inserted += 1;
        }
    }
    tx.commit().await?;

    Ok(summary)
}
