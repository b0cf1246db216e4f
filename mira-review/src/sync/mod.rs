//! Sync bridge to the external review spreadsheet
//!
//! - **Push** writes local reviews changed since the last successful push to
//!   the sheet: matching rows get their review cells overwritten, unknown
//!   sessions are appended as full rows. The watermark advances only over
//!   reviews that were written.
//! - **Pull** refreshes an in-memory cache of the sheet's review cells for
//!   display. It never writes the review store; local reviews stay
//!   authoritative.

pub mod grid;
pub mod sheets;

pub use grid::{RemoteReview, SheetGrid};
pub use sheets::GoogleSheetsBackend;

use crate::db::sync_state::{self, Watermark};
use crate::db::{reviews, sessions};
use async_trait::async_trait;
use mira_common::config::ReviewConfig;
use mira_common::db::Review;
use mira_common::time::now_timestamp;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Sync failures, kept apart from validation errors
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("Sync is not configured")]
    Disabled,

    #[error("Spreadsheet service unreachable: {0}")]
    Unreachable(String),

    #[error("Spreadsheet service rejected credentials: {0}")]
    Unauthorized(String),

    #[error("Spreadsheet service error {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Unexpected spreadsheet data: {0}")]
    Malformed(String),

    #[error("Local storage error during sync: {0}")]
    Storage(String),
}

impl From<mira_common::Error> for SyncError {
    fn from(err: mira_common::Error) -> Self {
        SyncError::Storage(err.to_string())
    }
}

/// Row-level access to one remote sheet
///
/// Row numbers are 1-based sheet rows; row 1 is the header.
#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// All rows of the sheet, header first
    async fn fetch_values(&self) -> Result<Vec<Vec<String>>, SyncError>;

    async fn update_header(&self, header: &[String]) -> Result<(), SyncError>;

    async fn update_row(&self, row_number: usize, values: &[String]) -> Result<(), SyncError>;

    async fn append_row(&self, values: &[String]) -> Result<(), SyncError>;
}

/// Counts from one push
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    /// Reviews selected for pushing
    pub considered: usize,
    /// Existing sheet rows overwritten
    pub updated: usize,
    /// New sheet rows appended
    pub appended: usize,
    /// Watermark after the push
    pub watermark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullReport {
    pub rows: usize,
    pub fetched_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub enabled: bool,
    pub sheet_url: Option<String>,
    pub last_push_at: Option<String>,
    pub cached_rows: usize,
    /// Seconds since the cache was last refreshed
    pub cache_age_secs: Option<u64>,
}

/// Sync result attached to a review submission response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Disabled,
    Synced { updated: usize, appended: usize },
    Failed { error: String },
}

impl SyncOutcome {
    pub fn from_report(report: &PushReport) -> Self {
        SyncOutcome::Synced {
            updated: report.updated,
            appended: report.appended,
        }
    }
}

#[derive(Debug, Default)]
struct SheetCache {
    fetched_at: Option<Instant>,
    reviews: HashMap<String, RemoteReview>,
}

pub struct SyncBridge {
    backend: Arc<dyn SheetBackend>,
    sheet_url: Option<String>,
    cache_ttl: Duration,
    cache: RwLock<SheetCache>,
}

impl SyncBridge {
    pub fn new(backend: Arc<dyn SheetBackend>, cache_ttl: Duration) -> Self {
        Self {
            backend,
            sheet_url: None,
            cache_ttl,
            cache: RwLock::new(SheetCache::default()),
        }
    }

    pub fn with_sheet_url(mut self, url: impl Into<String>) -> Self {
        self.sheet_url = Some(url.into());
        self
    }

    /// Build the bridge from configuration; `None` when sync is off or misconfigured
    pub fn from_config(config: &ReviewConfig) -> Option<Self> {
        let Some((url, credentials)) = config.sync_target() else {
            info!("Spreadsheet sync disabled (no sheets_url / credentials_file)");
            return None;
        };

        match GoogleSheetsBackend::from_config(url, credentials) {
            Ok(backend) => {
                info!(sheet_url = %url, "Spreadsheet sync enabled");
                Some(Self::new(Arc::new(backend), config.sheet_cache_ttl).with_sheet_url(url))
            }
            Err(e) => {
                warn!(error = %e, "Spreadsheet sync disabled: credentials could not be loaded");
                None
            }
        }
    }

    /// Push reviews changed since the watermark, or every review when `force`
    pub async fn push(&self, pool: &SqlitePool, force: bool) -> Result<PushReport, SyncError> {
        let watermark = if force {
            None
        } else {
            sync_state::get_watermark(pool).await?
        };
        let pending = reviews::list_reviews_after(pool, watermark.as_ref()).await?;

        let mut report = self.push_reviews(pool, &pending, true).await?;
        report.watermark = sync_state::get_watermark(pool).await?.map(|w| w.updated_at);
        info!(
            force,
            considered = report.considered,
            updated = report.updated,
            appended = report.appended,
            "Sheet push complete"
        );
        Ok(report)
    }

    /// Push a single session's review without touching the watermark
    ///
    /// Earlier unpushed changes may have smaller timestamps, so advancing the
    /// watermark here could hide them from the next incremental push.
    pub async fn push_session(&self, pool: &SqlitePool, session_id: &str) -> Result<PushReport, SyncError> {
        let Some(review) = reviews::get_review(pool, session_id).await? else {
            return Ok(PushReport::default());
        };
        self.push_reviews(pool, std::slice::from_ref(&review), false).await
    }

    async fn push_reviews(
        &self,
        pool: &SqlitePool,
        pending: &[Review],
        advance_watermark: bool,
    ) -> Result<PushReport, SyncError> {
        let mut report = PushReport {
            considered: pending.len(),
            ..Default::default()
        };
        if pending.is_empty() {
            return Ok(report);
        }

        let result = self.write_reviews(pool, pending, &mut report).await;

        if advance_watermark {
            // Reviews are ordered by (updated_at, session_id), so the successes form a prefix
            let written = report.updated + report.appended;
            if let Some(last) = written.checked_sub(1).and_then(|i| pending.get(i)) {
                let position = Watermark::new(last.updated_at.clone(), last.session_id.clone());
                sync_state::advance_watermark(pool, &position).await?;
            }
        }

        if let Err(e) = result {
            warn!(
                error = %e,
                updated = report.updated,
                appended = report.appended,
                remaining = report.considered - report.updated - report.appended,
                "Sheet push stopped"
            );
            return Err(e);
        }
        Ok(report)
    }

    async fn write_reviews(
        &self,
        pool: &SqlitePool,
        pending: &[Review],
        report: &mut PushReport,
    ) -> Result<(), SyncError> {
        let mut grid = SheetGrid::from_values(self.backend.fetch_values().await?);
        if grid.ensure_columns() {
            self.backend.update_header(&grid.header).await?;
        }

        for review in pending {
            match grid.find_session_row(&review.session_id) {
                Some(index) => {
                    let row = grid.updated_row(index, review);
                    self.backend.update_row(index + 2, &row).await?;
                    grid.rows[index] = row;
                    report.updated += 1;
                }
                None => {
                    let session = sessions::get_session(pool, &review.session_id)
                        .await?
                        .ok_or_else(|| SyncError::Storage(format!("Session {} missing", review.session_id)))?;
                    let row = grid.new_row(&session, review);
                    self.backend.append_row(&row).await?;
                    grid.rows.push(row);
                    report.appended += 1;
                }
            }
        }
        Ok(())
    }

    /// Refresh the presentation cache from the sheet
    pub async fn pull(&self) -> Result<PullReport, SyncError> {
        let values = self.backend.fetch_values().await.map_err(|e| {
            warn!(error = %e, "Sheet pull failed");
            e
        })?;
        let remote = SheetGrid::from_values(values).remote_reviews();
        let rows = remote.len();

        let mut cache = self.cache.write().await;
        cache.reviews = remote.into_iter().map(|r| (r.session_id.clone(), r)).collect();
        cache.fetched_at = Some(Instant::now());

        info!(rows, "Sheet cache refreshed");
        Ok(PullReport {
            rows,
            fetched_at: now_timestamp(),
        })
    }

    /// Cached remote reviews, refreshed first when older than the TTL
    ///
    /// A failed refresh keeps serving the stale cache and is not retried
    /// until another TTL has passed.
    pub async fn cached_reviews(&self) -> HashMap<String, RemoteReview> {
        let stale = {
            let cache = self.cache.read().await;
            cache
                .fetched_at
                .map(|at| at.elapsed() >= self.cache_ttl)
                .unwrap_or(true)
        };
        if stale && self.pull().await.is_err() {
            self.cache.write().await.fetched_at = Some(Instant::now());
        }
        self.cache.read().await.reviews.clone()
    }

    pub async fn status(&self, pool: &SqlitePool) -> Result<SyncStatus, SyncError> {
        let cache = self.cache.read().await;
        Ok(SyncStatus {
            enabled: true,
            sheet_url: self.sheet_url.clone(),
            last_push_at: sync_state::get_watermark(pool).await?.map(|w| w.updated_at),
            cached_rows: cache.reviews.len(),
            cache_age_secs: cache.fetched_at.map(|at| at.elapsed().as_secs()),
        })
    }
}
