//! mira-review: astrology session review service
//!
//! Imports generated user sessions from spreadsheets, lets astrologers record
//! a verdict per session, exports the reviewed corpus and mirrors reviews to
//! a shared Google Sheet.

pub mod api;
pub mod astro;
pub mod chart;
pub mod cli;
pub mod db;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod pagination;
pub mod review;
pub mod sync;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::Router;
use chrono::{DateTime, Utc};
use mira_common::config::ReviewConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use crate::sync::SyncBridge;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<ReviewConfig>,
    /// `None` when spreadsheet sync is not configured
    pub sync: Option<Arc<SyncBridge>>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: ReviewConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            sync: None,
            startup_time: Utc::now(),
        }
    }

    pub fn with_sync(mut self, bridge: SyncBridge) -> Self {
        self.sync = Some(Arc::new(bridge));
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .merge(api::ui_routes())
        .merge(api::health_routes())
        .merge(api::upload_routes().layer(DefaultBodyLimit::max(upload_limit)))
        .merge(api::session_routes())
        .merge(api::review_routes())
        .merge(api::export_routes())
        .merge(api::stats_routes())
        .merge(api::sync_routes())
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
