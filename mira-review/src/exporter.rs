//! CSV export of sessions joined with their reviews
//!
//! Session columns use the importer's canonical headers and flattened forms,
//! so an exported file can be imported again unchanged.

use crate::db::sessions::{self, SessionFilter};
use crate::importer::Column;
use mira_common::db::{Review, ReviewStatus, Session};
use mira_common::{Error, Result};
use serde_json::Value;
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Review columns appended after the session columns
pub const REVIEW_HEADERS: [&str; 6] = [
    "astrologer_name",
    "verdict",
    "comment",
    "review_status",
    "review_created_at",
    "review_updated_at",
];

/// Which rows to export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFilter {
    #[default]
    All,
    Status(ReviewStatus),
}

impl ExportFilter {
    pub fn status(self) -> Option<ReviewStatus> {
        match self {
            ExportFilter::All => None,
            ExportFilter::Status(status) => Some(status),
        }
    }
}

impl FromStr for ExportFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(ExportFilter::All);
        }
        trimmed
            .parse::<ReviewStatus>()
            .map(ExportFilter::Status)
            .map_err(|_| Error::unknown_value("export filter", s))
    }
}

impl fmt::Display for ExportFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFilter::All => f.write_str("all"),
            ExportFilter::Status(status) => f.write_str(status.as_str()),
        }
    }
}

/// Full header row of an export
pub fn export_headers() -> Vec<&'static str> {
    Column::ALL
        .iter()
        .map(|c| c.name())
        .chain(REVIEW_HEADERS)
        .collect()
}

/// Flattened text of one session column
pub fn session_cell(session: &Session, column: Column) -> String {
    match column {
        Column::SessionId => session.session_id.clone(),
        Column::UserId => session.user_id.clone(),
        Column::Age => session.age.map(|a| a.to_string()).unwrap_or_default(),
        Column::Gender => session.gender.clone(),
        Column::Rating => session.rating.map(|r| r.to_string()).unwrap_or_default(),
        Column::Summary => session.summary.clone(),
        Column::Kundli => session.kundli.clone(),
        Column::KundliJson => payload_text(&session.kundli_json),
        Column::MajorDasha => session.major_dasha.clone(),
        Column::MinorDasha => session.minor_dasha.clone(),
        Column::SubMinorDasha => session.sub_minor_dasha.clone(),
        Column::DashaJson => payload_text(&session.dasha_json),
        Column::ManglikDosha => session.manglik_dosha.to_string(),
        Column::PitraDosha => session.pitra_dosha.to_string(),
        Column::DoshaJson => payload_text(&session.dosha_json),
        Column::Chat => {
            if session.chat.is_empty() {
                String::new()
            } else {
                serde_json::to_string(&session.chat).unwrap_or_default()
            }
        }
        Column::Marking => session.marking.clone(),
        Column::Analysis => session.analysis.clone(),
    }
}

fn payload_text(value: &Option<Value>) -> String {
    value.as_ref().map(Value::to_string).unwrap_or_default()
}

/// Flattened cells of one export row
pub fn export_row(session: &Session, review: Option<&Review>) -> Vec<String> {
    let mut row: Vec<String> = Column::ALL.iter().map(|&c| session_cell(session, c)).collect();
    match review {
        Some(r) => row.extend([
            r.astrologer_name.clone(),
            r.verdict.to_string(),
            r.comment.clone(),
            r.status.to_string(),
            r.created_at.clone(),
            r.updated_at.clone(),
        ]),
        None => row.extend(std::iter::repeat(String::new()).take(REVIEW_HEADERS.len())),
    }
    row
}

/// Write rows as CSV
pub fn write_csv(rows: &[(Session, Option<Review>)]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(export_headers())
        .map_err(csv_error)?;

    for (session, review) in rows {
        writer
            .write_record(export_row(session, review.as_ref()))
            .map_err(csv_error)?;
    }

    writer.into_inner().map_err(|e| csv_error(e.into_error()))
}

fn csv_error(err: impl fmt::Display) -> Error {
    Error::Encode {
        format: "CSV",
        message: err.to_string(),
    }
}

/// Export matching sessions as a CSV document
pub async fn export_csv(pool: &SqlitePool, filter: ExportFilter) -> Result<Vec<u8>> {
    let rows = sessions::list_sessions(pool, &SessionFilter::with_status(filter.status()), None, 0).await?;
    let body = write_csv(&rows)?;
    info!(filter = %filter, rows = rows.len(), bytes = body.len(), "Export generated");
    Ok(body)
}
