//! In-memory view of the remote review sheet
//!
//! Row 1 of the sheet is the header; `rows[i]` is sheet row `i + 2`. Columns
//! are located by header name, so operators may reorder or add columns freely.

use crate::exporter::session_cell;
use crate::importer::columns::{normalize_header, Column};
use mira_common::db::{Review, Session};
use serde::{Deserialize, Serialize};

/// Session columns written when a row is appended to an empty sheet
pub const SESSION_SHEET_HEADERS: [&str; 15] = [
    "Session ID",
    "User ID",
    "Age",
    "Gender",
    "Rating",
    "Summary",
    "Kundli",
    "Major Dasha",
    "Minor Dasha",
    "Sub Minor Dasha",
    "Manglik Dosha",
    "Pitra Dosha",
    "Chat",
    "Expert Analysis",
    "Original Marking",
];

/// Review columns maintained by the push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewColumn {
    ReviewedBy,
    Verdict,
    Comments,
    ReviewStatus,
    ReviewDate,
}

impl ReviewColumn {
    pub const ALL: [ReviewColumn; 5] = [
        ReviewColumn::ReviewedBy,
        ReviewColumn::Verdict,
        ReviewColumn::Comments,
        ReviewColumn::ReviewStatus,
        ReviewColumn::ReviewDate,
    ];

    /// Header text added to the sheet
    pub fn header(self) -> &'static str {
        match self {
            ReviewColumn::ReviewedBy => "Reviewed By",
            ReviewColumn::Verdict => "Verdict",
            ReviewColumn::Comments => "Comments",
            ReviewColumn::ReviewStatus => "Review Status",
            ReviewColumn::ReviewDate => "Review Date",
        }
    }

    fn matches(self, normalized: &str) -> bool {
        let aliases: &[&str] = match self {
            ReviewColumn::ReviewedBy => &["reviewed_by", "astrologer_name", "reviewer"],
            ReviewColumn::Verdict => &["verdict", "overall_status"],
            ReviewColumn::Comments => &["comments", "comment"],
            ReviewColumn::ReviewStatus => &["review_status"],
            ReviewColumn::ReviewDate => &["review_date", "review_updated_at"],
        };
        aliases.contains(&normalized)
    }

    fn value(self, review: &Review) -> String {
        match self {
            ReviewColumn::ReviewedBy => review.astrologer_name.clone(),
            ReviewColumn::Verdict => review.verdict.to_string(),
            ReviewColumn::Comments => review.comment.clone(),
            ReviewColumn::ReviewStatus => review.status.to_string(),
            ReviewColumn::ReviewDate => review.updated_at.clone(),
        }
    }
}

/// Review fields as they currently appear in the remote sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteReview {
    pub session_id: String,
    pub reviewed_by: String,
    pub verdict: String,
    pub comments: String,
    pub review_status: String,
    pub review_date: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn from_values(values: Vec<Vec<String>>) -> Self {
        let mut values = values.into_iter();
        let header = values.next().unwrap_or_default();
        Self {
            header,
            rows: values.collect(),
        }
    }

    fn session_column(&self) -> Option<usize> {
        self.header
            .iter()
            .position(|h| Column::from_header(h) == Some(Column::SessionId))
    }

    fn review_column(&self, column: ReviewColumn) -> Option<usize> {
        self.header.iter().position(|h| column.matches(&normalize_header(h)))
    }

    /// Index into `rows` of the first row carrying this session id
    pub fn find_session_row(&self, session_id: &str) -> Option<usize> {
        let col = self.session_column()?;
        self.rows
            .iter()
            .position(|row| row.get(col).map(|v| v.trim() == session_id).unwrap_or(false))
    }

    /// Add missing review columns (or a full header to an empty sheet)
    ///
    /// A sheet without a session id column gets one, otherwise pushed rows
    /// could never be found again. Returns `true` when the header changed and
    /// must be written back.
    pub fn ensure_columns(&mut self) -> bool {
        if self.header.iter().all(|h| h.trim().is_empty()) {
            self.header = SESSION_SHEET_HEADERS
                .iter()
                .copied()
                .chain(ReviewColumn::ALL.iter().map(|c| c.header()))
                .map(str::to_string)
                .collect();
            return true;
        }

        let mut changed = false;
        if self.session_column().is_none() {
            self.header.push(SESSION_SHEET_HEADERS[0].to_string());
            changed = true;
        }
        for column in ReviewColumn::ALL {
            if self.review_column(column).is_none() {
                self.header.push(column.header().to_string());
                changed = true;
            }
        }
        changed
    }

    /// Existing row with its review cells overwritten
    pub fn updated_row(&self, index: usize, review: &Review) -> Vec<String> {
        let mut row = self.rows.get(index).cloned().unwrap_or_default();
        if row.len() < self.header.len() {
            row.resize(self.header.len(), String::new());
        }
        for column in ReviewColumn::ALL {
            if let Some(pos) = self.review_column(column) {
                row[pos] = column.value(review);
            }
        }
        row
    }

    /// Complete new row laid out by the current header
    pub fn new_row(&self, session: &Session, review: &Review) -> Vec<String> {
        self.header
            .iter()
            .map(|h| {
                let normalized = normalize_header(h);
                if let Some(column) = ReviewColumn::ALL.into_iter().find(|c| c.matches(&normalized)) {
                    column.value(review)
                } else if let Some(column) = Column::from_header(h) {
                    session_cell(session, column)
                } else {
                    String::new()
                }
            })
            .collect()
    }

    /// Review fields of every identifiable row
    pub fn remote_reviews(&self) -> Vec<RemoteReview> {
        let Some(id_col) = self.session_column() else {
            return Vec::new();
        };
        let cols: Vec<Option<usize>> = ReviewColumn::ALL.iter().map(|&c| self.review_column(c)).collect();
        let get = |row: &[String], col: Option<usize>| {
            col.and_then(|c| row.get(c)).map(|v| v.trim().to_string()).unwrap_or_default()
        };

        self.rows
            .iter()
            .filter_map(|row| {
                let row = row.as_slice();
                let session_id = get(row, Some(id_col));
                if session_id.is_empty() {
                    return None;
                }
                Some(RemoteReview {
                    session_id,
                    reviewed_by: get(row, cols[0]),
                    verdict: get(row, cols[1]),
                    comments: get(row, cols[2]),
                    review_status: get(row, cols[3]),
                    review_date: get(row, cols[4]),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mira_common::db::{ReviewStatus, Verdict};

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn review() -> Review {
        Review {
            session_id: "S2".into(),
            astrologer_name: "Asha".into(),
            verdict: Verdict::Correct,
            comment: "good".into(),
            status: ReviewStatus::Completed,
            created_at: "c".into(),
            updated_at: "2024-05-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn test_find_session_row() {
        let grid = SheetGrid::from_values(vec![
            strings(&["Session ID", "User ID"]),
            strings(&["S1", "U1"]),
            strings(&[" S2 ", "U2"]),
        ]);
        assert_eq!(grid.find_session_row("S2"), Some(1));
        assert_eq!(grid.find_session_row("S3"), None);
    }

    #[test]
    fn test_empty_sheet_gets_full_header() {
        let mut grid = SheetGrid::from_values(Vec::new());
        assert!(grid.ensure_columns());
        assert_eq!(grid.header[0], "Session ID");
        assert_eq!(grid.header.last().map(String::as_str), Some("Review Date"));
        assert!(!grid.ensure_columns());
    }

    #[test]
    fn test_missing_review_columns_appended() {
        let mut grid = SheetGrid::from_values(vec![strings(&["Session ID", "Comments"])]);
        assert!(grid.ensure_columns());
        assert_eq!(
            grid.header,
            strings(&["Session ID", "Comments", "Reviewed By", "Verdict", "Review Status", "Review Date"])
        );
    }

    #[test]
    fn test_missing_session_column_added() {
        let mut grid = SheetGrid::from_values(vec![strings(&["Name", "Notes"])]);
        assert!(grid.ensure_columns());
        assert_eq!(grid.header[2], "Session ID");

        let session = Session {
            session_id: "S2".into(),
            ..Default::default()
        };
        let row = grid.new_row(&session, &review());
        grid.rows.push(row);
        assert_eq!(grid.find_session_row("S2"), Some(0));
    }

    #[test]
    fn test_updated_row_only_touches_review_cells() {
        let mut grid = SheetGrid::from_values(vec![
            strings(&["session_id", "Notes", "Verdict"]),
            strings(&["S2", "keep me"]),
        ]);
        grid.ensure_columns();

        let row = grid.updated_row(0, &review());
        assert_eq!(row[0], "S2");
        assert_eq!(row[1], "keep me");
        assert_eq!(row[2], "correct");
        assert_eq!(row.len(), grid.header.len());
    }

    #[test]
    fn test_new_row_follows_header() {
        let grid = SheetGrid::from_values(vec![strings(&["Gender", "Session ID", "Other", "Reviewed By"])]);
        let session = Session {
            session_id: "S2".into(),
            gender: "F".into(),
            ..Default::default()
        };
        assert_eq!(grid.new_row(&session, &review()), strings(&["F", "S2", "", "Asha"]));
    }

    #[test]
    fn test_remote_reviews() {
        let grid = SheetGrid::from_values(vec![
            strings(&["Session ID", "Reviewed By", "Overall Status"]),
            strings(&["S1", "Ravi", "incorrect"]),
            strings(&["", "nobody"]),
        ]);
        let remote = grid.remote_reviews();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].reviewed_by, "Ravi");
        assert_eq!(remote[0].verdict, "incorrect");
        assert_eq!(remote[0].review_date, "");
    }
}
