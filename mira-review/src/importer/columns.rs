//! Canonical session columns and header resolution
//!
//! Headers match case-insensitively, with spaces and hyphens read as
//! underscores, against each column's canonical name and its aliases.

use std::collections::HashMap;

/// A session column understood by the importer and written by the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    SessionId,
    UserId,
    Age,
    Gender,
    Rating,
    Summary,
    Kundli,
    KundliJson,
    MajorDasha,
    MinorDasha,
    SubMinorDasha,
    DashaJson,
    ManglikDosha,
    PitraDosha,
    DoshaJson,
    Chat,
    Marking,
    Analysis,
}

impl Column {
    /// Export order
    pub const ALL: [Column; 18] = [
        Column::SessionId,
        Column::UserId,
        Column::Age,
        Column::Gender,
        Column::Rating,
        Column::Summary,
        Column::Kundli,
        Column::KundliJson,
        Column::MajorDasha,
        Column::MinorDasha,
        Column::SubMinorDasha,
        Column::DashaJson,
        Column::ManglikDosha,
        Column::PitraDosha,
        Column::DoshaJson,
        Column::Chat,
        Column::Marking,
        Column::Analysis,
    ];

    /// Columns an import cannot proceed without
    pub const REQUIRED: [Column; 5] = [
        Column::SessionId,
        Column::UserId,
        Column::Age,
        Column::Gender,
        Column::Rating,
    ];

    /// Canonical header name
    pub fn name(self) -> &'static str {
        match self {
            Column::SessionId => "session_id",
            Column::UserId => "user_id",
            Column::Age => "age",
            Column::Gender => "gender",
            Column::Rating => "rating",
            Column::Summary => "summary",
            Column::Kundli => "kundli",
            Column::KundliJson => "kundli_json",
            Column::MajorDasha => "major_dasha",
            Column::MinorDasha => "minor_dasha",
            Column::SubMinorDasha => "sub_minor_dasha",
            Column::DashaJson => "dasha_json",
            Column::ManglikDosha => "manglik_dosha",
            Column::PitraDosha => "pitra_dosha",
            Column::DoshaJson => "dosha_json",
            Column::Chat => "chat",
            Column::Marking => "marking",
            Column::Analysis => "analysis",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::SessionId => &["sessionid", "session"],
            Column::UserId => &["userid", "user"],
            Column::Rating => &["user_rating"],
            Column::Kundli => &["kundli_text", "birth_chart"],
            Column::KundliJson => &["kundli_payload", "chart_json"],
            Column::DashaJson => &["dasha_payload"],
            Column::ManglikDosha => &["manglik"],
            Column::PitraDosha => &["pitra"],
            Column::DoshaJson => &["dosha_payload"],
            Column::Chat => &["chat_transcript", "transcript", "conversation"],
            Column::Marking => &["original_marking"],
            Column::Analysis => &["expert_analysis", "astrologer_analysis"],
            _ => &[],
        }
    }

    /// Resolve a spreadsheet header to a column
    pub fn from_header(raw: &str) -> Option<Column> {
        let key = normalize_header(raw);
        Column::ALL
            .into_iter()
            .find(|c| c.name() == key || c.aliases().contains(&key.as_str()))
    }
}

/// Lowercase, trim, and map spaces/hyphens to single underscores
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.trim().trim_start_matches('\u{feff}').to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        let ch = if ch == ' ' || ch == '-' { '_' } else { ch };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }
    out
}

/// Positions of recognised columns within a sheet's header row
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    positions: HashMap<Column, usize>,
}

impl HeaderMap {
    /// Map header cells to columns; the first occurrence of a column wins
    ///
    /// Returns the canonical names of every missing required column on failure.
    pub fn resolve(headers: &[String]) -> Result<Self, Vec<String>> {
        let mut positions = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header) {
                positions.entry(column).or_insert(idx);
            }
        }

        let missing: Vec<String> = Column::REQUIRED
            .iter()
            .filter(|c| !positions.contains_key(*c))
            .map(|c| c.name().to_string())
            .collect();

        if missing.is_empty() {
            Ok(Self { positions })
        } else {
            Err(missing)
        }
    }

    /// Cell text for a column, empty when the column or cell is absent
    pub fn cell<'a>(&self, row: &'a [String], column: Column) -> &'a str {
        self.positions
            .get(&column)
            .and_then(|&idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}
