//! Row coercion: spreadsheet cells to a typed `Session`

use super::columns::{Column, HeaderMap};
use mira_common::db::{ChatTurn, Session};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Why a row was left out of the import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MissingSessionId,
    InvalidNumber { column: String, value: String },
    InvalidFlag { column: String, value: String },
    InvalidPayload { column: String, error: String },
    InvalidChat { error: String },
    PayloadMismatch { column: String, field: String },
    DuplicateSessionId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingSessionId => write!(f, "missing session_id"),
            SkipReason::InvalidNumber { column, value } => {
                write!(f, "{} is not a number: '{}'", column, value)
            }
            SkipReason::InvalidFlag { column, value } => {
                write!(f, "{} is not a yes/no value: '{}'", column, value)
            }
            SkipReason::InvalidPayload { column, error } => {
                write!(f, "{} is not a valid JSON document: {}", column, error)
            }
            SkipReason::InvalidChat { error } => write!(f, "chat could not be parsed: {}", error),
            SkipReason::PayloadMismatch { column, field } => {
                write!(f, "{} disagrees with {}", column, field)
            }
            SkipReason::DuplicateSessionId => write!(f, "session_id repeated earlier in the file"),
        }
    }
}

/// Build a session from one data row
pub fn parse_row(headers: &HeaderMap, row: &[String]) -> Result<Session, SkipReason> {
    let cell = |column: Column| headers.cell(row, column);

    let session_id = cell(Column::SessionId).trim();
    if session_id.is_empty() {
        return Err(SkipReason::MissingSessionId);
    }

    let manglik = parse_flag_cell(Column::ManglikDosha, cell(Column::ManglikDosha))?;
    let pitra = parse_flag_cell(Column::PitraDosha, cell(Column::PitraDosha))?;
    let dosha_json = parse_payload(Column::DoshaJson, cell(Column::DoshaJson))?;
    check_afflictions(dosha_json.as_ref(), manglik, pitra)?;

    let session = Session {
        session_id: session_id.to_string(),
        user_id: cell(Column::UserId).trim().to_string(),
        age: parse_age(cell(Column::Age))?,
        gender: cell(Column::Gender).trim().to_string(),
        rating: parse_rating(cell(Column::Rating))?,
        summary: cell(Column::Summary).to_string(),
        kundli: cell(Column::Kundli).to_string(),
        kundli_json: parse_payload(Column::KundliJson, cell(Column::KundliJson))?,
        major_dasha: cell(Column::MajorDasha).to_string(),
        minor_dasha: cell(Column::MinorDasha).to_string(),
        sub_minor_dasha: cell(Column::SubMinorDasha).to_string(),
        dasha_json: parse_payload(Column::DashaJson, cell(Column::DashaJson))?,
        // An empty flag cell takes the payload's value so the stored pair agrees
        manglik_dosha: manglik
            .or_else(|| payload_flag(dosha_json.as_ref(), MANGLIK_KEYS))
            .unwrap_or(false),
        pitra_dosha: pitra
            .or_else(|| payload_flag(dosha_json.as_ref(), PITRA_KEYS))
            .unwrap_or(false),
        dosha_json,
        chat: parse_chat(cell(Column::Chat))?,
        marking: cell(Column::Marking).to_string(),
        analysis: cell(Column::Analysis).to_string(),
    };

    check_periods(&session)?;

    Ok(session)
}

fn parse_age(raw: &str) -> Result<Option<i64>, SkipReason> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if let Ok(value) = text.parse::<i64>() {
        return Ok(Some(value));
    }
    // Spreadsheets sometimes hand back "31.0"
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Ok(Some(value as i64)),
        _ => Err(SkipReason::InvalidNumber {
            column: Column::Age.name().to_string(),
            value: text.to_string(),
        }),
    }
}

fn parse_rating(raw: &str) -> Result<Option<f64>, SkipReason> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(SkipReason::InvalidNumber {
            column: Column::Rating.name().to_string(),
            value: text.to_string(),
        }),
    }
}

/// Interpret a yes/no cell; `None` when empty
pub fn parse_flag(raw: &str) -> Option<Option<bool>> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Some(None),
        "true" | "yes" | "y" | "1" | "present" => Some(Some(true)),
        "false" | "no" | "n" | "0" | "absent" => Some(Some(false)),
        _ => None,
    }
}

fn parse_flag_cell(column: Column, raw: &str) -> Result<Option<bool>, SkipReason> {
    parse_flag(raw).ok_or_else(|| SkipReason::InvalidFlag {
        column: column.name().to_string(),
        value: raw.trim().to_string(),
    })
}

/// Parse a structured payload cell; only objects and arrays are accepted
pub fn parse_payload(column: Column, raw: &str) -> Result<Option<Value>, SkipReason> {
    let text = raw.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("null") || text.eq_ignore_ascii_case("n/a") {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(text).map_err(|e| SkipReason::InvalidPayload {
        column: column.name().to_string(),
        error: e.to_string(),
    })?;

    if value.is_object() || value.is_array() {
        Ok(Some(value))
    } else {
        Err(SkipReason::InvalidPayload {
            column: column.name().to_string(),
            error: "expected a JSON object or array".to_string(),
        })
    }
}

/// Parse a chat transcript
///
/// Accepts a JSON array of turn objects (`speaker`/`role` with
/// `text`/`content`/`message`) or plain `Speaker: text` lines. Text that is
/// not a JSON array is read as lines; lines without a speaker prefix continue
/// the previous turn.
pub fn parse_chat(raw: &str) -> Result<Vec<ChatTurn>, SkipReason> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    // Transcripts like "[10:00] User: hi" also start with a bracket
    if text.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<Value>>(text) {
            return items.iter().map(chat_turn_from_value).collect();
        }
    }

    let mut turns: Vec<ChatTurn> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match split_speaker(line) {
            Some((speaker, said)) => turns.push(ChatTurn {
                speaker: speaker.to_string(),
                text: said.to_string(),
            }),
            None => match turns.last_mut() {
                Some(last) => {
                    last.text.push('\n');
                    last.text.push_str(line.trim());
                }
                None => turns.push(ChatTurn {
                    speaker: String::new(),
                    text: line.trim().to_string(),
                }),
            },
        }
    }
    Ok(turns)
}

fn chat_turn_from_value(item: &Value) -> Result<ChatTurn, SkipReason> {
    match item {
        Value::String(text) => Ok(ChatTurn {
            speaker: String::new(),
            text: text.clone(),
        }),
        Value::Object(map) => {
            let pick = |keys: &[&str]| {
                keys.iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str))
                    .unwrap_or("")
                    .to_string()
            };
            Ok(ChatTurn {
                speaker: pick(&["speaker", "role", "sender"]),
                text: pick(&["text", "content", "message"]),
            })
        }
        other => Err(SkipReason::InvalidChat {
            error: format!("unexpected chat entry: {}", other),
        }),
    }
}

/// `Speaker: text` with a short, single-word-ish prefix
fn split_speaker(line: &str) -> Option<(&str, &str)> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    // "[10:00] User: hi" keeps only the speaker
    let line = match line.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
        Some((_, rest)) => rest.trim_start(),
        None => line,
    };
    let (speaker, rest) = line.split_once(':')?;
    let speaker = speaker.trim();
    if speaker.is_empty() || speaker.chars().count() > 40 || rest.starts_with("//") {
        return None;
    }
    Some((speaker, rest.trim()))
}

fn check_periods(session: &Session) -> Result<(), SkipReason> {
    let Some(Value::Object(map)) = &session.dasha_json else {
        return Ok(());
    };

    let pairs = [
        (&session.major_dasha, Column::MajorDasha, ["major", "major_dasha"]),
        (&session.minor_dasha, Column::MinorDasha, ["minor", "minor_dasha"]),
        (&session.sub_minor_dasha, Column::SubMinorDasha, ["sub_minor", "sub_minor_dasha"]),
    ];

    for (flat, column, keys) in pairs {
        if flat.trim().is_empty() {
            continue;
        }
        for key in keys {
            if let Some(Value::String(value)) = map.get(key) {
                if value.trim() != flat.trim() {
                    return Err(SkipReason::PayloadMismatch {
                        column: Column::DashaJson.name().to_string(),
                        field: column.name().to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

const MANGLIK_KEYS: [&str; 2] = ["manglik", "manglik_dosha"];
const PITRA_KEYS: [&str; 2] = ["pitra", "pitra_dosha"];

/// Boolean recorded for an affliction in the payload, if any
fn payload_flag(payload: Option<&Value>, keys: [&str; 2]) -> Option<bool> {
    let Some(Value::Object(map)) = payload else {
        return None;
    };
    keys.iter().find_map(|key| map.get(*key).and_then(Value::as_bool))
}

/// Flags set in the row, and both spellings in the payload, must agree
fn check_afflictions(payload: Option<&Value>, manglik: Option<bool>, pitra: Option<bool>) -> Result<(), SkipReason> {
    let Some(Value::Object(map)) = payload else {
        return Ok(());
    };

    let pairs = [
        (manglik, Column::ManglikDosha, MANGLIK_KEYS),
        (pitra, Column::PitraDosha, PITRA_KEYS),
    ];

    for (flag, column, keys) in pairs {
        let mut expected = flag;
        for key in keys {
            let Some(value) = map.get(key).and_then(Value::as_bool) else {
                continue;
            };
            match expected {
                Some(flag) if flag != value => {
                    return Err(SkipReason::PayloadMismatch {
                        column: Column::DoshaJson.name().to_string(),
                        field: column.name().to_string(),
                    });
                }
                _ => expected = Some(value),
            }
        }
    }
    Ok(())
}
