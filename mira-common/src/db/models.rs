//! Data model shared by the review service and its tests

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One turn of the recorded conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub speaker: String,
    pub text: String,
}

/// One imported user interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub age: Option<i64>,
    pub gender: String,
    pub rating: Option<f64>,
    pub summary: String,
    /// Raw chart description as it appeared in the source sheet
    pub kundli: String,
    pub kundli_json: Option<Value>,
    pub major_dasha: String,
    pub minor_dasha: String,
    pub sub_minor_dasha: String,
    pub dasha_json: Option<Value>,
    pub manglik_dosha: bool,
    pub pitra_dosha: bool,
    pub dosha_json: Option<Value>,
    pub chat: Vec<ChatTurn>,
    pub marking: String,
    pub analysis: String,
}

/// Astrologer's judgement of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    #[serde(alias = "cannot-judge")]
    CannotJudge,
    #[default]
    Unset,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
            Verdict::CannotJudge => "cannot_judge",
            Verdict::Unset => "unset",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "correct" => Ok(Verdict::Correct),
            "incorrect" => Ok(Verdict::Incorrect),
            "cannot_judge" => Ok(Verdict::CannotJudge),
            "unset" | "" => Ok(Verdict::Unset),
            _ => Err(Error::unknown_value("verdict", s)),
        }
    }
}

/// Review progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    #[serde(alias = "not-started")]
    NotStarted,
    #[serde(alias = "in-progress")]
    InProgress,
    Completed,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [ReviewStatus::NotStarted, ReviewStatus::InProgress, ReviewStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::NotStarted => "not_started",
            ReviewStatus::InProgress => "in_progress",
            ReviewStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "not_started" => Ok(ReviewStatus::NotStarted),
            "in_progress" => Ok(ReviewStatus::InProgress),
            "completed" => Ok(ReviewStatus::Completed),
            _ => Err(Error::unknown_value("review status", s)),
        }
    }
}

/// Stored review of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub session_id: String,
    pub astrologer_name: String,
    pub verdict: Verdict,
    pub comment: String,
    pub status: ReviewStatus,
    pub created_at: String,
    pub updated_at: String,
}

fn normalize_token(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_parse_accepts_variants() {
        assert_eq!("correct".parse::<Verdict>().unwrap(), Verdict::Correct);
        assert_eq!("Cannot Judge".parse::<Verdict>().unwrap(), Verdict::CannotJudge);
        assert_eq!("cannot-judge".parse::<Verdict>().unwrap(), Verdict::CannotJudge);
        assert_eq!("".parse::<Verdict>().unwrap(), Verdict::Unset);
        assert!("maybe".parse::<Verdict>().is_err());
    }

    #[test]
    fn test_status_parse_and_display_roundtrip() {
        for status in ReviewStatus::ALL {
            assert_eq!(status.to_string().parse::<ReviewStatus>().unwrap(), status);
        }
        assert!("done".parse::<ReviewStatus>().is_err());
    }

    #[test]
    fn test_verdict_serde_names() {
        assert_eq!(serde_json::to_string(&Verdict::CannotJudge).unwrap(), "\"cannot_judge\"");
        let parsed: Verdict = serde_json::from_str("\"cannot-judge\"").unwrap();
        assert_eq!(parsed, Verdict::CannotJudge);
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(serde_json::to_string(&ReviewStatus::InProgress).unwrap(), "\"in_progress\"");
        let parsed: ReviewStatus = serde_json::from_str("\"not-started\"").unwrap();
        assert_eq!(parsed, ReviewStatus::NotStarted);
    }
}
