//! Error type shared by the Mira crates
//!
//! Validation failures (`UnknownSession`, `UnknownValue`, `InvalidInput`) are
//! the caller's to fix; the service reports them without touching the store.
//! Everything else ends the request as a server error.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file, CLI or environment value rejected at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored payload or chat column that does not round-trip through JSON
    #[error("Stored {column} is not valid JSON: {source}")]
    StoredJson {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// CSV export or chart PNG could not be produced
    #[error("Failed to encode {format}: {message}")]
    Encode { format: &'static str, message: String },

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// Verdict, status or filter token outside the accepted set
    #[error("Unknown {kind}: '{value}'")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Adapter for `map_err` on JSON columns
    pub fn stored_json(column: &'static str) -> impl FnOnce(serde_json::Error) -> Error {
        move |source| Error::StoredJson { column, source }
    }

    pub fn unknown_value(kind: &'static str, value: &str) -> Error {
        Error::UnknownValue {
            kind,
            value: value.trim().to_string(),
        }
    }

    /// True for failures the caller can correct by changing the request
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnknownSession(_) | Error::UnknownValue { .. } | Error::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classes() {
        assert!(Error::UnknownSession("S9".into()).is_validation());
        assert!(Error::unknown_value("verdict", " maybe ").is_validation());
        assert!(!Error::Config("port".into()).is_validation());
        assert!(!Error::Internal("x".into()).is_validation());
    }

    #[test]
    fn test_stored_json_names_column() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::stored_json("chat")(source);
        assert!(err.to_string().starts_with("Stored chat is not valid JSON"));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_unknown_value_message() {
        assert_eq!(
            Error::unknown_value("review status", "done").to_string(),
            "Unknown review status: 'done'"
        );
    }
}
