use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RegError {
    #[error("unknown record type: {0}")]
    InvalidRecordType(String),

    #[error("missing config file regsync.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("table request failed: {0}")]
    TableHttp(String),

    #[error("table backend returned status {status}: {message}")]
    TableStatus { status: u16, message: String },

    #[error("unexpected table response shape: {0}")]
    UnexpectedResponse(String),

    #[error("record not found: {table}/{id}")]
    RecordNotFound { table: String, id: String },

    #[error("no records parsed from input")]
    EmptyInput,

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl RegError {
    /// Transient failures are worth retrying; everything else is terminal
    /// for the item that produced it.
    pub fn is_transient(&self) -> bool {
        match self {
            RegError::TableHttp(_) => true,
            RegError::TableStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = RegError::TableStatus {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_transient());
        assert!(RegError::TableHttp("connection reset".to_string()).is_transient());
    }

    #[test]
    fn client_errors_are_terminal() {
        let err = RegError::TableStatus {
            status: 400,
            message: "bad payload".to_string(),
        };
        assert!(!err.is_transient());
        assert!(!RegError::EmptyInput.is_transient());
    }
}
