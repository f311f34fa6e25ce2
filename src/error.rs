use thiserror::Error;

use crate::models::analysis::ExportFormat;

/// Failure of a single workflow operation.
///
/// Every variant is terminal for the operation that produced it only; the
/// console stays interactive and unrelated state is left as it was.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    /// Nothing usable is staged. Raised locally, never reaches the network.
    #[error("{0}")]
    Validation(String),

    /// An overlapping operation was rejected by a state guard.
    #[error("{0}")]
    Busy(String),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Parse(String),

    #[error("Error exporting {format}: {detail}")]
    Export { format: ExportFormat, detail: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl WorkflowError {
    pub fn http_status(status: u16) -> Self {
        Self::Transport(format!("HTTP error! status: {}", status))
    }

    pub fn export(format: ExportFormat, err: impl std::fmt::Display) -> Self {
        Self::Export {
            format,
            detail: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for WorkflowError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<std::io::Error> for WorkflowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message() {
        let err = WorkflowError::http_status(502);
        assert_eq!(err.to_string(), "HTTP error! status: 502");
        assert!(matches!(err, WorkflowError::Transport(_)));
    }

    #[test]
    fn test_export_error_is_format_qualified() {
        let err = WorkflowError::export(ExportFormat::Document, "HTTP error! status: 404");
        assert_eq!(err.to_string(), "Error exporting PDF: HTTP error! status: 404");
    }

    #[test]
    fn test_json_error_maps_to_parse() {
        let err: WorkflowError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, WorkflowError::Parse(_)));
    }
}
