use reqwest::StatusCode;
use thiserror::Error;

use crate::utils::file_size::format_size;

/// Why a file was refused before any upload started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    UnsupportedType(String),
    TooLarge { size: u64, limit: u64 },
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::UnsupportedType(ext) => write!(f, "Invalid file type (.{})", ext),
            InvalidReason::TooLarge { size, limit } => write!(
                f,
                "File too large ({} > {})",
                format_size(*size),
                format_size(*limit)
            ),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("No files selected")]
    EmptySelection,

    #[error("{file}: {reason}")]
    InvalidFile { file: String, reason: InvalidReason },

    #[error("An upload is already in progress")]
    RunActive,

    #[error("Upload failed: {file} ({reason})")]
    ChannelFailure { file: String, reason: String },
}

/// Failures of the HTTP transfer channel; each ends one file's channel.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to send request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid API token: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Upload failed with status {status}{}", message_suffix(.message))]
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_file_names_file_and_reason() {
        let err = UploadError::InvalidFile {
            file: "setup.exe".to_string(),
            reason: InvalidReason::UnsupportedType("exe".to_string()),
        };
        assert_eq!(err.to_string(), "setup.exe: Invalid file type (.exe)");
    }

    #[test]
    fn rejected_status_includes_server_message() {
        let err = TransferError::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: Some("File is empty".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Upload failed with status 400 Bad Request: File is empty"
        );

        let err = TransferError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(
            err.to_string(),
            "Upload failed with status 500 Internal Server Error"
        );
    }
}
