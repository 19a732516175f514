//! Store error types

use std::path::PathBuf;

use shipit_core::{ErrorKind, ShipitError};
use thiserror::Error;

/// Errors from distribution channels
#[derive(Debug, Error)]
pub enum StoreError {
    /// The service rejected the login for reasons other than bad credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The stored username/password pair was rejected
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// API error from a remote service
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// A single artifact upload failed
    #[error("Upload of {file} failed: {reason}")]
    UploadFailed { file: String, reason: String },

    /// One or more artifacts have no download URL after publishing
    #[error("Missing download URLs for: {}", missing.join(", "))]
    MissingArtifacts { missing: Vec<String> },

    /// The announcement draft has not been written
    #[error("Reddit post must be in {0}")]
    DraftMissing(PathBuf),

    /// FTP protocol error
    #[error("FTP error: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the core library (credentials, documents)
    #[error(transparent)]
    Core(#[from] ShipitError),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationFailed(_) | Self::InvalidCredentials(_) => ErrorKind::Auth,
            Self::ApiError { status, .. } if *status == 401 || *status == 403 => ErrorKind::Auth,
            Self::ApiError { .. } | Self::Http(_) | Self::Ftp(_) => ErrorKind::Network,
            Self::UploadFailed { .. } | Self::MissingArtifacts { .. } => ErrorKind::Upload,
            Self::DraftMissing(_) => ErrorKind::NotFound,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Validation,
            Self::Core(e) => e.kind(),
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether a new username/password pair might fix this error
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials(_))
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
