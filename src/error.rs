//! Error types for the sky_drive crate.

use thiserror::Error;

/// Errors that can occur when talking to the SkyDrive API.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Required argument is empty: {0}")]
    ArgumentError(&'static str),

    #[error("Request failed ({status}): {body}")]
    RequestFailure { status: u16, body: String },

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid authorization code or redirect URL: {0}")]
    InvalidAuthorizationCode(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl DriveError {
    /// HTTP status carried by a request failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailure { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server rejected the access token; callers are
    /// expected to refresh and retry themselves.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
