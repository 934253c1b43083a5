use thiserror::Error;

use crate::session::form::ValidationErrors;

/// Message shown for every failed upload, whatever the cause.
pub const UPLOAD_FAILED: &str = "Upload failed. Please check backend logs.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// One or more form fields failed validation.
    #[error("form validation failed: {0}")]
    Validation(ValidationErrors),

    /// Transport failure, non-2xx status, or an unusable response body.
    /// The detail is for logs only; users see [`UPLOAD_FAILED`].
    #[error("request failed: {0}")]
    Request(String),

    #[error("session storage: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(String),
}

impl ClientError {
    pub fn request(detail: impl std::fmt::Display) -> Self {
        ClientError::Request(detail.to_string())
    }

    /// The text a user may see for this error.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(errs) => errs.to_string(),
            ClientError::Request(_) => UPLOAD_FAILED.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Request(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
