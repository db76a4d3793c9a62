//! OAuth provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OAuthError {
    /// The provider refused the authorization code
    #[error("Authorization code rejected: {0}")]
    Rejected(String),

    #[error("OAuth provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("OAuth transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("OAuth response decode error: {0}")]
    Decode(String),

    #[error("OAuth configuration error: {0}")]
    Config(String),
}

impl OAuthError {
    pub fn status(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}
