//! Document store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Search backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Search transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search response decode error: {0}")]
    Decode(String),

    #[error("Search configuration error: {0}")]
    Config(String),
}

impl SearchError {
    pub fn status(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}
