//! PostgreSQL error types

use thiserror::Error;

/// SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum PostgresError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl PostgresError {
    /// Turn a unique violation into `Conflict(message)`, pass anything else through
    pub fn on_unique(e: sqlx::Error, message: impl Into<String>) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Self::Conflict(message.into())
            }
            _ => Self::Database(e),
        }
    }
}
