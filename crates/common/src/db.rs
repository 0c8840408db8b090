//! Shared database types for Telecare
//!
//! Conversation store implementations report failures through this type
//! before they are mapped onto the HTTP-facing [`Error`].

use crate::error::Error;
use thiserror::Error;

/// Store-level error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Error::NotFound("Record not found".to_string()),
            RepositoryError::Rejected(msg) => Error::Conflict(msg),
            RepositoryError::Connection(e) => Error::Database(e),
            RepositoryError::InvalidData(msg) => Error::Validation(msg),
        }
    }
}
