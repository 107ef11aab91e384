//! Error types for collabnotes-core

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using collabnotes-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in collabnotes-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Upsert of a note failed
    #[error("failed to save note: {0}")]
    Save(#[source] StoreError),

    /// Delete of a note failed
    #[error("failed to delete note: {0}")]
    Delete(#[source] StoreError),

    /// Opening the live subscription failed
    #[error("failed to subscribe to notes: {0}")]
    Subscribe(#[source] StoreError),

    /// Local validation rejected the input before it reached the store
    #[error("Invalid input: {0}")]
    Validation(String),

    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The store failure behind this error, if any.
    pub const fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Save(error) | Self::Delete(error) | Self::Subscribe(error) => Some(error),
            _ => None,
        }
    }
}
