use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] collabnotes_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("Nothing to change; pass --title and/or --content")]
    NothingToEdit,
    #[error("{0}")]
    LoadFailed(String),
    #[error("{0}")]
    SaveFailed(String),
    #[error("{0}")]
    DeleteFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
