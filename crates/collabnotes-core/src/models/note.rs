//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::time::now_ms;

/// An opaque, stable identifier for a note.
///
/// Fresh ids are generated client-side (UUID v7), but any string handed out by
/// the store is accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A note in the shared collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, immutable once assigned
    pub id: NoteId,
    /// Note title
    pub title: String,
    /// Plain text body
    pub content: String,
    /// Last edit or save timestamp (Unix ms)
    pub last_updated: i64,
}

impl Note {
    /// Create a blank note with a freshly generated id, stamped now
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: NoteId::new(),
            title: String::new(),
            content: String::new(),
            last_updated: now_ms(),
        }
    }

    /// Create a note with the given fields and a fresh id, stamped now
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::empty()
        }
    }

    /// Refresh `last_updated` to the current time
    pub fn touch(&mut self) {
        self.last_updated = now_ms();
    }
}
