//! Per-note display with edit and delete controls.

use chrono::TimeZone;

use crate::error::Result;
use crate::models::Note;
use crate::service::NoteService;
use crate::store::DocumentStore;
use crate::time::{format_timestamp, format_timestamp_local, time_ago, time_ago_now};
use crate::util::compact_text;

/// Prompt shown before a note is deleted
pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this note?";

/// Blocking yes/no question put to the user.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Called with the unchanged note when the user asks to edit it.
pub type EditCallback = Box<dyn FnMut(&Note) + Send>;

/// What happened when the user activated delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined the confirmation, or delete was disabled
    Declined,
    /// The store accepted the delete; the item leaves with the next snapshot
    Deleted,
    /// The store rejected the delete; carries the message shown on the item
    Failed(String),
}

/// A delete started with [`NoteItemControl::begin_delete`].
#[derive(Debug)]
#[must_use = "a pending delete must be completed with `finish_delete`"]
pub struct PendingDelete {
    note: Note,
}

impl PendingDelete {
    pub const fn note(&self) -> &Note {
        &self.note
    }
}

/// One rendered note.
pub struct NoteItemControl<S> {
    service: NoteService<S>,
    note: Note,
    on_edit: Option<EditCallback>,
    deleting: bool,
    delete_error: Option<String>,
}

impl<S: DocumentStore> NoteItemControl<S> {
    pub fn new(service: NoteService<S>, note: Note) -> Self {
        Self {
            service,
            note,
            on_edit: None,
            deleting: false,
            delete_error: None,
        }
    }

    #[must_use]
    pub fn with_on_edit(mut self, on_edit: EditCallback) -> Self {
        self.on_edit = Some(on_edit);
        self
    }

    /// Show a newer version of the note
    pub fn set_note(&mut self, note: Note) {
        self.note = note;
    }

    pub const fn note(&self) -> &Note {
        &self.note
    }

    pub fn title(&self) -> &str {
        &self.note.title
    }

    pub fn content(&self) -> &str {
        &self.note.content
    }

    /// `"Last updated: 5 minutes ago"`, measured against `now_ms`
    pub fn last_updated_label_at(&self, now_ms: i64) -> String {
        format!("Last updated: {}", time_ago(self.note.last_updated, now_ms))
    }

    pub fn last_updated_label(&self) -> String {
        format!("Last updated: {}", time_ago_now(self.note.last_updated))
    }

    /// Absolute timestamp for the label's tooltip, in `tz`
    pub fn last_updated_title_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        format_timestamp(self.note.last_updated, tz)
    }

    pub fn last_updated_title(&self) -> String {
        format_timestamp_local(self.note.last_updated)
    }

    /// The edit control exists only when the parent supplied a callback
    pub const fn shows_edit(&self) -> bool {
        self.on_edit.is_some()
    }

    pub const fn edit_enabled(&self) -> bool {
        self.on_edit.is_some() && !self.deleting
    }

    pub const fn delete_enabled(&self) -> bool {
        !self.deleting
    }

    pub const fn is_deleting(&self) -> bool {
        self.deleting
    }

    pub const fn delete_label(&self) -> &'static str {
        if self.deleting {
            "Deleting..."
        } else {
            "Delete"
        }
    }

    pub fn delete_error(&self) -> Option<&str> {
        self.delete_error.as_deref()
    }

    /// Hand the note to the edit callback. Returns whether it was called.
    pub fn request_edit(&mut self) -> bool {
        if self.deleting {
            return false;
        }
        match self.on_edit.as_mut() {
            Some(on_edit) => {
                on_edit(&self.note);
                true
            }
            None => false,
        }
    }

    /// Ask for confirmation and, if given, enter the deleting state.
    pub fn begin_delete(&mut self, prompt: &dyn ConfirmPrompt) -> Option<PendingDelete> {
        if self.deleting {
            return None;
        }
        if !prompt.confirm(DELETE_CONFIRMATION) {
            tracing::debug!("Delete of note {} declined", self.note.id);
            return None;
        }

        self.deleting = true;
        self.delete_error = None;
        Some(PendingDelete {
            note: self.note.clone(),
        })
    }

    /// Apply the store's answer to a started delete.
    ///
    /// On success the item stays in the deleting state until the next snapshot
    /// removes it.
    pub fn finish_delete(&mut self, pending: PendingDelete, result: Result<()>) -> DeleteOutcome {
        match result {
            Ok(()) => DeleteOutcome::Deleted,
            Err(error) => {
                tracing::error!("Error deleting note {}: {}", pending.note.id, error);
                let detail = error
                    .store_error()
                    .map_or_else(|| error.to_string(), ToString::to_string);
                let message = format!("Failed to delete note: {}", compact_text(&detail));
                self.deleting = false;
                self.delete_error = Some(message.clone());
                DeleteOutcome::Failed(message)
            }
        }
    }

    /// Confirm, then delete the note from the store.
    pub async fn delete(&mut self, prompt: &dyn ConfirmPrompt) -> DeleteOutcome {
        let Some(pending) = self.begin_delete(prompt) else {
            return DeleteOutcome::Declined;
        };
        let result = self.service.delete_note(&pending.note.id).await;
        self.finish_delete(pending, result)
    }
}
