//! Create/edit form for a single note.

use crate::error::{Error, Result};
use crate::models::Note;
use crate::service::NoteService;
use crate::store::DocumentStore;
use crate::util::{compact_text, has_text};

/// Called with the persisted note after every successful save.
pub type SaveCallback = Box<dyn FnMut(&Note) + Send>;

/// Result of a submit that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The note was persisted
    Saved(Note),
    /// The store rejected the write; carries the message shown on the form
    Failed(String),
}

/// A save that has been started with [`NoteEditorForm::begin_submit`].
#[derive(Debug)]
#[must_use = "a pending save must be completed with `finish_submit`"]
pub struct PendingSave {
    note: Note,
    was_new: bool,
}

impl PendingSave {
    /// The exact note being written
    pub const fn note(&self) -> &Note {
        &self.note
    }
}

/// Editor for one in-progress note.
///
/// Field edits only touch the local draft. The draft reaches the store on
/// submit, as a full create-or-replace keyed by the draft's id.
pub struct NoteEditorForm<S> {
    service: NoteService<S>,
    target: Option<Note>,
    draft: Note,
    saving: bool,
    error: Option<String>,
    on_save: Option<SaveCallback>,
}

impl<S: DocumentStore> NoteEditorForm<S> {
    /// Form editing `target`, or creating a new note when `None`
    pub fn new(service: NoteService<S>, target: Option<Note>) -> Self {
        let draft = target.clone().unwrap_or_else(Note::empty);
        Self {
            service,
            target,
            draft,
            saving: false,
            error: None,
            on_save: None,
        }
    }

    #[must_use]
    pub fn with_on_save(mut self, on_save: SaveCallback) -> Self {
        self.on_save = Some(on_save);
        self
    }

    /// Switch to editing another note (or back to creating one).
    ///
    /// A different target discards the current draft and any error.
    pub fn set_target(&mut self, target: Option<Note>) {
        if target == self.target {
            return;
        }
        self.draft = target.clone().unwrap_or_else(Note::empty);
        self.target = target;
        self.error = None;
        tracing::debug!("Editor now targets note {}", self.draft.id);
    }

    pub const fn draft(&self) -> &Note {
        &self.draft
    }

    pub const fn target(&self) -> Option<&Note> {
        self.target.as_ref()
    }

    /// Whether submitting creates a note rather than updating one
    pub const fn is_new(&self) -> bool {
        self.target.is_none()
    }

    pub const fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Inputs and the submit control are disabled while a save is in flight
    pub const fn fields_disabled(&self) -> bool {
        self.saving
    }

    pub const fn submit_label(&self) -> &'static str {
        if self.saving {
            "Saving..."
        } else if self.target.is_some() {
            "Update Note"
        } else {
            "Save Note"
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if self.ignore_edit() {
            return;
        }
        self.draft.title = title.into();
        self.draft.touch();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        if self.ignore_edit() {
            return;
        }
        self.draft.content = content.into();
        self.draft.touch();
    }

    fn ignore_edit(&self) -> bool {
        if self.saving {
            tracing::debug!("Ignoring edit while note {} is saving", self.draft.id);
        }
        self.saving
    }

    /// Check the draft without touching the store
    pub fn validate(&self) -> Result<()> {
        if !has_text(&self.draft.title) {
            return Err(Error::Validation("title is required".into()));
        }
        if !has_text(&self.draft.content) {
            return Err(Error::Validation("content is required".into()));
        }
        Ok(())
    }

    /// Validate, mark the form as saving, and stamp the draft.
    pub fn begin_submit(&mut self) -> Result<PendingSave> {
        if self.saving {
            return Err(Error::Validation("a save is already in progress".into()));
        }
        self.validate()?;

        self.saving = true;
        self.error = None;
        self.draft.touch();
        Ok(PendingSave {
            note: self.draft.clone(),
            was_new: self.is_new(),
        })
    }

    /// Apply the store's answer to a started save.
    pub fn finish_submit(&mut self, pending: PendingSave, result: Result<()>) -> SubmitOutcome {
        self.saving = false;

        match result {
            Ok(()) => {
                if let Some(on_save) = self.on_save.as_mut() {
                    on_save(&pending.note);
                }
                if pending.was_new {
                    self.draft = Note::empty();
                }
                SubmitOutcome::Saved(pending.note)
            }
            Err(error) => {
                tracing::error!("Error saving note {}: {}", pending.note.id, error);
                let detail = error
                    .store_error()
                    .map_or_else(|| error.to_string(), ToString::to_string);
                let message = format!("Failed to save note: {}", compact_text(&detail));
                self.error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Validate and persist the draft.
    ///
    /// Returns `Err` only for local validation failures, which never reach the
    /// store. Store failures come back as [`SubmitOutcome::Failed`].
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let pending = self.begin_submit()?;
        let result = self.service.save_note(pending.note()).await;
        Ok(self.finish_submit(pending, result))
    }
}
