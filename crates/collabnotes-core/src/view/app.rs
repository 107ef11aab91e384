//! Top-level notes screen: editor form above the live list.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;
use crate::models::Note;
use crate::service::NoteService;
use crate::store::DocumentStore;
use crate::view::editor::{NoteEditorForm, SubmitOutcome};
use crate::view::item::NoteItemControl;
use crate::view::list::{ListState, NoteListView};

pub const APP_TITLE: &str = "Collaborative Notes App";
pub const APP_TAGLINE: &str = "Changes are synced in real-time across all connected users";
pub const CREATE_HEADING: &str = "Create New Note";
pub const EDIT_HEADING: &str = "Edit Note";

/// Header indicator for the live connection to the note store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connected => "Connected to note store",
            Self::Disconnected => "Note store not connected",
        }
    }

    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Wires one list view and one editor form to the same service.
pub struct NotesApp<S> {
    service: NoteService<S>,
    list: NoteListView<S>,
    editor: NoteEditorForm<S>,
    editing: Option<Note>,
    edit_request: Arc<Mutex<Option<Note>>>,
}

impl<S: DocumentStore> NotesApp<S> {
    pub fn new(service: NoteService<S>) -> Self {
        Self {
            list: NoteListView::new(service.clone()),
            editor: NoteEditorForm::new(service.clone(), None),
            service,
            editing: None,
            edit_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn mount(&mut self) {
        self.list.mount();
    }

    pub fn unmount(&mut self) {
        self.list.unmount();
    }

    /// Connected while the list is mounted and its subscription has not failed.
    pub fn connection_status(&self) -> ConnectionStatus {
        if self.list.is_mounted() && self.list.state() != ListState::Errored {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    pub const fn heading(&self) -> &'static str {
        if self.editing.is_some() {
            EDIT_HEADING
        } else {
            CREATE_HEADING
        }
    }

    pub const fn editing(&self) -> Option<&Note> {
        self.editing.as_ref()
    }

    /// Load `note` into the editor form.
    pub fn begin_edit(&mut self, note: Note) {
        tracing::debug!("Editing note {}", note.id);
        self.editor.set_target(Some(note.clone()));
        self.editing = Some(note);
    }

    /// Leave edit mode after a successful save.
    pub fn note_saved(&mut self) {
        self.editing = None;
        self.editor.set_target(None);
    }

    /// Submit the editor; a successful save leaves edit mode.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let outcome = self.editor.submit().await?;
        if matches!(outcome, SubmitOutcome::Saved(_)) {
            self.note_saved();
        }
        Ok(outcome)
    }

    /// One control per listed note, newest first.
    ///
    /// Edit requests from the controls are picked up by
    /// [`apply_edit_request`](Self::apply_edit_request).
    pub fn item_controls(&self) -> Vec<NoteItemControl<S>> {
        self.list
            .sorted_notes()
            .into_iter()
            .map(|note| {
                let slot = Arc::clone(&self.edit_request);
                NoteItemControl::new(self.service.clone(), note).with_on_edit(Box::new(
                    move |note: &Note| {
                        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(note.clone());
                    },
                ))
            })
            .collect()
    }

    /// Start editing the note most recently requested by an item control.
    pub fn apply_edit_request(&mut self) -> bool {
        let requested = self
            .edit_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match requested {
            Some(note) => {
                self.begin_edit(note);
                true
            }
            None => false,
        }
    }

    pub const fn list(&self) -> &NoteListView<S> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut NoteListView<S> {
        &mut self.list
    }

    pub const fn editor(&self) -> &NoteEditorForm<S> {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut NoteEditorForm<S> {
        &mut self.editor
    }

    pub const fn service(&self) -> &NoteService<S> {
        &self.service
    }
}
