//! Front-end agnostic view state.
//!
//! These types hold exactly the state a notes screen needs (list, editor
//! form, per-note controls) and enforce its transitions. Rendering is left to
//! the front end.

mod app;
mod editor;
mod item;
mod list;

pub use app::{
    ConnectionStatus, NotesApp, APP_TAGLINE, APP_TITLE, CREATE_HEADING, EDIT_HEADING,
};
pub use editor::{NoteEditorForm, PendingSave, SaveCallback, SubmitOutcome};
pub use item::{
    ConfirmPrompt, DeleteOutcome, EditCallback, NoteItemControl, PendingDelete,
    DELETE_CONFIRMATION,
};
pub use list::{sorted_notes, ListRender, ListState, NoteListView, EMPTY_LIST_MESSAGE};
