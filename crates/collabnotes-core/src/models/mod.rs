//! Data models for collabnotes

mod collection;
mod note;

pub use collection::NoteCollection;
pub use note::{Note, NoteId};
