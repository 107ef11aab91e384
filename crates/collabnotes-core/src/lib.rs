//! collabnotes-core - Core library for collabnotes
//!
//! This crate contains the note model, the document store contract and its
//! local adapters, the live note subscription, and the view state used by
//! every collabnotes front end.

pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
pub mod subscription;
pub mod time;
pub mod transform;
pub mod util;
pub mod view;

pub use error::{Error, Result};
pub use models::{Note, NoteCollection, NoteId};
pub use service::NoteService;
