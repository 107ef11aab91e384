//! Note operations against an injected document store.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{Note, NoteCollection, NoteId};
use crate::store::{DocumentStore, StoreError};
use crate::subscription::{self, NoteStream, Unsubscribe};
use crate::transform::encode_note;

/// Default collection holding the shared notes
pub const NOTES_COLLECTION: &str = "notes";

/// Save, delete, and subscribe to notes in one collection.
///
/// The store is injected and shared; cloning the service is cheap.
pub struct NoteService<S> {
    store: Arc<S>,
    collection: String,
}

impl<S> Clone for NoteService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            collection: self.collection.clone(),
        }
    }
}

impl<S: DocumentStore> NoteService<S> {
    /// Service over the default `notes` collection
    pub fn new(store: Arc<S>) -> Self {
        Self::with_collection(store, NOTES_COLLECTION)
    }

    pub fn with_collection(store: Arc<S>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create or replace `note` in the store.
    pub async fn save_note(&self, note: &Note) -> Result<()> {
        self.store
            .upsert(&self.collection, note.id.as_str(), encode_note(note))
            .await
            .map_err(|error| {
                tracing::error!("Error saving note {}: {}", note.id, error);
                Error::Save(error)
            })?;
        tracing::info!("Saved note {}", note.id);
        Ok(())
    }

    /// Remove the note with `id` from the store.
    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        self.store
            .delete_by_id(&self.collection, id.as_str())
            .await
            .map_err(|error| {
                tracing::error!("Error deleting note {}: {}", id, error);
                Error::Delete(error)
            })?;
        tracing::info!("Deleted note {}", id);
        Ok(())
    }

    /// Subscribe to the collection; see [`subscription::subscribe`].
    pub fn subscribe<C, E>(&self, on_change: C, on_error: E) -> Result<Unsubscribe>
    where
        C: FnMut(NoteCollection) + Send + 'static,
        E: FnMut(StoreError) + Send + 'static,
    {
        subscription::subscribe(&*self.store, &self.collection, on_change, on_error)
    }

    /// Open the collection as an async event stream.
    pub fn stream(&self) -> Result<NoteStream> {
        NoteStream::open(&*self.store, &self.collection)
    }
}
