//! Document store contract and local adapters.
//!
//! The hosted database is an external collaborator. Everything in this crate
//! talks to it through [`DocumentStore`]: upsert by id, delete by id, and a
//! change subscription that pushes the full collection on every mutation.

mod listeners;
mod memory;
mod migrations;
mod sqlite;
#[cfg(test)]
pub(crate) mod testing;

use serde_json::Value;
use thiserror::Error;

pub use listeners::{Listener, ListenerRegistration, ListenerSet};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A raw document as held by the store.
pub type Document = Value;

/// One `(id, document)` pair of a collection snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    /// Document key inside the collection; authoritative for indexing
    pub id: String,
    /// Raw document fields
    pub data: Document,
}

impl SnapshotEntry {
    pub fn new(id: impl Into<String>, data: Document) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// The complete current state of a collection, in store order.
pub type Snapshot = Vec<SnapshotEntry>;

/// Something a store pushes to a subscribed listener.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Snapshot(Snapshot),
    Error(StoreError),
}

/// Failures reported by a document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request (permissions, quota, ...)
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The backing engine failed
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Backend(error.to_string())
    }
}

/// Operations the notes core needs from a document database.
///
/// Writes are create-or-replace keyed by id with last-write-wins semantics;
/// no version check is performed.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Create the document if absent, otherwise replace it entirely
    async fn upsert(&self, collection: &str, id: &str, document: Document)
        -> Result<(), StoreError>;

    /// Remove the document with the given id
    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Attach a listener to a collection.
    ///
    /// The listener receives a full snapshot on attach and after every later
    /// change, or an error event if the stream fails. Fails synchronously if
    /// the subscription cannot be opened.
    fn subscribe(
        &self,
        collection: &str,
        listener: Listener,
    ) -> Result<ListenerRegistration, StoreError>;
}
