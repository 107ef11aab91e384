//! In-process document store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    Document, DocumentStore, Listener, ListenerRegistration, ListenerSet, Snapshot, SnapshotEntry,
    StoreError, StoreEvent,
};

/// Document store kept entirely in memory.
///
/// Behaves like a local emulator of the hosted database: documents keep their
/// first-insertion position, a write replaces the whole document, and every
/// change pushes the full collection to its listeners. Cloning shares state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, Snapshot>>>,
    listeners: ListenerSet,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of `collection`.
    pub fn snapshot(&self, collection: &str) -> Snapshot {
        self.collections()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of listeners attached to `collection`.
    pub fn listener_count(&self, collection: &str) -> usize {
        self.listeners.active_count(collection)
    }

    /// Create or replace a document and notify listeners.
    pub fn put(&self, collection: &str, id: &str, document: Document) {
        self.mutate(collection, |entries| {
            if let Some(existing) = entries.iter_mut().find(|entry| entry.id == id) {
                existing.data = document;
            } else {
                entries.push(SnapshotEntry::new(id, document));
            }
            true
        });
        tracing::debug!("Upserted document '{}' in '{}'", id, collection);
    }

    /// Remove a document. Returns whether it existed.
    pub fn remove(&self, collection: &str, id: &str) -> bool {
        let removed = self.mutate(collection, |entries| {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            entries.len() < before
        });
        if removed {
            tracing::debug!("Deleted document '{}' from '{}'", id, collection);
        } else {
            tracing::debug!("Delete of missing document '{}' in '{}'", id, collection);
        }
        removed
    }

    /// Apply `change` and, if it reports a change, queue the new snapshot
    /// before the collection lock is released.
    fn mutate<F>(&self, collection: &str, change: F) -> bool
    where
        F: FnOnce(&mut Snapshot) -> bool,
    {
        let changed = {
            let mut collections = self.collections();
            let entries = collections.entry(collection.to_string()).or_default();
            let changed = change(entries);
            if changed {
                self.listeners.enqueue(collection, StoreEvent::Snapshot(entries.clone()));
            }
            changed
        };
        self.listeners.flush();
        changed
    }

    fn collections(&self) -> MutexGuard<'_, HashMap<String, Snapshot>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryStore {
    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> Result<(), StoreError> {
        self.put(collection, id, document);
        Ok(())
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.remove(collection, id);
        Ok(())
    }

    fn subscribe(
        &self,
        collection: &str,
        listener: Listener,
    ) -> Result<ListenerRegistration, StoreError> {
        let registration = {
            let collections = self.collections();
            let registration = self.listeners.add(collection, listener);
            let initial = collections.get(collection).cloned().unwrap_or_default();
            self.listeners.enqueue_one(&registration, StoreEvent::Snapshot(initial));
            registration
        };
        self.listeners.flush();
        Ok(registration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn collect_snapshots(store: &MemoryStore) -> (Arc<Mutex<Vec<Snapshot>>>, ListenerRegistration) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let registration = store
            .subscribe(
                "notes",
                Box::new(move |event| {
                    if let StoreEvent::Snapshot(snapshot) = event {
                        sink.lock().unwrap().push(snapshot);
                    }
                }),
            )
            .unwrap();
        (seen, registration)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn subscribe_pushes_initial_snapshot() {
        let store = MemoryStore::new();
        store.upsert("notes", "1", json!({"title": "a"})).await.unwrap();

        let (seen, _registration) = collect_snapshots(&store);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], vec![SnapshotEntry::new("1", json!({"title": "a"}))]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn upsert_replaces_in_place_and_pushes_full_snapshot() {
        let store = MemoryStore::new();
        let (seen, _registration) = collect_snapshots(&store);

        store.upsert("notes", "a", json!({"v": 1})).await.unwrap();
        store.upsert("notes", "b", json!({"v": 2})).await.unwrap();
        store.upsert("notes", "a", json!({"v": 3})).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(
            seen[3],
            vec![
                SnapshotEntry::new("a", json!({"v": 3})),
                SnapshotEntry::new("b", json!({"v": 2})),
            ]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn delete_missing_document_succeeds_without_push() {
        let store = MemoryStore::new();
        let (seen, _registration) = collect_snapshots(&store);

        store.delete_by_id("notes", "nope").await.unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn removed_listener_stops_receiving() {
        let store = MemoryStore::new();
        let (seen, registration) = collect_snapshots(&store);
        registration.remove();

        store.upsert("notes", "1", json!({})).await.unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(store.listener_count("notes"), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn collections_are_isolated() {
        let store = MemoryStore::new();
        store.upsert("notes", "1", json!({})).await.unwrap();
        store.upsert("drafts", "2", json!({})).await.unwrap();

        assert_eq!(store.snapshot("notes").len(), 1);
        assert_eq!(store.snapshot("drafts")[0].id, "2");
        assert!(store.snapshot("missing").is_empty());
    }

    #[test]
    fn concurrent_writers_leave_listener_on_latest_snapshot() {
        const WRITERS: usize = 4;
        const WRITES: usize = 50;

        for _ in 0..50 {
            let store = MemoryStore::new();
            let last_len = Arc::new(Mutex::new(0));
            let sink = Arc::clone(&last_len);
            let _registration = store
                .subscribe(
                    "notes",
                    Box::new(move |event| {
                        if let StoreEvent::Snapshot(snapshot) = event {
                            *sink.lock().unwrap() = snapshot.len();
                        }
                    }),
                )
                .unwrap();

            let handles: Vec<_> = (0..WRITERS)
                .map(|writer| {
                    let store = store.clone();
                    std::thread::spawn(move || {
                        for n in 0..WRITES {
                            store.put("notes", &format!("{writer}-{n}"), json!({}));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(store.snapshot("notes").len(), WRITERS * WRITES);
            assert_eq!(*last_len.lock().unwrap(), WRITERS * WRITES);
        }
    }

    #[test]
    fn listener_can_write_back_into_the_store() {
        let store = MemoryStore::new();
        let inner = store.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _registration = store
            .subscribe(
                "notes",
                Box::new(move |event| {
                    let StoreEvent::Snapshot(snapshot) = event else {
                        return;
                    };
                    let echo_needed = snapshot.len() == 1;
                    sink.lock().unwrap().push(snapshot.len());
                    if echo_needed {
                        inner.put("notes", "echo", json!({"title": "echo"}));
                    }
                }),
            )
            .unwrap();

        let (done, finished) = std::sync::mpsc::channel();
        let writer = store.clone();
        std::thread::spawn(move || {
            writer.put("notes", "1", json!({"title": "first"}));
            let _ = done.send(());
        });

        assert!(finished
            .recv_timeout(std::time::Duration::from_secs(5))
            .is_ok());
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(store.snapshot("notes")[1].id, "echo");
    }
}
