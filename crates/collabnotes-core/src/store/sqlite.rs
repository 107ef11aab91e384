//! `SQLite`-backed document store

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::{params, Connection};

use super::{
    migrations, Document, DocumentStore, Listener, ListenerRegistration, ListenerSet, Snapshot,
    SnapshotEntry, StoreError, StoreEvent,
};
use crate::error::Result;
use crate::time::now_ms;

/// Document store persisted in a local `SQLite` file.
///
/// Documents are stored as JSON text keyed by `(collection, id)`. Snapshots
/// list documents in first-insertion order. Change notifications reach
/// listeners attached through this handle (or its clones) only.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    listeners: ListenerSet,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open a store at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::info!("Opened document store at {}", path.display());
        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    /// Open an in-memory store (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            listeners: ListenerSet::new(),
            path,
        })
    }

    /// Filesystem location, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current contents of `collection`.
    pub fn snapshot(&self, collection: &str) -> std::result::Result<Snapshot, StoreError> {
        read_snapshot(&self.connection(), collection)
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_snapshot(
    conn: &Connection,
    collection: &str,
) -> std::result::Result<Snapshot, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, data FROM documents WHERE collection = ? ORDER BY rowid")?;
    let rows = stmt
        .query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(id, data)| {
            let data: Document = serde_json::from_str(&data).map_err(|error| {
                StoreError::Backend(format!("document '{id}' is not valid JSON: {error}"))
            })?;
            Ok(SnapshotEntry { id, data })
        })
        .collect()
}

impl DocumentStore for SqliteStore {
    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> std::result::Result<(), StoreError> {
        let data = serde_json::to_string(&document)
            .map_err(|error| StoreError::Backend(error.to_string()))?;

        {
            let conn = self.connection();
            conn.execute(
                "INSERT INTO documents (collection, id, data, updated_at) VALUES (?, ?, ?, ?)
                 ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                params![collection, id, data, now_ms()],
            )?;
            let snapshot = read_snapshot(&conn, collection)?;
            self.listeners.enqueue(collection, StoreEvent::Snapshot(snapshot));
        }

        tracing::debug!("Upserted document '{}' in '{}'", id, collection);
        self.listeners.flush();
        Ok(())
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> std::result::Result<(), StoreError> {
        let removed = {
            let conn = self.connection();
            let rows = conn.execute(
                "DELETE FROM documents WHERE collection = ? AND id = ?",
                params![collection, id],
            )?;
            if rows > 0 {
                let snapshot = read_snapshot(&conn, collection)?;
                self.listeners.enqueue(collection, StoreEvent::Snapshot(snapshot));
            }
            rows > 0
        };

        if removed {
            tracing::debug!("Deleted document '{}' from '{}'", id, collection);
            self.listeners.flush();
        }
        Ok(())
    }

    fn subscribe(
        &self,
        collection: &str,
        listener: Listener,
    ) -> std::result::Result<ListenerRegistration, StoreError> {
        let registration = {
            let conn = self.connection();
            let initial = read_snapshot(&conn, collection)?;
            let registration = self.listeners.add(collection, listener);
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

    #[tokio::test(flavor = "current_thread")]
    async fn upsert_then_snapshot_roundtrips_documents() {
        let store = SqliteStore::open_in_memory().unwrap();

        store
            .upsert("notes", "b", json!({"title": "B"}))
            .await
            .unwrap();
        store
            .upsert("notes", "a", json!({"title": "A"}))
            .await
            .unwrap();
        store
            .upsert("notes", "b", json!({"title": "B2"}))
            .await
            .unwrap();

        assert_eq!(
            store.snapshot("notes").unwrap(),
            vec![
                SnapshotEntry::new("b", json!({"title": "B2"})),
                SnapshotEntry::new("a", json!({"title": "A"})),
            ]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn delete_removes_document_and_notifies() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert("notes", "1", json!({})).await.unwrap();

        let pushes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pushes);
        let registration = store
            .subscribe(
                "notes",
                Box::new(move |event| sink.lock().unwrap().push(event)),
            )
            .unwrap();

        store.delete_by_id("notes", "1").await.unwrap();
        store.delete_by_id("notes", "1").await.unwrap();
        registration.remove();

        let pushes = pushes.lock().unwrap();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes[1], StoreEvent::Snapshot(Vec::new()));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn data_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .upsert("notes", "1", json!({"title": "kept"}))
                .await
                .unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.path(), Some(path.as_path()));
        assert_eq!(
            reopened.snapshot("notes").unwrap(),
            vec![SnapshotEntry::new("1", json!({"title": "kept"}))]
        );
    }

    #[test]
    fn corrupt_document_fails_subscription_open() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO documents (collection, id, data, updated_at) VALUES ('notes', 'x', 'not json', 0)",
                [],
            )
            .unwrap();

        let result = store.subscribe("notes", Box::new(|_| {}));
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[test]
    fn concurrent_writers_deliver_snapshots_in_write_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("notes.db")).unwrap();
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sizes);
        let _registration = store
            .subscribe(
                "notes",
                Box::new(move |event| {
                    if let StoreEvent::Snapshot(snapshot) = event {
                        sink.lock().unwrap().push(snapshot.len());
                    }
                }),
            )
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|writer| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let runtime = tokio::runtime::Builder::new_current_thread()
                        .build()
                        .unwrap();
                    for n in 0..25 {
                        runtime
                            .block_on(store.upsert("notes", &format!("{writer}-{n}"), json!({})))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let sizes = sizes.lock().unwrap();
        assert_eq!(*sizes, (0..=100).collect::<Vec<usize>>());
    }
}
