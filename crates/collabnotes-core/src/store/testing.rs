//! Programmable store double for unit tests.

use std::sync::{Mutex, MutexGuard};

use super::{
    Document, DocumentStore, Listener, ListenerRegistration, ListenerSet, Snapshot, StoreError,
    StoreEvent,
};

#[derive(Default)]
struct FakeState {
    subscribe_calls: usize,
    upserts: Vec<(String, String, Document)>,
    deletes: Vec<(String, String)>,
    fail_open: Option<StoreError>,
    fail_upsert: Option<StoreError>,
    fail_delete: Option<StoreError>,
}

/// Store that records every call and only pushes what the test tells it to.
#[derive(Default)]
pub struct FakeStore {
    listeners: ListenerSet,
    state: Mutex<FakeState>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn fail_open_with(&self, error: StoreError) {
        self.state().fail_open = Some(error);
    }

    pub fn fail_upserts_with(&self, error: StoreError) {
        self.state().fail_upsert = Some(error);
    }

    pub fn fail_deletes_with(&self, error: StoreError) {
        self.state().fail_delete = Some(error);
    }

    pub fn push_snapshot(&self, collection: &str, snapshot: Snapshot) {
        self.listeners.notify(collection, StoreEvent::Snapshot(snapshot));
    }

    pub fn push_error(&self, collection: &str, error: StoreError) {
        self.listeners.notify(collection, StoreEvent::Error(error));
    }

    pub fn subscribe_calls(&self) -> usize {
        self.state().subscribe_calls
    }

    pub fn removal_requests(&self) -> usize {
        self.listeners.removal_requests()
    }

    pub fn active_listeners(&self, collection: &str) -> usize {
        self.listeners.active_count(collection)
    }

    pub fn upserts(&self) -> Vec<(String, String, Document)> {
        self.state().upserts.clone()
    }

    pub fn deletes(&self) -> Vec<(String, String)> {
        self.state().deletes.clone()
    }
}

impl DocumentStore for FakeStore {
    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        state
            .upserts
            .push((collection.to_string(), id.to_string(), document));
        state.fail_upsert.clone().map_or(Ok(()), Err)
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        state.deletes.push((collection.to_string(), id.to_string()));
        state.fail_delete.clone().map_or(Ok(()), Err)
    }

    fn subscribe(
        &self,
        collection: &str,
        listener: Listener,
    ) -> Result<ListenerRegistration, StoreError> {
        let fail_open = {
            let mut state = self.state();
            state.subscribe_calls += 1;
            state.fail_open.clone()
        };
        if let Some(error) = fail_open {
            return Err(error);
        }
        Ok(self.listeners.add(collection, listener))
    }
}
