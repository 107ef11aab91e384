//! Live subscription to the notes collection.
//!
//! [`subscribe`] opens exactly one store listener per call and hands back an
//! [`Unsubscribe`] handle that owns it. [`NoteStream`] offers the same
//! full-snapshot feed as a cancellable async stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::models::NoteCollection;
use crate::store::{DocumentStore, Listener, ListenerRegistration, StoreError, StoreEvent};
use crate::transform::transform;

/// Something delivered by a note subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteEvent {
    /// The collection changed; carries the complete new mapping
    Changed(NoteCollection),
    /// The store reported a failure on the live stream
    Failed(StoreError),
}

/// Teardown handle for one subscription.
///
/// Stops delivery to both callbacks. Safe to call any number of times, and
/// runs automatically on drop.
#[derive(Debug)]
pub struct Unsubscribe {
    registration: Option<ListenerRegistration>,
    active: Arc<AtomicBool>,
}

impl Unsubscribe {
    pub fn unsubscribe(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(registration) = self.registration.take() {
            registration.remove();
            tracing::debug!("Closed note subscription {}", registration.id());
        }
    }

    /// Whether callbacks may still be invoked
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Subscribe to changes of `collection`.
///
/// Every snapshot the store pushes is transformed and passed to `on_change`
/// synchronously, in the order the store emits them. Stream failures go to
/// `on_error`. Fails with [`Error::Subscribe`] if the store cannot open the
/// listener.
pub fn subscribe<S, C, E>(
    store: &S,
    collection: &str,
    mut on_change: C,
    mut on_error: E,
) -> Result<Unsubscribe>
where
    S: DocumentStore + ?Sized,
    C: FnMut(NoteCollection) + Send + 'static,
    E: FnMut(StoreError) + Send + 'static,
{
    let active = Arc::new(AtomicBool::new(true));
    let listener_active = Arc::clone(&active);
    let listener_collection = collection.to_string();

    let listener: Listener = Box::new(move |event| {
        if !listener_active.load(Ordering::SeqCst) {
            return;
        }
        match event {
            StoreEvent::Snapshot(snapshot) => on_change(transform(&snapshot)),
            StoreEvent::Error(error) => {
                tracing::error!("Error fetching notes from '{}': {}", listener_collection, error);
                on_error(error);
            }
        }
    });

    let registration = store.subscribe(collection, listener).map_err(|error| {
        tracing::error!("Failed to subscribe to '{}': {}", collection, error);
        Error::Subscribe(error)
    })?;
    tracing::debug!(
        "Opened note subscription {} on '{}'",
        registration.id(),
        collection
    );

    Ok(Unsubscribe {
        registration: Some(registration),
        active,
    })
}

/// Note subscription exposed as an async event stream.
pub struct NoteStream {
    receiver: mpsc::UnboundedReceiver<NoteEvent>,
    subscription: Unsubscribe,
}

impl NoteStream {
    /// Open a stream over `collection`. The initial snapshot is the first event.
    pub fn open<S>(store: &S, collection: &str) -> Result<Self>
    where
        S: DocumentStore + ?Sized,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let error_sender = sender.clone();
        let subscription = subscribe(
            store,
            collection,
            move |notes| {
                let _ = sender.send(NoteEvent::Changed(notes));
            },
            move |error| {
                let _ = error_sender.send(NoteEvent::Failed(error));
            },
        )?;

        Ok(Self {
            receiver,
            subscription,
        })
    }

    /// Wait for the next event. `None` once the stream is closed.
    pub async fn next(&mut self) -> Option<NoteEvent> {
        if !self.subscription.is_active() {
            return None;
        }
        self.receiver.recv().await
    }

    /// Take the next buffered event without waiting.
    pub fn try_next(&mut self) -> Option<NoteEvent> {
        if !self.subscription.is_active() {
            return None;
        }
        self.receiver.try_recv().ok()
    }

    /// Cancel the stream; buffered events are discarded.
    pub fn close(&mut self) {
        self.subscription.unsubscribe();
        self.receiver.close();
    }
}
