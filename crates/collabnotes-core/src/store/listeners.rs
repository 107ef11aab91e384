//! Listener bookkeeping shared by the store adapters.
//!
//! Stores queue events with [`ListenerSet::enqueue`] while they still hold
//! their own lock, so the queue order is the mutation order. After releasing
//! that lock they call [`ListenerSet::flush`]. Only one flush delivers at a
//! time; a flush that finds another one running (on another thread, or further
//! up the stack when a listener writes back into the store) leaves its events
//! to it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::StoreEvent;

/// Callback attached to a collection subscription.
pub type Listener = Box<dyn FnMut(StoreEvent) + Send>;

type SharedListener = Arc<Mutex<Listener>>;

struct ListenerEntry {
    id: u64,
    collection: String,
    listener: SharedListener,
}

/// An event waiting for delivery, with the listeners attached when it was queued.
struct Delivery {
    targets: Vec<u64>,
    event: StoreEvent,
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: Vec<ListenerEntry>,
    removal_requests: usize,
    pending: VecDeque<Delivery>,
    delivering: bool,
}

impl ListenerTable {
    fn attached(&self, targets: &[u64]) -> Vec<SharedListener> {
        targets
            .iter()
            .filter_map(|id| self.entries.iter().find(|entry| entry.id == *id))
            .map(|entry| Arc::clone(&entry.listener))
            .collect()
    }
}

/// Registry of listeners keyed by collection.
///
/// Listeners are invoked outside the registry lock and outside the store's
/// lock, one event at a time and in queue order. A callback may add or remove
/// registrations, or write to the store; events it causes are delivered after
/// it returns.
#[derive(Clone, Default)]
pub struct ListenerSet {
    table: Arc<Mutex<ListenerTable>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `collection`.
    pub fn add(&self, collection: &str, listener: Listener) -> ListenerRegistration {
        let mut table = lock(&*self.table);
        table.next_id += 1;
        let id = table.next_id;
        table.entries.push(ListenerEntry {
            id,
            collection: collection.to_string(),
            listener: Arc::new(Mutex::new(listener)),
        });
        tracing::debug!("Attached listener {} to collection '{}'", id, collection);

        ListenerRegistration {
            id,
            table: Arc::downgrade(&self.table),
        }
    }

    /// Queue `event` for every listener currently attached to `collection`.
    pub fn enqueue(&self, collection: &str, event: StoreEvent) {
        let mut table = lock(&*self.table);
        let targets: Vec<u64> = table
            .entries
            .iter()
            .filter(|entry| entry.collection == collection)
            .map(|entry| entry.id)
            .collect();
        if !targets.is_empty() {
            table.pending.push_back(Delivery { targets, event });
        }
    }

    /// Queue `event` for a single registration.
    pub fn enqueue_one(&self, registration: &ListenerRegistration, event: StoreEvent) {
        lock(&*self.table).pending.push_back(Delivery {
            targets: vec![registration.id],
            event,
        });
    }

    /// Deliver queued events in order.
    ///
    /// Returns at once if a delivery is already running; that one drains the
    /// queue, including anything queued here.
    pub fn flush(&self) {
        {
            let mut table = lock(&*self.table);
            if table.delivering {
                return;
            }
            table.delivering = true;
        }
        let _guard = DeliveryGuard { table: &self.table };

        loop {
            let (listeners, event) = {
                let mut table = lock(&*self.table);
                let Some(delivery) = table.pending.pop_front() else {
                    table.delivering = false;
                    return;
                };
                (table.attached(&delivery.targets), delivery.event)
            };

            for listener in listeners {
                let mut callback = lock(&*listener);
                (*callback)(event.clone());
            }
        }
    }

    /// Queue `event` for `collection` and deliver it.
    pub fn notify(&self, collection: &str, event: StoreEvent) {
        self.enqueue(collection, event);
        self.flush();
    }

    /// Number of listeners currently attached to `collection`.
    pub fn active_count(&self, collection: &str) -> usize {
        lock(&*self.table)
            .entries
            .iter()
            .filter(|entry| entry.collection == collection)
            .count()
    }

    /// Number of times any registration asked to be removed, including
    /// requests for listeners that were already gone.
    pub fn removal_requests(&self) -> usize {
        lock(&*self.table).removal_requests
    }
}

/// Releases the delivery slot if a listener panics mid-flush.
struct DeliveryGuard<'a> {
    table: &'a Mutex<ListenerTable>,
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            lock(self.table).delivering = false;
        }
    }
}

/// Handle to one attached listener.
///
/// [`remove`](Self::remove) detaches it; calling it after the listener (or the
/// whole store) is gone is a no-op.
#[derive(Debug)]
pub struct ListenerRegistration {
    id: u64,
    table: Weak<Mutex<ListenerTable>>,
}

impl ListenerRegistration {
    pub const fn id(&self) -> u64 {
        self.id
    }

    pub fn remove(&self) {
        let Some(shared) = self.table.upgrade() else {
            return;
        };
        let mut table = lock(&*shared);
        table.removal_requests += 1;
        let before = table.entries.len();
        table.entries.retain(|entry| entry.id != self.id);
        if table.entries.len() < before {
            tracing::debug!("Detached listener {}", self.id);
        }
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    fn recording_listener(seen: &Arc<Mutex<Vec<StoreEvent>>>) -> Listener {
        let seen = Arc::clone(seen);
        Box::new(move |event| seen.lock().unwrap().push(event))
    }

    fn error(text: &str) -> StoreEvent {
        StoreEvent::Error(StoreError::Backend(text.to_string()))
    }

    #[test]
    fn notify_reaches_only_matching_collection() {
        let set = ListenerSet::new();
        let notes = Arc::new(Mutex::new(Vec::new()));
        let other = Arc::new(Mutex::new(Vec::new()));
        let _a = set.add("notes", recording_listener(&notes));
        let _b = set.add("other", recording_listener(&other));

        set.notify("notes", StoreEvent::Snapshot(Vec::new()));

        assert_eq!(notes.lock().unwrap().len(), 1);
        assert!(other.lock().unwrap().is_empty());
    }

    #[test]
    fn remove_is_idempotent_and_counted() {
        let set = ListenerSet::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registration = set.add("notes", recording_listener(&seen));
        assert_eq!(set.active_count("notes"), 1);

        registration.remove();
        registration.remove();

        assert_eq!(set.active_count("notes"), 0);
        assert_eq!(set.removal_requests(), 2);
        set.notify("notes", StoreEvent::Snapshot(Vec::new()));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn remove_after_store_dropped_is_noop() {
        let set = ListenerSet::new();
        let registration = set.add("notes", Box::new(|_| {}));
        drop(set);
        registration.remove();
    }

    #[test]
    fn listener_may_detach_itself_during_delivery() {
        let set = ListenerSet::new();
        let slot: Arc<Mutex<Option<ListenerRegistration>>> = Arc::new(Mutex::new(None));
        let slot_in_listener = Arc::clone(&slot);
        let registration = set.add(
            "notes",
            Box::new(move |_| {
                if let Some(registration) = slot_in_listener.lock().unwrap().take() {
                    registration.remove();
                }
            }),
        );
        *slot.lock().unwrap() = Some(registration);

        set.notify("notes", StoreEvent::Snapshot(Vec::new()));

        assert_eq!(set.active_count("notes"), 0);
    }

    #[test]
    fn queued_events_arrive_in_queue_order() {
        let set = ListenerSet::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _registration = set.add("notes", recording_listener(&seen));

        set.enqueue("notes", error("first"));
        set.enqueue("notes", error("second"));
        assert!(seen.lock().unwrap().is_empty());
        set.flush();

        assert_eq!(*seen.lock().unwrap(), vec![error("first"), error("second")]);
    }

    #[test]
    fn listener_notifying_its_own_collection_is_delivered_after_it_returns() {
        let set = ListenerSet::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let inner = set.clone();
        let _registration = set.add(
            "notes",
            Box::new(move |event| {
                let first = sink.lock().unwrap().is_empty();
                sink.lock().unwrap().push(event);
                if first {
                    inner.notify("notes", error("echo"));
                    assert_eq!(sink.lock().unwrap().len(), 1);
                }
            }),
        );

        set.notify("notes", error("outer"));

        assert_eq!(*seen.lock().unwrap(), vec![error("outer"), error("echo")]);
    }

    #[test]
    fn listener_added_after_queueing_misses_earlier_event() {
        let set = ListenerSet::new();
        set.enqueue("notes", error("before"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _registration = set.add("notes", recording_listener(&seen));

        set.flush();

        assert!(seen.lock().unwrap().is_empty());
    }
}
