//! Live note list.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::{Note, NoteCollection};
use crate::service::NoteService;
use crate::store::DocumentStore;
use crate::subscription::Unsubscribe;

/// Text shown when the collection has no notes
pub const EMPTY_LIST_MESSAGE: &str = "No notes yet. Create your first note!";

/// Lifecycle of the list's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListState {
    /// Waiting for the first snapshot
    #[default]
    Loading,
    /// Showing the latest snapshot
    Ready,
    /// The subscription failed; terminal until remount
    Errored,
}

/// What the list should display right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRender {
    Loading,
    Error(String),
    /// Ready, but the collection is empty
    Empty,
    /// Notes, newest first
    Notes(Vec<Note>),
}

#[derive(Debug, Default)]
struct ListModel {
    state: ListState,
    notes: NoteCollection,
    error: Option<String>,
}

impl ListModel {
    fn apply_change(&mut self, notes: NoteCollection) {
        if self.state == ListState::Errored {
            tracing::debug!("Ignoring note snapshot after subscription error");
            return;
        }
        self.notes = notes;
        self.state = ListState::Ready;
        self.error = None;
    }

    fn apply_error(&mut self, detail: &str) {
        self.state = ListState::Errored;
        self.error = Some(format!(
            "Error loading notes: {}",
            crate::util::compact_text(detail)
        ));
    }
}

/// Order notes newest first by `last_updated`.
///
/// The sort is stable: notes with equal timestamps keep collection order.
pub fn sorted_notes(notes: &NoteCollection) -> Vec<Note> {
    let mut sorted: Vec<Note> = notes.values().cloned().collect();
    sorted.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    sorted
}

/// List of notes kept live by a subscription.
///
/// [`mount`](Self::mount) opens the subscription once; reading or rendering
/// never opens another. [`unmount`](Self::unmount), or dropping the view,
/// closes it exactly once.
pub struct NoteListView<S> {
    service: NoteService<S>,
    model: Arc<Mutex<ListModel>>,
    subscription: Option<Unsubscribe>,
    mounted: bool,
}

impl<S: DocumentStore> NoteListView<S> {
    pub fn new(service: NoteService<S>) -> Self {
        Self {
            service,
            model: Arc::new(Mutex::new(ListModel::default())),
            subscription: None,
            mounted: false,
        }
    }

    /// Start listening for notes. No-op while already mounted, including
    /// after the subscription failed to open.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        *self.model() = ListModel::default();

        let on_change = {
            let model = Arc::clone(&self.model);
            move |notes| lock(&model).apply_change(notes)
        };
        let on_error = {
            let model = Arc::clone(&self.model);
            move |error: crate::store::StoreError| lock(&model).apply_error(&error.to_string())
        };

        match self.service.subscribe(on_change, on_error) {
            Ok(handle) => self.subscription = Some(handle),
            Err(error) => {
                tracing::error!("Error setting up note subscription: {}", error);
                self.model().apply_error(&error.to_string());
            }
        }
    }

    /// Stop listening. Safe to call in any state.
    pub fn unmount(&mut self) {
        self.mounted = false;
        if let Some(mut handle) = self.subscription.take() {
            handle.unsubscribe();
        }
    }

    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn state(&self) -> ListState {
        self.model().state
    }

    pub fn is_loading(&self) -> bool {
        self.state() == ListState::Loading
    }

    pub fn error(&self) -> Option<String> {
        self.model().error.clone()
    }

    /// Latest mapping received from the store
    pub fn notes(&self) -> NoteCollection {
        self.model().notes.clone()
    }

    /// Latest notes, newest first
    pub fn sorted_notes(&self) -> Vec<Note> {
        sorted_notes(&self.model().notes)
    }

    pub fn render(&self) -> ListRender {
        let model = self.model();
        match model.state {
            ListState::Loading => ListRender::Loading,
            ListState::Errored => ListRender::Error(model.error.clone().unwrap_or_default()),
            ListState::Ready if model.notes.is_empty() => ListRender::Empty,
            ListState::Ready => ListRender::Notes(sorted_notes(&model.notes)),
        }
    }

    pub fn service(&self) -> &NoteService<S> {
        &self.service
    }

    fn model(&self) -> MutexGuard<'_, ListModel> {
        lock(&self.model)
    }
}

impl<S> Drop for NoteListView<S> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.subscription.take() {
            handle.unsubscribe();
        }
    }
}

fn lock(model: &Mutex<ListModel>) -> MutexGuard<'_, ListModel> {
    model.lock().unwrap_or_else(PoisonError::into_inner)
}
