//! Id-keyed note collection

use std::collections::HashMap;

use super::{Note, NoteId};

/// Mapping from note id to note.
///
/// Keys are unique. Iteration follows the order in which ids were first
/// inserted; display code must not rely on it and sorts by `last_updated`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteCollection {
    order: Vec<NoteId>,
    notes: HashMap<NoteId, Note>,
}

impl NoteCollection {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the note stored under `id`.
    ///
    /// A replaced entry keeps its original iteration position.
    pub fn insert(&mut self, id: NoteId, note: Note) -> Option<Note> {
        let previous = self.notes.insert(id.clone(), note);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.notes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate `(id, note)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&NoteId, &Note)> {
        self.order
            .iter()
            .filter_map(|id| self.notes.get(id).map(|note| (id, note)))
    }

    /// Iterate notes in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Note> {
        self.iter().map(|(_, note)| note)
    }

    /// Iterate ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &NoteId> {
        self.order.iter()
    }
}

impl FromIterator<(NoteId, Note)> for NoteCollection {
    fn from_iter<T: IntoIterator<Item = (NoteId, Note)>>(iter: T) -> Self {
        let mut collection = Self::new();
        for (id, note) in iter {
            collection.insert(id, note);
        }
        collection
    }
}
