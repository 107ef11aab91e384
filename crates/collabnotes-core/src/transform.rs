//! Conversion between raw store documents and notes.
//!
//! Decoding is lenient: malformed documents are coerced into the note shape
//! (and logged) rather than rejected, so a snapshot always yields exactly one
//! note per distinct id.

use serde_json::{Map, Value};

use crate::models::{Note, NoteCollection, NoteId};
use crate::store::SnapshotEntry;

/// Build the id-keyed collection for a snapshot.
///
/// Keys come from the snapshot entries, never from the document body. A
/// repeated id keeps its first position and takes the later document.
pub fn transform(snapshot: &[SnapshotEntry]) -> NoteCollection {
    snapshot
        .iter()
        .map(|entry| {
            let id = NoteId::from(entry.id.as_str());
            (id, decode_note(&entry.id, &entry.data))
        })
        .collect()
}

/// Decode one document stored under `id`, coercing malformed fields.
pub fn decode_note(id: &str, data: &Value) -> Note {
    let empty = Map::new();
    let fields = data.as_object().unwrap_or_else(|| {
        tracing::warn!("Document '{}' is not an object; decoding as empty note", id);
        &empty
    });

    let mut coerced = Vec::new();
    let title = text_field(fields, "title", &mut coerced);
    let content = text_field(fields, "content", &mut coerced);
    let last_updated = timestamp_field(fields, "lastUpdated", &mut coerced);

    if let Some(embedded) = fields.get("id").and_then(Value::as_str) {
        if embedded != id {
            tracing::debug!("Document '{}' embeds mismatched id '{}'", id, embedded);
        }
    }
    if !coerced.is_empty() {
        tracing::warn!(
            "Coerced malformed fields of document '{}': {}",
            id,
            coerced.join(", ")
        );
    }

    Note {
        id: NoteId::from(id),
        title,
        content,
        last_updated,
    }
}

/// Document shape written to the store for a note.
pub fn encode_note(note: &Note) -> Value {
    serde_json::json!({
        "id": note.id.as_str(),
        "title": note.title,
        "content": note.content,
        "lastUpdated": note.last_updated,
    })
}

fn text_field(
    fields: &Map<String, Value>,
    name: &'static str,
    coerced: &mut Vec<&'static str>,
) -> String {
    match fields.get(name) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => {
            coerced.push(name);
            String::new()
        }
        Some(other) => {
            coerced.push(name);
            other.to_string()
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn timestamp_field(
    fields: &Map<String, Value>,
    name: &'static str,
    coerced: &mut Vec<&'static str>,
) -> i64 {
    let parsed = match fields.get(name) {
        Some(Value::Number(number)) => {
            if let Some(value) = number.as_i64() {
                return value;
            }
            number
                .as_f64()
                .filter(|value| value.is_finite())
                .map(|value| value.trunc() as i64)
        }
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .map(|value| value.trunc() as i64)
            })
        }
        _ => None,
    };

    coerced.push(name);
    parsed.unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry(id: &str, data: Value) -> SnapshotEntry {
        SnapshotEntry::new(id, data)
    }

    #[test]
    fn transform_empty_snapshot_is_empty() {
        assert!(transform(&[]).is_empty());
    }

    #[test]
    fn transform_keys_by_snapshot_id() {
        let snapshot = vec![entry(
            "1",
            json!({"id": "1", "title": "Note 1", "content": "Content 1", "lastUpdated": 1_234_567_890}),
        )];

        let notes = transform(&snapshot);

        assert_eq!(notes.len(), 1);
        assert_eq!(
            notes.get(&NoteId::from("1")),
            Some(&Note {
                id: NoteId::from("1"),
                title: "Note 1".to_string(),
                content: "Content 1".to_string(),
                last_updated: 1_234_567_890,
            })
        );
    }

    #[test]
    fn transform_prefers_snapshot_key_over_embedded_id() {
        let snapshot = vec![entry(
            "outer",
            json!({"id": "inner", "title": "t", "content": "c", "lastUpdated": 1}),
        )];

        let notes = transform(&snapshot);

        assert!(notes.contains(&NoteId::from("outer")));
        assert!(!notes.contains(&NoteId::from("inner")));
        assert_eq!(notes.get(&NoteId::from("outer")).unwrap().id.as_str(), "outer");
    }

    #[test]
    fn transform_one_entry_per_distinct_id() {
        let snapshot = vec![
            entry("a", json!({"title": "first", "content": "", "lastUpdated": 1})),
            entry("b", json!({"title": "b", "content": "", "lastUpdated": 2})),
            entry("a", json!({"title": "second", "content": "", "lastUpdated": 3})),
        ];

        let notes = transform(&snapshot);

        assert_eq!(notes.len(), 2);
        assert_eq!(notes.get(&NoteId::from("a")).unwrap().title, "second");
        let ids: Vec<_> = notes.ids().map(NoteId::as_str).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn decode_coerces_malformed_fields() {
        let note = decode_note("x", &json!({"title": 42, "lastUpdated": "1700000000000.9"}));

        assert_eq!(note.title, "42");
        assert_eq!(note.content, "");
        assert_eq!(note.last_updated, 1_700_000_000_000);
    }

    #[test]
    fn decode_non_object_document_is_empty_note() {
        let note = decode_note("x", &json!("just a string"));

        assert_eq!(note.id.as_str(), "x");
        assert!(note.title.is_empty());
        assert_eq!(note.last_updated, 0);
    }

    #[test]
    fn decode_float_timestamp_truncates() {
        let note = decode_note("x", &json!({"title": "", "content": "", "lastUpdated": 12.7}));
        assert_eq!(note.last_updated, 12);
    }

    #[test]
    fn encode_then_decode_preserves_note() {
        let note = Note::new("Title", "Body");
        assert_eq!(decode_note(note.id.as_str(), &encode_note(&note)), note);
    }
}
