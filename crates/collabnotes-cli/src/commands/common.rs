use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use collabnotes_core::config::NotesConfig;
use collabnotes_core::store::SqliteStore;
use collabnotes_core::time::time_ago;
use collabnotes_core::view::{ConfirmPrompt, ListRender, NoteListView};
use collabnotes_core::{Note, NoteService};
use serde::Serialize;

use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub last_updated: i64,
    pub relative_time: String,
}

pub fn load_config(
    db_path: Option<PathBuf>,
    collection: Option<String>,
) -> Result<NotesConfig, CliError> {
    Ok(NotesConfig::from_env()?.with_overrides(db_path, collection))
}

pub fn open_service(config: &NotesConfig) -> Result<NoteService<SqliteStore>, CliError> {
    let store = SqliteStore::open(&config.store_path)?;
    Ok(NoteService::with_collection(
        Arc::new(store),
        config.collection.clone(),
    ))
}

/// Read the collection once through a short-lived list subscription.
pub fn load_notes(service: &NoteService<SqliteStore>) -> Result<Vec<Note>, CliError> {
    let mut view = NoteListView::new(service.clone());
    view.mount();
    let render = view.render();
    view.unmount();

    match render {
        ListRender::Notes(notes) => Ok(notes),
        ListRender::Empty | ListRender::Loading => Ok(Vec::new()),
        ListRender::Error(message) => Err(CliError::LoadFailed(message)),
    }
}

/// Resolve a full id or unique id prefix against `notes`.
pub fn find_note(notes: &[Note], query: &str) -> Result<Note, CliError> {
    let query = normalize_note_identifier(query)?;

    if let Some(note) = notes.iter().find(|note| note.id.as_str() == query) {
        return Ok(note.clone());
    }

    let matches = notes
        .iter()
        .filter(|note| note.id.as_str().starts_with(&query))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(CliError::NoteNotFound(query)),
        [note] => Ok((*note).clone()),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|note| short_id(note))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(note: &Note) -> String {
    note.id.as_str().chars().take(SHORT_ID_LEN).collect()
}

pub fn format_note_lines(notes: &[Note], now_ms: i64) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let short_id = short_id(note);
            let title = note_preview(&note.title, 40);
            let relative_time = time_ago(note.last_updated, now_ms);
            format!("{short_id:<13}  {title:<40}  {relative_time}")
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();

    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        content: note.content.clone(),
        last_updated: note.last_updated,
        relative_time: time_ago(note.last_updated, now_ms),
    }
}

pub fn note_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

/// Content from the flag, else from piped stdin.
pub fn resolve_note_content(content: Option<String>) -> Result<String, CliError> {
    if let Some(content) = content.as_deref().and_then(normalize_content) {
        return Ok(content);
    }

    read_piped_stdin()?.ok_or(CliError::EmptyContent)
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks on stderr and reads the answer from stdin.
pub struct TerminalPrompt;

impl ConfirmPrompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> bool {
        let mut stderr = io::stderr();
        if write!(stderr, "{message} [y/N] ").and_then(|()| stderr.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(error) => {
                tracing::warn!("Failed to read confirmation: {}", error);
                false
            }
        }
    }
}

/// Accepts every confirmation (`--yes`).
pub struct AssumeYes;

impl ConfirmPrompt for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}
