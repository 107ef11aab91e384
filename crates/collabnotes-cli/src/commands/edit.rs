use collabnotes_core::config::NotesConfig;
use collabnotes_core::view::{NotesApp, SubmitOutcome};
use collabnotes_core::Note;

use crate::commands::common::{find_note, load_notes, normalize_content, open_service};
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    title: Option<&str>,
    content: Option<&str>,
    config: &NotesConfig,
) -> Result<Note, CliError> {
    let title = title.and_then(normalize_content);
    let content = content.and_then(normalize_content);
    if title.is_none() && content.is_none() {
        return Err(CliError::NothingToEdit);
    }

    let service = open_service(config)?;
    let note = find_note(&load_notes(&service)?, id)?;

    let mut app = NotesApp::new(service);
    app.begin_edit(note);
    if let Some(title) = title {
        app.editor_mut().set_title(title);
    }
    if let Some(content) = content {
        app.editor_mut().set_content(content);
    }

    match app.submit().await? {
        SubmitOutcome::Saved(updated) => {
            println!("{}", updated.id);
            Ok(updated)
        }
        SubmitOutcome::Failed(message) => Err(CliError::SaveFailed(message)),
    }
}
