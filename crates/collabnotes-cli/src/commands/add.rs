use collabnotes_core::config::NotesConfig;
use collabnotes_core::view::{NoteEditorForm, SubmitOutcome};
use collabnotes_core::Note;

use crate::commands::common::{open_service, resolve_note_content};
use crate::error::CliError;

pub async fn run_add(
    title: &str,
    content: Option<String>,
    config: &NotesConfig,
) -> Result<Note, CliError> {
    let content = resolve_note_content(content)?;

    let service = open_service(config)?;
    let mut form = NoteEditorForm::new(service, None);
    form.set_title(title);
    form.set_content(content);

    match form.submit().await? {
        SubmitOutcome::Saved(note) => {
            println!("{}", note.id);
            Ok(note)
        }
        SubmitOutcome::Failed(message) => Err(CliError::SaveFailed(message)),
    }
}
