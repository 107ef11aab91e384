use collabnotes_core::config::NotesConfig;
use collabnotes_core::view::{ConfirmPrompt, DeleteOutcome, NoteItemControl};

use crate::commands::common::{find_note, load_notes, open_service, AssumeYes, TerminalPrompt};
use crate::error::CliError;

pub async fn run_delete(id: &str, assume_yes: bool, config: &NotesConfig) -> Result<(), CliError> {
    if assume_yes {
        run_delete_with_prompt(id, &AssumeYes, config).await
    } else {
        run_delete_with_prompt(id, &TerminalPrompt, config).await
    }
}

pub async fn run_delete_with_prompt(
    id: &str,
    prompt: &dyn ConfirmPrompt,
    config: &NotesConfig,
) -> Result<(), CliError> {
    let service = open_service(config)?;
    let note = find_note(&load_notes(&service)?, id)?;

    let mut item = NoteItemControl::new(service, note);
    match item.delete(prompt).await {
        DeleteOutcome::Deleted => {
            println!("{}", item.note().id);
            Ok(())
        }
        DeleteOutcome::Declined => {
            eprintln!("Delete cancelled");
            Ok(())
        }
        DeleteOutcome::Failed(message) => Err(CliError::DeleteFailed(message)),
    }
}
