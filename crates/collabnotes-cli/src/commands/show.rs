use collabnotes_core::config::NotesConfig;
use collabnotes_core::view::NoteItemControl;

use crate::commands::common::{find_note, load_notes, note_to_list_item, open_service};
use crate::error::CliError;

pub fn run_show(id: &str, as_json: bool, config: &NotesConfig) -> Result<(), CliError> {
    let service = open_service(config)?;
    let note = find_note(&load_notes(&service)?, id)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note_to_list_item(&note))?);
        return Ok(());
    }

    let item = NoteItemControl::new(service, note);
    println!("{}", item.title());
    println!(
        "{} ({})",
        item.last_updated_label(),
        item.last_updated_title()
    );
    println!();
    println!("{}", item.content());
    Ok(())
}
