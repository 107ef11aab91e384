use chrono::Utc;
use collabnotes_core::config::NotesConfig;
use collabnotes_core::view::EMPTY_LIST_MESSAGE;

use crate::commands::common::{
    format_note_lines, load_notes, note_to_list_item, open_service, NoteListItem,
};
use crate::error::CliError;

pub fn run_list(as_json: bool, config: &NotesConfig) -> Result<(), CliError> {
    let service = open_service(config)?;
    let notes = load_notes(&service)?;

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("{EMPTY_LIST_MESSAGE}");
    } else {
        for line in format_note_lines(&notes, Utc::now().timestamp_millis()) {
            println!("{line}");
        }
    }

    Ok(())
}
