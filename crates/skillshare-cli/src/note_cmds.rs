//! CLI handlers for `skillshare note` subcommands.
//!
//! Implements:
//! - `skillshare note add <title> [--content <text>]`
//! - `skillshare note list` / `skillshare note show <note-id>`
//! - `skillshare note search <text>`
//! - `skillshare note edit <note-id> --title <title> [--content <text>]`
//! - `skillshare note delete <note-id>`

use anyhow::Result;

use skillshare_core::notes::{NoteRequest, NoteService};
use skillshare_core::store::NoteStore;
use skillshare_db::models::Note;

use crate::NoteCommands;
use crate::resolve::parse_id;

pub async fn run_note_command<N: NoteStore>(
    command: NoteCommands,
    service: &NoteService<N>,
    user: &str,
) -> Result<()> {
    match command {
        NoteCommands::Add { title, content } => {
            let note = service.create(user, &NoteRequest::new(title, content)).await?;
            println!("Note {} created.", note.id);
        }
        NoteCommands::List => print_note_table(&service.list(user).await?),
        NoteCommands::Show { note_id } => {
            let note = service.get(user, parse_id("note", &note_id)?).await?;
            print_note(&note);
        }
        NoteCommands::Search { query } => print_note_table(&service.search(user, &query).await?),
        NoteCommands::Edit {
            note_id,
            title,
            content,
        } => {
            let note_id = parse_id("note", &note_id)?;
            let note = service
                .update(user, note_id, &NoteRequest::new(title, content))
                .await?;
            println!("Note {} updated.", note.id);
        }
        NoteCommands::Delete { note_id } => {
            let note_id = parse_id("note", &note_id)?;
            service.delete(user, note_id).await?;
            println!("Note {note_id} deleted.");
        }
    }
    Ok(())
}

fn print_note_table(notes: &[Note]) {
    if notes.is_empty() {
        println!("No notes.");
        return;
    }
    let title_w = notes.iter().map(|n| n.title.len()).max().unwrap_or(5).max(5);
    println!("{:<36}  {:<title_w$}  UPDATED", "ID", "TITLE");
    for note in notes {
        println!(
            "{:<36}  {:<title_w$}  {}",
            note.id,
            note.title,
            note.updated_at.format("%Y-%m-%d %H:%M"),
        );
    }
}

fn print_note(note: &Note) {
    println!("Note: {}", note.title);
    println!("  ID:       {}", note.id);
    println!("  Created:  {}", note.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Updated:  {}", note.updated_at.format("%Y-%m-%d %H:%M"));
    if !note.content.is_empty() {
        println!();
        println!("{}", note.content);
    }
}
