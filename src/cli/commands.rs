use std::fmt::Write as _;
use std::io::{self, Read};

use anyhow::{bail, Result};
use clap::Args;

use crate::app::{Action, ActionOutcome, App};
use crate::notes::NoteId;
use crate::persist::PersistEvent;
use crate::storage::KeyValueStore;

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note (may be empty if content is given)
    #[arg()]
    pub title: Option<String>,
    /// Provide the note markup inline. If omitted, reads from stdin.
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Note identifier
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Note identifier
    pub id: String,
    /// New title (kept when omitted)
    #[arg(long)]
    pub title: Option<String>,
    /// New markup content (kept when omitted)
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Note identifier
    pub id: String,
}

pub fn list_notes<S: KeyValueStore>(app: &App<S>) -> String {
    let entries = app.entries();
    if entries.is_empty() {
        return "(no notes)\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(&mut out, "{}  {}", entry.id, entry.title);
    }
    out
}

pub fn new_note<S: KeyValueStore>(app: &mut App<S>, args: NewArgs) -> Result<String> {
    app.dispatch(Action::NewNote);
    let outcome = app.dispatch(Action::Input {
        title: args.title.unwrap_or_default(),
        content: args.content.unwrap_or_default(),
    });
    match outcome {
        ActionOutcome::Edited {
            note_id: Some(id),
            persist,
        } => {
            ensure_persisted(persist)?;
            Ok(format!("Created note {id}\n"))
        }
        ActionOutcome::Edited { note_id: None, .. } => Ok("Nothing to save.\n".to_string()),
        other => bail!("unexpected outcome creating note: {other:?}"),
    }
}

pub fn show_note<S: KeyValueStore>(app: &mut App<S>, args: ShowArgs) -> Result<String> {
    let id = open_existing(app, &args.id)?;
    let binding = app.binding();
    let title = app
        .store()
        .find(&id)
        .map(|note| note.display_title().to_string())
        .unwrap_or_default();
    let mut out = String::new();
    let _ = writeln!(&mut out, "#{id}  {title}");
    if !binding.content().is_empty() {
        let _ = writeln!(&mut out);
        let _ = writeln!(&mut out, "{}", binding.content());
    }
    Ok(out)
}

pub fn edit_note<S: KeyValueStore>(app: &mut App<S>, args: EditArgs) -> Result<String> {
    if args.title.is_none() && args.content.is_none() {
        bail!("nothing to change; pass --title and/or --content");
    }
    let id = open_existing(app, &args.id)?;
    let title = args
        .title
        .unwrap_or_else(|| app.binding().title().to_string());
    let content = args
        .content
        .unwrap_or_else(|| app.binding().content().to_string());
    match app.dispatch(Action::Input { title, content }) {
        ActionOutcome::Edited { persist, .. } => ensure_persisted(persist)?,
        other => bail!("unexpected outcome editing note {id}: {other:?}"),
    }
    Ok(format!("Updated note {id}\n"))
}

pub fn delete_note<S: KeyValueStore>(app: &mut App<S>, args: DeleteArgs) -> Result<String> {
    let id = NoteId::from(args.id.trim());
    match app.dispatch(Action::Delete(id.clone())) {
        ActionOutcome::Deleted {
            removed: true,
            persist,
        } => {
            ensure_persisted(persist)?;
            Ok(format!("Deleted note {id}\n"))
        }
        ActionOutcome::Deleted { removed: false, .. } => {
            Ok(format!("No note {id}; nothing deleted\n"))
        }
        other => bail!("unexpected outcome deleting note {id}: {other:?}"),
    }
}

/// Turns a failed save into an error; a CLI run ends right after, so an
/// in-memory-only change would be lost.
pub fn ensure_persisted(event: Option<PersistEvent>) -> Result<()> {
    match event {
        Some(PersistEvent::Failed { message }) => bail!("notes were not saved: {message}"),
        _ => Ok(()),
    }
}

fn open_existing<S: KeyValueStore>(app: &mut App<S>, raw: &str) -> Result<NoteId> {
    let id = NoteId::from(raw.trim());
    match app.dispatch(Action::Open(id)) {
        ActionOutcome::Opened(id) => Ok(id),
        ActionOutcome::Missing(id) => bail!("note {id} not found"),
        other => bail!("unexpected outcome opening note: {other:?}"),
    }
}

pub(crate) fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}
