//! The note collection and its mirror in a single key-value slot.
//!
//! Every mutation works on the in-memory collection only. Callers decide
//! when to [`NoteStore::save`]; the whole collection is rewritten each time.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::KeyValueStore;

mod ids;

pub use ids::IdGenerator;

pub const PLACEHOLDER_TITLE: &str = "Untitled Note";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub title: String,
    /// Rich-text markup, stored exactly as received.
    #[serde(default)]
    pub content: String,
}

impl Note {
    pub fn display_title(&self) -> &str {
        display_title(&self.title)
    }
}

/// One row of the rebuilt note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: NoteId,
    pub title: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Persisted,
    Stale { message: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reading slot '{key}': {message}")]
    Read { key: String, message: String },

    #[error("slot '{key}' does not hold a note collection")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoding note collection: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("writing slot '{key}': {message}")]
    Write { key: String, message: String },
}

pub struct NoteStore<S> {
    slots: S,
    key: String,
    notes: Vec<Note>,
    ids: IdGenerator,
    stale: Option<String>,
}

impl<S: KeyValueStore> NoteStore<S> {
    /// Reads the collection from `key`. An absent slot gives an empty
    /// collection; an unreadable or corrupt one is logged and also gives an
    /// empty collection.
    pub fn load(slots: S, key: impl Into<String>, ids: IdGenerator) -> Self {
        let key = key.into();
        let notes = match read_collection(&slots, &key) {
            Ok(Some(notes)) => {
                tracing::debug!(count = notes.len(), %key, "loaded note collection");
                notes
            }
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::error!(%err, "discarding persisted notes, starting empty");
                Vec::new()
            }
        };
        Self {
            slots,
            key,
            notes,
            ids,
            stale: None,
        }
    }

    pub fn save(&mut self) -> PersistOutcome {
        match self.try_save() {
            Ok(()) => {
                self.stale = None;
                PersistOutcome::Persisted
            }
            Err(err) => {
                tracing::error!(%err, "failed to persist notes; in-memory copy is authoritative");
                let message = err.to_string();
                self.stale = Some(message.clone());
                PersistOutcome::Stale { message }
            }
        }
    }

    fn try_save(&self) -> Result<(), StoreError> {
        let blob = serde_json::to_string(&self.notes)?;
        self.slots
            .set(&self.key, &blob)
            .map_err(|err| StoreError::Write {
                key: self.key.clone(),
                message: format!("{err:#}"),
            })
    }

    /// Updates the note named by `id`, or appends a new one. Returns `None`
    /// when nothing was touched: no matching note and nothing to store.
    pub fn upsert(&mut self, id: Option<&NoteId>, title: &str, content: &str) -> Option<NoteId> {
        let trimmed = title.trim();
        if let Some(id) = id {
            if let Some(note) = self.notes.iter_mut().find(|note| &note.id == id) {
                note.title = persisted_title(trimmed);
                note.content = content.to_string();
                return Some(note.id.clone());
            }
            tracing::warn!(%id, "selected note missing during update, creating a new one");
        }
        if trimmed.is_empty() && content.is_empty() {
            return None;
        }
        let notes = &self.notes;
        let id = self
            .ids
            .next(|candidate| notes.iter().any(|note| note.id.as_str() == candidate));
        self.notes.push(Note {
            id: id.clone(),
            title: persisted_title(trimmed),
            content: content.to_string(),
        });
        Some(id)
    }

    pub fn remove(&mut self, id: &NoteId) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| &note.id != id);
        before != self.notes.len()
    }

    pub fn find(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn entries(&self, selection: Option<&NoteId>) -> Vec<ListEntry> {
        self.notes
            .iter()
            .map(|note| ListEntry {
                id: note.id.clone(),
                title: note.display_title().to_string(),
                selected: selection == Some(&note.id),
            })
            .collect()
    }

    /// Whether the last save failed, leaving the slot behind memory.
    pub fn is_stale(&self) -> bool {
        self.stale.is_some()
    }
}

pub fn read_collection<S: KeyValueStore>(
    slots: &S,
    key: &str,
) -> Result<Option<Vec<Note>>, StoreError> {
    let raw = slots.get(key).map_err(|err| StoreError::Read {
        key: key.to_string(),
        message: format!("{err:#}"),
    })?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })
}

fn persisted_title(trimmed: &str) -> String {
    if trimmed.is_empty() {
        PLACEHOLDER_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

fn display_title(title: &str) -> &str {
    if title.trim().is_empty() {
        PLACEHOLDER_TITLE
    } else {
        title
    }
}
