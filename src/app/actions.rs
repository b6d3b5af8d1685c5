use crate::notes::NoteId;
use crate::persist::PersistEvent;
use crate::storage::KeyValueStore;

use super::App;

/// Discrete user actions a front end feeds into the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    NewNote,
    Open(NoteId),
    Input { title: String, content: String },
    Delete(NoteId),
    Flush,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Cleared,
    Opened(NoteId),
    Missing(NoteId),
    Edited {
        note_id: Option<NoteId>,
        persist: Option<PersistEvent>,
    },
    Deleted {
        removed: bool,
        persist: Option<PersistEvent>,
    },
    Flushed(Option<PersistEvent>),
}

pub struct ActionDispatcher<'a, S: KeyValueStore> {
    app: &'a mut App<S>,
}

impl<'a, S: KeyValueStore> ActionDispatcher<'a, S> {
    pub fn new(app: &'a mut App<S>) -> Self {
        Self { app }
    }

    pub fn dispatch(&mut self, action: Action) -> ActionOutcome {
        tracing::trace!(?action, "dispatching action");
        match action {
            Action::NewNote => {
                self.app.begin_new();
                ActionOutcome::Cleared
            }
            Action::Open(id) => {
                if self.app.open(&id) {
                    ActionOutcome::Opened(id)
                } else {
                    ActionOutcome::Missing(id)
                }
            }
            Action::Input { title, content } => {
                let persist = self.app.input(&title, &content);
                ActionOutcome::Edited {
                    note_id: self.app.binding().selection().cloned(),
                    persist,
                }
            }
            Action::Delete(id) => {
                let (removed, persist) = self.app.delete(&id);
                ActionOutcome::Deleted { removed, persist }
            }
            Action::Flush => ActionOutcome::Flushed(self.app.flush()),
        }
    }
}
