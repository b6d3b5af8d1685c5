use crate::notes::{Note, NoteId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Unbound,
    Bound(NoteId),
}

/// The two editor inputs and the note they are bound to, if any.
#[derive(Debug, Clone, Default)]
pub struct EditorBinding {
    selection: Option<NoteId>,
    title: String,
    content: String,
}

impl EditorBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> EditorMode {
        match &self.selection {
            Some(id) => EditorMode::Bound(id.clone()),
            None => EditorMode::Unbound,
        }
    }

    pub fn selection(&self) -> Option<&NoteId> {
        self.selection.as_ref()
    }

    pub fn is_bound_to(&self, id: &NoteId) -> bool {
        self.selection.as_ref() == Some(id)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn bind(&mut self, note: &Note) {
        self.selection = Some(note.id.clone());
        self.title = note.title.clone();
        self.content = note.content.clone();
    }

    pub fn clear(&mut self) {
        self.selection = None;
        self.title.clear();
        self.content.clear();
    }

    pub(crate) fn record_inputs(&mut self, title: &str, content: &str) {
        self.title.clear();
        self.title.push_str(title);
        self.content.clear();
        self.content.push_str(content);
    }

    pub(crate) fn select(&mut self, id: NoteId) {
        self.selection = Some(id);
    }
}
