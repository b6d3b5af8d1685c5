//! Controller tying the note store, the editor binding and the persistence
//! schedule together. Front ends call these operations and redraw from
//! [`App::entries`] and [`App::binding`] afterwards.

use crate::config::{AppConfig, MarkupPolicy};
use crate::markup::prepare_content;
use crate::notes::{IdGenerator, ListEntry, NoteId, NoteStore};
use crate::persist::{PersistEvent, PersistScheduler, PersistStatus};
use crate::storage::KeyValueStore;

mod actions;
pub mod format;
pub mod state;

pub use actions::{Action, ActionDispatcher, ActionOutcome};
pub use format::{FormatCommand, FormattingSurface};
pub use state::{EditorBinding, EditorMode};

pub struct App<S: KeyValueStore> {
    store: NoteStore<S>,
    binding: EditorBinding,
    scheduler: PersistScheduler,
    markup: MarkupPolicy,
    entries: Vec<ListEntry>,
}

impl<S: KeyValueStore> App<S> {
    /// Loads the collection from `slots`. The editor always starts unbound.
    pub fn new(slots: S, config: &AppConfig) -> Self {
        let store = NoteStore::load(
            slots,
            config.storage.notes_key.clone(),
            IdGenerator::new(config.ids.strategy),
        );
        let mut app = Self {
            store,
            binding: EditorBinding::new(),
            scheduler: PersistScheduler::new(&config.persistence),
            markup: config.markup.policy,
            entries: Vec::new(),
        };
        app.refresh_entries();
        app
    }

    pub fn dispatch(&mut self, action: Action) -> ActionOutcome {
        ActionDispatcher::new(self).dispatch(action)
    }

    pub fn store(&self) -> &NoteStore<S> {
        &self.store
    }

    pub fn binding(&self) -> &EditorBinding {
        &self.binding
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn persist_status(&self) -> PersistStatus {
        self.scheduler.status()
    }

    /// Binds the editor to `id`. A missing note leaves the editor cleared
    /// and unbound.
    pub fn open(&mut self, id: &NoteId) -> bool {
        let opened = match self.store.find(id) {
            Some(note) => {
                self.binding.bind(note);
                true
            }
            None => {
                tracing::warn!(%id, "note not found, clearing editor");
                self.binding.clear();
                false
            }
        };
        self.refresh_entries();
        opened
    }

    pub fn begin_new(&mut self) {
        self.binding.clear();
        self.refresh_entries();
    }

    /// Writes the current editor inputs back into the store.
    pub fn input(&mut self, title: &str, content: &str) -> Option<PersistEvent> {
        self.binding.record_inputs(title, content);
        let content = prepare_content(self.markup, content);
        let selection = self.binding.selection().cloned();
        let note_id = self.store.upsert(selection.as_ref(), title, &content)?;
        if selection.as_ref() != Some(&note_id) {
            tracing::debug!(%note_id, "editor bound to new note");
            self.binding.select(note_id);
        }
        let event = self.scheduler.on_mutation(&mut self.store);
        self.refresh_entries();
        event
    }

    pub fn input_title(&mut self, title: &str) -> Option<PersistEvent> {
        let content = self.binding.content().to_string();
        self.input(title, &content)
    }

    pub fn input_content(&mut self, content: &str) -> Option<PersistEvent> {
        let title = self.binding.title().to_string();
        self.input(&title, content)
    }

    /// Removes `id` and reports whether anything was removed, plus the
    /// save that followed. Nothing is saved when the id was absent.
    pub fn delete(&mut self, id: &NoteId) -> (bool, Option<PersistEvent>) {
        let removed = self.store.remove(id);
        let event = if removed {
            self.scheduler.on_mutation(&mut self.store)
        } else {
            None
        };
        if self.binding.is_bound_to(id) {
            self.binding.clear();
        }
        self.refresh_entries();
        (removed, event)
    }

    /// Hands a formatting command to the host surface. Failures are logged
    /// and never reach the caller.
    pub fn apply_format<F: FormattingSurface>(
        &mut self,
        surface: &mut F,
        command: &FormatCommand,
    ) -> bool {
        if let FormatCommand::CreateLink(url) = command {
            if url.trim().is_empty() {
                return false;
            }
        }
        match surface.exec(command.name(), command.argument()) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(?err, command = command.name(), "format command failed");
                false
            }
        }
    }

    /// Gives a debounced schedule the chance to save.
    pub fn tick(&mut self) -> Option<PersistEvent> {
        self.scheduler.poll(&mut self.store)
    }

    pub fn flush(&mut self) -> Option<PersistEvent> {
        self.scheduler.flush_now(&mut self.store)
    }

    fn refresh_entries(&mut self) {
        self.entries = self.store.entries(self.binding.selection());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IdStrategy, PersistenceConfig};
    use crate::notes::PLACEHOLDER_TITLE;
    use crate::storage::MemorySlots;
    use anyhow::bail;
    use assert_matches::assert_matches;

    fn app(slots: &MemorySlots) -> App<MemorySlots> {
        App::new(slots.clone(), &AppConfig::default())
    }

    fn titles<S: KeyValueStore>(app: &App<S>) -> Vec<String> {
        app.entries().iter().map(|e| e.title.clone()).collect()
    }

    #[test]
    fn typing_into_unbound_editor_creates_and_binds() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);

        let event = app.input("Groceries", "<p>milk</p>");
        assert_matches!(event, Some(PersistEvent::Saved { .. }));
        let EditorMode::Bound(id) = app.binding().mode() else {
            panic!("editor should be bound after first input");
        };
        let note = app.store().find(&id).expect("note stored");
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "<p>milk</p>");
        assert_eq!(titles(&app), vec!["Groceries"]);
        assert!(app.entries()[0].selected);
    }

    #[test]
    fn every_keystroke_updates_the_same_note() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);
        for prefix in ["G", "Gr", "Gro", "Groc"] {
            app.input_title(prefix);
        }
        app.input_content("<p>eggs</p>");

        assert_eq!(app.store().len(), 1);
        let reloaded = App::new(slots.clone(), &AppConfig::default());
        let note = &reloaded.store().notes()[0];
        assert_eq!(note.title, "Groc");
        assert_eq!(note.content, "<p>eggs</p>");
    }

    #[test]
    fn empty_input_in_unbound_editor_does_nothing() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);
        assert_eq!(app.input("", ""), None);
        assert!(app.store().is_empty());
        assert_eq!(app.binding().mode(), EditorMode::Unbound);
        assert!(slots.raw(&AppConfig::default().storage.notes_key).is_none());
    }

    #[test]
    fn clearing_title_of_bound_note_keeps_placeholder() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);
        app.input("Draft", "");
        app.input_title("");
        assert_eq!(titles(&app), vec![PLACEHOLDER_TITLE]);
        assert_eq!(app.binding().title(), "");
        assert_eq!(app.store().len(), 1);
    }

    #[test]
    fn new_note_unbinds_and_next_input_creates_another() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);
        app.input("First", "");
        app.begin_new();
        assert_eq!(app.binding().mode(), EditorMode::Unbound);
        assert_eq!(app.binding().title(), "");

        app.input("Second", "");
        assert_eq!(titles(&app), vec!["First", "Second"]);
        assert!(app.entries()[1].selected);
    }

    #[test]
    fn opening_populates_inputs_and_missing_id_unbinds() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);
        app.input("Groceries", "<p>milk</p>");
        let id = app.binding().selection().cloned().expect("bound");
        app.begin_new();

        assert!(app.open(&id));
        assert_eq!(app.binding().title(), "Groceries");
        assert_eq!(app.binding().content(), "<p>milk</p>");

        assert!(!app.open(&NoteId::from("stale")));
        assert_eq!(app.binding().mode(), EditorMode::Unbound);
        assert_eq!(app.binding().content(), "");
    }

    #[test]
    fn deleting_bound_note_resets_selection() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);
        app.input("A", "");
        let a = app.binding().selection().cloned().expect("a");
        app.begin_new();
        app.input("B", "");
        let b = app.binding().selection().cloned().expect("b");
        app.open(&a);

        let (removed, event) = app.delete(&a);
        assert!(removed);
        assert_matches!(event, Some(PersistEvent::Saved { .. }));
        assert_eq!(app.binding().mode(), EditorMode::Unbound);
        let ids: Vec<_> = app.store().notes().iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec![b.clone()]);

        assert_eq!(app.delete(&a), (false, None));
        assert_eq!(app.store().len(), 1);

        let reloaded = App::new(slots.clone(), &AppConfig::default());
        assert!(reloaded.store().find(&a).is_none());
        assert!(reloaded.store().find(&b).is_some());
    }

    #[test]
    fn deleting_other_note_keeps_selection() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);
        app.input("A", "");
        let a = app.binding().selection().cloned().expect("a");
        app.begin_new();
        app.input("B", "");
        let b = app.binding().selection().cloned().expect("b");

        app.delete(&a);
        assert_eq!(app.binding().mode(), EditorMode::Bound(b));
        assert_eq!(app.binding().title(), "B");
    }

    #[test]
    fn delete_reports_failed_save() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);
        app.input("Keep out", "");
        let id = app.binding().selection().cloned().expect("id");
        slots.set_quota(Some(0));

        let (removed, event) = app.delete(&id);
        assert!(removed);
        assert_matches!(event, Some(PersistEvent::Failed { .. }));
        assert!(app.store().is_stale());
        assert!(app.store().find(&id).is_none());

        let reloaded = App::new(slots.clone(), &AppConfig::default());
        assert!(reloaded.store().find(&id).is_some());
    }

    #[test]
    fn fresh_session_starts_unbound() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);
        app.input("Persisted", "");

        let next = App::new(slots.clone(), &AppConfig::default());
        assert_eq!(next.binding().mode(), EditorMode::Unbound);
        assert_eq!(titles(&next), vec!["Persisted"]);
        assert!(!next.entries()[0].selected);
    }

    #[test]
    fn sanitize_policy_cleans_before_storing() {
        let slots = MemorySlots::new();
        let mut config = AppConfig::default();
        config.markup.policy = MarkupPolicy::Sanitize;
        let mut app = App::new(slots.clone(), &config);

        app.input("Unsafe", "<p>ok</p><script>steal()</script>");
        let note = &app.store().notes()[0];
        assert_eq!(note.content, "<p>ok</p>");
        assert_eq!(app.binding().content(), "<p>ok</p><script>steal()</script>");
    }

    #[test]
    fn debounced_policy_defers_until_flush() {
        let slots = MemorySlots::new();
        let mut config = AppConfig::default();
        config.persistence = PersistenceConfig::debounced(60_000);
        let key = config.storage.notes_key.clone();
        let mut app = App::new(slots.clone(), &config);

        assert_eq!(app.input("Later", ""), None);
        assert_eq!(app.tick(), None);
        assert!(slots.raw(&key).is_none());
        assert_matches!(app.persist_status(), PersistStatus::Pending { .. });

        assert_matches!(app.flush(), Some(PersistEvent::Saved { .. }));
        assert!(slots.raw(&key).is_some());
    }

    #[test]
    fn uuid_strategy_assigns_uuid_ids() {
        let slots = MemorySlots::new();
        let mut config = AppConfig::default();
        config.ids.strategy = IdStrategy::Uuid;
        let mut app = App::new(slots.clone(), &config);
        app.input("x", "");
        let id = app.binding().selection().cloned().expect("bound");
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn write_failure_keeps_session_running() {
        let slots = MemorySlots::with_quota(16);
        let mut app = app(&slots);
        assert_matches!(
            app.input("Too large to persist", "<p>body</p>"),
            Some(PersistEvent::Failed { .. })
        );
        assert_eq!(app.store().len(), 1);
        assert!(app.store().is_stale());
        assert_matches!(app.persist_status(), PersistStatus::Error { .. });
    }

    #[derive(Default)]
    struct RecordingSurface {
        calls: Vec<(String, Option<String>)>,
        fail: bool,
    }

    impl FormattingSurface for RecordingSurface {
        fn exec(&mut self, name: &str, argument: Option<&str>) -> anyhow::Result<()> {
            if self.fail {
                bail!("surface rejected {name}");
            }
            self.calls
                .push((name.to_string(), argument.map(str::to_string)));
            Ok(())
        }
    }

    #[test]
    fn format_commands_reach_surface_and_failures_are_swallowed() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);
        let mut surface = RecordingSurface::default();

        assert!(app.apply_format(&mut surface, &FormatCommand::Bold));
        assert!(app.apply_format(
            &mut surface,
            &FormatCommand::CreateLink("https://example.com".into())
        ));
        assert!(!app.apply_format(&mut surface, &FormatCommand::CreateLink("  ".into())));
        assert_eq!(
            surface.calls,
            vec![
                ("bold".to_string(), None),
                (
                    "createLink".to_string(),
                    Some("https://example.com".to_string())
                ),
            ]
        );

        surface.fail = true;
        assert!(!app.apply_format(&mut surface, &FormatCommand::Italic));
    }

    #[test]
    fn dispatcher_routes_actions() {
        let slots = MemorySlots::new();
        let mut app = app(&slots);

        let outcome = app.dispatch(Action::Input {
            title: "Groceries".into(),
            content: "<p>milk</p>".into(),
        });
        let id = match outcome {
            ActionOutcome::Edited {
                note_id: Some(id), ..
            } => id,
            other => panic!("expected edit outcome, got {other:?}"),
        };

        assert_eq!(app.dispatch(Action::NewNote), ActionOutcome::Cleared);
        assert_eq!(
            app.dispatch(Action::Open(id.clone())),
            ActionOutcome::Opened(id.clone())
        );
        assert_matches!(
            app.dispatch(Action::Delete(id.clone())),
            ActionOutcome::Deleted {
                removed: true,
                persist: Some(PersistEvent::Saved { .. })
            }
        );
        assert_eq!(
            app.dispatch(Action::Open(id.clone())),
            ActionOutcome::Missing(id)
        );
        assert_eq!(app.dispatch(Action::Flush), ActionOutcome::Flushed(None));
    }
}
