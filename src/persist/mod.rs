use std::time::{Duration, Instant};

use time::OffsetDateTime;

use crate::config::{PersistPolicy, PersistenceConfig};
use crate::notes::{NoteStore, PersistOutcome};
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    Idle {
        last_saved_at: Option<OffsetDateTime>,
    },
    Pending {
        since: OffsetDateTime,
    },
    Error {
        message: String,
        occurred_at: OffsetDateTime,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistEvent {
    Saved { timestamp: OffsetDateTime },
    Failed { message: String },
}

/// Decides when mutations reach the slot. Write-through saves on every
/// mutation; debounced waits until the collection has been quiet for the
/// configured window.
#[derive(Debug)]
pub struct PersistScheduler {
    policy: PersistPolicy,
    debounce: Duration,
    dirty_since: Option<Instant>,
    dirty_since_wall: Option<OffsetDateTime>,
    last_saved_at: Option<OffsetDateTime>,
    last_error: Option<PersistFailure>,
}

#[derive(Debug, Clone)]
struct PersistFailure {
    message: String,
    occurred_at: OffsetDateTime,
}

impl PersistScheduler {
    pub fn new(config: &PersistenceConfig) -> Self {
        Self {
            policy: config.policy,
            debounce: config.debounce_duration(),
            dirty_since: None,
            dirty_since_wall: None,
            last_saved_at: None,
            last_error: None,
        }
    }

    pub fn status(&self) -> PersistStatus {
        if let Some(failure) = &self.last_error {
            return PersistStatus::Error {
                message: failure.message.clone(),
                occurred_at: failure.occurred_at,
            };
        }
        if let Some(since) = self.dirty_since_wall {
            return PersistStatus::Pending { since };
        }
        PersistStatus::Idle {
            last_saved_at: self.last_saved_at,
        }
    }

    pub fn has_pending_changes(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Called after every store mutation.
    pub fn on_mutation<S: KeyValueStore>(
        &mut self,
        store: &mut NoteStore<S>,
    ) -> Option<PersistEvent> {
        match self.policy {
            PersistPolicy::WriteThrough => Some(self.save(store)),
            PersistPolicy::Debounced => {
                if self.dirty_since.is_none() {
                    self.dirty_since_wall = Some(OffsetDateTime::now_utc());
                }
                // every mutation restarts the quiet window
                self.dirty_since = Some(Instant::now());
                None
            }
        }
    }

    pub fn poll<S: KeyValueStore>(&mut self, store: &mut NoteStore<S>) -> Option<PersistEvent> {
        let ready = self
            .dirty_since
            .map(|since| since.elapsed() >= self.debounce)
            .unwrap_or(false);
        if !ready {
            return None;
        }
        Some(self.save(store))
    }

    pub fn flush_now<S: KeyValueStore>(
        &mut self,
        store: &mut NoteStore<S>,
    ) -> Option<PersistEvent> {
        if self.dirty_since.is_none() {
            return None;
        }
        Some(self.save(store))
    }

    fn save<S: KeyValueStore>(&mut self, store: &mut NoteStore<S>) -> PersistEvent {
        let timestamp = OffsetDateTime::now_utc();
        // a failed write is not retried, so the collection is no longer pending either way
        self.dirty_since = None;
        self.dirty_since_wall = None;
        match store.save() {
            PersistOutcome::Persisted => {
                self.last_saved_at = Some(timestamp);
                self.last_error = None;
                PersistEvent::Saved { timestamp }
            }
            PersistOutcome::Stale { message } => {
                self.last_error = Some(PersistFailure {
                    message: message.clone(),
                    occurred_at: timestamp,
                });
                PersistEvent::Failed { message }
            }
        }
    }
}
