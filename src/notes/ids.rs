use time::OffsetDateTime;
use uuid::Uuid;

use super::NoteId;
use crate::config::IdStrategy;

#[derive(Debug, Clone)]
pub struct IdGenerator {
    strategy: IdStrategy,
    last_millis: i128,
}

impl IdGenerator {
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            last_millis: 0,
        }
    }

    /// Produces an id for which `taken` returns false.
    pub fn next(&mut self, taken: impl Fn(&str) -> bool) -> NoteId {
        match self.strategy {
            IdStrategy::Timestamp => {
                let now = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
                self.next_from_millis(now, taken)
            }
            IdStrategy::Uuid => loop {
                let candidate = Uuid::new_v4().to_string();
                if !taken(&candidate) {
                    return NoteId::from(candidate);
                }
            },
        }
    }

    fn next_from_millis(&mut self, now: i128, taken: impl Fn(&str) -> bool) -> NoteId {
        let mut millis = now.max(self.last_millis + 1);
        while taken(&millis.to_string()) {
            millis += 1;
        }
        self.last_millis = millis;
        NoteId::from(millis.to_string())
    }
}
