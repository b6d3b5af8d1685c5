use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use parking_lot::Mutex;

use super::KeyValueStore;

/// In-process slots. Clones share the same backing map, so a second
/// session built from a clone sees what the first one persisted.
#[derive(Debug, Clone, Default)]
pub struct MemorySlots {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any write that would push the total stored bytes past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        let slots = Self::default();
        slots.inner.lock().quota_bytes = Some(bytes);
        slots
    }

    pub fn set_quota(&self, bytes: Option<usize>) {
        self.inner.lock().quota_bytes = bytes;
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.lock().values.get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .values
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemorySlots {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(quota) = inner.quota_bytes {
            let others: usize = inner
                .values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                bail!("storage quota exceeded writing '{key}' ({needed} > {quota} bytes)");
            }
        }
        inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
