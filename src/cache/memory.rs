//! In-process snapshot store.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::keys::KeyPrefix;
use super::lock::{rw_read, rw_write};

const TARGET: &str = "cache::memory";

struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

/// Ordered map so prefix deletes are a range scan.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let entries = rw_read(&self.entries, TARGET, "get");
        entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: &str, value: String, ttl: Option<Duration>) {
        let entry = MemoryEntry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        rw_write(&self.entries, TARGET, "set").insert(key.to_string(), entry);
    }

    pub fn delete(&self, key: &str) -> bool {
        rw_write(&self.entries, TARGET, "delete")
            .remove(key)
            .is_some()
    }

    /// Returns the number of removed entries.
    pub fn delete_prefix(&self, prefix: &KeyPrefix) -> usize {
        let mut entries = rw_write(&self.entries, TARGET, "delete_prefix");
        let doomed: Vec<String> = entries
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| prefix.matches(key))
            .cloned()
            .collect();
        for key in &doomed {
            entries.remove(key);
        }
        doomed.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        rw_read(&self.entries, TARGET, "len").len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
