//! Prompt → generated-text cache.
//!
//! The prompt string itself is the key (exact match, no normalization).
//! Entries older than `max_age` are treated as absent and dropped on read;
//! inserting a new prompt at capacity evicts the oldest entry.
//!
//! Concurrent misses for the same prompt are not collapsed into a single
//! fetch: each caller dispatches its own request and the last write wins.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default maximum number of cached prompts.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Default maximum entry age.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Cache limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries kept.
    pub max_entries: usize,
    /// Maximum age of an entry before it is considered stale.
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    inserted_at: Instant,
}

/// Thread-safe response cache.
#[derive(Debug)]
pub struct ResponseCache {
    config: CacheConfig,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// Creates an empty cache with the given limits.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cache limits.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Looks up the text generated for `prompt`, if fresh.
    pub fn get(&self, prompt: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        match entries.get(prompt) {
            Some(entry) if entry.inserted_at.elapsed() < self.config.max_age => {
                Some(entry.text.clone())
            }
            Some(_) => {
                entries.remove(prompt);
                None
            }
            None => None,
        }
    }

    /// Stores `text` for `prompt`, replacing any previous value.
    pub fn put(&self, prompt: impl Into<String>, text: impl Into<String>) {
        if self.config.max_entries == 0 {
            return;
        }

        let prompt = prompt.into();
        let mut entries = self.entries.lock();

        if !entries.contains_key(&prompt) && entries.len() >= self.config.max_entries {
            Self::remove_expired(&mut entries, self.config.max_age);
            if entries.len() >= self.config.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(key, _)| key.clone());
                if let Some(key) = oldest {
                    tracing::debug!(evicted = %key, "Cache full, evicting oldest entry");
                    entries.remove(&key);
                }
            }
        }

        entries.insert(
            prompt,
            CacheEntry {
                text: text.into(),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        Self::remove_expired(&mut entries, self.config.max_age)
    }

    /// Number of stored entries, stale ones included until they are purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn remove_expired(entries: &mut HashMap<String, CacheEntry>, max_age: Duration) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < max_age);
        before - entries.len()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
