/*!
 * Translation caching functionality.
 *
 * One cache belongs to one orchestrator and lives for one run. Entries are
 * keyed by the original text exactly as extracted (before cleaning), so
 * repeated garbage input is short-circuited as well. Nothing is evicted and
 * nothing is persisted.
 */

use std::collections::HashMap;

use log::debug;

use crate::text::{clean_for_log, CleanText, RawText};

/// Per-run translation cache
#[derive(Debug, Default)]
pub struct TranslationCache {
    /// Internal cache storage
    entries: HashMap<RawText, CleanText>,

    /// Cache hit counter
    hits: usize,

    /// Cache miss counter
    misses: usize,
}

impl TranslationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a translation from the cache
    pub fn get(&mut self, original: &RawText) -> Option<CleanText> {
        match self.entries.get(original) {
            Some(result) => {
                self.hits += 1;
                debug!("Cache hit for '{}'", truncate_text(&clean_for_log(&original.to_string_lossy()), 30));
                Some(result.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store the final result for an original text
    ///
    /// The first value stored for a key wins; a later store for the same key
    /// is ignored so one original maps to exactly one result per run.
    pub fn put(&mut self, original: RawText, result: CleanText) {
        self.entries.entry(original).or_insert(result);
    }

    /// Get cache statistics: hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };
        (self.hits, self.misses, hit_rate)
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
