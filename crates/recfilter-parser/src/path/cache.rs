//! A process-wide, thread-safe cache of parsed paths.

use super::chunk::{self, Chunk};
use crate::error::PathSyntaxError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A cache mapping path source strings to their parsed, immutable chunk
/// sequences. Safe to share across threads; reads do not block each other.
pub struct PathCache {
    entries: RwLock<HashMap<String, Arc<[Chunk]>>>,
}

impl PathCache {
    pub fn new() -> Self {
        PathCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Parses `s`, or returns the previously-parsed chunk sequence for it.
    /// Repeated calls with the same `s` return a clone of the same `Arc`
    /// allocation.
    pub fn parse(&self, s: &str) -> Result<Arc<[Chunk]>, PathSyntaxError> {
        if let Some(hit) = self.entries.read().unwrap().get(s) {
            return Ok(Arc::clone(hit));
        }
        let chunks: Arc<[Chunk]> = chunk::parse(s)?.into();
        self.entries
            .write()
            .unwrap()
            .entry(s.to_string())
            .or_insert_with(|| Arc::clone(&chunks));
        Ok(chunks)
    }

    pub fn size(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_CACHE: Lazy<PathCache> = Lazy::new(PathCache::new);

/// Parses `s` against the process-wide cache.
pub fn cached_parse(s: &str) -> Result<Arc<[Chunk]>, PathSyntaxError> {
    GLOBAL_CACHE.parse(s)
}

pub fn cache_size() -> usize {
    GLOBAL_CACHE.size()
}

pub fn clear_cache() {
    GLOBAL_CACHE.clear()
}
