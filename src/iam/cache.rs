//! LRU cache of compiled matchers
//!
//! Keyed by the pattern text after interpolation, so a templated pattern
//! caches one entry per distinct substituted value.

use super::Matcher;
use crate::error::Result;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Thread-safe LRU cache of compiled matchers
pub struct MatcherCache {
    cache: Mutex<LruCache<String, Arc<Matcher>>>,
}

impl MatcherCache {
    /// Create a new matcher cache with given capacity (at least one entry)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        MatcherCache {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Create a new matcher cache with default capacity (1000 entries)
    pub fn new_default() -> Self {
        Self::new(1000)
    }

    /// Return the cached matcher for `pattern`, compiling it on a miss
    ///
    /// Compilation errors are returned and nothing is cached.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<Matcher>> {
        if let Some(matcher) = self.cache.lock().get(pattern) {
            return Ok(Arc::clone(matcher));
        }

        // compile without holding the lock
        let matcher = Arc::new(Matcher::new(pattern)?);
        self.cache
            .lock()
            .put(pattern.to_string(), Arc::clone(&matcher));
        Ok(matcher)
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }
}

impl Default for MatcherCache {
    fn default() -> Self {
        Self::new_default()
    }
}
