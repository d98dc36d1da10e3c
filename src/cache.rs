//! # Feed Cache
//! Holds the last successfully normalized post list and when it was fetched.
//!
//! Two states: `Empty` until the first successful refresh, then `Populated`
//! forever after. Every successful refresh overwrites the entry wholesale;
//! nothing ever clears it. Lives only as long as the process.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::ingest::types::NormalizedPost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub posts: Vec<NormalizedPost>,
    pub fetched_at_ms: i64,
}

/// Point-in-time view of the cache, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Populated { fetched_at_ms: i64, posts: usize },
}

/// Thread-safe single-entry cache with a fixed freshness window.
#[derive(Debug)]
pub struct FeedCache {
    inner: RwLock<Option<CacheEntry>>,
    freshness: Duration,
}

impl FeedCache {
    pub fn new(freshness: Duration) -> Self {
        Self {
            inner: RwLock::new(None),
            freshness,
        }
    }

    /// Convenience constructor for the 5 minute window.
    pub fn new_5m() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Posts still inside the freshness window, if any.
    pub fn fresh(&self, now_ms: i64) -> Option<Vec<NormalizedPost>> {
        let window = i64::try_from(self.freshness.as_millis()).unwrap_or(i64::MAX);
        let guard = self.read();
        guard
            .as_ref()
            .filter(|e| now_ms.saturating_sub(e.fetched_at_ms) < window)
            .map(|e| e.posts.clone())
    }

    /// Last stored posts regardless of age. `None` only before the first store.
    pub fn stale(&self) -> Option<Vec<NormalizedPost>> {
        self.read().as_ref().map(|e| e.posts.clone())
    }

    /// Overwrite the entry. Old posts are dropped, never merged.
    pub fn store(&self, posts: Vec<NormalizedPost>, now_ms: i64) {
        *self.write() = Some(CacheEntry {
            posts,
            fetched_at_ms: now_ms,
        });
    }

    pub fn state(&self) -> CacheState {
        match self.read().as_ref() {
            None => CacheState::Empty,
            Some(e) => CacheState::Populated {
                fetched_at_ms: e.fetched_at_ms,
                posts: e.posts.len(),
            },
        }
    }

    // A panic mid-write can only leave a complete old or new entry behind,
    // so poisoned locks are safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, Option<CacheEntry>> {
        self.inner.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<CacheEntry>> {
        self.inner.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new_5m()
    }
}
