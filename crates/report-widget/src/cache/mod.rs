//! Time-to-live gate in front of the extractor.
//!
//! The cache owns a single slot. Every failure it meets (storage errors,
//! corrupt JSON, entries stamped in the future) turns into a miss; nothing
//! here is ever propagated to the caller except from [`FreshnessCache::clear`].

mod clock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{CacheStore, FileStore, MemoryStore, StoreError};

use crate::report::Report;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_CACHE_KEY: &str = "job-report-cache";

/// Persisted slot contents: `{ "report": ..., "timestamp": <epoch ms> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub report: Report,
    pub timestamp: i64,
}

#[derive(Serialize)]
struct CacheEntryRef<'a> {
    report: &'a Report,
    timestamp: i64,
}

/// A cache entry together with its age at the time it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSnapshot {
    pub entry: CacheEntry,
    pub age_millis: i64,
    pub fresh: bool,
}

pub struct FreshnessCache<S, C = SystemClock> {
    store: S,
    clock: C,
    key: String,
    ttl: Duration,
}

impl<S: CacheStore> FreshnessCache<S, SystemClock> {
    pub fn new(store: S, key: impl Into<String>, ttl: Duration) -> Self {
        Self::with_clock(store, SystemClock, key, ttl)
    }
}

impl<S: CacheStore, C: Clock> FreshnessCache<S, C> {
    pub fn with_clock(store: S, clock: C, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            key: key.into(),
            ttl,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// Returns the cached report while it is younger than the TTL. Stale or
    /// unreadable entries are removed and reported as absent.
    pub fn get(&self) -> Option<Report> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "report cache empty");
                return None;
            }
            Err(err @ StoreError::Corrupt { .. }) => {
                debug!(key = %self.key, error = %err, "discarding corrupt report cache entry");
                self.discard();
                return None;
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "report cache unreadable, treating as miss");
                return None;
            }
        };

        let entry = match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(key = %self.key, error = %err, "discarding corrupt report cache entry");
                self.discard();
                return None;
            }
        };

        let age = self.clock.now_millis().saturating_sub(entry.timestamp);
        if age < 0 {
            debug!(key = %self.key, age, "discarding report cache entry stamped in the future");
            self.discard();
            return None;
        }
        if age >= self.ttl_millis() {
            debug!(key = %self.key, age, "report cache entry expired");
            self.discard();
            return None;
        }

        debug!(key = %self.key, age, "report cache hit");
        Some(entry.report)
    }

    /// Stores `report` stamped with the current time, replacing any previous
    /// entry. Storage failures are logged and swallowed.
    pub fn put(&self, report: &Report) {
        let entry = CacheEntryRef {
            report,
            timestamp: self.clock.now_millis(),
        };

        let serialized = match serde_json::to_string(&entry) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(key = %self.key, error = %err, "report could not be serialized for caching");
                return;
            }
        };

        if let Err(err) = self.store.put(&self.key, &serialized) {
            warn!(key = %self.key, error = %err, "report cache write failed, continuing uncached");
        }
    }

    /// Reads the slot without applying the TTL or removing anything.
    pub fn peek(&self) -> Option<CachedSnapshot> {
        let raw = self.store.get(&self.key).ok().flatten()?;
        let entry = serde_json::from_str::<CacheEntry>(&raw).ok()?;
        let age_millis = self.clock.now_millis().saturating_sub(entry.timestamp);
        let fresh = (0..self.ttl_millis()).contains(&age_millis);

        Some(CachedSnapshot {
            entry,
            age_millis,
            fresh,
        })
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.delete(&self.key)
    }

    fn discard(&self) {
        if let Err(err) = self.store.delete(&self.key) {
            warn!(key = %self.key, error = %err, "failed to remove stale report cache entry");
        }
    }
}
