//! In-process barcode cache.
//!
//! Caches both hits and confirmed misses so repeated scans of the same code do
//! not go back to the bulk dataset. Not an LRU: when full, an arbitrary tenth
//! of the entries is dropped before the next insert.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use tracing::debug;

use crate::foods::dto::FoodRecord;

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
const MIN_EVICTION: usize = 100;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub positive_ttl: Duration,
    pub negative_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            positive_ttl: Duration::from_secs(24 * 60 * 60),
            negative_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Outcome of a cache hit.
#[derive(Debug, Clone, PartialEq)]
pub enum Cached {
    Found(FoodRecord),
    /// The bulk dataset was asked and had nothing.
    NotFound,
}

#[derive(Debug)]
struct Entry {
    value: Cached,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires: Option<Instant>,
}

impl Entry {
    fn live_at(&self, now: Instant) -> bool {
        self.expires.map_or(true, |t| now < t)
    }
}

pub struct BarcodeCache {
    cfg: CacheConfig,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl BarcodeCache {
    pub fn new(cfg: CacheConfig) -> Self {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    pub fn with_clock(mut cfg: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        if cfg.max_entries == 0 {
            cfg.max_entries = DEFAULT_MAX_ENTRIES;
        }
        Self {
            cfg,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    // A panic while holding the lock cannot leave the map half-written, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `None` on a miss or an expired entry (which is dropped).
    pub fn get(&self, code: &str) -> Option<Cached> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(code) {
            Some(e) if e.live_at(now) => Some(e.value.clone()),
            Some(_) => {
                entries.remove(code);
                debug!(code, "barcode cache entry expired");
                None
            }
            None => None,
        }
    }

    pub fn set(&self, code: &str, record: FoodRecord) {
        self.insert(code, Cached::Found(record), self.cfg.positive_ttl);
    }

    pub fn set_not_found(&self, code: &str) {
        self.insert(code, Cached::NotFound, self.cfg.negative_ttl);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, code: &str, value: Cached, ttl: Duration) {
        let expires = self.clock.now().checked_add(ttl);
        let mut entries = self.lock();
        if !entries.contains_key(code) && entries.len() >= self.cfg.max_entries {
            let n = (self.cfg.max_entries / 10).max(MIN_EVICTION);
            let victims: Vec<String> = entries.keys().take(n).cloned().collect();
            for k in &victims {
                entries.remove(k);
            }
            debug!(evicted = victims.len(), "barcode cache full");
        }
        entries.insert(code.to_string(), Entry { value, expires });
    }
}

/// Clock that only moves when told to.
#[cfg(test)]
pub(crate) struct ManualClock {
    now: Mutex<Instant>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
        })
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}
