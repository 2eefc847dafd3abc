//! TTL cache storage.
//!
//! A single type-erased store backs every listing and detail fetch. Entries
//! expire at an absolute deadline and are removed lazily on access; bulk
//! invalidation walks a key family's prefix.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::warn;

use super::config::CacheConfig;
use super::keys::{CacheKey, KeyFamily};

const METRIC_CACHE_HIT: &str = "vitrina_cache_hit_total";
const METRIC_CACHE_MISS: &str = "vitrina_cache_miss_total";
const METRIC_CACHE_EVICT: &str = "vitrina_cache_evict_total";

struct Entry {
    value: Box<dyn Any + Send + Sync>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory TTL key/value store.
///
/// Misses are normal control flow: the public surface never fails and never
/// panics. Poisoned locks are recovered with a warning.
pub struct TtlStore {
    entries: RwLock<HashMap<String, Entry>>,
    max_entries: usize,
}

impl TtlStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: config.max_entries,
        }
    }

    fn read_entries(&self, op: &'static str) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    op,
                    result = "poisoned_recovered",
                    hint = "entries may be stale after panic in another thread",
                    "Recovered cache store lock"
                );
                poisoned.into_inner()
            }
        }
    }

    fn write_entries(&self, op: &'static str) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    op,
                    result = "poisoned_recovered",
                    hint = "entries may be stale after panic in another thread",
                    "Recovered cache store lock"
                );
                poisoned.into_inner()
            }
        }
    }

    /// Fetch a cached value. Expired entries are removed on access and a
    /// removed entry is never resurrected by a later `get`. A stored value of
    /// a different type is a miss.
    pub fn get<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let rendered = key.render();
        let now = Instant::now();
        let mut entries = self.write_entries("get");

        match entries.get(&rendered) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(&rendered);
                counter!(METRIC_CACHE_MISS, "reason" => "expired").increment(1);
                None
            }
            Some(entry) => match entry.value.downcast_ref::<T>() {
                Some(value) => {
                    counter!(METRIC_CACHE_HIT).increment(1);
                    Some(value.clone())
                }
                None => {
                    counter!(METRIC_CACHE_MISS, "reason" => "type").increment(1);
                    None
                }
            },
            None => {
                counter!(METRIC_CACHE_MISS, "reason" => "absent").increment(1);
                None
            }
        }
    }

    /// Store a value with an absolute expiry of `now + ttl`, overwriting any
    /// previous entry for the key.
    pub fn set<T>(&self, key: &CacheKey, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        let rendered = key.render();
        let now = Instant::now();
        let mut entries = self.write_entries("set");

        if self.max_entries > 0
            && !entries.contains_key(&rendered)
            && entries.len() >= self.max_entries
        {
            Self::evict_soonest(&mut entries, now);
        }

        entries.insert(
            rendered,
            Entry {
                value: Box::new(value),
                expires_at: now + ttl,
            },
        );
    }

    /// Drop a single entry.
    pub fn remove(&self, key: &CacheKey) {
        self.write_entries("remove").remove(&key.render());
    }

    /// Drop every entry belonging to the family.
    pub fn invalidate_family(&self, family: KeyFamily) {
        let prefix = family.prefix();
        self.write_entries("invalidate_family")
            .retain(|key, _| !key.starts_with(prefix));
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.write_entries("clear").clear();
    }

    /// Number of unexpired entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.read_entries("len")
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove expired entries, then the entry closest to expiry if the map is
    /// still at capacity.
    fn evict_soonest(entries: &mut HashMap<String, Entry>, now: Instant) {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - entries.len();
        if purged > 0 {
            counter!(METRIC_CACHE_EVICT, "reason" => "expired").increment(purged as u64);
            return;
        }

        let soonest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = soonest {
            entries.remove(&key);
            counter!(METRIC_CACHE_EVICT, "reason" => "capacity").increment(1);
        }
    }
}
