//! Time- and size-bounded memoization for metadata listings.
//!
//! Only successful results are stored: a producer that fails leaves the cache
//! untouched, so the next call with the same key runs the producer again.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// A cached value with its insertion bookkeeping.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    /// Insertion sequence number; the smallest is the oldest insertion.
    generation: u64,
}

#[derive(Debug)]
struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    next_generation: u64,
}

/// Memoizes producer results per key.
///
/// Entries expire `ttl` after insertion. When inserting a new key would
/// exceed `max_entries`, expired entries are dropped and then, if still
/// full, the least recently inserted entry is evicted. Lookups and
/// insertions each happen under a single lock, so the eviction check and
/// the insertion it guards are atomic.
#[derive(Debug)]
pub struct MetadataCache<K, V> {
    name: &'static str,
    ttl: Duration,
    max_entries: usize,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> MetadataCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Default time-to-live of an entry.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

    /// Default maximum number of distinct keys.
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    /// Creates a cache; `name` labels its log events.
    pub fn new(name: &'static str, ttl: Duration, max_entries: usize) -> Self {
        Self {
            name,
            ttl,
            max_entries: max_entries.max(1),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    /// Returns the cached value for `key`, or runs `producer` and caches
    /// its result if it succeeds.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            debug!(cache = self.name, ?key, "Cache hit");
            return Ok(value);
        }

        debug!(cache = self.name, ?key, "Cache miss");
        let value = producer().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Returns an unexpired value for `key`. An expired entry is removed.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.lock();
        let expired = match state.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            state.entries.remove(key);
        }
        None
    }

    /// Stores `value` under `key`, evicting if the cache is full.
    pub fn insert(&self, key: K, value: V) {
        let mut state = self.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_entries {
            let ttl = self.ttl;
            state
                .entries
                .retain(|_, entry| entry.inserted_at.elapsed() < ttl);

            if state.entries.len() >= self.max_entries {
                let oldest = state
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.generation)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    debug!(cache = self.name, key = ?oldest, "Evicting oldest entry");
                    state.entries.remove(&oldest);
                }
            }
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        state.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                generation,
            },
        );
    }

    /// Drops the entry for `key`, if any.
    pub fn invalidate(&self, key: &K) {
        self.lock().entries.remove(key);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Whether an unexpired entry exists for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.inserted_at.elapsed() < self.ttl)
    }

    /// Number of stored entries, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<K, V>> {
        // Entries are only ever replaced whole, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
