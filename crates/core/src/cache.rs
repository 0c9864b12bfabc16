//! Positive cache (§4.4): a small, TTL-bounded map from a resolved name
//! to its address list. Grounded on the teacher's `cache_layer.rs`
//! (`DashMap` + manual TTL check, no external cache crate) rather than
//! on a generic LRU crate, because the cache here is intentionally tiny
//! (25 entries) and eviction is FIFO-by-insertion per the spec, not
//! recency-based.

use crate::alloc::try_clone_vec;
use dashmap::DashMap;
use netresolve_domain::{HostError, CACHE_MAX_ENTRIES, CACHE_TTL};
use rustc_hash::FxBuildHasher;
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::Instant;
use tracing::debug;

struct CacheEntry {
    addresses: Vec<IpAddr>,
    inserted_at: Instant,
}

/// The process-wide positive cache. Lives on `MasterRegistry` (§4.3/§4.4
/// share the same global mutex discipline in the original design, but a
/// `DashMap` lets reads and writes interleave without hand-rolled
/// striping while still giving us the FIFO order we need via a separate
/// insertion queue).
pub struct PositiveCache {
    entries: DashMap<String, CacheEntry, FxBuildHasher>,
    insertion_order: Mutex<VecDeque<String>>,
}

impl Default for PositiveCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PositiveCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            insertion_order: Mutex::new(VecDeque::new()),
        }
    }

    /// Returns a deep copy of the cached addresses for `name`, if present
    /// and not expired (C3). An expired entry is evicted on read. The
    /// copy is fallible (§7's `OutOfMemory`) since it duplicates a
    /// potentially large shared address list out to a new owner.
    pub fn lookup(&self, name: &str) -> Result<Option<Vec<IpAddr>>, HostError> {
        if let Some(entry) = self.entries.get(name) {
            if entry.inserted_at.elapsed() < CACHE_TTL {
                debug!(name, "positive cache hit");
                return try_clone_vec(&entry.addresses).map(Some);
            }
        } else {
            return Ok(None);
        }
        debug!(name, "positive cache entry expired, evicting");
        self.entries.remove(name);
        Ok(None)
    }

    /// Inserts or replaces an entry, evicting the oldest entry first if
    /// the cache is already at capacity (C2).
    pub fn insert(&self, name: String, addresses: Vec<IpAddr>) {
        let mut order = self.insertion_order.lock().unwrap();
        if !self.entries.contains_key(&name) {
            if self.entries.len() >= CACHE_MAX_ENTRIES {
                if let Some(oldest) = order.pop_front() {
                    debug!(evicted = %oldest, "positive cache at capacity, evicting oldest");
                    self.entries.remove(&oldest);
                }
            }
            order.push_back(name.clone());
        }
        debug!(name, count = addresses.len(), "positive cache insert");
        self.entries.insert(
            name,
            CacheEntry {
                addresses,
                inserted_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
