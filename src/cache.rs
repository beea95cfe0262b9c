//! In-memory result cache with TTL expiry and a hard capacity bound
//!
//! Payloads are stored serialized so a damaged entry is detected on read and
//! purged instead of being handed out. Eviction under capacity pressure is
//! oldest-insertion-first. Expired entries are never returned by `get`, but
//! stay available to `get_stale` for a grace period so the collector can fall
//! back to them when the search API is down.

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::place::{CacheKey, PlaceRecord};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

struct CacheEntry {
    payload: Vec<u8>,
    inserted_at: Instant,
    ttl: Duration,
    /// Insertion sequence number, matched against `order` on eviction
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.inserted_at + self.ttl
    }

    fn is_past_grace(&self, now: Instant, grace: Duration) -> bool {
        now > self.inserted_at + self.ttl + grace
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Insertion order; may hold superseded (key, seq) pairs that are skipped
    order: VecDeque<(CacheKey, u64)>,
    next_seq: u64,
}

impl CacheState {
    fn evict_oldest(&mut self) -> Option<CacheKey> {
        while let Some((key, seq)) = self.order.pop_front() {
            if self.entries.get(&key).is_some_and(|e| e.seq == seq) {
                self.entries.remove(&key);
                return Some(key);
            }
        }
        None
    }

    fn compact_order(&mut self) {
        let entries = &self.entries;
        self.order
            .retain(|(key, seq)| entries.get(key).is_some_and(|e| e.seq == *seq));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub capacity: usize,
    pub utilization_percent: f64,
    pub expired_entries: usize,
    pub active_entries: usize,
}

pub struct ResultCache {
    state: Mutex<CacheState>,
    capacity: usize,
    stale_grace: Duration,
}

impl ResultCache {
    pub fn new(capacity: usize, stale_grace: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
            stale_grace,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, Duration::from_secs(config.stale_grace_sec))
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Every mutation completes before the guard drops, so a poisoned
        // lock still guards consistent state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the cached payload if present and unexpired
    pub fn get(&self, key: &CacheKey) -> Option<Vec<PlaceRecord>> {
        let now = Instant::now();
        let mut state = self.lock();

        let entry = state.entries.get(key)?;
        if entry.is_expired(now) {
            if entry.is_past_grace(now, self.stale_grace) {
                debug!("Evicting expired cache entry {}", key);
                state.entries.remove(key);
            }
            return None;
        }

        match decode(key, &entry.payload) {
            Ok(places) => {
                debug!("Cache hit for {} ({} places)", key, places.len());
                Some(places)
            }
            Err(e) => {
                warn!("{}; purging", e);
                state.entries.remove(key);
                None
            }
        }
    }

    /// Return the payload regardless of TTL, for degraded-mode fallback
    pub fn get_stale(&self, key: &CacheKey) -> Option<Vec<PlaceRecord>> {
        let mut state = self.lock();

        let entry = state.entries.get(key)?;
        match decode(key, &entry.payload) {
            Ok(places) => Some(places),
            Err(e) => {
                warn!("{}; purging", e);
                state.entries.remove(key);
                None
            }
        }
    }

    /// Insert or replace an entry, then evict oldest insertions past capacity
    pub fn put(&self, key: CacheKey, payload: &[PlaceRecord], ttl: Duration) {
        let bytes = match serde_json::to_vec(payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to serialize payload for {}: {}", key, e);
                return;
            }
        };
        self.insert_bytes(key, bytes, ttl);
    }

    fn insert_bytes(&self, key: CacheKey, payload: Vec<u8>, ttl: Duration) {
        let mut state = self.lock();

        let seq = state.next_seq;
        state.next_seq += 1;
        state.order.push_back((key.clone(), seq));
        state.entries.insert(
            key,
            CacheEntry {
                payload,
                inserted_at: Instant::now(),
                ttl,
                seq,
            },
        );

        while state.entries.len() > self.capacity {
            match state.evict_oldest() {
                Some(evicted) => debug!("Cache full, evicted {}", evicted),
                None => break,
            }
        }

        if state.order.len() > self.capacity * 2 {
            state.compact_order();
        }
    }

    /// Remove every expired entry; returns how many were dropped
    #[allow(dead_code)]
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.lock();

        let before = state.entries.len();
        state.entries.retain(|_, e| !e.is_expired(now));
        let removed = before - state.entries.len();
        if removed > 0 {
            state.compact_order();
            debug!("Swept {} expired cache entries", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let state = self.lock();

        let total = state.entries.len();
        let expired = state.entries.values().filter(|e| e.is_expired(now)).count();

        CacheStats {
            total_entries: total,
            capacity: self.capacity,
            utilization_percent: total as f64 / self.capacity as f64 * 100.0,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

fn decode(key: &CacheKey, payload: &[u8]) -> Result<Vec<PlaceRecord>, CacheError> {
    serde_json::from_slice(payload).map_err(|e| CacheError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::place::{Anchor, SearchQuery};

    fn key(category: &str) -> CacheKey {
        SearchQuery::new(category, Anchor::new(37.5563, 126.9237), 1000, 15).cache_key(3)
    }

    fn place(name: &str) -> PlaceRecord {
        PlaceRecord {
            id: name.to_string(),
            name: name.to_string(),
            category: "cafe".to_string(),
            lat: 37.5563,
            lng: 126.9237,
            distance_from_anchor: 10.0,
            detail_category: None,
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn test_get_respects_ttl_boundary() {
        let cache = ResultCache::new(50, Duration::ZERO);
        cache.put(key("cafe"), &[place("a")], HOUR);

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert_eq!(cache.get(&key("cafe")), Some(vec![place("a")]));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&key("cafe")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_kept_for_stale_fallback() {
        let cache = ResultCache::new(50, HOUR);
        cache.put(key("cafe"), &[place("a")], Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(cache.get(&key("cafe")), None);
        assert_eq!(cache.get_stale(&key("cafe")), Some(vec![place("a")]));

        // Past the grace period the next read purges it
        tokio::time::advance(HOUR).await;
        assert_eq!(cache.get(&key("cafe")), None);
        assert_eq!(cache.get_stale(&key("cafe")), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let cache = ResultCache::new(50, Duration::ZERO);
        for i in 0..120 {
            cache.put(key(&format!("cat-{}", i)), &[place("a")], HOUR);
            assert!(cache.len() <= 50);
        }
        assert_eq!(cache.len(), 50);

        // Oldest insertions went first
        assert!(cache.get(&key("cat-69")).is_none());
        assert!(cache.get(&key("cat-70")).is_some());
        assert!(cache.get(&key("cat-119")).is_some());
    }

    #[test]
    fn test_replacing_refreshes_insertion_order() {
        let cache = ResultCache::new(3, Duration::ZERO);
        cache.put(key("a"), &[place("1")], HOUR);
        cache.put(key("b"), &[place("1")], HOUR);
        cache.put(key("c"), &[place("1")], HOUR);

        // Re-inserting "a" makes "b" the oldest
        cache.put(key("a"), &[place("2")], HOUR);
        cache.put(key("d"), &[place("1")], HOUR);

        assert_eq!(cache.len(), 3);
        assert!(cache.get(&key("b")).is_none());
        assert_eq!(cache.get(&key("a")), Some(vec![place("2")]));
    }

    #[test]
    fn test_repeated_replacement_keeps_order_bounded() {
        let cache = ResultCache::new(2, Duration::ZERO);
        for _ in 0..100 {
            cache.put(key("a"), &[place("1")], HOUR);
        }
        assert_eq!(cache.len(), 1);
        assert!(cache.lock().order.len() <= 4);
    }

    #[test]
    fn test_corrupt_entry_is_purged() {
        let cache = ResultCache::new(50, Duration::ZERO);
        cache.insert_bytes(key("cafe"), b"{not json".to_vec(), HOUR);
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.get(&key("cafe")), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_entry_not_used_as_stale() {
        let cache = ResultCache::new(50, Duration::ZERO);
        cache.insert_bytes(key("cafe"), vec![0xff, 0x00], HOUR);
        assert_eq!(cache.get_stale(&key("cafe")), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_and_stats() {
        let cache = ResultCache::new(10, HOUR);
        cache.put(key("short"), &[place("a")], Duration::from_secs(10));
        cache.put(key("long"), &[place("b")], HOUR);

        tokio::time::advance(Duration::from_secs(30)).await;
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.active_entries, 1);
        assert_eq!(stats.utilization_percent, 20.0);

        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("long")).is_some());
    }
}
