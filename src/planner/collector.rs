//! Per-category place collection: cache first, then the rate-limited API,
//! degrading to stale cache or an empty list when the API keeps failing.

use crate::cache::ResultCache;
use crate::config::{Config, RetryConfig};
use crate::error::FetchError;
use crate::limiter::RateLimiter;
use crate::place::{Anchor, CacheKey, PlaceRecord, SearchQuery};
use crate::runner::retry_with_backoff;
use crate::search::PlaceSearch;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a category's results came from
#[derive(Debug, Clone, PartialEq)]
pub enum CollectSource {
    Cached,
    Fresh,
    /// API failed; served an expired cache entry
    Stale { error: String },
    /// API failed and nothing was cached
    Failed { error: String },
}

impl CollectSource {
    pub fn is_degraded(&self) -> bool {
        matches!(self, CollectSource::Stale { .. } | CollectSource::Failed { .. })
    }
}

impl std::fmt::Display for CollectSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectSource::Cached => write!(f, "cached"),
            CollectSource::Fresh => write!(f, "fresh"),
            CollectSource::Stale { error } => write!(f, "stale: {}", error),
            CollectSource::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Collected {
    pub category: String,
    pub places: Vec<PlaceRecord>,
    pub source: CollectSource,
}

type KeyLocks = Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>;

pub struct PlaceCollector {
    cache: Arc<ResultCache>,
    limiter: Arc<RateLimiter>,
    search: Arc<dyn PlaceSearch>,
    retry: RetryConfig,
    ttl: Duration,
    coordinate_precision: u32,
    result_limit: u32,
    /// One fetch per key at a time; later callers wait and hit the cache
    in_flight: KeyLocks,
}

impl PlaceCollector {
    pub fn new(
        config: &Config,
        cache: Arc<ResultCache>,
        limiter: Arc<RateLimiter>,
        search: Arc<dyn PlaceSearch>,
    ) -> Self {
        Self {
            cache,
            limiter,
            search,
            retry: config.retry.clone(),
            ttl: config.cache_ttl(),
            coordinate_precision: config.cache.coordinate_precision,
            result_limit: config.search.result_limit,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Collect places for one category. Never fails; API errors degrade.
    pub async fn collect(&self, category: &str, anchor: Anchor, radius_m: u32) -> Collected {
        let query = SearchQuery::new(category, anchor, radius_m, self.result_limit);
        let key = query.cache_key(self.coordinate_precision);

        if let Some(places) = self.cache.get(&key) {
            return self.done(category, places, CollectSource::Cached);
        }

        let key_lock = self.key_lock(&key);
        let _guard = key_lock.lock.lock().await;

        // Another task may have filled the entry while we waited
        match self.cache.get(&key) {
            Some(places) => self.done(category, places, CollectSource::Cached),
            None => self.fetch(category, &query, key.clone()).await,
        }
    }

    async fn fetch(&self, category: &str, query: &SearchQuery, key: CacheKey) -> Collected {
        let result = retry_with_backoff(&self.retry, FetchError::is_transient, || async {
            self.limiter.wait_if_needed().await;
            self.search.search(query).await
        })
        .await;

        match result {
            Ok(places) => {
                self.cache.put(key, &places, self.ttl);
                self.done(category, places, CollectSource::Fresh)
            }
            Err(e) => {
                let error = e.to_string();
                match self.cache.get_stale(&key) {
                    Some(places) => {
                        warn!(
                            "Search for '{}' failed ({}); using {} stale cached places",
                            category,
                            error,
                            places.len()
                        );
                        self.done(category, places, CollectSource::Stale { error })
                    }
                    None => {
                        warn!("Search for '{}' failed ({}); no fallback", category, error);
                        self.done(category, Vec::new(), CollectSource::Failed { error })
                    }
                }
            }
        }
    }

    fn done(&self, category: &str, places: Vec<PlaceRecord>, source: CollectSource) -> Collected {
        match source {
            CollectSource::Fresh => info!("Fetched {} places for '{}'", places.len(), category),
            CollectSource::Cached => debug!("Using {} cached places for '{}'", places.len(), category),
            _ => {}
        }
        Collected {
            category: category.to_string(),
            places,
            source,
        }
    }

    fn key_lock(&self, key: &CacheKey) -> KeyLock<'_> {
        let mut locks = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        KeyLock {
            locks: &self.in_flight,
            key: key.clone(),
            lock: locks.entry(key.clone()).or_default().clone(),
        }
    }
}

/// Handle on a per-key fetch lock; drops its map entry once unused, even
/// when the collecting future is dropped mid-fetch
struct KeyLock<'a> {
    locks: &'a KeyLocks,
    key: CacheKey,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this handle hold it: nobody else is waiting
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}
