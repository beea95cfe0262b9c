//! Planning session: choose categories, collect them in parallel, reduce.

use crate::cache::ResultCache;
use crate::config::{CategoryTable, Config};
use crate::error::PipelineError;
use crate::limiter::RateLimiter;
use crate::place::{Anchor, CandidatePool, CuratedCandidateSet};
use crate::search::PlaceSearch;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::categories::select_categories;
use super::collector::{CollectSource, Collected, PlaceCollector};
use super::reducer::CandidateReducer;

/// What the user asked for
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub anchor: Anchor,
    pub companion: String,
    /// Explicit categories; empty means derive from the companion table
    pub categories: Vec<String>,
    pub radius_m: u32,
}

#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub category: String,
    pub source: CollectSource,
    pub places: usize,
}

#[derive(Debug)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub outcomes: Vec<CategoryOutcome>,
    pub candidates: CuratedCandidateSet,
    pub duration: Duration,
}

impl SessionReport {
    pub fn degraded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.source.is_degraded()).count()
    }
}

pub struct PlanningSession {
    collector: Arc<PlaceCollector>,
    reducer: CandidateReducer,
    categories: CategoryTable,
    concurrency: Option<usize>,
    provider: &'static str,
}

impl PlanningSession {
    /// Cache and limiter are shared handles so they outlive the session
    pub fn new(
        config: &Config,
        cache: Arc<ResultCache>,
        limiter: Arc<RateLimiter>,
        search: Arc<dyn PlaceSearch>,
    ) -> Self {
        let provider = search.name();
        Self {
            collector: Arc::new(PlaceCollector::new(config, cache, limiter, search)),
            reducer: CandidateReducer::from_config(&config.reducer),
            categories: config.categories.clone(),
            concurrency: config.concurrency,
            provider,
        }
    }

    pub fn with_target(mut self, target_count: usize) -> Self {
        self.reducer = self.reducer.with_target(target_count);
        self
    }

    pub fn categories_for(&self, request: &PlanRequest) -> Vec<String> {
        select_categories(&self.categories, &request.companion, &request.categories)
    }

    pub async fn run(
        &self,
        request: &PlanRequest,
        cancel: &CancellationToken,
    ) -> Result<SessionReport, PipelineError> {
        let start = std::time::Instant::now();
        let session_id = Uuid::new_v4();

        let categories = self.categories_for(request);
        if categories.is_empty() {
            return Err(PipelineError::NoCategories);
        }

        let workers = self
            .concurrency
            .unwrap_or(categories.len())
            .clamp(1, categories.len());
        let semaphore = Arc::new(Semaphore::new(workers));

        info!(
            "Session {}: searching {} categories near {} via {} ({} workers)",
            session_id,
            categories.len(),
            request.anchor,
            self.provider,
            workers
        );

        let mut futures = FuturesUnordered::new();
        for (idx, category) in categories.iter().enumerate() {
            let semaphore = semaphore.clone();
            let collector = self.collector.clone();
            let cancel = cancel.clone();
            let category = category.clone();
            let anchor = request.anchor;
            let radius_m = request.radius_m;

            futures.push(tokio::spawn(async move {
                // Cancellation wins over both a free slot and a finished search
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok::<_, PipelineError>((idx, None)),
                    permit = semaphore.acquire_owned() => permit?,
                };
                if cancel.is_cancelled() {
                    return Ok((idx, None));
                }
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Ok((idx, None)),
                    collected = collector.collect(&category, anchor, radius_m) => {
                        Ok((idx, Some(collected)))
                    }
                }
            }));
        }

        let mut slots: Vec<Option<Collected>> = vec![None; categories.len()];
        while let Some(result) = futures.next().await {
            match result {
                Ok(Ok((idx, collected))) => slots[idx] = collected,
                Ok(Err(e)) => warn!("Category collection failed: {}", e),
                Err(e) => warn!("Task panicked: {}", e),
            }
        }

        if cancel.is_cancelled() {
            info!("Session {} cancelled", session_id);
            return Err(PipelineError::Cancelled);
        }

        // Assemble in category order so reduction is independent of completion order
        let mut pool = CandidatePool::new();
        let mut outcomes = Vec::with_capacity(categories.len());
        for (category, slot) in categories.into_iter().zip(slots) {
            let collected = slot.unwrap_or_else(|| Collected {
                category: category.clone(),
                places: Vec::new(),
                source: CollectSource::Failed {
                    error: "collector task did not finish".to_string(),
                },
            });
            outcomes.push(CategoryOutcome {
                category: category.clone(),
                source: collected.source,
                places: collected.places.len(),
            });
            pool.insert(category, collected.places);
        }

        for outcome in &outcomes {
            info!(
                "  {}: {} places ({})",
                outcome.category, outcome.places, outcome.source
            );
        }

        let candidates = self.reducer.reduce(&pool)?;

        Ok(SessionReport {
            session_id,
            outcomes,
            candidates,
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::place::{PlaceRecord, SearchQuery};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Returns `per_category` places for every category except those in `failing`
    struct GridSearch {
        per_category: usize,
        failing: HashSet<String>,
        delay: Duration,
        queries: Mutex<Vec<String>>,
    }

    impl GridSearch {
        fn new(per_category: usize) -> Self {
            Self {
                per_category,
                failing: HashSet::new(),
                delay: Duration::ZERO,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PlaceSearch for GridSearch {
        fn name(&self) -> &'static str {
            "grid"
        }

        async fn search(&self, query: &SearchQuery) -> Result<Vec<PlaceRecord>, FetchError> {
            self.queries.lock().unwrap().push(query.category.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing.contains(&query.category) {
                return Err(FetchError::Status {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            // Spread categories apart by a hash-free offset: the category's byte sum
            let offset: u32 = query.category.bytes().map(u32::from).sum();
            Ok((0..self.per_category)
                .map(|i| PlaceRecord {
                    id: format!("{}-{}", query.category, i),
                    name: format!("{} #{}", query.category, i),
                    category: query.category.clone(),
                    lat: query.anchor.lat + f64::from(offset) * 0.01 + i as f64 * 0.001,
                    lng: query.anchor.lng,
                    distance_from_anchor: i as f64 * 100.0,
                    detail_category: None,
                })
                .collect())
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.retry.max_attempts = 2;
        config.retry.backoff_base_ms = 10;
        config
    }

    fn session(search: Arc<GridSearch>) -> (PlanningSession, Arc<ResultCache>) {
        let config = config();
        let cache = Arc::new(ResultCache::from_config(&config.cache));
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        (PlanningSession::new(&config, cache.clone(), limiter, search), cache)
    }

    fn request(categories: &[&str]) -> PlanRequest {
        PlanRequest {
            anchor: Anchor::new(37.5563, 126.9237),
            companion: "solo".to_string(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
            radius_m: 1000,
        }
    }

    #[tokio::test]
    async fn test_session_collects_and_reduces() {
        let search = Arc::new(GridSearch::new(10));
        let (session, cache) = session(search.clone());

        let report = session
            .run(&request(&["aa", "bb", "cc"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.candidates.len(), 20);
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.degraded(), 0);
        assert_eq!(cache.len(), 3);
        // Outcomes follow category order, not completion order
        let order: Vec<&str> = report.outcomes.iter().map(|o| o.category.as_str()).collect();
        assert_eq!(order, vec!["aa", "bb", "cc"]);
    }

    #[tokio::test]
    async fn test_second_session_uses_cache() {
        let search = Arc::new(GridSearch::new(5));
        let (session, _) = session(search.clone());
        let cancel = CancellationToken::new();

        let first = session.run(&request(&["aa", "bb"]), &cancel).await.unwrap();
        let second = session.run(&request(&["aa", "bb"]), &cancel).await.unwrap();

        assert_eq!(search.queries.lock().unwrap().len(), 2);
        assert!(second
            .outcomes
            .iter()
            .all(|o| o.source == CollectSource::Cached));
        assert_eq!(first.candidates, second.candidates);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_category_does_not_abort() {
        let mut grid = GridSearch::new(4);
        grid.failing.insert("bb".to_string());
        let (session, _) = session(Arc::new(grid));

        let report = session
            .run(&request(&["aa", "bb", "cc"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.candidates.len(), 8);
        assert_eq!(report.degraded(), 1);
        assert!(matches!(
            report.outcomes[1].source,
            CollectSource::Failed { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failed_is_empty_pool() {
        let mut grid = GridSearch::new(4);
        grid.failing.insert("aa".to_string());
        let (session, _) = session(Arc::new(grid));

        let result = session
            .run(&request(&["aa"]), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(PipelineError::EmptyCandidatePool)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_session() {
        let mut grid = GridSearch::new(4);
        grid.delay = Duration::from_secs(30);
        let (session, cache) = session(Arc::new(grid));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = session.run(&request(&["aa", "bb"]), &cancel).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_starts_no_new_searches() {
        let mut config = config();
        config.concurrency = Some(1);
        let mut grid = GridSearch::new(2);
        grid.delay = Duration::from_secs(30);
        let search = Arc::new(grid);
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let session = PlanningSession::new(
            &config,
            Arc::new(ResultCache::from_config(&config.cache)),
            limiter.clone(),
            search.clone(),
        );

        let categories: Vec<String> = (0..20).map(|i| format!("cat-{:02}", i)).collect();
        let categories: Vec<&str> = categories.iter().map(String::as_str).collect();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = session.run(&request(&categories), &cancel).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
        // Only the search already running when cancel fired went out
        assert_eq!(search.queries.lock().unwrap().len(), 1);
        assert_eq!(limiter.status().calls_in_window, 1);
    }

    #[tokio::test]
    async fn test_no_categories() {
        let mut config = config();
        config.categories = CategoryTable {
            companions: Default::default(),
            variety: vec![],
            fallback: vec![],
            companion_picks: 3,
            variety_picks: 2,
            min_categories: 6,
        };
        let session = PlanningSession::new(
            &config,
            Arc::new(ResultCache::from_config(&config.cache)),
            Arc::new(RateLimiter::from_config(&config.rate_limit)),
            Arc::new(GridSearch::new(1)),
        );

        let result = session.run(&request(&[]), &CancellationToken::new()).await;
        assert!(matches!(result, Err(PipelineError::NoCategories)));
    }

    #[tokio::test]
    async fn test_concurrency_cap() {
        let mut config = config();
        config.concurrency = Some(1);
        let search = Arc::new(GridSearch::new(2));
        let session = PlanningSession::new(
            &config,
            Arc::new(ResultCache::from_config(&config.cache)),
            Arc::new(RateLimiter::from_config(&config.rate_limit)),
            search.clone(),
        )
        .with_target(3);

        let report = session
            .run(&request(&["aa", "bb", "cc"]), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.candidates.len(), 3);
        assert_eq!(search.queries.lock().unwrap().len(), 3);
    }
}
