mod fixture;
mod kakao;

pub use fixture::FixtureSearch;
pub use kakao::KakaoSearch;

use crate::config::{ProviderKind, SearchConfig};
use crate::error::FetchError;
use crate::place::{Anchor, PlaceRecord, SearchQuery};
use async_trait::async_trait;
use std::sync::Arc;

/// A place-search backend.
///
/// `Ok(vec![])` means the provider answered with zero results; transport and
/// decoding problems are reported as `FetchError`.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlaceRecord>, FetchError>;

    /// Resolve a place name to a coordinate; `Ok(None)` when nothing matches
    async fn locate(&self, _name: &str) -> Result<Option<Anchor>, FetchError> {
        Ok(None)
    }
}

/// Create the configured search provider
pub fn create_provider(config: &SearchConfig) -> Result<Arc<dyn PlaceSearch>, FetchError> {
    match config.provider {
        ProviderKind::Kakao => Ok(Arc::new(KakaoSearch::from_config(config)?)),
        ProviderKind::Fixture => {
            let path = config
                .fixture
                .as_ref()
                .ok_or_else(|| FetchError::NotConfigured("search.fixture is not set".to_string()))?;
            Ok(Arc::new(FixtureSearch::load(path)?))
        }
    }
}
