mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            concurrency: None,
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            search: SearchConfig::default(),
            reducer: ReducerConfig::default(),
            categories: CategoryTable::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config if the file exists, otherwise fall back to built-in defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("Config '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.capacity == 0 {
            return Err(ConfigError::Invalid("cache.capacity must be at least 1".into()));
        }
        if self.cache.coordinate_precision > 7 {
            return Err(ConfigError::Invalid(
                "cache.coordinate_precision must be at most 7".into(),
            ));
        }
        if self.rate_limit.max_calls == 0 || self.rate_limit.window_sec == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_calls and rate_limit.window_sec must be positive".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        if self.search.result_limit == 0 || self.search.result_limit > 15 {
            return Err(ConfigError::Invalid(
                "search.result_limit must be between 1 and 15".into(),
            ));
        }
        if self.reducer.target_count == 0 {
            return Err(ConfigError::Invalid("reducer.target_count must be at least 1".into()));
        }
        let dedup = self.reducer.dedup_distance_m;
        if dedup.is_nan() || dedup < 0.0 {
            return Err(ConfigError::Invalid(
                "reducer.dedup_distance_m must be non-negative".into(),
            ));
        }
        if self.concurrency == Some(0) {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        let mut companions = HashSet::new();
        for name in self.categories.companions.keys() {
            let folded = name.trim().to_lowercase();
            if !companions.insert(folded.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "categories.companions has more than one entry for '{}'",
                    folded
                )));
            }
        }
        if self.search.provider == ProviderKind::Fixture && self.search.fixture.is_none() {
            return Err(ConfigError::Invalid(
                "search.fixture is required for the fixture provider".into(),
            ));
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.cache.ttl_sec, 3600);
        assert_eq!(config.rate_limit.max_calls, 100);
        assert_eq!(config.rate_limit.window_sec, 60);
        assert_eq!(config.reducer.target_count, 20);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "rate_limit:\n  max_calls: 10\ncategories:\n  companions:\n    business: [\"카페\", \"음식점\"]"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.rate_limit.max_calls, 10);
        assert_eq!(config.rate_limit.window_sec, 60);
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.categories.companions.len(), 1);
        assert_eq!(config.categories.fallback, default_fallback());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config::default();
        config.cache.capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_companion_keys_differing_only_in_case() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "categories:\n  companions:\n    Family: [\"박물관\"]\n    \" family\": [\"공원\"]"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        match config.validate() {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("'family'"), "{}", msg),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_fixture_provider_requires_path() {
        let mut config = Config::default();
        config.search.provider = ProviderKind::Fixture;
        assert!(config.validate().is_err());

        config.search.fixture = Some("places.yaml".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("daytrip.yaml")).unwrap();
        assert_eq!(config.search.radius_m, 1000);
    }
}
