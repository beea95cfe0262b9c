use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Cap on parallel category collectors (defaults to one per category)
    #[serde(default)]
    pub concurrency: Option<usize>,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub reducer: ReducerConfig,

    #[serde(default)]
    pub categories: CategoryTable,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_sec")]
    pub ttl_sec: u64,

    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Decimal places kept when rounding anchor coordinates into cache keys
    #[serde(default = "default_coordinate_precision")]
    pub coordinate_precision: u32,

    /// How long an expired entry stays around for degraded-mode fallback
    #[serde(default = "default_stale_grace_sec")]
    pub stale_grace_sec: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_sec: default_cache_ttl_sec(),
            capacity: default_cache_capacity(),
            coordinate_precision: default_coordinate_precision(),
            stale_grace_sec: default_stale_grace_sec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_calls")]
    pub max_calls: usize,

    #[serde(default = "default_window_sec")]
    pub window_sec: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: default_max_calls(),
            window_sec: default_window_sec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Kakao,
    Fixture,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Kakao => write!(f, "kakao"),
            ProviderKind::Fixture => write!(f, "fixture"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SearchConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Environment variable holding the REST API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_radius_m")]
    pub radius_m: u32,

    #[serde(default = "default_result_limit")]
    pub result_limit: u32,

    #[serde(default = "default_search_timeout_sec")]
    pub timeout_sec: u64,

    /// Fixture file used by the `fixture` provider
    #[serde(default)]
    pub fixture: Option<std::path::PathBuf>,

    /// Category keyword -> provider category group code
    #[serde(default = "default_category_codes")]
    pub category_codes: HashMap<String, String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: default_search_base_url(),
            api_key_env: default_api_key_env(),
            radius_m: default_radius_m(),
            result_limit: default_result_limit(),
            timeout_sec: default_search_timeout_sec(),
            fixture: None,
            category_codes: default_category_codes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ReducerConfig {
    #[serde(default = "default_target_count")]
    pub target_count: usize,

    #[serde(default = "default_dedup_distance_m")]
    pub dedup_distance_m: f64,

    /// Drop records farther than this from the anchor before reducing
    #[serde(default)]
    pub max_distance_m: Option<f64>,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            dedup_distance_m: default_dedup_distance_m(),
            max_distance_m: None,
        }
    }
}

/// Companion type -> default categories, consulted when the user picks none
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CategoryTable {
    #[serde(default = "default_companions")]
    pub companions: HashMap<String, Vec<String>>,

    /// Categories mixed in for variety after the companion picks
    #[serde(default = "default_variety")]
    pub variety: Vec<String>,

    /// Used to top up the selection to `min_categories`
    #[serde(default = "default_fallback")]
    pub fallback: Vec<String>,

    #[serde(default = "default_companion_picks")]
    pub companion_picks: usize,

    #[serde(default = "default_variety_picks")]
    pub variety_picks: usize,

    #[serde(default = "default_min_categories")]
    pub min_categories: usize,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            companions: default_companions(),
            variety: default_variety(),
            fallback: default_fallback(),
            companion_picks: default_companion_picks(),
            variety_picks: default_variety_picks(),
            min_categories: default_min_categories(),
        }
    }
}
