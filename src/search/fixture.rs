//! Offline provider backed by a YAML or JSON file of category -> places

use super::PlaceSearch;
use crate::error::FetchError;
use crate::place::{normalize_name, Anchor, PlaceRecord, SearchQuery};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
struct FixturePlace {
    #[serde(default)]
    id: Option<String>,
    name: String,
    lat: f64,
    lng: f64,
    #[serde(default)]
    category_name: Option<String>,
}

pub struct FixtureSearch {
    places: HashMap<String, Vec<FixturePlace>>,
}

impl FixtureSearch {
    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let content = std::fs::read_to_string(path).map_err(|e| FetchError::Fixture {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// YAML is a superset of JSON, so both formats go through serde_yaml
    pub fn parse(content: &str) -> Result<Self, FetchError> {
        let raw: HashMap<String, Vec<FixturePlace>> =
            serde_yaml::from_str(content).map_err(|e| FetchError::Malformed(e.to_string()))?;

        let places = raw
            .into_iter()
            .map(|(category, places)| (category.trim().to_lowercase(), places))
            .collect();
        Ok(Self { places })
    }
}

#[async_trait]
impl PlaceSearch for FixtureSearch {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlaceRecord>, FetchError> {
        let key = query.category.trim().to_lowercase();
        let Some(candidates) = self.places.get(&key) else {
            debug!("Fixture has no places for '{}'", query.category);
            return Ok(Vec::new());
        };

        let mut places: Vec<PlaceRecord> = candidates
            .iter()
            .map(|p| PlaceRecord {
                id: p
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("{}@{:.5},{:.5}", p.name, p.lat, p.lng)),
                name: p.name.clone(),
                category: query.category.clone(),
                lat: p.lat,
                lng: p.lng,
                distance_from_anchor: query.anchor.distance_to(&Anchor::new(p.lat, p.lng)),
                detail_category: p.category_name.clone(),
            })
            .filter(|p| p.distance_from_anchor <= f64::from(query.radius_m))
            .collect();

        places.sort_by(|a, b| a.distance_from_anchor.total_cmp(&b.distance_from_anchor));
        places.truncate(query.result_limit as usize);
        Ok(places)
    }

    /// Matches fixture place names, visiting categories in sorted order
    async fn locate(&self, name: &str) -> Result<Option<Anchor>, FetchError> {
        let wanted = normalize_name(name);
        if wanted.is_empty() {
            return Ok(None);
        }

        let mut categories: Vec<&String> = self.places.keys().collect();
        categories.sort();

        Ok(categories
            .into_iter()
            .flat_map(|category| &self.places[category])
            .find(|p| normalize_name(&p.name) == wanted)
            .map(|p| Anchor::new(p.lat, p.lng)))
    }
}
