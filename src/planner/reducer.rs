//! Candidate reducer: merges per-category results into a small, diverse shortlist
//!
//! 1. Drop records beyond the optional distance limit
//! 2. Deduplicate across categories (first seen wins)
//! 3. Round-robin draw across categories, best-ranked first, up to the target

use crate::config::ReducerConfig;
use crate::error::PipelineError;
use crate::place::{CandidatePool, CuratedCandidateSet, PlaceRecord};
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CandidateReducer {
    target_count: usize,
    dedup_distance_m: f64,
    max_distance_m: Option<f64>,
}

impl CandidateReducer {
    pub fn new(target_count: usize, dedup_distance_m: f64) -> Self {
        Self {
            target_count,
            dedup_distance_m,
            max_distance_m: None,
        }
    }

    pub fn from_config(config: &ReducerConfig) -> Self {
        Self {
            target_count: config.target_count,
            dedup_distance_m: config.dedup_distance_m,
            max_distance_m: config.max_distance_m,
        }
    }

    pub fn with_target(mut self, target_count: usize) -> Self {
        self.target_count = target_count;
        self
    }

    /// Reduce a pool to at most `target_count` places.
    ///
    /// Returns `EmptyCandidatePool` when no category produced a usable record.
    pub fn reduce(&self, pool: &CandidatePool) -> Result<CuratedCandidateSet, PipelineError> {
        let per_category = self.deduplicate(pool);
        let unique: usize = per_category.iter().map(Vec::len).sum();

        if unique == 0 {
            info!("No candidates after reduction ({} raw records)", pool.total());
            return Err(PipelineError::EmptyCandidatePool);
        }

        let selected = round_robin(&per_category, self.target_count);

        info!(
            "Reduced {} records ({} unique) across {} categories to {} candidates",
            pool.total(),
            unique,
            per_category.len(),
            selected.len()
        );

        Ok(CuratedCandidateSet::new(selected))
    }

    fn deduplicate<'a>(&self, pool: &'a CandidatePool) -> Vec<Vec<&'a PlaceRecord>> {
        let mut kept: Vec<&PlaceRecord> = Vec::new();
        let mut names: HashSet<String> = HashSet::new();
        let mut ids: HashSet<&str> = HashSet::new();
        let mut per_category = Vec::new();

        for (category, places) in pool.iter() {
            let mut unique = Vec::new();

            for place in places {
                if let Some(max) = self.max_distance_m {
                    if place.distance_from_anchor > max {
                        continue;
                    }
                }
                if ids.contains(place.id.as_str()) {
                    continue;
                }

                let name = place.normalized_name();
                if !name.is_empty() && names.contains(&name) {
                    debug!("Dropping '{}' in {}: duplicate name", place.name, category);
                    continue;
                }

                let position = place.position();
                if kept
                    .iter()
                    .any(|k| k.position().distance_to(&position) <= self.dedup_distance_m)
                {
                    debug!("Dropping '{}' in {}: too close to a kept place", place.name, category);
                    continue;
                }

                ids.insert(place.id.as_str());
                names.insert(name);
                kept.push(place);
                unique.push(place);
            }

            per_category.push(unique);
        }

        per_category
    }
}

/// One record per category per round, in category order
fn round_robin(per_category: &[Vec<&PlaceRecord>], target: usize) -> Vec<PlaceRecord> {
    let mut selected = Vec::with_capacity(target);
    let mut round = 0;

    while selected.len() < target {
        let mut drew = false;
        for places in per_category {
            if selected.len() >= target {
                break;
            }
            if let Some(place) = places.get(round) {
                selected.push((*place).clone());
                drew = true;
            }
        }
        if !drew {
            break;
        }
        round += 1;
    }

    selected
}
