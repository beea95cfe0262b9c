//! Domain types shared by the collector, cache and reducer

use serde::{Deserialize, Serialize};
use std::fmt;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub lat: f64,
    pub lng: f64,
}

impl Anchor {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in meters (haversine)
    pub fn distance_to(&self, other: &Anchor) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

impl std::str::FromStr for Anchor {
    type Err = String;

    /// Parses `"lat,lng"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("Expected 'lat,lng', got '{}'", s))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|e| format!("Invalid latitude '{}': {}", lat.trim(), e))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|e| format!("Invalid longitude '{}': {}", lng.trim(), e))?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(format!("Coordinate out of range: {},{}", lat, lng));
        }
        Ok(Anchor { lat, lng })
    }
}

/// One category search around an anchor
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub category: String,
    pub anchor: Anchor,
    pub radius_m: u32,
    pub result_limit: u32,
}

impl SearchQuery {
    pub fn new(category: impl Into<String>, anchor: Anchor, radius_m: u32, result_limit: u32) -> Self {
        Self {
            category: category.into(),
            anchor,
            radius_m,
            result_limit,
        }
    }

    /// Normalize into a cache key, rounding the anchor to `precision` decimal places
    pub fn cache_key(&self, precision: u32) -> CacheKey {
        let category = self.category.trim().to_lowercase();
        let lat = round_to(self.anchor.lat, precision);
        let lng = round_to(self.anchor.lng, precision);
        let digits = precision as usize;

        CacheKey(format!(
            "{}|{:.*}|{:.*}|{}|{}",
            category, digits, lat, digits, lng, self.radius_m, self.result_limit
        ))
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let rounded = (value * factor).round() / factor;
    // Fold -0.0 into 0.0 so both print identically
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A place returned by the search API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub lat: f64,
    pub lng: f64,
    /// Meters from the search anchor
    pub distance_from_anchor: f64,
    /// Provider's own classification, e.g. "음식점 > 카페 > 커피전문점"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_category: Option<String>,
}

impl PlaceRecord {
    pub fn position(&self) -> Anchor {
        Anchor::new(self.lat, self.lng)
    }

    /// Name folded for duplicate detection: lowercase, alphanumerics only
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Per-category results for one session, kept in category order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePool {
    categories: Vec<(String, Vec<PlaceRecord>)>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add results for a category; a repeated category appends to the existing list
    pub fn insert(&mut self, category: impl Into<String>, places: Vec<PlaceRecord>) {
        let category = category.into();
        match self.categories.iter_mut().find(|(c, _)| *c == category) {
            Some((_, existing)) => existing.extend(places),
            None => self.categories.push((category, places)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PlaceRecord])> {
        self.categories
            .iter()
            .map(|(c, places)| (c.as_str(), places.as_slice()))
    }

    pub fn total(&self) -> usize {
        self.categories.iter().map(|(_, p)| p.len()).sum()
    }
}

/// The reduced shortlist handed to the downstream selector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CuratedCandidateSet {
    places: Vec<PlaceRecord>,
}

impl CuratedCandidateSet {
    pub(crate) fn new(places: Vec<PlaceRecord>) -> Self {
        Self { places }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn places(&self) -> &[PlaceRecord] {
        &self.places
    }

    /// Look up by the 1-based index shown to the selector
    pub fn get(&self, index: usize) -> Option<&PlaceRecord> {
        index.checked_sub(1).and_then(|i| self.places.get(i))
    }

    /// Entries paired with their stable 1-based indices
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &PlaceRecord)> {
        self.places.iter().enumerate().map(|(i, p)| (i + 1, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_folds_case_and_whitespace() {
        let anchor = Anchor::new(37.5563, 126.9237);
        let a = SearchQuery::new("  Cafe ", anchor, 1000, 15);
        let b = SearchQuery::new("cafe", anchor, 1000, 15);
        assert_eq!(a.cache_key(3), b.cache_key(3));
    }

    #[test]
    fn test_cache_key_folds_sub_precision_coordinates() {
        let a = SearchQuery::new("cafe", Anchor::new(37.55631, 126.92312), 1000, 15);
        let b = SearchQuery::new("cafe", Anchor::new(37.55649, 126.92349), 1000, 15);
        assert_eq!(a.cache_key(3), b.cache_key(3));
        assert_eq!(a.cache_key(3).to_string(), "cafe|37.556|126.923|1000|15");

        // Distinct at higher precision
        assert_ne!(a.cache_key(4), b.cache_key(4));
    }

    #[test]
    fn test_cache_key_keeps_radius_and_limit() {
        let anchor = Anchor::new(37.5563, 126.9237);
        let a = SearchQuery::new("cafe", anchor, 1000, 15);
        assert_ne!(a.cache_key(3), SearchQuery::new("cafe", anchor, 2000, 15).cache_key(3));
        assert_ne!(a.cache_key(3), SearchQuery::new("cafe", anchor, 1000, 10).cache_key(3));
    }

    #[test]
    fn test_cache_key_negative_zero() {
        let a = SearchQuery::new("park", Anchor::new(-0.0001, 0.0), 500, 10);
        let b = SearchQuery::new("park", Anchor::new(0.0001, 0.0), 500, 10);
        assert_eq!(a.cache_key(3), b.cache_key(3));
    }

    #[test]
    fn test_distance() {
        // Roughly 111 km per degree of latitude
        let a = Anchor::new(37.0, 127.0);
        let b = Anchor::new(38.0, 127.0);
        let d = a.distance_to(&b);
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_parse_anchor() {
        let anchor: Anchor = "37.5563, 126.9237".parse().unwrap();
        assert_eq!(anchor, Anchor::new(37.5563, 126.9237));
        assert!("37.5".parse::<Anchor>().is_err());
        assert!("91,0".parse::<Anchor>().is_err());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Starbucks Hongdae-Station"), "starbuckshongdaestation");
        assert_eq!(normalize_name("스타벅스 홍대점"), "스타벅스홍대점");
    }

    #[test]
    fn test_pool_merges_repeated_category() {
        let mut pool = CandidatePool::new();
        pool.insert("cafe", vec![]);
        pool.insert("park", vec![]);
        pool.insert("cafe", vec![]);
        assert_eq!(pool.iter().count(), 2);
        assert_eq!(pool.total(), 0);
    }
}
