//! Kakao Local keyword search client

use super::PlaceSearch;
use crate::config::SearchConfig;
use crate::error::FetchError;
use crate::place::{Anchor, PlaceRecord, SearchQuery};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const KEYWORD_PATH: &str = "/v2/local/search/keyword.json";

/// Largest page the keyword endpoint serves
const MAX_PAGE_SIZE: u32 = 15;

pub struct KakaoSearch {
    http: Client,
    base_url: String,
    api_key: String,
    category_codes: HashMap<String, String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct KeywordResponse {
    documents: Vec<Document>,
}

/// Kakao encodes numbers as strings; everything is optional so one odd
/// document doesn't sink the whole page
#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    place_name: Option<String>,
    /// Longitude
    #[serde(default)]
    x: Option<String>,
    /// Latitude
    #[serde(default)]
    y: Option<String>,
    #[serde(default)]
    distance: Option<String>,
    #[serde(default)]
    category_name: Option<String>,
}

impl KakaoSearch {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            category_codes: HashMap::new(),
            timeout,
        })
    }

    /// Build from config, reading the API key from the configured env var
    pub fn from_config(config: &SearchConfig) -> Result<Self, FetchError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| FetchError::MissingApiKey(config.api_key_env.clone()))?;

        let mut client = Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_sec),
        )?;
        client.category_codes = config
            .category_codes
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.clone()))
            .collect();
        Ok(client)
    }

    fn params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", query.category.trim().to_string()),
            ("x", query.anchor.lng.to_string()),
            ("y", query.anchor.lat.to_string()),
            ("radius", query.radius_m.min(20_000).to_string()),
            ("size", query.result_limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("sort", "distance".to_string()),
        ];
        if let Some(code) = self
            .category_codes
            .get(&query.category.trim().to_lowercase())
        {
            params.push(("category_group_code", code.clone()));
        }
        params
    }
}

#[async_trait]
impl PlaceSearch for KakaoSearch {
    fn name(&self) -> &'static str {
        "kakao"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlaceRecord>, FetchError> {
        debug!("Keyword search query={:?}", query.category);
        let body = self.keyword(&self.params(query)).await?;
        parse_documents(&body, query)
    }

    /// First keyword hit for `name`, with no anchor bias
    async fn locate(&self, name: &str) -> Result<Option<Anchor>, FetchError> {
        debug!("Resolving location {:?}", name);
        let params = [("query", name.trim().to_string()), ("size", "1".to_string())];
        let body = self.keyword(&params).await?;
        parse_location(&body)
    }
}

impl KakaoSearch {
    /// GET the keyword endpoint and return the body of a 2xx response
    async fn keyword(&self, params: &[(&'static str, String)]) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, KEYWORD_PATH);

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .query(params)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        Ok(body)
    }

    fn map_transport(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(e)
        }
    }
}

fn parse_documents(body: &str, query: &SearchQuery) -> Result<Vec<PlaceRecord>, FetchError> {
    let response: KeywordResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let total = response.documents.len();
    let places: Vec<PlaceRecord> = response
        .documents
        .into_iter()
        .filter_map(|doc| to_record(doc, query))
        .collect();

    if places.len() < total {
        debug!(
            "Skipped {} malformed documents for '{}'",
            total - places.len(),
            query.category
        );
    }
    Ok(places)
}

fn parse_location(body: &str) -> Result<Option<Anchor>, FetchError> {
    let response: KeywordResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    Ok(response.documents.into_iter().find_map(|doc| {
        let lat: f64 = doc.y?.trim().parse().ok()?;
        let lng: f64 = doc.x?.trim().parse().ok()?;
        Some(Anchor::new(lat, lng))
    }))
}

fn to_record(doc: Document, query: &SearchQuery) -> Option<PlaceRecord> {
    let name = doc.place_name.filter(|n| !n.trim().is_empty())?;
    let lat: f64 = doc.y?.trim().parse().ok()?;
    let lng: f64 = doc.x?.trim().parse().ok()?;

    let distance = doc
        .distance
        .and_then(|d| d.trim().parse::<f64>().ok())
        .unwrap_or_else(|| query.anchor.distance_to(&Anchor::new(lat, lng)));

    let id = doc
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{}@{:.5},{:.5}", name, lat, lng));

    Some(PlaceRecord {
        id,
        name,
        category: query.category.clone(),
        lat,
        lng,
        distance_from_anchor: distance,
        detail_category: doc.category_name.filter(|c| !c.trim().is_empty()),
    })
}
