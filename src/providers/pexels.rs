//! Pexels-compatible photo search.
//!
//! See: <https://www.pexels.com/api/documentation/#photos-search>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::traits::ImageSearch;
use super::{DEFAULT_TIMEOUT, check_status, endpoint, http_client};
use crate::{FitgenError, Result};

/// Default base URL for the Pexels API
pub const DEFAULT_BASE_URL: &str = "https://api.pexels.com";

#[derive(Clone)]
pub struct PexelsClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl std::fmt::Debug for PexelsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PexelsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PexelsClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FitgenError::NotConfigured("images"));
        }
        Ok(Self {
            api_key,
            http: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ImageSearch for PexelsClient {
    fn name(&self) -> &str {
        "pexels"
    }

    async fn search(&self, query: &str) -> Result<Option<String>> {
        let url = endpoint(&self.base_url, "v1/search");
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .query(&[("query", query), ("per_page", "1")])
            .send()
            .await?;
        let response = check_status(response, "photo search").await?;
        let body: SearchResponse = response.json().await.map_err(|e| {
            FitgenError::MalformedResponse(format!("unexpected search response shape: {e}"))
        })?;
        Ok(body.first_url())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

impl SearchResponse {
    fn first_url(self) -> Option<String> {
        let src = self.photos.into_iter().next()?.src;
        src.medium.or(src.large).or(src.original)
    }
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSources,
}

#[derive(Debug, Deserialize)]
struct PhotoSources {
    #[serde(default)]
    original: Option<String>,
    #[serde(default)]
    large: Option<String>,
    #[serde(default)]
    medium: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_medium_then_large() {
        let body: SearchResponse = serde_json::from_value(json!({
            "photos": [{"src": {"large": "L", "original": "O"}}]
        }))
        .unwrap();
        assert_eq!(body.first_url().as_deref(), Some("L"));

        let empty: SearchResponse = serde_json::from_value(json!({"photos": []})).unwrap();
        assert_eq!(empty.first_url(), None);
    }
}
