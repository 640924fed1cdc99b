//! Google Gemini client: model catalog, text generation and image analysis.
//!
//! See: <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{ModelCatalog, TextGenerator, VisionAnalyzer};
use super::{DEFAULT_TIMEOUT, check_status, endpoint, http_client};
use crate::types::{ImageInput, ModelDescriptor};
use crate::{FitgenError, Result};

/// Default base URL for the Gemini API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client against the public endpoint.
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
            return Err(FitgenError::NotConfigured("gemini"));
        }
        Ok(Self {
            api_key,
            http: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    async fn generate(&self, model: &str, parts: Vec<Part<'_>>) -> Result<String> {
        let url = endpoint(
            &self.base_url,
            &format!("v1beta/models/{model}:generateContent"),
        );
        let request = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response, model).await?;

        let body: GenerateResponse = response.json().await.map_err(|e| {
            FitgenError::MalformedResponse(format!("unexpected response shape: {e}"))
        })?;
        let text = body.text().ok_or(FitgenError::EmptyResponse)?;
        debug!(model, chars = text.len(), "gemini generated content");
        Ok(text)
    }
}

#[async_trait]
impl ModelCatalog for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        let url = endpoint(&self.base_url, "v1beta/models");
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("pageSize", "1000")])
            .send()
            .await?;
        let response = check_status(response, "model list").await?;
        let body: ModelsResponse = response.json().await.map_err(|e| {
            FitgenError::MalformedResponse(format!("unexpected model list shape: {e}"))
        })?;
        Ok(body.models.into_iter().map(into_descriptor).collect())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String> {
        self.generate(model, vec![Part::Text { text: prompt }]).await
    }
}

#[async_trait]
impl VisionAnalyzer for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze_image(&self, model: &str, prompt: &str, image: &ImageInput) -> Result<String> {
        let parts = vec![
            Part::Text { text: prompt },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: &image.mime_type,
                    data: image.to_base64(),
                },
            },
        ];
        self.generate(model, parts).await
    }
}

fn into_descriptor(entry: ModelEntry) -> ModelDescriptor {
    let id = entry
        .name
        .strip_prefix("models/")
        .unwrap_or(&entry.name)
        .to_string();
    ModelDescriptor {
        id,
        supported_operations: entry.supported_generation_methods.into_iter().collect(),
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate, if non-blank.
    fn text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}
