//! OpenAI-compatible text-to-speech client.
//!
//! See: <https://platform.openai.com/docs/api-reference/audio/createSpeech>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::traits::SpeechSynthesizer;
use super::{DEFAULT_TIMEOUT, check_status, endpoint, http_client};
use crate::types::AudioClip;
use crate::{FitgenError, Result};

/// Default base URL for the OpenAI API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Voice used when the caller does not pick one.
pub const DEFAULT_VOICE: &str = "alloy";

/// Longest input the speech endpoint accepts, in characters.
pub const MAX_INPUT_CHARS: usize = 4096;

/// Client for `/v1/audio/speech`.
#[derive(Clone)]
pub struct SpeechClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl std::fmt::Debug for SpeechClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SpeechClient {
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
            return Err(FitgenError::NotConfigured("speech"));
        }
        Ok(Self {
            api_key,
            http: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechClient {
    fn name(&self) -> &str {
        "openai-speech"
    }

    async fn synthesize(&self, model: &str, text: &str, voice: &str) -> Result<AudioClip> {
        let url = endpoint(&self.base_url, "v1/audio/speech");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SpeechRequest {
                model,
                input: text,
                voice,
                response_format: "mp3",
            })
            .send()
            .await?;
        let response = check_status(response, model).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let data = response.bytes().await?.to_vec();
        if data.is_empty() {
            return Err(FitgenError::EmptyResponse);
        }
        debug!(model, voice, bytes = data.len(), "speech synthesized");

        Ok(AudioClip {
            data,
            content_type,
            model: model.to_string(),
        })
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}
