//! Upstream service clients.
//!
//! Each client implements one or more capability traits from [`traits`].
//! Clients are cheap to build and are constructed per request scope from
//! configuration and secrets; nothing here is global.

pub mod gemini;
pub mod pexels;
pub mod speech;
pub mod traits;

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::{FitgenError, Result};

pub use gemini::GeminiClient;
pub use pexels::PexelsClient;
pub use speech::SpeechClient;
pub use traits::{ImageSearch, ModelCatalog, SpeechSynthesizer, TextGenerator, VisionAnalyzer};

/// Transport timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FitgenError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Error body shape shared by Gemini and OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Pass a successful response through; map anything else to an error.
///
/// The upstream error message is taken from `{"error": {"message": ..}}`
/// when present, otherwise the raw body. `Retry-After` is honoured when it
/// holds a number of seconds.
pub(crate) async fn check_status(
    response: reqwest::Response,
    subject: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or(body);
    let message = if detail.is_empty() {
        format!("{subject}: {status}")
    } else {
        format!("{subject}: {detail}")
    };

    Err(FitgenError::from_status(
        status.as_u16(),
        message,
        retry_after,
    ))
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
