//! HTTP API (axum).
//!
//! [`AppState`] holds configuration, secrets and the shared image cache.
//! Provider clients are not shared: every request builds its own
//! [`Assistant`] through [`AppState::assistant`].
//!
//! | method | path                  |
//! |--------|-----------------------|
//! | POST   | `/api/describe`       |
//! | POST   | `/api/plan`           |
//! | POST   | `/api/analyze-photo`  |
//! | POST   | `/api/speech`         |
//! | POST   | `/api/image`          |
//! | DELETE | `/api/image/:name`    |
//! | GET    | `/health`             |

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::cache::LocalResponseCache;
use crate::providers::{GeminiClient, PexelsClient, SpeechClient};
use crate::resolver::ModelResolver;
use crate::service::Assistant;

pub use config::{Config, Secrets, Service};
pub use error::ApiError;

/// Shared, read-only server state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    secrets: Secrets,
    image_cache: Option<Arc<LocalResponseCache>>,
    text_resolver: ModelResolver,
    vision_resolver: ModelResolver,
    speech_resolver: ModelResolver,
}

impl AppState {
    /// Build state from configuration. Fails on invalid model overrides.
    pub fn new(config: Config, secrets: Secrets) -> Result<Self> {
        let image_cache = config.image_cache();
        Self::with_image_cache(config, secrets, image_cache)
    }

    /// Build state with an explicit image cache (or none).
    pub fn with_image_cache(
        config: Config,
        secrets: Secrets,
        image_cache: Option<Arc<LocalResponseCache>>,
    ) -> Result<Self> {
        let text_resolver = config.text_resolver()?;
        let vision_resolver = config.vision_resolver()?;
        let speech_resolver = config.speech_resolver()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                secrets,
                image_cache,
                text_resolver,
                vision_resolver,
                speech_resolver,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Build a request-scoped assistant from the configured services.
    ///
    /// Services without a key are left out; operations needing them fail
    /// with a not-configured error.
    pub fn assistant(&self) -> Result<Assistant> {
        let inner = &self.inner;
        let providers = &inner.config.providers;
        let timeout = inner.config.timeout();

        let mut builder = Assistant::builder()
            .text_resolver(inner.text_resolver.clone())
            .vision_resolver(inner.vision_resolver.clone())
            .speech_resolver(inner.speech_resolver.clone())
            .default_voice(providers.speech.voice.clone());

        if let Some(key) = inner.secrets.api_key(Service::Gemini) {
            let gemini = Arc::new(GeminiClient::with_base_url(
                key,
                &providers.gemini.base_url,
                timeout,
            )?);
            builder = builder
                .catalog(gemini.clone())
                .text(gemini.clone())
                .vision(gemini);
        }

        if let Some(key) = inner.secrets.api_key(Service::OpenAi) {
            builder = builder.speech(Arc::new(SpeechClient::with_base_url(
                key,
                &providers.speech.base_url,
                timeout,
            )?));
        }

        if let Some(key) = inner.secrets.api_key(Service::Pexels) {
            builder = builder.images(Arc::new(PexelsClient::with_base_url(
                key,
                &providers.images.base_url,
                timeout,
            )?));
        }

        if let Some(cache) = &inner.image_cache {
            builder = builder.image_cache(cache.clone());
        }

        Ok(builder.build())
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config().server.max_body_bytes;
    Router::new()
        .route("/api/describe", post(routes::describe))
        .route("/api/plan", post(routes::plan))
        .route("/api/analyze-photo", post(routes::analyze_photo))
        .route("/api/speech", post(routes::speech))
        .route("/api/image", post(routes::image))
        .route("/api/image/:name", delete(routes::forget_image))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
