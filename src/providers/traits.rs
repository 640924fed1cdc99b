//! Provider traits for capability-specific implementations.
//!
//! Providers implement capability-specific traits (e.g. `TextGenerator`,
//! `SpeechSynthesizer`) rather than a single "god trait". This lets the
//! [`Assistant`](crate::service::Assistant) mix real HTTP clients with test
//! fakes per capability.
//!
//! # Model Selection
//!
//! Every generation method receives the model identifier explicitly. The
//! caller (usually the [`FallbackInvoker`](crate::invoker::FallbackInvoker))
//! decides which candidate to try; providers never pick a model themselves.
//! Providers report failures as plain [`FitgenError`](crate::FitgenError)s;
//! classification into retryable/fatal happens in the invoker.

use async_trait::async_trait;

use crate::Result;
use crate::types::{AudioClip, ImageInput, ModelDescriptor};

// ============================================================================
// Model Catalog
// ============================================================================

/// Source of the live list of models a provider offers.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Fetch every model the provider currently exposes.
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>>;
}

// ============================================================================
// Text Generation
// ============================================================================

/// Provider for single-turn text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Generate text for `prompt` with `model`.
    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String>;
}

// ============================================================================
// Vision
// ============================================================================

/// Provider for image analysis.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Describe or assess `image` according to `prompt`.
    async fn analyze_image(&self, model: &str, prompt: &str, image: &ImageInput) -> Result<String>;
}

// ============================================================================
// Speech
// ============================================================================

/// Provider for text-to-speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Synthesize `text` with `model` and `voice`.
    async fn synthesize(&self, model: &str, text: &str, voice: &str) -> Result<AudioClip>;
}

// ============================================================================
// Image Search
// ============================================================================

/// Provider that finds an illustrative image URL for a query.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Return the best matching image URL, or `None` when nothing matched.
    async fn search(&self, query: &str) -> Result<Option<String>>;
}
