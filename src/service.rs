//! The fitness assistant: request-scoped orchestration of resolver,
//! invoker, providers and image cache.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use fitgen::providers::GeminiClient;
//! # use fitgen::service::Assistant;
//! # async fn example() -> fitgen::Result<()> {
//! let gemini = Arc::new(GeminiClient::new("key")?);
//! let assistant = Assistant::builder()
//!     .catalog(gemini.clone())
//!     .text(gemini)
//!     .build();
//! let text = assistant.describe("push-ups").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cache::{self, LocalResponseCache};
use crate::classify::{KeywordProfile, SubjectKind, classify_subject};
use crate::invoker::{FallbackInvoker, InvocationContext};
use crate::providers::speech::{DEFAULT_VOICE, MAX_INPUT_CHARS};
use crate::providers::traits::{
    ImageSearch, ModelCatalog, SpeechSynthesizer, TextGenerator, VisionAnalyzer,
};
use crate::repair;
use crate::resolver::ModelResolver;
use crate::types::{AudioClip, FitnessPlan, FitnessProfile, ImageInput};
use crate::{FitgenError, Result};

/// Result of an image lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageLookup {
    /// Image URL, or `None` when the search found nothing.
    pub url: Option<String>,
    /// Whether the URL came from the local cache.
    pub cached: bool,
}

/// Request-scoped assistant. Each capability is optional; calling an
/// operation whose provider is missing returns
/// [`FitgenError::NotConfigured`].
pub struct Assistant {
    catalog: Option<Arc<dyn ModelCatalog>>,
    text: Option<Arc<dyn TextGenerator>>,
    vision: Option<Arc<dyn VisionAnalyzer>>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    images: Option<Arc<dyn ImageSearch>>,
    image_cache: Option<Arc<LocalResponseCache>>,
    text_resolver: ModelResolver,
    vision_resolver: ModelResolver,
    speech_resolver: ModelResolver,
    default_voice: String,
}

impl Assistant {
    pub fn builder() -> AssistantBuilder {
        AssistantBuilder::new()
    }

    /// Describe an exercise or a meal.
    #[instrument(skip(self))]
    pub async fn describe(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FitgenError::InvalidInput("name must not be empty".into()));
        }
        let text = self.text.as_ref().ok_or(FitgenError::NotConfigured("text"))?;

        let kind = classify_subject(name, KeywordProfile::Describe);
        let prompt = describe_prompt(name, kind);
        debug!(kind = kind.as_str(), "describing subject");

        let candidates = self
            .text_resolver
            .resolve(self.catalog.as_deref(), None)
            .await;
        FallbackInvoker::new(InvocationContext::Text)
            .invoke_with(&candidates, |model| {
                let text = text.clone();
                let prompt = prompt.clone();
                async move { text.generate_text(&model, &prompt).await }
            })
            .await
    }

    /// Generate a workout and diet plan for `profile`.
    ///
    /// The model output is parsed strictly, with one repair pass; output
    /// that still fails to parse is reported as a malformed response.
    #[instrument(skip_all, fields(days = profile.plan_days()))]
    pub async fn generate_plan(&self, profile: &FitnessProfile) -> Result<FitnessPlan> {
        profile.validate()?;
        let text = self.text.as_ref().ok_or(FitgenError::NotConfigured("text"))?;
        let prompt = plan_prompt(profile);

        let candidates = self
            .text_resolver
            .resolve(self.catalog.as_deref(), None)
            .await;
        let raw = FallbackInvoker::new(InvocationContext::Text)
            .invoke_with(&candidates, |model| {
                let text = text.clone();
                let prompt = prompt.clone();
                async move { text.generate_text(&model, &prompt).await }
            })
            .await?;

        let plan: FitnessPlan = repair::parse_model_json(&raw)?;
        if plan.workout.is_empty() && plan.diet.is_empty() {
            return Err(FitgenError::MalformedResponse(
                "plan has neither workouts nor meals".into(),
            ));
        }
        info!(
            workout_days = plan.workout.len(),
            diet_days = plan.diet.len(),
            "plan generated"
        );
        Ok(plan)
    }

    /// Assess a progress or meal photo.
    #[instrument(skip_all, fields(mime_type = %image.mime_type, bytes = image.data.len()))]
    pub async fn analyze_photo(&self, image: &ImageInput, note: Option<&str>) -> Result<String> {
        if image.data.is_empty() {
            return Err(FitgenError::InvalidInput("image is empty".into()));
        }
        let vision = self
            .vision
            .as_ref()
            .ok_or(FitgenError::NotConfigured("vision"))?;
        let prompt = photo_prompt(note);

        let candidates = self
            .vision_resolver
            .resolve(self.catalog.as_deref(), None)
            .await;
        let image = Arc::new(image.clone());
        FallbackInvoker::new(InvocationContext::Vision)
            .invoke_with(&candidates, |model| {
                let vision = vision.clone();
                let prompt = prompt.clone();
                let image = image.clone();
                async move { vision.analyze_image(&model, &prompt, &image).await }
            })
            .await
    }

    /// Read `text` aloud. Speech models come from the static list only.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<AudioClip> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FitgenError::InvalidInput("text must not be empty".into()));
        }
        if text.chars().count() > MAX_INPUT_CHARS {
            return Err(FitgenError::InvalidInput(format!(
                "text must be at most {MAX_INPUT_CHARS} characters"
            )));
        }
        let speech = self
            .speech
            .as_ref()
            .ok_or(FitgenError::NotConfigured("speech"))?;
        let voice = voice
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_voice)
            .to_string();

        let candidates = self.speech_resolver.resolve(None, None).await;
        let text = text.to_string();
        FallbackInvoker::new(InvocationContext::Speech)
            .invoke_with(&candidates, |model| {
                let speech = speech.clone();
                let text = text.clone();
                let voice = voice.clone();
                async move { speech.synthesize(&model, &text, &voice).await }
            })
            .await
    }

    /// Find an illustrative image for an exercise or meal, using the cache.
    #[instrument(skip(self))]
    pub async fn image_for(&self, name: &str) -> Result<ImageLookup> {
        let key = cache::image_cache_key(name)
            .ok_or_else(|| FitgenError::InvalidInput("name must contain letters or digits".into()))?;

        if let Some(url) = self.image_cache.as_ref().and_then(|c| c.read(&key)) {
            debug!(%key, "image served from cache");
            return Ok(ImageLookup {
                url: Some(url),
                cached: true,
            });
        }

        let images = self
            .images
            .as_ref()
            .ok_or(FitgenError::NotConfigured("images"))?;
        let query = image_query(name.trim(), classify_subject(name, KeywordProfile::ImageLookup));
        let url = images.search(&query).await?;

        if let (Some(cache), Some(url)) = (&self.image_cache, &url) {
            cache.write(&key, url);
        }
        Ok(ImageLookup { url, cached: false })
    }

    /// Drop the cached image for `name`, if any.
    pub fn forget_image(&self, name: &str) -> Result<()> {
        let key = cache::image_cache_key(name)
            .ok_or_else(|| FitgenError::InvalidInput("name must contain letters or digits".into()))?;
        if let Some(cache) = &self.image_cache {
            cache.invalidate(&key);
        }
        Ok(())
    }
}

fn describe_prompt(name: &str, kind: SubjectKind) -> String {
    match kind {
        SubjectKind::Exercise => format!(
            "Explain how to perform the exercise \"{name}\". Cover the muscles it targets, \
             step-by-step form, common mistakes and an easier variation for beginners. \
             Keep it under 200 words."
        ),
        SubjectKind::Meal => format!(
            "Describe the meal \"{name}\" for someone following a fitness plan. List the main \
             ingredients, approximate calories and macronutrients, and a simple way to \
             prepare it. Keep it under 200 words."
        ),
    }
}

fn plan_prompt(p: &FitnessProfile) -> String {
    let mut facts = vec![
        format!("age {}", p.age),
        format!("height {} cm", p.height_cm),
        format!("weight {} kg", p.weight_kg),
        format!("goal: {}", p.goal.trim()),
    ];
    let optional = [
        ("gender", &p.gender),
        ("activity level", &p.activity_level),
        ("diet preference", &p.diet_preference),
        ("available equipment", &p.equipment),
        ("medical notes", &p.medical_notes),
    ];
    for (label, value) in optional {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            facts.push(format!("{label}: {v}"));
        }
    }

    format!(
        "Create a {days}-day fitness plan for a person with {facts}.\n\
         Respond with JSON only, no markdown, matching exactly this shape:\n\
         {{\"summary\": string, \
         \"workout\": [{{\"day\": string, \"focus\": string, \"exercises\": [{{\"name\": string, \"sets\": number, \"reps\": string, \"rest\": string}}]}}], \
         \"diet\": [{{\"day\": string, \"meals\": [{{\"name\": string, \"slot\": string, \"calories\": number, \"description\": string}}]}}], \
         \"tips\": [string]}}\n\
         Include exactly {days} entries in both \"workout\" and \"diet\".",
        days = p.plan_days(),
        facts = facts.join(", "),
    )
}

fn photo_prompt(note: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are a fitness coach. Look at this photo. If it shows a meal, estimate its \
         calories and macronutrients and suggest one healthier swap. If it shows a person, \
         comment on visible posture or form and suggest one exercise focus. Be concise and \
         encouraging; do not guess at medical conditions.",
    );
    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        prompt.push_str("\nThe user adds: ");
        prompt.push_str(note);
    }
    prompt
}

fn image_query(name: &str, kind: SubjectKind) -> String {
    match kind {
        SubjectKind::Exercise => format!("{name} exercise"),
        SubjectKind::Meal => format!("{name} food"),
    }
}

/// Builder for [`Assistant`].
pub struct AssistantBuilder {
    catalog: Option<Arc<dyn ModelCatalog>>,
    text: Option<Arc<dyn TextGenerator>>,
    vision: Option<Arc<dyn VisionAnalyzer>>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    images: Option<Arc<dyn ImageSearch>>,
    image_cache: Option<Arc<LocalResponseCache>>,
    text_resolver: ModelResolver,
    vision_resolver: ModelResolver,
    speech_resolver: ModelResolver,
    default_voice: String,
}

impl Default for AssistantBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssistantBuilder {
    pub fn new() -> Self {
        Self {
            catalog: None,
            text: None,
            vision: None,
            speech: None,
            images: None,
            image_cache: None,
            text_resolver: ModelResolver::gemini_text(),
            vision_resolver: ModelResolver::gemini_vision(),
            speech_resolver: ModelResolver::speech(),
            default_voice: DEFAULT_VOICE.to_string(),
        }
    }

    /// Live model list used to resolve text and vision candidates.
    pub fn catalog(mut self, catalog: Arc<dyn ModelCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn text(mut self, provider: Arc<dyn TextGenerator>) -> Self {
        self.text = Some(provider);
        self
    }

    pub fn vision(mut self, provider: Arc<dyn VisionAnalyzer>) -> Self {
        self.vision = Some(provider);
        self
    }

    pub fn speech(mut self, provider: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(provider);
        self
    }

    pub fn images(mut self, provider: Arc<dyn ImageSearch>) -> Self {
        self.images = Some(provider);
        self
    }

    pub fn image_cache(mut self, cache: Arc<LocalResponseCache>) -> Self {
        self.image_cache = Some(cache);
        self
    }

    pub fn text_resolver(mut self, resolver: ModelResolver) -> Self {
        self.text_resolver = resolver;
        self
    }

    pub fn vision_resolver(mut self, resolver: ModelResolver) -> Self {
        self.vision_resolver = resolver;
        self
    }

    pub fn speech_resolver(mut self, resolver: ModelResolver) -> Self {
        self.speech_resolver = resolver;
        self
    }

    /// Voice used when a speech request names none.
    pub fn default_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = voice.into();
        self
    }

    pub fn build(self) -> Assistant {
        Assistant {
            catalog: self.catalog,
            text: self.text,
            vision: self.vision,
            speech: self.speech,
            images: self.images,
            image_cache: self.image_cache,
            text_resolver: self.text_resolver,
            vision_resolver: self.vision_resolver,
            speech_resolver: self.speech_resolver,
            default_voice: self.default_voice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> FitnessProfile {
        serde_json::from_value(serde_json::json!({
            "age": 30, "height_cm": 175.0, "weight_kg": 70.0, "goal": "build muscle",
            "equipment": "dumbbells", "diet_preference": "  ", "days": 3
        }))
        .unwrap()
    }

    #[test]
    fn plan_prompt_lists_known_facts_only() {
        let prompt = plan_prompt(&profile());
        assert!(prompt.starts_with("Create a 3-day fitness plan"));
        assert!(prompt.contains("available equipment: dumbbells"));
        assert!(!prompt.contains("diet preference"));
        assert!(prompt.contains("exactly 3 entries"));
    }

    #[test]
    fn describe_prompt_follows_kind() {
        assert!(describe_prompt("squats", SubjectKind::Exercise).contains("exercise \"squats\""));
        assert!(describe_prompt("oatmeal", SubjectKind::Meal).contains("meal \"oatmeal\""));
    }

    #[test]
    fn photo_prompt_appends_note() {
        assert!(photo_prompt(Some(" week 4 ")).ends_with("The user adds: week 4"));
        assert!(!photo_prompt(Some("")).contains("The user adds"));
    }

    #[test]
    fn image_query_hints_kind() {
        assert_eq!(image_query("Plank", SubjectKind::Exercise), "Plank exercise");
        assert_eq!(image_query("Dal", SubjectKind::Meal), "Dal food");
    }
}
