//! Assistant orchestration with in-process fake providers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fitgen::cache::{DEFAULT_TTL, IMAGE_CACHE_VERSION, LocalResponseCache, MemoryStore};
use fitgen::providers::traits::{
    ImageSearch, ModelCatalog, SpeechSynthesizer, TextGenerator, VisionAnalyzer,
};
use fitgen::resolver::GENERATE_CONTENT;
use fitgen::service::{Assistant, ImageLookup};
use fitgen::types::{AudioClip, FitnessProfile, ImageInput, ModelDescriptor};
use fitgen::{ErrorKind, FitgenError, Result};

// ============================================================================
// Fakes
// ============================================================================

/// Text provider replaying scripted results and recording (model, prompt).
#[derive(Default)]
struct ScriptedText {
    script: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedText {
    fn new(script: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::default(),
        })
    }

    fn models(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    fn last_prompt(&self) -> String {
        self.calls.lock().unwrap().last().unwrap().1.clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FitgenError::Http("script exhausted".into())))
    }
}

#[async_trait]
impl VisionAnalyzer for ScriptedText {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn analyze_image(&self, model: &str, prompt: &str, _image: &ImageInput) -> Result<String> {
        self.generate_text(model, prompt).await
    }
}

struct FixedCatalog(Vec<&'static str>);

#[async_trait]
impl ModelCatalog for FixedCatalog {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        Ok(self
            .0
            .iter()
            .map(|id| ModelDescriptor::new(*id).with_operation(GENERATE_CONTENT))
            .collect())
    }
}

#[derive(Default)]
struct CountingSearch {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageSearch for CountingSearch {
    fn name(&self) -> &str {
        "counting"
    }

    async fn search(&self, query: &str) -> Result<Option<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(Some(format!("https://img.example/{}", query.replace(' ', "_"))))
    }
}

#[derive(Default)]
struct FakeSpeech {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    fn name(&self) -> &str {
        "fake-speech"
    }

    async fn synthesize(&self, model: &str, _text: &str, voice: &str) -> Result<AudioClip> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), voice.to_string()));
        if model == "gpt-4o-mini-tts" {
            return Err(FitgenError::ModelNotFound(model.to_string()));
        }
        Ok(AudioClip {
            data: vec![1, 2, 3],
            content_type: "audio/mpeg".into(),
            model: model.to_string(),
        })
    }
}

fn profile() -> FitnessProfile {
    serde_json::from_value(serde_json::json!({
        "age": 28, "height_cm": 165.0, "weight_kg": 60.0, "goal": "run a 10k", "days": 2
    }))
    .unwrap()
}

fn image_cache() -> Arc<LocalResponseCache> {
    Arc::new(LocalResponseCache::new(
        Arc::new(MemoryStore::new()),
        IMAGE_CACHE_VERSION,
        DEFAULT_TTL,
    ))
}

// ============================================================================
// describe
// ============================================================================

#[tokio::test]
async fn describe_walks_discovered_candidates() {
    let text = ScriptedText::new(vec![
        Err(FitgenError::from_status(503, "busy", None)),
        Ok("Keep your back straight.".into()),
    ]);
    let assistant = Assistant::builder()
        .catalog(Arc::new(FixedCatalog(vec!["gemini-1.5-pro", "gemini-1.5-flash"])))
        .text(text.clone())
        .build();

    let out = assistant.describe("Deadlift").await.unwrap();

    assert_eq!(out, "Keep your back straight.");
    assert_eq!(text.models(), ["gemini-1.5-flash", "gemini-1.5-pro"]);
    assert!(text.last_prompt().contains("exercise \"Deadlift\""));
}

#[tokio::test]
async fn describe_uses_meal_prompt_for_meals() {
    let text = ScriptedText::new(vec![Ok("Rich in fibre.".into())]);
    let assistant = Assistant::builder().text(text.clone()).build();

    assistant.describe("Overnight oats").await.unwrap();

    assert!(text.last_prompt().contains("meal \"Overnight oats\""));
    // No catalog: static list is used.
    assert_eq!(text.models(), ["gemini-1.5-flash"]);
}

#[tokio::test]
async fn describe_rejects_blank_names() {
    let assistant = Assistant::builder()
        .text(ScriptedText::new(vec![]))
        .build();
    let err = assistant.describe("   ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn missing_provider_is_not_configured() {
    let assistant = Assistant::builder().build();
    assert!(matches!(
        assistant.describe("plank").await,
        Err(FitgenError::NotConfigured("text"))
    ));
}

// ============================================================================
// generate_plan
// ============================================================================

#[tokio::test]
async fn plan_output_is_repaired_once() {
    let raw = r#"Here is your plan:
```json
{
  summary: "Two easy days",
  workout: [
    {day: "Day 1", focus: "Legs", exercises: [{name: "Squats", sets: 3, reps: 12, rest: "60s"},]},
    {day: "Day 2", exercises: [{name: "Easy run", reps: "20 min"}]},
  ],
  diet: [{day: "Day 1", meals: [{name: "Oatmeal with berries", slot: "breakfast", calories: 350}]}],
  tips: ["Sleep 8 hours",],
}
```"#;
    let text = ScriptedText::new(vec![Ok(raw.to_string())]);
    let assistant = Assistant::builder().text(text.clone()).build();

    let plan = assistant.generate_plan(&profile()).await.unwrap();

    assert_eq!(plan.workout.len(), 2);
    assert_eq!(plan.workout[0].exercises[0].reps.as_deref(), Some("12"));
    assert_eq!(plan.diet[0].meals[0].calories, Some(350));
    assert_eq!(plan.tips, ["Sleep 8 hours"]);
    assert!(text.last_prompt().contains("2-day fitness plan"));
}

#[tokio::test]
async fn unparseable_plan_is_malformed_response() {
    let text = ScriptedText::new(vec![Ok("Sorry, I can't do that.".into())]);
    let assistant = Assistant::builder().text(text).build();

    let err = assistant.generate_plan(&profile()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedUpstreamResponse);
    assert_eq!(err.kind().status_code(), 500);
}

#[tokio::test]
async fn invalid_profile_never_reaches_the_model() {
    let text = ScriptedText::new(vec![]);
    let assistant = Assistant::builder().text(text.clone()).build();
    let mut bad = profile();
    bad.weight_kg = 0.0;

    let err = assistant.generate_plan(&bad).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(text.models().is_empty());
}

// ============================================================================
// analyze_photo
// ============================================================================

#[tokio::test]
async fn analyze_photo_uses_vision_candidates() {
    let vision = ScriptedText::new(vec![
        Err(FitgenError::from_status(404, "gone", None)),
        Ok("Looks balanced.".into()),
    ]);
    let assistant = Assistant::builder().vision(vision.clone()).build();
    let image = ImageInput::new("image/jpeg", vec![0xFF, 0xD8]);

    let out = assistant
        .analyze_photo(&image, Some("post-workout lunch"))
        .await
        .unwrap();

    assert_eq!(out, "Looks balanced.");
    assert_eq!(vision.models(), ["gemini-1.5-flash", "gemini-1.5-pro"]);
    assert!(vision.last_prompt().ends_with("post-workout lunch"));
}

// ============================================================================
// synthesize
// ============================================================================

#[tokio::test]
async fn synthesize_falls_back_past_missing_model() {
    let speech = Arc::new(FakeSpeech::default());
    let assistant = Assistant::builder()
        .speech(speech.clone())
        .default_voice("echo")
        .build();

    let clip = assistant.synthesize("Breathe out on the way up.", None).await.unwrap();

    assert_eq!(clip.model, "tts-1");
    let calls = speech.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        [
            ("gpt-4o-mini-tts".to_string(), "echo".to_string()),
            ("tts-1".to_string(), "echo".to_string()),
        ]
    );
}

#[tokio::test]
async fn synthesize_rejects_empty_text() {
    let assistant = Assistant::builder()
        .speech(Arc::new(FakeSpeech::default()))
        .build();
    let err = assistant.synthesize("  ", Some("nova")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// ============================================================================
// image_for / forget_image
// ============================================================================

#[tokio::test]
async fn image_lookup_is_cached() {
    let search = Arc::new(CountingSearch::default());
    let assistant = Assistant::builder()
        .images(search.clone())
        .image_cache(image_cache())
        .build();

    let first = assistant.image_for("Push-ups").await.unwrap();
    let second = assistant.image_for("push-ups").await.unwrap();

    assert_eq!(
        first,
        ImageLookup {
            url: Some("https://img.example/Push-ups_exercise".into()),
            cached: false,
        }
    );
    assert_eq!(second.url, first.url);
    assert!(second.cached);
    assert_eq!(search.queries.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn image_query_reflects_meal_classification() {
    let search = Arc::new(CountingSearch::default());
    let assistant = Assistant::builder().images(search.clone()).build();

    assistant.image_for("Paneer tikka").await.unwrap();

    assert_eq!(search.queries.lock().unwrap().as_slice(), ["Paneer tikka food"]);
}

#[tokio::test]
async fn forget_image_forces_a_fresh_lookup() {
    let search = Arc::new(CountingSearch::default());
    let assistant = Assistant::builder()
        .images(search.clone())
        .image_cache(image_cache())
        .build();

    assistant.image_for("Plank").await.unwrap();
    assistant.forget_image("Plank").unwrap();
    let again = assistant.image_for("Plank").await.unwrap();

    assert!(!again.cached);
    assert_eq!(search.queries.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn image_lookup_rejects_symbol_only_names() {
    let assistant = Assistant::builder()
        .images(Arc::new(CountingSearch::default()))
        .build();
    let err = assistant.image_for("!!!").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
