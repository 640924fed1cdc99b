//! HTTP API tests driven through the router with `tower::ServiceExt::oneshot`.
#![cfg(feature = "server")]

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use fitgen::cache::{DEFAULT_TTL, LocalResponseCache, MemoryStore};
use fitgen::server::config::ApiKeySecret;
use fitgen::server::{self, AppState, Config, Secrets};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn key(k: &str) -> Option<ApiKeySecret> {
    Some(ApiKeySecret {
        api_key: k.to_string(),
    })
}

fn state_for(upstream: &MockServer) -> AppState {
    let mut config = Config::default();
    config.providers.timeout_secs = 5;
    config.providers.gemini.base_url = upstream.uri();
    config.providers.speech.base_url = upstream.uri();
    config.providers.images.base_url = upstream.uri();

    let secrets = Secrets {
        gemini: key("g"),
        openai: key("o"),
        pexels: key("p"),
    };
    let cache = Arc::new(LocalResponseCache::new(
        Arc::new(MemoryStore::new()),
        "v2",
        DEFAULT_TTL,
    ));
    AppState::with_image_cache(config, secrets, Some(cache)).unwrap()
}

async fn send(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    server::router(state.clone())
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_catalog(upstream: &MockServer, ids: &[&str]) {
    let models: Vec<Value> = ids
        .iter()
        .map(|id| json!({"name": format!("models/{id}"), "supportedGenerationMethods": ["generateContent"]}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": models})))
        .mount(upstream)
        .await;
}

fn gemini_text(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    }))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn health_reports_version() {
    let upstream = MockServer::start().await;
    let response = send(&state_for(&upstream), Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().unwrap().starts_with(fitgen::PKG_VERSION));
}

#[tokio::test]
async fn describe_falls_back_past_overloaded_model() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream, &["gemini-1.5-flash", "gemini-1.5-pro"]).await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"message": "overloaded"}
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .respond_with(gemini_text("Lower slowly."))
        .expect(1)
        .mount(&upstream)
        .await;

    let response = send(
        &state_for(&upstream),
        Method::POST,
        "/api/describe",
        Some(json!({"name": "push-ups"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"content": "Lower slowly."}));
}

#[tokio::test]
async fn describe_unauthorized_stops_after_one_attempt() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream, &["gemini-1.5-flash", "gemini-1.5-pro"]).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.*:generateContent$"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&upstream)
        .await;

    let response = send(
        &state_for(&upstream),
        Method::POST,
        "/api/describe",
        Some(json!({"name": "plank"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
    assert!(body.get("retry_after_secs").is_none());
}

#[tokio::test]
async fn exhausted_overload_is_503_with_all_models_named() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream, &["gemini-1.5-flash", "gemini-1.5-pro"]).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.*:generateContent$"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&upstream)
        .await;

    let response = send(
        &state_for(&upstream),
        Method::POST,
        "/api/describe",
        Some(json!({"name": "squat"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let details = json_body(response).await["details"].as_str().unwrap().to_string();
    assert!(details.contains("gemini-1.5-flash") && details.contains("gemini-1.5-pro"));
    assert!(details.contains("overloaded"));
}

#[tokio::test]
async fn malformed_json_body_is_400() {
    let upstream = MockServer::start().await;
    let state = state_for(&upstream);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/describe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = server::router(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["details"].is_string());
}

#[tokio::test]
async fn invalid_profile_is_400() {
    let upstream = MockServer::start().await;
    let response = send(
        &state_for(&upstream),
        Method::POST,
        "/api/plan",
        Some(json!({"age": 0, "height_cm": 170, "weight_kg": 70, "goal": "fit"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn plan_returns_plan_and_subjects() {
    let upstream = MockServer::start().await;
    mount_catalog(&upstream, &["gemini-1.5-flash"]).await;
    let plan = json!({
        "summary": "One day",
        "workout": [{"day": "Mon", "exercises": [{"name": "Lunges", "sets": 3, "reps": "10"}]}],
        "diet": [{"day": "Mon", "meals": [{"name": "Chicken salad", "slot": "lunch"}]}],
        "tips": []
    });
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(gemini_text(&format!("```json\n{plan}\n```")))
        .mount(&upstream)
        .await;

    let response = send(
        &state_for(&upstream),
        Method::POST,
        "/api/plan",
        Some(json!({"age": 40, "height_cm": 170, "weight_kg": 80, "goal": "lose fat", "days": 1})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["plan"]["workout"][0]["exercises"][0]["name"], "Lunges");
    assert_eq!(
        body["subjects"],
        json!([
            {"name": "Lunges", "kind": "exercise"},
            {"name": "Chicken salad", "kind": "meal"}
        ])
    );
}

#[tokio::test]
async fn image_lookup_then_cache_hit_then_forget() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "photos": [{"src": {"medium": "https://img/plank.jpg"}}]
        })))
        .expect(2)
        .mount(&upstream)
        .await;
    let state = state_for(&upstream);

    let first = json_body(send(&state, Method::POST, "/api/image", Some(json!({"name": "Plank"}))).await).await;
    assert_eq!(first, json!({"url": "https://img/plank.jpg", "cached": false}));

    let second = json_body(send(&state, Method::POST, "/api/image", Some(json!({"name": "plank"}))).await).await;
    assert_eq!(second["cached"], true);

    let deleted = send(&state, Method::DELETE, "/api/image/Plank", None).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let third = json_body(send(&state, Method::POST, "/api/image", Some(json!({"name": "Plank"}))).await).await;
    assert_eq!(third["cached"], false);
}

#[tokio::test]
async fn undecodable_image_name_is_json_400() {
    let upstream = MockServer::start().await;
    let response = send(&state_for(&upstream), Method::DELETE, "/api/image/%FF%FE", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid input");
    assert!(body["details"].as_str().unwrap().contains("UTF-8"));
}

#[tokio::test]
async fn speech_returns_audio() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(b"ID3audio".to_vec()),
        )
        .mount(&upstream)
        .await;

    let response = send(
        &state_for(&upstream),
        Method::POST,
        "/api/speech",
        Some(json!({"text": "Hold for thirty seconds."})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(response.headers()["x-fitgen-model"], "gpt-4o-mini-tts");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ID3audio");
}

#[tokio::test]
async fn analyze_photo_rejects_bad_base64() {
    let upstream = MockServer::start().await;
    let response = send(
        &state_for(&upstream),
        Method::POST,
        "/api/analyze-photo",
        Some(json!({"image_base64": "***", "mime_type": "image/png"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_key_reports_not_configured() {
    let upstream = MockServer::start().await;
    let mut config = Config::default();
    config.providers.images.base_url = upstream.uri();
    let state = AppState::with_image_cache(config, Secrets::default(), None).unwrap();

    // Only meaningful when the environment provides no Pexels key.
    if std::env::var("PEXELS_API_KEY").is_ok() {
        return;
    }
    let response = send(&state, Method::POST, "/api/image", Some(json!({"name": "plank"}))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["details"].as_str().unwrap().contains("images"));
}
