//! Wiremock integration tests for SpeechClient.

use std::time::Duration;

use fitgen::providers::SpeechClient;
use fitgen::providers::traits::SpeechSynthesizer;
use fitgen::{ErrorKind, FitgenError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> SpeechClient {
    SpeechClient::with_base_url("sk-test", server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn synthesize_returns_audio_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "model": "tts-1",
            "input": "Three sets of ten.",
            "voice": "nova",
            "response_format": "mp3"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(vec![0xFF, 0xFB, 0x90, 0x00]),
        )
        .mount(&server)
        .await;

    let clip = client(&server)
        .synthesize("tts-1", "Three sets of ten.", "nova")
        .await
        .unwrap();
    assert_eq!(clip.data, [0xFF, 0xFB, 0x90, 0x00]);
    assert_eq!(clip.content_type, "audio/mpeg");
    assert_eq!(clip.model, "tts-1");
}

#[tokio::test]
async fn unknown_model_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "The model `gpt-4o-mini-tts` does not exist"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .synthesize("gpt-4o-mini-tts", "hi", "alloy")
        .await
        .unwrap_err();
    assert!(matches!(err, FitgenError::ModelNotFound(_)));
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn empty_audio_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = client(&server).synthesize("tts-1", "hi", "alloy").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedUpstreamResponse);
}

#[test]
fn blank_key_is_not_configured() {
    assert!(matches!(
        SpeechClient::new(""),
        Err(FitgenError::NotConfigured("speech"))
    ));
}
