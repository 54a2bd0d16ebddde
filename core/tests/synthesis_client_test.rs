/// ElevenLabs client tests against a local mock provider
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose, Engine};
use narration_core::synthesis::{
    normalize_alignment, ElevenLabsClient, ElevenLabsConfig, SpeechSynthesizer,
};
use narration_core::NarrationError;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct MockProvider {
    status: StatusCode,
    response: Value,
    delay: Duration,
    seen: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

impl MockProvider {
    fn new(status: StatusCode, response: Value) -> Self {
        Self {
            status,
            response,
            delay: Duration::ZERO,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

async fn synthesize(
    State(mock): State<MockProvider>,
    Path(voice): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let key = headers
        .get("xi-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.seen.lock().unwrap().push((voice, key, body));
    if !mock.delay.is_zero() {
        tokio::time::sleep(mock.delay).await;
    }
    (mock.status, Json(mock.response.clone()))
}

async fn spawn_provider(mock: MockProvider) -> (String, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/v1/text-to-speech/:voice/with-timestamps", post(synthesize))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), handle)
}

fn client(base_url: &str, timeout_ms: u64) -> ElevenLabsClient {
    let mut cfg = ElevenLabsConfig::new("test-key");
    cfg.base_url = base_url.to_string();
    cfg.timeout_ms = timeout_ms;
    ElevenLabsClient::new(cfg).unwrap()
}

#[tokio::test]
async fn test_successful_synthesis() {
    let mock = MockProvider::new(
        StatusCode::OK,
        json!({
            "audio_base64": general_purpose::STANDARD.encode(b"ID3fakeaudio"),
            "alignment": {
                "characters": ["H", "i"],
                "character_start_times_seconds": [0.0, 0.1],
                "character_end_times_seconds": [0.1, 0.2],
            },
        }),
    );
    let seen = mock.seen.clone();
    let (base, handle) = spawn_provider(mock).await;

    let out = client(&base, 5_000)
        .synthesize("Hi", "voice-1", "model-1")
        .await
        .unwrap();
    assert_eq!(&out.audio[..], b"ID3fakeaudio");

    let words = normalize_alignment(&out.raw_alignment);
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].normalized, "hi");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (voice, key, body) = &seen[0];
    assert_eq!(voice, "voice-1");
    assert_eq!(key.as_deref(), Some("test-key"));
    assert_eq!(body["text"], "Hi");
    assert_eq!(body["model_id"], "model-1");
    assert_eq!(body["voice_settings"]["stability"], 0.5);
    assert_eq!(body["voice_settings"]["similarity_boost"], 0.75);

    handle.abort();
}

#[tokio::test]
async fn test_provider_error_carries_status_and_body() {
    let mock = MockProvider::new(
        StatusCode::UNAUTHORIZED,
        json!({ "detail": { "status": "invalid_api_key" } }),
    );
    let (base, handle) = spawn_provider(mock).await;

    match client(&base, 5_000).synthesize("Hi", "v", "m").await {
        Err(NarrationError::SynthesisFailed { status, detail }) => {
            assert_eq!(status, Some(401));
            assert!(detail.contains("invalid_api_key"));
        }
        other => panic!("expected SynthesisFailed, got {:?}", other.map(|_| ())),
    }

    handle.abort();
}

#[tokio::test]
async fn test_missing_audio_is_synthesis_failure() {
    let mock = MockProvider::new(StatusCode::OK, json!({ "alignment": {} }));
    let (base, handle) = spawn_provider(mock).await;

    match client(&base, 5_000).synthesize("Hi", "v", "m").await {
        Err(NarrationError::SynthesisFailed { status: None, detail }) => {
            assert_eq!(detail, "no audio");
        }
        other => panic!("expected SynthesisFailed, got {:?}", other.map(|_| ())),
    }

    handle.abort();
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let mut mock = MockProvider::new(StatusCode::OK, json!({}));
    mock.delay = Duration::from_secs(5);
    let (base, handle) = spawn_provider(mock).await;

    match client(&base, 100).synthesize("Hi", "v", "m").await {
        Err(NarrationError::SynthesisFailed { status, .. }) => assert!(status.is_none()),
        other => panic!("expected SynthesisFailed, got {:?}", other.map(|_| ())),
    }

    handle.abort();
}
