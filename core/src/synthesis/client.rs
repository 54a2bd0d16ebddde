use super::{SpeechSynthesizer, SynthesisOutput};
use crate::{NarrationError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed voice settings sent with every request
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
        }
    }
}

/// Configuration for the ElevenLabs timestamped synthesis endpoint
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub voice_settings: VoiceSettings,
}

impl ElevenLabsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: api_key.into(),
            timeout_ms: 60_000,
            voice_settings: VoiceSettings::default(),
        }
    }
}

/// Client for `POST /v1/text-to-speech/{voice}/with-timestamps`
#[derive(Clone)]
pub struct ElevenLabsClient {
    http: reqwest::Client,
    cfg: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(cfg: ElevenLabsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| NarrationError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    fn endpoint(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}/with-timestamps",
            self.cfg.base_url.trim_end_matches('/'),
            voice_id
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        model_id: &str,
    ) -> Result<SynthesisOutput> {
        let url = self.endpoint(voice_id);
        debug!(
            target: "synthesis",
            voice = %voice_id,
            model = %model_id,
            chars = text.len(),
            "POST {}", url
        );

        let body = json!({
            "text": text,
            "model_id": model_id,
            "voice_settings": self.cfg.voice_settings,
        });

        let resp = self
            .http
            .post(&url)
            .header("xi-api-key", &self.cfg.api_key)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "synthesis", error = %e, "Synthesis request failed");
                NarrationError::synthesis(format!("request failed: {e}"))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            warn!(target: "synthesis", status = %status, "Provider returned error");
            return Err(NarrationError::SynthesisFailed {
                status: Some(status.as_u16()),
                detail,
            });
        }

        let payload: Value = resp.json().await.map_err(|e| {
            warn!(target: "synthesis", error = %e, "Failed to parse provider response");
            NarrationError::synthesis(format!("invalid response body: {e}"))
        })?;

        parse_provider_payload(payload)
    }
}

/// Split a provider response into audio bytes and the raw alignment object.
fn parse_provider_payload(mut payload: Value) -> Result<SynthesisOutput> {
    let audio = payload
        .get("audio_base64")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .and_then(|encoded| general_purpose::STANDARD.decode(encoded).ok())
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| NarrationError::synthesis("no audio"))?;

    let raw_alignment = ["alignment", "normalized_alignment"]
        .iter()
        .filter_map(|field| payload.get_mut(*field).map(Value::take))
        .find(|value| !value.is_null())
        .unwrap_or(Value::Null);

    Ok(SynthesisOutput {
        audio: Bytes::from(audio),
        raw_alignment,
    })
}
