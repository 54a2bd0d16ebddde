//! Speech synthesis provider seam and timestamp normalization.

mod alignment;
mod client;

pub use alignment::{estimate_uniform, normalize_alignment, parse_time_value};
pub use client::{ElevenLabsClient, ElevenLabsConfig, VoiceSettings};

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Raw provider output: audio plus an alignment payload of unknown shape.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub audio: Bytes,
    /// Fed to [`normalize_alignment`], which absorbs the shape variance
    pub raw_alignment: serde_json::Value,
}

/// External text-to-speech provider with timing information.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str, model_id: &str)
        -> Result<SynthesisOutput>;
}
