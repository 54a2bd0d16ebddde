//! Shared narration data types and their wire representation.

use serde::{Deserialize, Serialize};

/// A single spoken word with its position on the audio timeline.
///
/// `start <= end` always holds and `normalized` is never empty; sequences are
/// ordered by `start` (non-decreasing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    /// Original surface form as reported by the provider
    pub word: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Output of [`crate::normalize_word`] for `word`
    pub normalized: String,
}

/// A narration that is fully present in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedNarration {
    pub audio_url: String,
    pub timestamps: Vec<WordTimestamp>,
}

/// Slug as accepted on the wire: `"a/b"` or `["a", "b"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlugParam {
    Path(String),
    Segments(Vec<String>),
}

impl SlugParam {
    /// Raw segments before validation
    pub fn segments(&self) -> Vec<String> {
        match self {
            SlugParam::Path(path) => path.split('/').map(str::to_string).collect(),
            SlugParam::Segments(segments) => segments.clone(),
        }
    }
}

impl From<&str> for SlugParam {
    fn from(path: &str) -> Self {
        SlugParam::Path(path.to_string())
    }
}

/// Body of `POST /api/text-to-speech`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationRequest {
    #[serde(default)]
    pub slug: Option<SlugParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl NarrationRequest {
    pub fn for_slug(slug: impl Into<SlugParam>) -> Self {
        Self {
            slug: Some(slug.into()),
            voice_id: None,
            model_id: None,
        }
    }
}

/// Success body of `POST /api/text-to-speech`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationResponse {
    pub audio_url: String,
    pub timestamps: Vec<WordTimestamp>,
    pub hash: String,
}

/// Error body returned with every non-2xx status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
