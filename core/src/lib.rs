// Narration Core Library
// Article narration: synthesis, content-addressed caching and playback highlight sync

pub mod article;
pub mod cache;
pub mod client;
pub mod config;
pub mod normalize;
pub mod playback;
pub mod service;
pub mod synthesis;
pub mod telemetry;
pub mod types;

// Export core types
pub use cache::{BlobStore, CacheKey, NarrationCache};
pub use config::NarrationConfig;
pub use normalize::normalize_word;
pub use service::NarrationService;
pub use types::{CachedNarration, NarrationRequest, NarrationResponse, SlugParam, WordTimestamp};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("Synthesis failed{}: {detail}", status_suffix(.status))]
    SynthesisFailed { status: Option<u16>, detail: String },

    #[error("Storage error: {0}")]
    StorageFailed(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl NarrationError {
    pub(crate) fn synthesis(detail: impl Into<String>) -> Self {
        Self::SynthesisFailed {
            status: None,
            detail: detail.into(),
        }
    }

    /// HTTP status the API answers with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidSlug(_) => 400,
            Self::ArticleNotFound(_) => 404,
            _ => 500,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, NarrationError>;
