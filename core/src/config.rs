//! Environment-driven configuration for the narration pipeline.

use crate::article::FsArticleSource;
use crate::cache::{BlobStore, FsBlobStore, HttpBlobStore, InMemoryBlobStore, NarrationCache};
use crate::synthesis::{ElevenLabsClient, ElevenLabsConfig};
use crate::{NarrationError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

/// Where narration objects are stored
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    Memory {
        public_base_url: String,
    },
    Fs {
        root: PathBuf,
        public_base_url: String,
    },
    Http {
        public_base_url: String,
        upload_base_url: String,
        token: Option<String>,
    },
}

impl StorageConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageConfig::Memory { .. } => "memory",
            StorageConfig::Fs { .. } => "fs",
            StorageConfig::Http { .. } => "http",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NarrationConfig {
    pub elevenlabs: ElevenLabsConfig,
    pub default_voice_id: String,
    pub default_model_id: String,
    pub content_dir: PathBuf,
    pub storage: StorageConfig,
    pub storage_timeout_ms: u64,
    pub host: String,
    pub port: u16,
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| NarrationError::Config(format!("{name} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}

impl NarrationConfig {
    /// Build from environment variables. The provider API key is required.
    pub fn from_env() -> Result<Self> {
        let api_key = env_string("ELEVENLABS_API_KEY").ok_or_else(|| {
            NarrationError::Config("ELEVENLABS_API_KEY is not set".to_string())
        })?;

        let mut elevenlabs = ElevenLabsConfig::new(api_key);
        if let Some(base_url) = env_string("ELEVENLABS_BASE_URL") {
            elevenlabs.base_url = base_url;
        }
        elevenlabs.timeout_ms = env_parse("NARRATION_SYNTHESIS_TIMEOUT_MS", 60_000)?;

        let host = env_string("NARRATION_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = env_parse("NARRATION_PORT", 3000u16)?;
        let public_base_url = env_string("NARRATION_PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));

        let storage = match env_string("NARRATION_STORAGE").as_deref().unwrap_or("fs") {
            "fs" => StorageConfig::Fs {
                root: env_string("NARRATION_STORAGE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("public")),
                public_base_url,
            },
            "memory" => StorageConfig::Memory { public_base_url },
            "http" => StorageConfig::Http {
                upload_base_url: env_string("NARRATION_STORAGE_URL").ok_or_else(|| {
                    NarrationError::Config(
                        "NARRATION_STORAGE_URL is required for http storage".to_string(),
                    )
                })?,
                token: env_string("NARRATION_STORAGE_TOKEN"),
                public_base_url,
            },
            other => {
                return Err(NarrationError::Config(format!(
                    "unknown NARRATION_STORAGE backend: {other}"
                )))
            }
        };

        Ok(Self {
            elevenlabs,
            default_voice_id: env_string("ELEVENLABS_VOICE_ID")
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            default_model_id: env_string("ELEVENLABS_MODEL_ID")
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            content_dir: env_string("NARRATION_CONTENT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("content")),
            storage,
            storage_timeout_ms: env_parse("NARRATION_STORAGE_TIMEOUT_MS", 15_000)?,
            host,
            port,
        })
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Local directory served under the public base URL, if objects live on disk
    pub fn served_dir(&self) -> Option<&PathBuf> {
        match &self.storage {
            StorageConfig::Fs { root, .. } => Some(root),
            _ => None,
        }
    }

    pub fn build_store(&self) -> Result<Arc<dyn BlobStore>> {
        let store: Arc<dyn BlobStore> = match &self.storage {
            StorageConfig::Memory { public_base_url } => {
                InMemoryBlobStore::with_base_url(public_base_url.clone())
            }
            StorageConfig::Fs {
                root,
                public_base_url,
            } => Arc::new(FsBlobStore::new(root.clone(), public_base_url.clone())),
            StorageConfig::Http {
                public_base_url,
                upload_base_url,
                token,
            } => {
                let http = reqwest::Client::builder()
                    .timeout(self.storage_timeout())
                    .build()
                    .map_err(|e| {
                        NarrationError::Config(format!("Failed to build HTTP client: {e}"))
                    })?;
                Arc::new(HttpBlobStore::new(
                    http,
                    public_base_url.clone(),
                    upload_base_url.clone(),
                    token.clone(),
                ))
            }
        };
        Ok(store)
    }

    pub fn build_cache(&self) -> Result<NarrationCache> {
        Ok(NarrationCache::new(self.build_store()?, self.storage_timeout()))
    }

    pub fn build_synthesizer(&self) -> Result<ElevenLabsClient> {
        ElevenLabsClient::new(self.elevenlabs.clone())
    }

    pub fn build_article_source(&self) -> FsArticleSource {
        FsArticleSource::new(self.content_dir.clone())
    }
}
