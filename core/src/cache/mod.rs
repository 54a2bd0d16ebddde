//! Read-through narration cache.
//!
//! One narration is two objects under the same content-addressed base path:
//! `<base>.mp3` (audio) and `<base>.json` (canonical word timestamps). An
//! entry only counts as a hit when both exist.

mod key;
mod store;

pub use key::{CacheKey, HASH_LEN};
pub use store::{BlobStore, FsBlobStore, HttpBlobStore, InMemoryBlobStore};

use crate::types::{CachedNarration, WordTimestamp};
use crate::{NarrationError, Result};
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";
pub const TIMESTAMPS_CONTENT_TYPE: &str = "application/json";

#[derive(Clone)]
pub struct NarrationCache {
    store: Arc<dyn BlobStore>,
    timeout: Duration,
}

impl NarrationCache {
    pub fn new(store: Arc<dyn BlobStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Look up a complete narration. Partial entries are misses.
    pub async fn read(&self, key: &CacheKey) -> Result<Option<CachedNarration>> {
        let audio_path = key.audio_path();
        let timestamps_path = key.timestamps_path();

        let (audio_url, timestamps_raw) = tokio::try_join!(
            self.bounded(self.store.locate(&audio_path)),
            self.bounded(self.store.get(&timestamps_path)),
        )?;

        let (audio_url, timestamps_raw) = match (audio_url, timestamps_raw) {
            (Some(url), Some(raw)) => (url, raw),
            (audio, timestamps) => {
                if audio.is_some() != timestamps.is_some() {
                    warn!(
                        target: "cache",
                        base = %key.base,
                        audio = audio.is_some(),
                        timestamps = timestamps.is_some(),
                        "Partial cache entry, treating as miss"
                    );
                }
                return Ok(None);
            }
        };

        match serde_json::from_slice::<Vec<WordTimestamp>>(&timestamps_raw) {
            Ok(timestamps) => {
                debug!(target: "cache", base = %key.base, words = timestamps.len(), "Cache hit");
                Ok(Some(CachedNarration {
                    audio_url,
                    timestamps,
                }))
            }
            Err(e) => {
                warn!(target: "cache", base = %key.base, error = %e, "Unreadable timestamps, treating as miss");
                Ok(None)
            }
        }
    }

    /// Upload audio and timestamps concurrently; returns the audio URL.
    pub async fn write(
        &self,
        key: &CacheKey,
        audio: Bytes,
        timestamps: &[WordTimestamp],
    ) -> Result<String> {
        let json = Bytes::from(serde_json::to_vec(timestamps)?);
        let audio_path = key.audio_path();
        let timestamps_path = key.timestamps_path();
        let audio_len = audio.len();

        let (audio_url, _) = tokio::try_join!(
            self.bounded(self.store.put(&audio_path, audio, AUDIO_CONTENT_TYPE)),
            self.bounded(self.store.put(&timestamps_path, json, TIMESTAMPS_CONTENT_TYPE)),
        )?;

        info!(
            target: "cache",
            base = %key.base,
            audio_bytes = audio_len,
            words = timestamps.len(),
            "Cached narration"
        );
        Ok(audio_url)
    }

    async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(NarrationError::StorageFailed(format!(
                "storage operation timed out after {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
