use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest
pub const HASH_LEN: usize = 16;

/// Content-addressed location of one narration in the blob store.
///
/// A pure function of `(slug, text, voice, model)`: edited content hashes to a
/// new key, so entries never need invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// `tts/<slug segments joined by "__">/<hash>`
    pub base: String,
    pub hash: String,
}

impl CacheKey {
    /// Slug segments must already be validated.
    pub fn build(slug_segments: &[String], text: &str, voice_id: &str, model_id: &str) -> Self {
        let hash = content_hash(text, voice_id, model_id);
        let base = format!("tts/{}/{}", slug_segments.join("__"), hash);
        Self { base, hash }
    }

    pub fn audio_path(&self) -> String {
        format!("{}.mp3", self.base)
    }

    pub fn timestamps_path(&self) -> String {
        format!("{}.json", self.base)
    }
}

fn content_hash(text: &str, voice_id: &str, model_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(b"::");
    hasher.update(voice_id.as_bytes());
    hasher.update(b"::");
    hasher.update(model_id.as_bytes());
    let digest = hasher.finalize();

    digest
        .iter()
        .take(HASH_LEN / 2)
        .map(|b| format!("{:02x}", b))
        .collect()
}
