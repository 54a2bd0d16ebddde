//! Server-side narration acquisition.
//!
//! slug -> article -> speakable text -> cache key -> cache read; on a miss,
//! synthesize, normalize the alignment and write both objects back.

use crate::article::{extract_speakable_text, parse_slug, ArticleSource};
use crate::cache::{CacheKey, NarrationCache};
use crate::config::NarrationConfig;
use crate::synthesis::{normalize_alignment, SpeechSynthesizer};
use crate::types::{NarrationRequest, NarrationResponse};
use crate::{NarrationError, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct NarrationService {
    articles: Arc<dyn ArticleSource>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    cache: NarrationCache,
    default_voice_id: String,
    default_model_id: String,
}

impl NarrationService {
    pub fn new(
        articles: Arc<dyn ArticleSource>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        cache: NarrationCache,
        default_voice_id: impl Into<String>,
        default_model_id: impl Into<String>,
    ) -> Self {
        Self {
            articles,
            synthesizer,
            cache,
            default_voice_id: default_voice_id.into(),
            default_model_id: default_model_id.into(),
        }
    }

    /// Wire up the filesystem article source, the configured store and the
    /// ElevenLabs client.
    pub fn from_config(cfg: &NarrationConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(cfg.build_article_source()),
            Arc::new(cfg.build_synthesizer()?),
            cfg.build_cache()?,
            cfg.default_voice_id.clone(),
            cfg.default_model_id.clone(),
        ))
    }

    pub fn cache(&self) -> &NarrationCache {
        &self.cache
    }

    pub async fn narrate(&self, request: &NarrationRequest) -> Result<NarrationResponse> {
        let started = Instant::now();
        let slug = parse_slug(request.slug.as_ref())?;
        let slug_path = slug.join("/");

        let source = self.articles.load(&slug).await?;
        let text = extract_speakable_text(&source);
        if text.is_empty() {
            warn!(target: "narration", slug = %slug_path, "Article has no speakable text");
            return Err(NarrationError::synthesis("article has no speakable text"));
        }

        let voice_id = request
            .voice_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(self.default_voice_id.as_str());
        let model_id = request
            .model_id
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(self.default_model_id.as_str());

        let key = CacheKey::build(&slug, &text, voice_id, model_id);
        debug!(
            target: "narration",
            slug = %slug_path,
            hash = %key.hash,
            chars = text.len(),
            voice = %voice_id,
            model = %model_id,
            "Resolved narration key"
        );

        if let Some(cached) = self.cache.read(&key).await? {
            info!(
                target: "narration",
                slug = %slug_path,
                hash = %key.hash,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Serving cached narration"
            );
            return Ok(NarrationResponse {
                audio_url: cached.audio_url,
                timestamps: cached.timestamps,
                hash: key.hash,
            });
        }

        let output = self.synthesizer.synthesize(&text, voice_id, model_id).await?;
        let timestamps = normalize_alignment(&output.raw_alignment);
        if timestamps.is_empty() {
            warn!(target: "narration", slug = %slug_path, "Provider alignment yielded no words");
        }

        let audio_url = self.cache.write(&key, output.audio, &timestamps).await?;
        info!(
            target: "narration",
            slug = %slug_path,
            hash = %key.hash,
            words = timestamps.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Synthesized narration"
        );

        Ok(NarrationResponse {
            audio_url,
            timestamps,
            hash: key.hash,
        })
    }
}
