//! Word/block highlighting and autoscroll.

use super::dom::{ElementRef, RenderedArticle};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

pub const WORD_ACTIVE_CLASS: &str = "tts-word-active";
pub const BLOCK_ACTIVE_CLASS: &str = "tts-block-active";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightConfig {
    /// Autoscroll stays off this long after the last user scroll
    pub scroll_debounce: Duration,
    /// Central viewport band, as fractions of its height, where no scroll is needed
    pub band_low: f64,
    pub band_high: f64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            scroll_debounce: Duration::from_millis(1200),
            band_low: 0.25,
            band_high: 0.75,
        }
    }
}

/// Owns the currently highlighted span and block.
#[derive(Debug, Default)]
pub struct HighlightController {
    config: HighlightConfig,
    active_span: Option<ElementRef>,
    active_block: Option<ElementRef>,
    last_user_scroll: Option<Instant>,
}

impl HighlightController {
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn active_span(&self) -> Option<ElementRef> {
        self.active_span
    }

    pub fn active_block(&self) -> Option<ElementRef> {
        self.active_block
    }

    /// Record wheel/touch input from the reader
    pub fn note_user_scroll(&mut self, at: Instant) {
        self.last_user_scroll = Some(at);
    }

    pub fn is_user_scrolling(&self, now: Instant) -> bool {
        self.last_user_scroll
            .map(|at| now.saturating_duration_since(at) < self.config.scroll_debounce)
            .unwrap_or(false)
    }

    /// Move the highlight to `span` (or clear it), scrolling if needed.
    pub fn apply<A: RenderedArticle + ?Sized>(
        &mut self,
        article: &mut A,
        span: Option<ElementRef>,
        now: Instant,
    ) {
        self.clear(article);
        let Some(span) = span else {
            return;
        };

        article.add_class(span, WORD_ACTIVE_CLASS);
        self.active_span = Some(span);
        if let Some(block) = article.block_ancestor(span) {
            article.add_class(block, BLOCK_ACTIVE_CLASS);
            self.active_block = Some(block);
        }

        if article.prefers_reduced_motion() || self.is_user_scrolling(now) {
            return;
        }
        if !article.in_viewport_band(span, self.config.band_low, self.config.band_high) {
            trace!(target: "playback", span, "Autoscrolling to active word");
            article.scroll_into_view(span);
        }
    }

    pub fn clear<A: RenderedArticle + ?Sized>(&mut self, article: &mut A) {
        if let Some(span) = self.active_span.take() {
            article.remove_class(span, WORD_ACTIVE_CLASS);
        }
        if let Some(block) = self.active_block.take() {
            article.remove_class(block, BLOCK_ACTIVE_CLASS);
        }
    }
}
