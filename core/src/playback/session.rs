//! Per-narration playback state and the frame loop driving it.
//!
//! A [`NarrationSession`] owns everything scoped to one narration: the
//! timestamps, the indexed spans, their alignment, the tracker and the
//! highlight. The [`FrameLoop`] polls an [`AudioClock`] while audio plays and
//! feeds positions into the session; it stops on pause or end, and is aborted
//! when dropped.

use super::aligner::{align, AlignmentMapping};
use super::dom::RenderedArticle;
use super::highlight::{HighlightConfig, HighlightController};
use super::spans::{index_spans, SpanMeta};
use super::tracker::{PlaybackState, PlaybackTracker, WordChange, DEFAULT_TOLERANCE};
use crate::synthesis::estimate_uniform;
use crate::types::WordTimestamp;
use crate::{NarrationError, Result};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Roughly one display frame
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub struct NarrationSession<A: RenderedArticle> {
    article: A,
    timestamps: Vec<WordTimestamp>,
    spans: Vec<SpanMeta>,
    mapping: AlignmentMapping,
    tracker: PlaybackTracker,
    highlight: HighlightController,
}

impl<A: RenderedArticle> NarrationSession<A> {
    pub fn new(article: A, timestamps: Vec<WordTimestamp>, config: HighlightConfig) -> Self {
        let spans = index_spans(&article);
        let mapping = align(&timestamps, &spans);
        debug!(
            target: "playback",
            words = timestamps.len(),
            spans = spans.len(),
            matched = mapping.matched(),
            "Narration session ready"
        );
        Self {
            article,
            timestamps,
            spans,
            mapping,
            tracker: PlaybackTracker::new(DEFAULT_TOLERANCE),
            highlight: HighlightController::new(config),
        }
    }

    /// Swap in a new narration for the same article.
    pub fn load(&mut self, timestamps: Vec<WordTimestamp>) {
        self.reset();
        self.mapping = align(&timestamps, &self.spans);
        self.timestamps = timestamps;
    }

    /// Re-index spans after the rendered article changed.
    pub fn remount(&mut self) {
        self.highlight.clear(&mut self.article);
        self.spans = index_spans(&self.article);
        self.mapping = align(&self.timestamps, &self.spans);
        self.tracker.reset();
    }

    /// Fill in length-weighted timings when the narration came without any.
    /// Returns whether an estimate was applied.
    pub fn estimate_if_empty(&mut self, text: &str, duration: f64) -> bool {
        if !self.timestamps.is_empty() {
            return false;
        }
        let estimated = estimate_uniform(text, duration);
        if estimated.is_empty() {
            return false;
        }
        info!(target: "playback", words = estimated.len(), duration, "Using estimated word timings");
        self.load(estimated);
        true
    }

    /// Advance to `current_time`; highlight only moves when the word changes.
    pub fn tick(&mut self, current_time: f64, now: Instant) -> Option<WordChange> {
        let change = self.tracker.update(current_time, &self.timestamps)?;
        let element = change
            .current
            .and_then(|i| self.mapping.span_for(i))
            .and_then(|s| self.spans.get(s))
            .map(|span| span.element);
        self.highlight.apply(&mut self.article, element, now);
        Some(change)
    }

    pub fn note_user_scroll(&mut self, at: Instant) {
        self.highlight.note_user_scroll(at);
    }

    /// Back to `(0, None)` with nothing highlighted
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.highlight.clear(&mut self.article);
    }

    /// Clear all highlight state and hand the article back.
    pub fn teardown(mut self) -> A {
        self.reset();
        self.article
    }

    pub fn state(&self) -> PlaybackState {
        self.tracker.state()
    }

    pub fn timestamps(&self) -> &[WordTimestamp] {
        &self.timestamps
    }

    pub fn spans(&self) -> &[SpanMeta] {
        &self.spans
    }

    pub fn mapping(&self) -> &AlignmentMapping {
        &self.mapping
    }

    pub fn article(&self) -> &A {
        &self.article
    }

    pub fn article_mut(&mut self) -> &mut A {
        &mut self.article
    }
}

/// Audio element as seen by the frame loop.
pub trait AudioClock: Send + Sync {
    /// Playback position in seconds
    fn current_time(&self) -> f64;

    fn is_playing(&self) -> bool;

    fn has_ended(&self) -> bool;

    /// Total length in seconds, once known
    fn duration(&self) -> Option<f64>;

    /// Start or resume playback; fails when the environment refuses to play
    fn play(&self) -> Result<()>;

    fn pause(&self);

    fn seek(&self, position: f64);
}

#[derive(Debug)]
struct ClockState {
    offset: f64,
    started_at: Option<Instant>,
    ended: bool,
}

/// Wall-clock driven stand-in for an audio element.
#[derive(Debug)]
pub struct SimulatedClock {
    duration: f64,
    rate: f64,
    blocked: bool,
    state: StdMutex<ClockState>,
}

impl SimulatedClock {
    pub fn new(duration: f64) -> Arc<Self> {
        Self::with_rate(duration, 1.0)
    }

    /// Playback at `rate` times real time
    pub fn with_rate(duration: f64, rate: f64) -> Arc<Self> {
        Arc::new(Self {
            duration,
            rate,
            blocked: false,
            state: StdMutex::new(ClockState {
                offset: 0.0,
                started_at: None,
                ended: false,
            }),
        })
    }

    /// A clock whose `play` is always refused, like a blocked autoplay
    pub fn blocked(duration: f64) -> Arc<Self> {
        Arc::new(Self {
            duration,
            rate: 1.0,
            blocked: true,
            state: StdMutex::new(ClockState {
                offset: 0.0,
                started_at: None,
                ended: false,
            }),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn position(&self, state: &ClockState) -> f64 {
        let elapsed = state
            .started_at
            .map(|at| at.elapsed().as_secs_f64() * self.rate)
            .unwrap_or(0.0);
        (state.offset + elapsed).min(self.duration)
    }

    fn settle(&self, state: &mut ClockState) {
        if state.started_at.is_some() && self.position(state) >= self.duration {
            state.offset = self.duration;
            state.started_at = None;
            state.ended = true;
        }
    }
}

impl AudioClock for SimulatedClock {
    fn current_time(&self) -> f64 {
        let mut state = self.lock();
        self.settle(&mut state);
        self.position(&state)
    }

    fn is_playing(&self) -> bool {
        let mut state = self.lock();
        self.settle(&mut state);
        state.started_at.is_some()
    }

    fn has_ended(&self) -> bool {
        let mut state = self.lock();
        self.settle(&mut state);
        state.ended
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn play(&self) -> Result<()> {
        if self.blocked {
            return Err(NarrationError::PlaybackFailed(
                "playback was not allowed to start".to_string(),
            ));
        }
        let mut state = self.lock();
        if state.ended {
            state.offset = 0.0;
            state.ended = false;
        }
        if state.started_at.is_none() {
            state.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.lock();
        if state.started_at.is_some() {
            state.offset = self.position(&state);
            state.started_at = None;
        }
    }

    fn seek(&self, position: f64) {
        let mut state = self.lock();
        state.offset = position.clamp(0.0, self.duration);
        state.ended = false;
        if state.started_at.is_some() {
            state.started_at = Some(Instant::now());
        }
    }
}

/// Polls the clock at a fixed interval and ticks the session.
pub struct FrameLoop {
    handle: Option<JoinHandle<()>>,
}

impl FrameLoop {
    pub fn start<A>(
        session: Arc<Mutex<NarrationSession<A>>>,
        clock: Arc<dyn AudioClock>,
        interval: Duration,
    ) -> Self
    where
        A: RenderedArticle + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if clock.has_ended() {
                    session.lock().await.reset();
                    debug!(target: "playback", "Playback ended, frame loop stopped");
                    break;
                }
                if !clock.is_playing() {
                    debug!(target: "playback", "Playback paused, frame loop stopped");
                    break;
                }
                let position = clock.current_time();
                session.lock().await.tick(position, Instant::now());
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Abort the loop and wait until its task has released the session
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Wait for the loop to exit on its own (pause or end)
    pub async fn finished(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Play/pause control tying a clock to a session.
pub struct NarrationPlayer<A: RenderedArticle + Send + 'static> {
    session: Arc<Mutex<NarrationSession<A>>>,
    clock: Arc<dyn AudioClock>,
    frame_loop: Option<FrameLoop>,
    interval: Duration,
}

impl<A: RenderedArticle + Send + 'static> NarrationPlayer<A> {
    pub fn new(session: NarrationSession<A>, clock: Arc<dyn AudioClock>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            clock,
            frame_loop: None,
            interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn session(&self) -> &Arc<Mutex<NarrationSession<A>>> {
        &self.session
    }

    pub fn clock(&self) -> &Arc<dyn AudioClock> {
        &self.clock
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Start playback and the frame loop. A refused play leaves everything
    /// stopped and is reported to the caller.
    pub fn play(&mut self) -> Result<()> {
        self.clock.play()?;
        if let Some(mut old) = self.frame_loop.take() {
            old.stop();
        }
        self.frame_loop = Some(FrameLoop::start(
            self.session.clone(),
            self.clock.clone(),
            self.interval,
        ));
        info!(target: "playback", position = self.clock.current_time(), "Playback started");
        Ok(())
    }

    pub fn pause(&mut self) {
        self.clock.pause();
        if let Some(mut frame_loop) = self.frame_loop.take() {
            frame_loop.stop();
        }
        info!(target: "playback", position = self.clock.current_time(), "Playback paused");
    }

    pub fn toggle(&mut self) -> Result<()> {
        if self.clock.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Wait until the frame loop exits on pause or end
    pub async fn wait(&mut self) {
        if let Some(frame_loop) = self.frame_loop.as_mut() {
            frame_loop.finished().await;
        }
        self.frame_loop = None;
    }

    /// Stop playback, clear highlights and release the article. Returns
    /// `None` if the session is still shared elsewhere.
    pub async fn teardown(self) -> Option<A> {
        let Self {
            session,
            clock,
            frame_loop,
            ..
        } = self;
        clock.pause();
        if let Some(mut frame_loop) = frame_loop {
            frame_loop.shutdown().await;
        }
        match Arc::try_unwrap(session) {
            Ok(session) => Some(session.into_inner().teardown()),
            Err(shared) => {
                shared.lock().await.reset();
                None
            }
        }
    }
}
