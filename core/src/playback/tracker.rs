//! Playback position -> current word.

use crate::types::WordTimestamp;

/// Slack, in seconds, on both edges of a word's interval
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// Index of the word being spoken at `current_time`, searching outward from
/// the previous result.
///
/// Gaps between words and times past the final word keep the last word that
/// started; times before the first word yield `None`.
pub fn locate(current_time: f64, timestamps: &[WordTimestamp], last_index: Option<usize>) -> Option<usize> {
    locate_with_tolerance(current_time, timestamps, last_index, DEFAULT_TOLERANCE)
}

pub fn locate_with_tolerance(
    current_time: f64,
    timestamps: &[WordTimestamp],
    last_index: Option<usize>,
    tolerance: f64,
) -> Option<usize> {
    if timestamps.is_empty() || !current_time.is_finite() {
        return None;
    }
    let starts_by = |i: usize| current_time >= timestamps[i].start - tolerance;

    let mut i = last_index.map_or(0, |i| i.min(timestamps.len() - 1));
    while i + 1 < timestamps.len() && starts_by(i + 1) {
        i += 1;
    }
    while i > 0 && !starts_by(i) {
        i -= 1;
    }

    // Only reachable at index 0: nothing has started yet
    starts_by(i).then_some(i)
}

/// Position state for one narration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackState {
    pub current_time: f64,
    pub last_word_index: Option<usize>,
}

/// Emitted when the current word changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordChange {
    pub previous: Option<usize>,
    pub current: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct PlaybackTracker {
    state: PlaybackState,
    tolerance: f64,
}

impl Default for PlaybackTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl PlaybackTracker {
    pub fn new(tolerance: f64) -> Self {
        Self {
            state: PlaybackState::default(),
            tolerance,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Record a new playback position; reports the word change, if any.
    pub fn update(&mut self, current_time: f64, timestamps: &[WordTimestamp]) -> Option<WordChange> {
        self.state.current_time = current_time;
        let current =
            locate_with_tolerance(current_time, timestamps, self.state.last_word_index, self.tolerance);
        if current == self.state.last_word_index {
            return None;
        }
        let previous = std::mem::replace(&mut self.state.last_word_index, current);
        Some(WordChange { previous, current })
    }

    pub fn reset(&mut self) {
        self.state = PlaybackState::default();
    }
}
