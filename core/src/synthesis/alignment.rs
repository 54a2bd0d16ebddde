//! Provider alignment payload -> canonical word timestamps.
//!
//! Providers expose timing as loosely typed parallel arrays: either per word or
//! per character, in seconds, milliseconds, or unlabeled units. Each series is
//! looked up through an ordered list of candidate field names and the first
//! non-empty one wins. Normalization never fails; an unusable payload yields
//! an empty sequence.

use crate::normalize::normalize_word;
use crate::types::WordTimestamp;
use serde_json::Value;
use tracing::debug;

/// Raw values above this are taken to be milliseconds.
pub const MILLISECONDS_THRESHOLD: f64 = 1000.0;

const WORD_FIELDS: &[&str] = &["words"];
const WORD_START_FIELDS: &[&str] = &[
    "word_start_times_seconds",
    "word_start_times_ms",
    "word_start_times",
    "start_times_seconds",
    "start_times_ms",
    "start_times",
];
const WORD_END_FIELDS: &[&str] = &[
    "word_end_times_seconds",
    "word_end_times_ms",
    "word_end_times",
    "end_times_seconds",
    "end_times_ms",
    "end_times",
];

const CHARACTER_FIELDS: &[&str] = &["characters", "chars"];
const CHARACTER_START_FIELDS: &[&str] = &[
    "character_start_times_seconds",
    "character_start_times_ms",
    "character_start_times",
];
const CHARACTER_END_FIELDS: &[&str] = &[
    "character_end_times_seconds",
    "character_end_times_ms",
    "character_end_times",
];

/// Convert an alignment payload into ordered word timestamps.
pub fn normalize_alignment(payload: &Value) -> Vec<WordTimestamp> {
    let words = from_word_series(payload);
    if !words.is_empty() {
        debug!(target: "synthesis", words = words.len(), "Alignment from word series");
        return words;
    }

    let words = from_character_series(payload);
    if !words.is_empty() {
        debug!(target: "synthesis", words = words.len(), "Alignment from character series");
    } else {
        debug!(target: "synthesis", "Alignment payload has no usable series");
    }
    words
}

/// Parse one raw time value into seconds.
///
/// Numbers and numeric strings are accepted; anything above 1000 is assumed to
/// be milliseconds. The threshold is a heuristic that cached data relies on,
/// so it applies to every series regardless of its field name.
pub fn parse_time_value(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !value.is_finite() {
        return None;
    }
    if value > MILLISECONDS_THRESHOLD {
        Some(value / 1000.0)
    } else {
        Some(value)
    }
}

fn first_series<'a>(payload: &'a Value, fields: &[&str]) -> Option<&'a Vec<Value>> {
    fields
        .iter()
        .filter_map(|field| payload.get(*field).and_then(Value::as_array))
        .find(|series| !series.is_empty())
}

/// `end[i] ?? start[i]`: a missing or null end falls back to the start,
/// an unparseable one drops the entry.
fn end_or_start(ends: Option<&Vec<Value>>, index: usize, start: f64) -> Option<f64> {
    match ends.and_then(|series| series.get(index)) {
        None | Some(Value::Null) => Some(start),
        Some(raw) => parse_time_value(raw),
    }
}

fn from_word_series(payload: &Value) -> Vec<WordTimestamp> {
    let (Some(words), Some(starts)) = (
        first_series(payload, WORD_FIELDS),
        first_series(payload, WORD_START_FIELDS),
    ) else {
        return Vec::new();
    };
    let ends = first_series(payload, WORD_END_FIELDS);

    words
        .iter()
        .enumerate()
        .filter_map(|(i, raw_word)| {
            let word = raw_word.as_str()?.trim();
            if word.is_empty() {
                return None;
            }
            let normalized = normalize_word(word);
            if normalized.is_empty() {
                return None;
            }
            let start = parse_time_value(starts.get(i)?)?;
            let end = end_or_start(ends, i, start)?;
            Some(WordTimestamp {
                word: word.to_string(),
                start,
                end: end.max(start),
                normalized,
            })
        })
        .collect()
}

/// Accumulates one word while scanning characters.
#[derive(Default)]
struct WordBuffer {
    text: String,
    start: Option<f64>,
    end: Option<f64>,
}

impl WordBuffer {
    fn push(&mut self, ch: &str, start: Option<f64>, end: Option<f64>) {
        self.text.push_str(ch);
        if self.start.is_none() {
            self.start = start;
        }
        if let Some(end) = end.or(start) {
            self.end = Some(end);
        }
    }

    fn flush(&mut self, out: &mut Vec<WordTimestamp>) {
        let buffer = std::mem::take(self);
        let normalized = normalize_word(&buffer.text);
        if normalized.is_empty() {
            return;
        }
        if let Some(start) = buffer.start {
            let end = buffer.end.unwrap_or(start).max(start);
            out.push(WordTimestamp {
                word: buffer.text,
                start,
                end,
                normalized,
            });
        }
    }
}

fn from_character_series(payload: &Value) -> Vec<WordTimestamp> {
    let Some(characters) = first_series(payload, CHARACTER_FIELDS) else {
        return Vec::new();
    };
    let starts = first_series(payload, CHARACTER_START_FIELDS);
    let ends = first_series(payload, CHARACTER_END_FIELDS);

    let mut out = Vec::new();
    let mut buffer = WordBuffer::default();

    for (i, raw) in characters.iter().enumerate() {
        let ch = raw.as_str().unwrap_or("");
        if ch.trim().is_empty() {
            buffer.flush(&mut out);
            continue;
        }
        let start = starts
            .and_then(|series| series.get(i))
            .and_then(parse_time_value);
        let end = ends
            .and_then(|series| series.get(i))
            .and_then(parse_time_value);
        buffer.push(ch, start, end);
    }
    buffer.flush(&mut out);

    out
}

/// Spread the words of `text` uniformly over `duration` seconds, weighted by
/// word length. Fallback for narrations whose alignment came back empty.
pub fn estimate_uniform(text: &str, duration: f64) -> Vec<WordTimestamp> {
    if !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }

    let words: Vec<(&str, String)> = text
        .split_whitespace()
        .map(|w| (w, normalize_word(w)))
        .filter(|(_, normalized)| !normalized.is_empty())
        .collect();
    let total_weight: usize = words.iter().map(|(_, n)| n.chars().count()).sum();
    if total_weight == 0 {
        return Vec::new();
    }

    let per_unit = duration / total_weight as f64;
    let mut cursor = 0.0;
    words
        .into_iter()
        .map(|(word, normalized)| {
            let start = cursor;
            cursor += normalized.chars().count() as f64 * per_unit;
            WordTimestamp {
                word: word.to_string(),
                start,
                end: cursor,
                normalized,
            }
        })
        .collect()
}
