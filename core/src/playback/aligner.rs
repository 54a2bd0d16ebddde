//! Timestamp -> span alignment.
//!
//! A single forward greedy pass with a monotonically advancing cursor. Each
//! timestamp takes the first not-yet-consumed span with the same normalized
//! text; a miss leaves the cursor where it was. The match is O(T·S) in the
//! worst case, which is fine for article-sized inputs.

use super::spans::SpanMeta;
use crate::types::WordTimestamp;

/// For each timestamp index, the index of its span or `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentMapping(Vec<Option<usize>>);

impl AlignmentMapping {
    pub fn span_for(&self, timestamp_index: usize) -> Option<usize> {
        self.0.get(timestamp_index).copied().flatten()
    }

    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of timestamps that found a span
    pub fn matched(&self) -> usize {
        self.0.iter().filter(|m| m.is_some()).count()
    }
}

pub fn align(timestamps: &[WordTimestamp], spans: &[SpanMeta]) -> AlignmentMapping {
    let mut cursor = 0;
    let mapping = timestamps
        .iter()
        .map(|ts| {
            let found = spans[cursor.min(spans.len())..]
                .iter()
                .position(|span| span.normalized == ts.normalized)
                .map(|offset| cursor + offset);
            if let Some(index) = found {
                cursor = index + 1;
            }
            found
        })
        .collect();
    AlignmentMapping(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(normalized: &str) -> WordTimestamp {
        WordTimestamp {
            word: normalized.to_string(),
            start: 0.0,
            end: 0.0,
            normalized: normalized.to_string(),
        }
    }

    fn span(element: usize, normalized: &str) -> SpanMeta {
        SpanMeta {
            element,
            normalized: normalized.to_string(),
        }
    }

    #[test]
    fn skips_spans_absent_from_audio() {
        let timestamps = vec![ts("the"), ts("cat"), ts("sat")];
        let spans = vec![span(0, "the"), span(1, "cat"), span(2, "cat"), span(3, "sat")];
        assert_eq!(align(&timestamps, &spans).as_slice(), &[Some(0), Some(1), Some(3)]);
    }

    #[test]
    fn unmatched_timestamp_keeps_cursor() {
        let timestamps = vec![ts("a"), ts("zzz"), ts("b")];
        let spans = vec![span(0, "a"), span(1, "b")];
        let mapping = align(&timestamps, &spans);
        assert_eq!(mapping.as_slice(), &[Some(0), None, Some(1)]);
        assert_eq!(mapping.matched(), 2);
    }

    #[test]
    fn never_reuses_a_span() {
        let timestamps = vec![ts("a"), ts("a"), ts("a")];
        let spans = vec![span(0, "a"), span(1, "a")];
        assert_eq!(align(&timestamps, &spans).as_slice(), &[Some(0), Some(1), None]);
    }

    #[test]
    fn empty_inputs() {
        assert!(align(&[], &[span(0, "a")]).is_empty());
        assert_eq!(align(&[ts("a")], &[]).as_slice(), &[None]);
    }
}
