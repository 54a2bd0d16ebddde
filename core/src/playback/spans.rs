use super::dom::{ElementRef, RenderedArticle};
use crate::normalize::normalize_word;

/// A highlightable word in the rendered article.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanMeta {
    pub element: ElementRef,
    pub normalized: String,
}

/// Collect the article's tagged word fragments in document order.
///
/// A fragment's pre-normalized attribute, when present and non-empty, is used
/// instead of its text. Either way the value goes through [`normalize_word`],
/// the same function the timestamp side uses. Fragments that normalize to
/// nothing are skipped.
pub fn index_spans<A: RenderedArticle + ?Sized>(article: &A) -> Vec<SpanMeta> {
    article
        .word_fragments()
        .into_iter()
        .filter_map(|fragment| {
            let source = fragment
                .normalized_hint
                .as_deref()
                .filter(|hint| !hint.is_empty())
                .unwrap_or(&fragment.text);
            let normalized = normalize_word(source);
            (!normalized.is_empty()).then_some(SpanMeta {
                element: fragment.element,
                normalized,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::dom::{ArticleDom, NORMALIZED_ATTR};

    #[test]
    fn indexes_in_document_order() {
        let mut dom = ArticleDom::new();
        let p = dom.append(None, "p", "");
        let a = dom.append_word(p, "Hello,");
        dom.append(Some(p), "span", "untagged");
        dom.append_word(p, "—");
        let b = dom.append_word(p, "World!");
        let c = dom.append_word(p, "e.g.");
        dom.set_attribute(c, NORMALIZED_ATTR, "forexample");

        let spans = index_spans(&dom);
        assert_eq!(
            spans,
            vec![
                SpanMeta { element: a, normalized: "hello".into() },
                SpanMeta { element: b, normalized: "world".into() },
                SpanMeta { element: c, normalized: "forexample".into() },
            ]
        );
    }

    #[test]
    fn hint_is_normalized_like_timestamps() {
        let mut dom = ArticleDom::new();
        let p = dom.append(None, "p", "");
        let a = dom.append_word(p, "Hello");
        dom.set_attribute(a, NORMALIZED_ATTR, "Hello");
        let b = dom.append_word(p, "for example");
        dom.set_attribute(b, NORMALIZED_ATTR, "E.g.");
        let c = dom.append_word(p, "Dr.");
        dom.set_attribute(c, NORMALIZED_ATTR, "");

        let spans = index_spans(&dom);
        let normalized: Vec<&str> = spans.iter().map(|s| s.normalized.as_str()).collect();
        assert_eq!(normalized, vec!["hello", "eg", "dr"]);
    }
}
