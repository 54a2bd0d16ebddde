//! DOM-like model of a rendered article.
//!
//! The rendering layer segments article text into per-word fragments tagged
//! with [`WORD_ATTR`]; this module only consumes that structure. Anything able
//! to report fragments, block ancestry and viewport geometry can implement
//! [`RenderedArticle`].

use std::collections::{BTreeSet, HashMap};

/// Opaque handle to a rendered node
pub type ElementRef = usize;

/// Attribute marking a speakable word fragment
pub const WORD_ATTR: &str = "data-tts-word";
/// Optional pre-normalized text of a word fragment
pub const NORMALIZED_ATTR: &str = "data-tts-normalized";

/// Tags that count as the block containing a highlighted word
pub const BLOCK_TAGS: &[&str] = &["p", "li", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6"];

/// One tagged word fragment as reported by the rendering layer
#[derive(Debug, Clone, PartialEq)]
pub struct WordFragment {
    pub element: ElementRef,
    pub text: String,
    pub normalized_hint: Option<String>,
}

/// Rendered article surface: fragment discovery plus highlight/scroll effects.
pub trait RenderedArticle {
    /// Tagged word fragments in document order
    fn word_fragments(&self) -> Vec<WordFragment>;

    /// Nearest enclosing paragraph, list item, blockquote or heading
    fn block_ancestor(&self, element: ElementRef) -> Option<ElementRef>;

    fn add_class(&mut self, element: ElementRef, class: &str);

    fn remove_class(&mut self, element: ElementRef, class: &str);

    /// Whether the element's vertical center lies inside `[low, high]`,
    /// expressed as fractions of the viewport height
    fn in_viewport_band(&self, element: ElementRef, low: f64, high: f64) -> bool;

    /// Smoothly scroll so the element sits at the viewport center
    fn scroll_into_view(&mut self, element: ElementRef);

    fn prefers_reduced_motion(&self) -> bool;
}

/// Vertical layout box in document coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBox {
    pub top: f64,
    pub height: f64,
}

impl LayoutBox {
    fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_top: 0.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag: String,
    pub parent: Option<ElementRef>,
    pub attributes: HashMap<String, String>,
    pub text: String,
    pub classes: BTreeSet<String>,
    pub layout: Option<LayoutBox>,
}

/// In-memory article tree. Nodes are kept in document order, so children
/// must be appended depth-first.
#[derive(Debug, Clone, Default)]
pub struct ArticleDom {
    nodes: Vec<DomNode>,
    viewport: Viewport,
    reduced_motion: bool,
    scroll_count: usize,
}

impl ArticleDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build `article > p > span` with one tagged span per whitespace word.
    /// Each paragraph is laid out as a single 24px line, 16px apart.
    pub fn from_paragraphs(paragraphs: &[&str]) -> Self {
        let mut dom = Self::new();
        let root = dom.append(None, "article", "");
        let mut top = 0.0;
        for paragraph in paragraphs {
            let p = dom.append(Some(root), "p", "");
            dom.set_layout(p, LayoutBox { top, height: 24.0 });
            for word in paragraph.split_whitespace() {
                let span = dom.append_word(p, word);
                dom.set_layout(span, LayoutBox { top, height: 24.0 });
            }
            top += 40.0;
        }
        dom
    }

    pub fn append(&mut self, parent: Option<ElementRef>, tag: &str, text: &str) -> ElementRef {
        self.nodes.push(DomNode {
            tag: tag.to_ascii_lowercase(),
            parent,
            attributes: HashMap::new(),
            text: text.to_string(),
            classes: BTreeSet::new(),
            layout: None,
        });
        self.nodes.len() - 1
    }

    /// Append a `span` tagged as a speakable word
    pub fn append_word(&mut self, parent: ElementRef, text: &str) -> ElementRef {
        let id = self.append(Some(parent), "span", text);
        self.set_attribute(id, WORD_ATTR, "");
        id
    }

    pub fn set_attribute(&mut self, element: ElementRef, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn set_layout(&mut self, element: ElementRef, layout: LayoutBox) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.layout = Some(layout);
        }
    }

    pub fn node(&self, element: ElementRef) -> Option<&DomNode> {
        self.nodes.get(element)
    }

    pub fn has_class(&self, element: ElementRef, class: &str) -> bool {
        self.nodes
            .get(element)
            .map(|n| n.classes.contains(class))
            .unwrap_or(false)
    }

    /// Elements currently carrying `class`, in document order
    pub fn elements_with_class(&self, class: &str) -> Vec<ElementRef> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.classes.contains(class))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    /// Number of programmatic scrolls performed so far
    pub fn scroll_count(&self) -> usize {
        self.scroll_count
    }
}

impl RenderedArticle for ArticleDom {
    fn word_fragments(&self) -> Vec<WordFragment> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.attributes.contains_key(WORD_ATTR))
            .map(|(element, n)| WordFragment {
                element,
                text: n.text.clone(),
                normalized_hint: n.attributes.get(NORMALIZED_ATTR).cloned(),
            })
            .collect()
    }

    fn block_ancestor(&self, element: ElementRef) -> Option<ElementRef> {
        let mut current = self.nodes.get(element)?.parent;
        while let Some(id) = current {
            let node = self.nodes.get(id)?;
            if BLOCK_TAGS.contains(&node.tag.as_str()) {
                return Some(id);
            }
            current = node.parent;
        }
        None
    }

    fn add_class(&mut self, element: ElementRef, class: &str) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.classes.insert(class.to_string());
        }
    }

    fn remove_class(&mut self, element: ElementRef, class: &str) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.classes.remove(class);
        }
    }

    fn in_viewport_band(&self, element: ElementRef, low: f64, high: f64) -> bool {
        let Some(layout) = self.nodes.get(element).and_then(|n| n.layout) else {
            // nothing to measure, never scroll
            return true;
        };
        if self.viewport.height <= 0.0 {
            return true;
        }
        let relative = (layout.center() - self.viewport.scroll_top) / self.viewport.height;
        relative >= low && relative <= high
    }

    fn scroll_into_view(&mut self, element: ElementRef) {
        if let Some(layout) = self.nodes.get(element).and_then(|n| n.layout) {
            self.viewport.scroll_top = (layout.center() - self.viewport.height / 2.0).max(0.0);
            self.scroll_count += 1;
        }
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_ancestor_skips_inline_wrappers() {
        let mut dom = ArticleDom::new();
        let root = dom.append(None, "article", "");
        let li = dom.append(Some(root), "LI", "");
        let em = dom.append(Some(li), "em", "");
        let word = dom.append_word(em, "hello");
        assert_eq!(dom.block_ancestor(word), Some(li));
        assert_eq!(dom.block_ancestor(root), None);
    }

    #[test]
    fn viewport_band() {
        let mut dom = ArticleDom::new();
        let root = dom.append(None, "p", "");
        let near = dom.append_word(root, "near");
        let far = dom.append_word(root, "far");
        dom.set_layout(near, LayoutBox { top: 388.0, height: 24.0 });
        dom.set_layout(far, LayoutBox { top: 2000.0, height: 24.0 });

        assert!(dom.in_viewport_band(near, 0.25, 0.75));
        assert!(!dom.in_viewport_band(far, 0.25, 0.75));

        dom.scroll_into_view(far);
        assert_eq!(dom.viewport().scroll_top, 2012.0 - 400.0);
        assert!(dom.in_viewport_band(far, 0.25, 0.75));
        assert_eq!(dom.scroll_count(), 1);
    }
}
