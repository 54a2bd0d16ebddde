//! Client-side synchronized highlighting.
//!
//! Rendered article -> span index -> alignment with the narration's word
//! timestamps -> position tracking on every frame -> highlight and autoscroll.

mod aligner;
mod dom;
mod highlight;
mod session;
mod spans;
mod tracker;

pub use aligner::{align, AlignmentMapping};
pub use dom::{
    ArticleDom, DomNode, ElementRef, LayoutBox, RenderedArticle, Viewport, WordFragment,
    BLOCK_TAGS, NORMALIZED_ATTR, WORD_ATTR,
};
pub use highlight::{HighlightConfig, HighlightController, BLOCK_ACTIVE_CLASS, WORD_ACTIVE_CLASS};
pub use session::{
    AudioClock, FrameLoop, NarrationPlayer, NarrationSession, SimulatedClock,
    DEFAULT_FRAME_INTERVAL,
};
pub use spans::{index_spans, SpanMeta};
pub use tracker::{
    locate, locate_with_tolerance, PlaybackState, PlaybackTracker, WordChange, DEFAULT_TOLERANCE,
};
