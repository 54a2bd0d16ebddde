// Article input side: locating a source file, validating slugs and turning
// markup into speakable text.

mod extract;
mod slug;
mod source;

pub use extract::extract_speakable_text;
pub use slug::{parse_slug, validate_slug};
pub use source::{ArticleSource, FsArticleSource};
