//! Markdown/MDX to speakable plain text.
//!
//! Each stage is a pure text transform and the order matters: front matter
//! first, then everything that is code, then the remaining markdown syntax,
//! then whitespace cleanup. Code must never reach the synthesizer.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_FRONT_MATTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A\u{feff}?---[ \t]*\r?\n.*?\r?\n---[ \t]*(?:\r?\n|\z)").unwrap());

// Code
static RE_FENCE_BACKTICK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?ms)^[ \t]*```.*?(?:^[ \t]*```[ \t]*$|\z)").unwrap());
static RE_FENCE_TILDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?ms)^[ \t]*~~~.*?(?:^[ \t]*~~~[ \t]*$|\z)").unwrap());
static RE_PRE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<pre\b[^>]*>.*?</pre>").unwrap());
static RE_INLINE_CODE_DOUBLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"``[^\n]*?``").unwrap());
static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]*`").unwrap());

// Markdown / MDX syntax
static RE_MDX_STATEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:import|export)[ \t].*$").unwrap());
static RE_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\](?:\([^)]*\)|\[[^\]]*\])").unwrap());
static RE_LINK_DEFINITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\[[^\]]+\]:[ \t]*\S+.*$").unwrap());
static RE_INLINE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
static RE_REFERENCE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\[[^\]]*\]").unwrap());
static RE_HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static RE_HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>\n]*>").unwrap());
static RE_HORIZONTAL_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*_][ \t]*){3,}$").unwrap());
static RE_SETEXT_UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*=+[ \t]*$").unwrap());
static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]*").unwrap());
static RE_BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:>[ \t]?)+").unwrap());
static RE_LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*+]|\d+[.)])[ \t]+").unwrap());
static RE_STRONG_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*{1,3}([^*\n]+?)\*{1,3}").unwrap());
static RE_UNDERSCORE_EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(^|[\s(\[])_{1,3}([^_\n]+?)_{1,3}([\s.,;:!?)\]]|$)").unwrap()
});
static RE_STRIKETHROUGH: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~([^~\n]+?)~~").unwrap());

// Whitespace
static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());
static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Convert an article body into text suitable for speech synthesis.
pub fn extract_speakable_text(source: &str) -> String {
    let text = strip_front_matter(source);
    let text = strip_code(&text);
    let text = strip_markdown(&text);
    tidy_whitespace(&text)
}

fn strip_front_matter(source: &str) -> String {
    RE_FRONT_MATTER.replace(source, "").into_owned()
}

fn strip_code(text: &str) -> String {
    let text = RE_FENCE_BACKTICK.replace_all(text, "");
    let text = RE_FENCE_TILDE.replace_all(&text, "");
    let text = RE_PRE_BLOCK.replace_all(&text, "");
    let text = RE_INLINE_CODE_DOUBLE.replace_all(&text, "");
    RE_INLINE_CODE.replace_all(&text, "").into_owned()
}

fn strip_markdown(text: &str) -> String {
    let text = RE_MDX_STATEMENT.replace_all(text, "");
    let text = RE_HTML_COMMENT.replace_all(&text, "");
    // images go entirely, alt text is not read out
    let text = RE_IMAGE.replace_all(&text, "");
    let text = RE_LINK_DEFINITION.replace_all(&text, "");
    let text = RE_INLINE_LINK.replace_all(&text, "${1}");
    let text = RE_REFERENCE_LINK.replace_all(&text, "${1}");
    let text = RE_HTML_TAG.replace_all(&text, "");
    let text = RE_HORIZONTAL_RULE.replace_all(&text, "");
    let text = RE_SETEXT_UNDERLINE.replace_all(&text, "");
    let text = RE_HEADING.replace_all(&text, "");
    let text = RE_BLOCKQUOTE.replace_all(&text, "");
    let text = RE_LIST_MARKER.replace_all(&text, "");
    let text = RE_STRONG_EMPHASIS.replace_all(&text, "${1}");
    let text = RE_UNDERSCORE_EMPHASIS.replace_all(&text, "${1}${2}${3}");
    RE_STRIKETHROUGH.replace_all(&text, "${1}").into_owned()
}

fn tidy_whitespace(text: &str) -> String {
    let collapsed = RE_HORIZONTAL_WS.replace_all(text, " ");
    let lines: Vec<&str> = collapsed.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    RE_BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}
