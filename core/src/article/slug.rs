use crate::types::SlugParam;
use crate::{NarrationError, Result};

/// Validate raw slug segments.
///
/// Only ASCII letters, digits and `-` are allowed, which rules out `..`,
/// separators and anything else that could escape the content root or the
/// cache prefix.
pub fn validate_slug(segments: &[String]) -> Result<Vec<String>> {
    if segments.is_empty() {
        return Err(NarrationError::InvalidSlug("slug is required".to_string()));
    }
    for segment in segments {
        if segment.is_empty() {
            return Err(NarrationError::InvalidSlug(
                "slug contains an empty segment".to_string(),
            ));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(NarrationError::InvalidSlug(format!(
                "invalid slug segment: {segment:?}"
            )));
        }
    }
    Ok(segments.to_vec())
}

/// Validate an optional wire slug (`None` is a missing slug)
pub fn parse_slug(slug: Option<&SlugParam>) -> Result<Vec<String>> {
    match slug {
        Some(param) => validate_slug(&param.segments()),
        None => Err(NarrationError::InvalidSlug("slug is required".to_string())),
    }
}
