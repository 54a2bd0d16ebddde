/// Word canonicalization shared by the timestamp side and the rendered-text side.
///
/// Both sides must go through this exact function, otherwise alignment silently
/// degrades: lowercases and keeps only alphanumeric characters, so case and
/// punctuation never affect equality.
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
