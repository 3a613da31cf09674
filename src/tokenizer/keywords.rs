use std::collections::BTreeSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Match-all keyword query
pub const WILDCARD: &str = "*";

/// Fold free text into the keyword form used on both sides of the index.
///
/// Trims, lowercases, decomposes to NFD and strips combining marks, keeps
/// only letters, digits and whitespace, then trims again. A lone `*` (after
/// trimming) is passed through untouched.
pub fn prepare_keywords(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == WILDCARD {
        return trimmed.to_string();
    }

    // Lowercasing can itself emit combining marks (`İ` becomes `i` + U+0307)
    let folded: String = trimmed
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    folded.trim().to_string()
}

/// Whitespace tokenizer over prepared keyword text
#[derive(Clone, Debug, Default)]
pub struct KeywordTokenizer;

impl KeywordTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Prepare `text` and split it into tokens, preserving order and duplicates
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        prepare_keywords(text)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Distinct tokens in byte order
    pub fn unique_terms(&self, text: &str) -> BTreeSet<String> {
        self.tokenize(text).into_iter().collect()
    }

    /// Keyword text of a track: artist, album and track names joined
    pub fn keyword_text(artist_name: &str, album_name: &str, track_name: &str) -> String {
        prepare_keywords(&format!("{artist_name} {album_name} {track_name}"))
    }
}
