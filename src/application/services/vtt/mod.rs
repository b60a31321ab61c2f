//! VTT translation - Normalization, compilers and token placement
//!
//! Everything in here is pure and synchronous. Compilers normalize their raw
//! input first and produce documents in the VTT's native schemas.

mod actor_compiler;
mod journal_compiler;
mod scene_compiler;
mod shape_normalizer;
mod token_placement;

pub use actor_compiler::ActorCompiler;
pub use journal_compiler::JournalCompiler;
pub use scene_compiler::SceneCompiler;
pub use shape_normalizer::{ShapeNormalizer, ValidationError};
pub use token_placement::{
    ActorRef, PlacementFailure, PlacementResult, TokenPlacement, TokenPlacementEngine,
};

/// Escape text for embedding in VTT HTML fields
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Lowercase alphanumeric words of `text`
pub(crate) fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether `needle` occurs in `haystack` as a run of whole words
pub(crate) fn contains_words(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|run| run == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_words_matches_whole_words_only() {
        let haystack = words("Bog Beast, the elder");
        assert!(contains_words(&haystack, &words("bog beast")));
        assert!(contains_words(&haystack, &words("BEAST")));
        assert!(!contains_words(&haystack, &words("Bo")));
        assert!(!contains_words(&haystack, &words("beast elder")));
        assert!(!contains_words(&haystack, &[]));
    }
}
