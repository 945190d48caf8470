//! Lexical normalization shared by the similarity scorer and the keyword gap
//! analyzer. Both lower-case their input; they differ in how tokens are cut.

use super::stopwords::ENGLISH_STOP_WORDS;

/// Tokens eligible for TF-IDF weighting: maximal runs of word characters
/// (alphanumeric or `_`) at least two characters long, lower-cased, with
/// English stop words removed.
pub fn tfidf_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !is_word_char(c))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|t| !ENGLISH_STOP_WORDS.contains(t.as_str()))
        .collect()
}

/// Tokens considered by the keyword gap analyzer: whitespace-separated words,
/// lower-cased, with surrounding punctuation stripped. Anything of three
/// characters or fewer is dropped.
pub fn keyword_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| t.chars().count() > 3)
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
