//! Transcript normalization before rule matching

/// Trims, lower-cases and collapses whitespace.
///
/// Recognizers often close an utterance with sentence punctuation
/// ("Add 3 chairs at 40.") and use typographic apostrophes ("l’article"),
/// both are folded too. Empty input yields an empty string, meaning nothing
/// to interpret.
pub fn normalize(utterance: &str) -> String {
    let lower = utterance.trim().to_lowercase().replace('\u{2019}', "'");
    let words: Vec<&str> = lower.split_whitespace().collect();
    words
        .join(" ")
        .trim_end_matches(['.', '!', '?'])
        .trim_end()
        .to_string()
}
