use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Tokenize text into a set of lowercased words.
///
/// Word boundaries follow Unicode segmentation rules, so punctuation and
/// markup characters never become tokens.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

/// Jaccard similarity between two token sets.
///
/// Returns 0.0 when either set is empty. Two entities that added no text on
/// a shared burst day must not be considered similar, so the empty/empty
/// case is 0.0 rather than 1.0 here.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}
