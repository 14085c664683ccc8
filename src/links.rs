use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    /// Matches wiki-style internal links: `[[Target]]` or `[[Target|Display]]`.
    static ref WIKI_LINK: Regex = Regex::new(r"\[\[(.*?)\]\]").expect("wiki link regex is valid");
}

/// Extract the set of entities referenced by wiki links in the given text.
///
/// Only the target portion (before an optional `|`) of each link is kept,
/// trimmed of surrounding whitespace. Duplicates collapse into one entry.
///
/// Extraction is deliberately conservative: malformed or unterminated link
/// markup is not an error, it simply contributes no references.
///
/// # Arguments
/// * `text` - The added text to scan, typically the joined added lines of one edit
///
/// # Returns
/// * `HashSet<String>` - Unique referenced entity identifiers (possibly empty)
pub fn extract_links(text: &str) -> HashSet<String> {
    let mut targets = HashSet::new();

    for capture in WIKI_LINK.captures_iter(text) {
        let inner = &capture[1];
        let target = inner.split('|').next().unwrap_or("").trim();
        if !target.is_empty() {
            targets.insert(target.to_string());
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_link() {
        let links = extract_links("The [[White House]] responded.");
        assert_eq!(links.len(), 1);
        assert!(links.contains("White House"));
    }

    #[test]
    fn test_piped_link_keeps_target() {
        let links = extract_links("See [[United Nations|UN]] statement.");
        assert_eq!(links.len(), 1);
        assert!(links.contains("United Nations"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let links = extract_links("[[Paris]] and again [[Paris]] and [[Paris|the capital]]");
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_whitespace_trimmed() {
        let links = extract_links("[[ Angela Merkel ]] spoke");
        assert!(links.contains("Angela Merkel"));
    }

    #[test]
    fn test_malformed_markup_is_ignored() {
        assert!(extract_links("[[unclosed link").is_empty());
        assert!(extract_links("closing only]]").is_empty());
        assert!(extract_links("[single brackets]").is_empty());
        // An empty target extracts nothing.
        assert!(extract_links("[[]]").is_empty());
        assert!(extract_links("[[|display only]]").is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_links("").is_empty());
    }

    #[test]
    fn test_multiple_links_one_line() {
        let links = extract_links("[[A]] met [[B]] in [[C|the city]]");
        assert_eq!(links.len(), 3);
        assert!(links.contains("A"));
        assert!(links.contains("B"));
        assert!(links.contains("C"));
    }
}
