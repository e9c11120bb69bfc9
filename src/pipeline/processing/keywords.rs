//! Frequency-heuristic keyword extraction shared by normalization and matching.
//!
//! [`extract_keywords`] ranks terms for display and drops stop words.
//! [`extract_match_keywords`] keeps every qualifying token, stop words included.

use std::collections::{BTreeSet, HashMap, HashSet};

use once_cell::sync::Lazy;

/// Tokens this short or shorter never count as keywords.
pub const MIN_TOKEN_LEN: usize = 3;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "with", "by",
        "about", "as", "of", "that", "this", "is", "are", "was", "were", "be", "been", "being",
        "have", "has", "had", "do", "does", "did", "will", "would", "should", "can", "could",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Lower-cases, turns every non-alphanumeric character into a separator and
/// keeps tokens longer than [`MIN_TOKEN_LEN`] characters, in text order.
fn tokens(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() > MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// Returns up to `max_keywords` of the most frequent non-stop-word tokens,
/// most frequent first. Equal counts keep first-occurrence order.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for token in tokens(text) {
        if is_stop_word(&token) {
            continue;
        }
        match index.get(&token) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(token.clone(), order.len());
                order.push((token, 1));
            }
        }
    }

    // sort_by is stable, so ties stay in first-occurrence order
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(max_keywords)
        .map(|(word, _)| word)
        .collect()
}

/// Full deduplicated token set used for similarity matching.
pub fn extract_match_keywords(text: &str) -> BTreeSet<String> {
    tokens(text).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_keywords_ranks_by_frequency() {
        let text = "Spark spark SPARK pipeline pipeline streams";
        assert_eq!(
            extract_keywords(text, 10),
            vec!["spark", "pipeline", "streams"]
        );
    }

    #[test]
    fn test_extract_keywords_ties_keep_first_occurrence() {
        let text = "zeta alpha zeta alpha beta gamma";
        assert_eq!(
            extract_keywords(text, 3),
            vec!["zeta", "alpha", "beta"]
        );
    }

    #[test]
    fn test_extract_keywords_drops_stop_words_and_short_tokens() {
        let text = "This would have been about the big data tool, which could work";
        let keywords = extract_keywords(text, 10);
        assert_eq!(keywords, vec!["data", "tool", "which", "work"]);
        for word in &keywords {
            assert!(word.len() > MIN_TOKEN_LEN);
            assert!(!is_stop_word(word));
        }
    }

    #[test]
    fn test_extract_keywords_respects_limit() {
        let text = "one1 two2 three four five sixes seven eight nines tenth eleven twelve";
        let keywords = extract_keywords(text, 10);
        assert_eq!(keywords.len(), 10);
        assert!(extract_keywords(text, 0).is_empty());
    }

    #[test]
    fn test_non_alphanumeric_characters_split_tokens() {
        let set = extract_match_keywords("data-science/machine_learning: v2.0!");
        let expected: BTreeSet<String> = ["data", "science", "machine", "learning"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn test_match_keywords_keep_stop_words_and_dedupe() {
        let set = extract_match_keywords("about about Data data");
        assert_eq!(set.len(), 2);
        assert!(set.contains("about"));
        assert!(set.contains("data"));
    }

    #[test]
    fn test_empty_input_yields_empty_result() {
        assert!(extract_keywords("", 10).is_empty());
        assert!(extract_keywords("   \n\t", 10).is_empty());
        assert!(extract_match_keywords("").is_empty());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // three characters, six bytes
        assert!(extract_match_keywords("äöü").is_empty());
        assert!(extract_match_keywords("äöüß").contains("äöüß"));
    }
}
