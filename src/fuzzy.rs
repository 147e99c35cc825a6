//! Fuzzy string matching used as an optional scoring capability.
//!
//! Fuzzy matching is modeled as a capability with an availability probe:
//! the relevance scorer checks [`FuzzyMatcher::is_available`] once per call
//! and simply skips the fuzzy bonus when no matcher is configured.

use std::cmp::min;

/// Calculate the Levenshtein distance between two strings.
///
/// This is the minimum number of single-character edits (insertions,
/// deletions, or substitutions) required to change one word into another.
#[allow(clippy::needless_range_loop)]
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    for i in 0..=len1 {
        matrix[i][0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] {
                0
            } else {
                1
            };

            matrix[i][j] = min(
                min(
                    matrix[i - 1][j] + 1, // deletion
                    matrix[i][j - 1] + 1, // insertion
                ),
                matrix[i - 1][j - 1] + cost, // substitution
            );
        }
    }

    matrix[len1][len2]
}

/// Similarity ratio in [0, 1] derived from edit distance.
pub fn similarity_ratio(s1: &str, s2: &str) -> f32 {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();
    let max_len = len1.max(len2);
    if max_len == 0 {
        return 1.0;
    }

    let distance = levenshtein_distance(s1, s2);
    1.0 - (distance as f32 / max_len as f32)
}

/// Optional fuzzy-matching capability consumed by the relevance scorer.
pub trait FuzzyMatcher: Send + Sync {
    /// Whether fuzzy matching can currently be used.
    fn is_available(&self) -> bool {
        true
    }

    /// Best partial similarity ratio between a query and a candidate text.
    fn partial_ratio(&self, query: &str, text: &str) -> f32;
}

/// Levenshtein-backed fuzzy matcher.
///
/// The partial ratio is the best similarity between the query and any
/// query-length window of words in the candidate text, so a short query can
/// still score highly against a long product name.
#[derive(Debug, Default)]
pub struct LevenshteinMatcher;

impl LevenshteinMatcher {
    /// Create a new Levenshtein matcher.
    pub fn new() -> Self {
        Self
    }
}

impl FuzzyMatcher for LevenshteinMatcher {
    fn partial_ratio(&self, query: &str, text: &str) -> f32 {
        let query = query.to_lowercase();
        let text = text.to_lowercase();

        if query.is_empty() || text.is_empty() {
            return 0.0;
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let query_words = query.split_whitespace().count().max(1);

        if words.is_empty() {
            return similarity_ratio(&query, &text);
        }

        let mut best = similarity_ratio(&query, &text);
        let window = query_words.min(words.len());
        for chunk in words.windows(window) {
            let candidate = chunk.join(" ");
            best = best.max(similarity_ratio(&query, &candidate));
        }
        best
    }
}
