//! Similarity - Word overlap between two texts
//!
//! A rough bag-of-words heuristic used by deduplication. It says nothing
//! about semantic equivalence; replace it with something better when one is
//! available, but keep the threshold and tie-break order in the store.

use std::collections::HashSet;

/// Two entries scoring above this are considered duplicates
pub const DUPLICATE_THRESHOLD: f64 = 0.85;

/// Overlap score in 0.0-1.0
///
/// Case-insensitive. Identical texts score 1.0; otherwise the number of
/// tokens of `b` found in `a` (repeats counted) over the longer token count.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    if a == b {
        return 1.0;
    }

    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let known: HashSet<&str> = tokens_a.iter().copied().collect();
    let overlap = tokens_b.iter().filter(|t| known.contains(*t)).count();

    overlap as f64 / tokens_a.len().max(tokens_b.len()) as f64
}

/// True when `similarity(a, b)` exceeds [`DUPLICATE_THRESHOLD`]
pub fn is_duplicate(a: &str, b: &str) -> bool {
    similarity(a, b) > DUPLICATE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_ignoring_case() {
        assert_eq!(similarity("Use Swift Testing", "use swift testing"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_empty_side() {
        assert_eq!(similarity("words here", ""), 0.0);
        assert_eq!(similarity("   ", "words"), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // 3 of 4 tokens of b appear in a; longer list has 4
        assert_eq!(similarity("a b c d", "a b c x"), 0.75);
        // Whitespace differences only
        assert_eq!(similarity("a  b\tc", "a b c"), 1.0);
    }

    #[test]
    fn test_repeats_are_counted() {
        // b's tokens: a, a, a -> all three found in a's set; max len is 3
        assert_eq!(similarity("a b c", "a a a"), 1.0);
        // Not symmetric
        assert!((similarity("a a a", "a b c") - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_strict() {
        // 17 of 20 = 0.85 exactly: not a duplicate
        let a: Vec<String> = (0..20).map(|i| format!("w{}", i)).collect();
        let mut b = a.clone();
        for (i, token) in b.iter_mut().enumerate().take(3) {
            *token = format!("other{}", i);
        }
        let a = a.join(" ");
        let b = b.join(" ");
        assert!((similarity(&a, &b) - 0.85).abs() < 1e-9);
        assert!(!is_duplicate(&a, &b));

        assert!(is_duplicate("one two three", "ONE two three"));
    }
}
