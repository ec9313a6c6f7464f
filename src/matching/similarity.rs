use strsim::normalized_levenshtein;

/// Similarity of two canonical names in [0, 1]: the normalized edit-distance
/// ratio `1 - distance / max(len)`, with 1.0 for two empty strings. Symmetric
/// in its arguments. Purely character-level; no token weighting.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_names_score_one() {
        assert_eq!(similarity("milk 3", "milk 3"), 1.0);
    }

    #[test]
    fn both_empty_score_one() {
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn case_is_folded() {
        assert_eq!(similarity("Milk", "mILK"), 1.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [("milk 3", "milk 1"), ("חלב 3", "חלב טרי 3"), ("a", "")];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn known_ratio() {
        // One substitution over length four.
        assert!((similarity("abcd", "abce") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn disjoint_names_score_low() {
        assert!(similarity("milk", "shampoo") < 0.3);
    }
}
