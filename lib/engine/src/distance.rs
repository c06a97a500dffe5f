//! Field-level similarity helpers used by the rule-based scorer.

use std::collections::BTreeSet;

/// Exact, case-sensitive comparison. Two absent values are equal.
#[inline]
pub fn categorical_match(a: Option<&str>, b: Option<&str>) -> bool {
    a == b
}

/// Jaccard index `|a ∩ b| / |a ∪ b|`. Zero when either set is empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

/// Round to one decimal place, the precision scores are reported with.
#[inline]
pub fn round_score(score: f32) -> f32 {
    (score * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_categorical_match() {
        assert!(categorical_match(Some("CS"), Some("CS")));
        assert!(!categorical_match(Some("CS"), Some("cs")));
        assert!(!categorical_match(Some("CS"), Some("EE")));
        assert!(categorical_match(None, None));
        assert!(!categorical_match(Some("CS"), None));
        assert!(!categorical_match(None, Some("CS")));
    }

    #[test]
    fn test_jaccard() {
        let a = set(&["ai", "music"]);
        let b = set(&["ai", "sports"]);
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(jaccard(&a, &a), 1.0);
        assert_eq!(jaccard(&a, &set(&[])), 0.0);
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn test_round_score() {
        assert!((round_score(93.333_33) - 93.3).abs() < 1e-4);
        assert!((round_score(30.04) - 30.0).abs() < 1e-4);
        assert!((round_score(95.0) - 95.0).abs() < 1e-4);
    }
}
