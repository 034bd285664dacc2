//! Token-set Jaccard similarity

use super::{DocumentPair, OmissionReason, ScoringContext};
use std::collections::HashSet;
use std::hash::Hash;

/// `|A ∩ B| / |A ∪ B|`, 0 when both sets are empty.
pub fn set_similarity<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    // Iterate the smaller set for the intersection
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Jaccard over the deduplicated tokens of two texts
pub fn similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<String> = crate::text::tokenize(a).into_iter().collect();
    let set_b: HashSet<String> = crate::text::tokenize(b).into_iter().collect();
    set_similarity(&set_a, &set_b)
}

pub(crate) fn score(pair: &DocumentPair<'_>, _ctx: &ScoringContext<'_>) -> Result<f64, OmissionReason> {
    Ok(set_similarity(&pair.a.token_set, &pair.b.token_set))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_is_one() {
        assert_eq!(similarity("alpha beta gamma", "gamma beta alpha"), 1.0);
    }

    #[test]
    fn test_disjoint_is_zero() {
        assert_eq!(similarity("hello world", "completely unrelated text sample"), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // {alpha, beta, gamma} vs {beta, gamma, delta}: 2 / 4
        let sim = similarity("alpha beta gamma", "beta gamma delta");
        assert!((sim - 0.5).abs() < 1e-12, "got {}", sim);
    }

    #[test]
    fn test_duplicates_do_not_count_twice() {
        assert_eq!(similarity("alpha alpha alpha", "alpha"), 1.0);
    }

    #[test]
    fn test_empty_union_is_zero() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("a b", "c d"), 0.0);
        assert_eq!(similarity("", "something"), 0.0);
    }
}
