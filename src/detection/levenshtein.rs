//! Levenshtein edit distance and the similarity derived from it
//!
//! O(n·m) time, O(min) space with two rolling rows. The engine only calls
//! this below `max_document_chars`.

use super::{DocumentPair, OmissionReason, ScoringContext};

/// Minimum number of single-character inserts, deletes and substitutions
/// turning `a` into `b`.
pub fn distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    // Keep the shorter string on the row axis
    let (long, short) = if a_chars.len() >= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };

    let n = short.len();
    if n == 0 {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for (i, lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = usize::from(*lc != short[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// `(max_len - distance) / max_len`, 1.0 for two empty strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let d = distance(a, b);
    (max_len - d) as f64 / max_len as f64
}

pub(crate) fn score(pair: &DocumentPair<'_>, _ctx: &ScoringContext<'_>) -> Result<f64, OmissionReason> {
    Ok(similarity(&pair.a.normalized, &pair.b.normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_distances() {
        assert_eq!(distance("kitten", "sitting"), 3);
        assert_eq!(distance("flaw", "lawn"), 2);
        assert_eq!(distance("", "abc"), 3);
        assert_eq!(distance("abc", ""), 3);
        assert_eq!(distance("same", "same"), 0);
    }

    #[test]
    fn test_distance_counts_chars_not_bytes() {
        assert_eq!(distance("naïve", "naive"), 1);
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("", "abc"), 0.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_renamed_identifiers_stay_similar() {
        let a = crate::text::normalize("def add(a, b):\n    return a + b");
        let b = crate::text::normalize("def add(x, y):\n    return x + y");
        let sim = similarity(&a, &b);
        assert!(sim > 0.8, "renamed identifiers should stay close, got {}", sim);
    }
}
