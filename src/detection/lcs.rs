//! Longest common subsequence over token sequences

use super::{DocumentPair, OmissionReason, ScoringContext};

/// Length of the longest common subsequence of two sequences
pub fn lcs_length<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let n = short.len();
    if n == 0 {
        return 0;
    }

    let mut prev = vec![0usize; n + 1];
    let mut curr = vec![0usize; n + 1];
    for item in long {
        for j in 1..=n {
            curr[j] = if *item == short[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// LCS length divided by the longer sequence; 1.0 when both are empty.
pub fn sequence_similarity<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    lcs_length(a, b) as f64 / longest as f64
}

/// Token-level LCS similarity of two raw texts
pub fn similarity(a: &str, b: &str) -> f64 {
    sequence_similarity(&crate::text::tokenize(a), &crate::text::tokenize(b))
}

pub(crate) fn score(pair: &DocumentPair<'_>, _ctx: &ScoringContext<'_>) -> Result<f64, OmissionReason> {
    Ok(sequence_similarity(&pair.a.tokens, &pair.b.tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcs_length_chars() {
        let a: Vec<char> = "ABCBDAB".chars().collect();
        let b: Vec<char> = "BDCABA".chars().collect();
        assert_eq!(lcs_length(&a, &b), 4);
    }

    #[test]
    fn test_lcs_respects_order() {
        assert_eq!(similarity("alpha beta gamma", "gamma beta alpha"), 1.0 / 3.0);
    }

    #[test]
    fn test_insertion_keeps_subsequence() {
        // 4 of 5 tokens form the common subsequence
        let sim = similarity("open file read lines", "open file then read lines");
        assert!((sim - 0.8).abs() < 1e-12, "got {}", sim);
    }

    #[test]
    fn test_empty_boundaries() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("", "some tokens here"), 0.0);
    }
}
