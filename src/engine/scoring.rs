//! Score aggregation
//!
//! The overall score is the weighted mean of the algorithm scores that were
//! actually computed. An omitted algorithm leaves both the numerator and the
//! denominator, so the scale does not move with the set of algorithms that
//! happened to run. With every weight at 1 this is the arithmetic mean.

use crate::detection::AlgorithmScores;
use crate::policy::PolicyConfig;

/// Overall score in [0,1]; 0 when no algorithm produced a score
pub fn aggregate(scores: &AlgorithmScores, config: &PolicyConfig) -> f64 {
    let mut weighted = 0.0f64;
    let mut total_weight = 0.0f64;

    for (algorithm, score) in scores.iter() {
        let Some(weight) = config.weight(algorithm) else {
            continue;
        };
        weighted += weight * score;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        (weighted / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub fn is_flagged(overall_score: f64, config: &PolicyConfig) -> bool {
    overall_score >= config.flag_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Algorithm;

    fn scores(entries: &[(Algorithm, f64)]) -> AlgorithmScores {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_mean_of_available_scores() {
        let config = PolicyConfig::default();
        let s = scores(&[
            (Algorithm::Jaccard, 0.2),
            (Algorithm::Cosine, 0.4),
            (Algorithm::Lcs, 0.9),
        ]);
        assert!((aggregate(&s, &config) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_omitted_entry_not_treated_as_zero() {
        let config = PolicyConfig::default();
        let full = scores(&[
            (Algorithm::Jaccard, 0.6),
            (Algorithm::Cosine, 0.8),
            (Algorithm::Structural, 0.0),
        ]);
        let mut reduced = full.clone();
        reduced.remove(Algorithm::Structural);

        assert!((aggregate(&reduced, &config) - 0.7).abs() < 1e-12);
        assert!(aggregate(&full, &config) < aggregate(&reduced, &config));
    }

    #[test]
    fn test_weights_shift_the_mean() {
        let mut config = PolicyConfig::default();
        config.algorithms.retain(|s| matches!(s.algorithm, Algorithm::Jaccard | Algorithm::Lcs));
        config.algorithms[0].weight = 3.0;
        let s = scores(&[(Algorithm::Jaccard, 1.0), (Algorithm::Lcs, 0.0)]);
        assert!((aggregate(&s, &config) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_disabled_algorithms_ignored() {
        let mut config = PolicyConfig::default();
        config.set_enabled(Algorithm::Cosine, false);
        let s = scores(&[(Algorithm::Jaccard, 0.4), (Algorithm::Cosine, 1.0)]);
        assert!((aggregate(&s, &config) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_empty_scores() {
        assert_eq!(aggregate(&AlgorithmScores::new(), &PolicyConfig::default()), 0.0);
    }

    #[test]
    fn test_flag_threshold_inclusive() {
        let config = PolicyConfig::default();
        assert!(is_flagged(0.5, &config));
        assert!(!is_flagged(0.4999, &config));
    }
}
