//! TF-IDF cosine similarity over a two-document corpus
//!
//! IDF is smoothed (`ln((1 + N) / (1 + df)) + 1`, N = 2) so a term shared by
//! both documents keeps a positive weight. Without smoothing every shared term
//! would weigh zero and two identical documents would score 0.

use super::{DocumentPair, OmissionReason, ScoringContext};
use std::collections::BTreeMap;

const CORPUS_SIZE: f64 = 2.0;

fn term_frequencies(tokens: &[String]) -> BTreeMap<&str, usize> {
    let mut tf = BTreeMap::new();
    for token in tokens {
        *tf.entry(token.as_str()).or_insert(0) += 1;
    }
    tf
}

fn idf(document_frequency: usize) -> f64 {
    ((1.0 + CORPUS_SIZE) / (1.0 + document_frequency as f64)).ln() + 1.0
}

/// Cosine of the TF-IDF vectors of two token sequences.
///
/// The vocabulary is walked in sorted order so the floating point sums are
/// the same whichever side is passed first.
pub fn token_similarity(a: &[String], b: &[String]) -> f64 {
    let tf_a = term_frequencies(a);
    let tf_b = term_frequencies(b);

    let mut vocabulary: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (term, count) in &tf_a {
        vocabulary.entry(*term).or_default().0 = *count;
    }
    for (term, count) in &tf_b {
        vocabulary.entry(*term).or_default().1 = *count;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (count_a, count_b) in vocabulary.values() {
        let df = usize::from(*count_a > 0) + usize::from(*count_b > 0);
        let weight = idf(df);
        let wa = *count_a as f64 * weight;
        let wb = *count_b as f64 * weight;
        dot += wa * wb;
        norm_a += wa * wa;
        norm_b += wb * wb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b).sqrt()).clamp(0.0, 1.0)
}

/// TF-IDF cosine of two raw texts
pub fn similarity(a: &str, b: &str) -> f64 {
    token_similarity(&crate::text::tokenize(a), &crate::text::tokenize(b))
}

pub(crate) fn score(pair: &DocumentPair<'_>, _ctx: &ScoringContext<'_>) -> Result<f64, OmissionReason> {
    Ok(token_similarity(&pair.a.tokens, &pair.b.tokens))
}
