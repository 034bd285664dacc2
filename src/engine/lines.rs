//! Per-line classification against the opposing submission
//!
//! Every line of the reference submission gets a record, blank lines
//! included, so record counts always equal the submission's line count.

use super::segments::{compare_lines, SegmentOptions};
use crate::policy::{PolicyConfig, SimilarityBucket};
use crate::text::Document;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineMatchRecord {
    /// 1-based line number in the reference submission
    pub line: usize,
    /// Best similarity against any non-blank opposing line
    pub similarity: f64,
    pub matched: bool,
    /// First opposing line reaching `similarity`
    pub best_match_line: Option<usize>,
    pub bucket: SimilarityBucket,
}

/// Classify each line of `this` against `other`.
///
/// `overall_score` selects the token-overlap threshold for the pair.
pub fn classify_lines(
    this: &Document,
    other: &Document,
    overall_score: f64,
    config: &PolicyConfig,
) -> Vec<LineMatchRecord> {
    let options = SegmentOptions::for_score(config, overall_score);
    let opposing: Vec<_> = other.lines.iter().filter(|l| !l.is_blank()).collect();

    this.lines
        .iter()
        .map(|line| {
            let mut best = 0.0f64;
            let mut best_match_line = None;

            if !line.is_blank() {
                for candidate in &opposing {
                    let similarity = compare_lines(line, candidate).similarity(options.token_threshold);
                    if similarity > best {
                        best = similarity;
                        best_match_line = Some(candidate.number);
                    }
                }
            }

            let similarity = best.clamp(0.0, 1.0);
            LineMatchRecord {
                line: line.number,
                similarity,
                matched: similarity > 0.0 && similarity >= options.direct_threshold,
                best_match_line,
                bucket: config.buckets.classify(similarity),
            }
        })
        .collect()
}
