//! Segment matching — aligned line spans between two submissions
//!
//! Two phases over every pair of non-blank lines:
//!
//! 1. **Direct**: normalized lines that are identical (1.0) or where one
//!    contains the other (`min(len) / max(len)`), admitted at the direct
//!    threshold
//! 2. **Token overlap**: pairs phase 1 did not admit, scored by token-set
//!    Jaccard and admitted at the dynamic threshold picked from the pair's
//!    overall score
//!
//! Each `(line_a, line_b)` pair is admitted at most once. Diagonal runs of
//! admitted pairs are then coalesced into multi-line segments.

use crate::detection::jaccard;
use crate::policy::PolicyConfig;
use crate::text::{Document, Line};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Types ──────────────────────────────────────────────────────────

/// A run of lines in one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// 1-based, inclusive
    pub start_line: usize,
    /// 1-based, inclusive
    pub end_line: usize,
    /// Byte offset of the first character
    pub start_offset: usize,
    /// Byte offset one past the last character of `end_line`
    pub end_offset: usize,
}

impl Span {
    fn from_lines(doc: &Document, start_line: usize, end_line: usize) -> Option<Self> {
        let first = doc.line(start_line)?;
        let last = doc.line(end_line)?;
        Some(Self {
            start_line,
            end_line,
            start_offset: first.start_offset,
            end_offset: last.end_offset,
        })
    }

    pub fn line_count(&self) -> usize {
        self.end_line + 1 - self.start_line
    }

    /// The span's raw text, terminators between lines included
    pub fn text<'a>(&self, content: &'a str) -> Option<&'a str> {
        content.get(self.start_offset..self.end_offset)
    }
}

/// Which phase admitted the lines of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Direct,
    TokenOverlap,
    /// Coalesced run containing both kinds
    Mixed,
}

/// Aligned spans with their similarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSegment {
    pub a: Span,
    pub b: Span,
    /// Mean similarity of the line pairs in the segment
    pub similarity: f64,
    pub kind: MatchKind,
    /// Number of admitted line pairs the segment was built from
    pub line_pairs: usize,
}

/// One admitted `(line_a, line_b)` pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePair {
    pub line_a: usize,
    pub line_b: usize,
    pub similarity: f64,
    pub kind: MatchKind,
}

/// Thresholds for one pair's segment matching
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentOptions {
    pub direct_threshold: f64,
    pub token_threshold: f64,
    pub coalesce: bool,
}

impl SegmentOptions {
    /// Options for a pair with the given overall score
    pub fn for_score(config: &PolicyConfig, overall_score: f64) -> Self {
        Self {
            direct_threshold: config.direct_line_threshold,
            token_threshold: config.token_thresholds.select(overall_score),
            coalesce: config.coalesce_segments,
        }
    }
}

// ─── Line Similarity ────────────────────────────────────────────────

/// Exact-or-containment similarity of two normalized lines.
///
/// Identical lines score 1.0, a line contained in the other scores the ratio
/// of their character lengths, anything else 0. Empty lines never match.
pub fn line_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(b) || b.contains(a) {
        let len_a = a.chars().count();
        let len_b = b.chars().count();
        return len_a.min(len_b) as f64 / len_a.max(len_b) as f64;
    }
    0.0
}

/// Both similarity measures for one pair of lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineComparison {
    pub direct: f64,
    pub token: f64,
}

impl LineComparison {
    /// Direct similarity, raised to the token overlap when that reaches
    /// `token_threshold`
    pub fn similarity(&self, token_threshold: f64) -> f64 {
        if self.token >= token_threshold {
            self.direct.max(self.token)
        } else {
            self.direct
        }
    }
}

pub fn compare_lines(a: &Line, b: &Line) -> LineComparison {
    let token = if a.tokens.is_empty() || b.tokens.is_empty() {
        0.0
    } else {
        jaccard::set_similarity(&a.tokens, &b.tokens)
    };
    LineComparison {
        direct: line_similarity(&a.normalized, &b.normalized),
        token,
    }
}

// ─── Matching ───────────────────────────────────────────────────────

/// Every admitted line pair, ordered by `(line_a, line_b)`
pub fn match_line_pairs(a: &Document, b: &Document, options: &SegmentOptions) -> Vec<LinePair> {
    let mut pairs = Vec::new();

    for line_a in a.lines.iter().filter(|l| !l.is_blank()) {
        for line_b in b.lines.iter().filter(|l| !l.is_blank()) {
            let cmp = compare_lines(line_a, line_b);

            let kind = if cmp.direct > 0.0 && cmp.direct >= options.direct_threshold {
                MatchKind::Direct
            } else if cmp.token > 0.0 && cmp.token >= options.token_threshold {
                MatchKind::TokenOverlap
            } else {
                continue;
            };

            pairs.push(LinePair {
                line_a: line_a.number,
                line_b: line_b.number,
                similarity: cmp.similarity(options.token_threshold),
                kind,
            });
        }
    }

    pairs
}

/// Matched segments between `a` and `b`, sorted by start line in `a` then `b`
pub fn match_segments(a: &Document, b: &Document, options: &SegmentOptions) -> Vec<MatchedSegment> {
    let pairs = match_line_pairs(a, b, options);
    let runs = if options.coalesce {
        diagonal_runs(&pairs)
    } else {
        pairs.iter().map(|p| vec![*p]).collect()
    };

    let mut segments: Vec<MatchedSegment> = runs
        .iter()
        .filter_map(|run| build_segment(a, b, run))
        .collect();
    segments.sort_by_key(|s| (s.a.start_line, s.b.start_line));
    segments
}

/// Group pairs `(i, j), (i+1, j+1), …` into runs. Each pair joins exactly
/// one run.
fn diagonal_runs(pairs: &[LinePair]) -> Vec<Vec<LinePair>> {
    let mut runs: Vec<Vec<LinePair>> = Vec::new();
    let mut run_of: HashMap<(usize, usize), usize> = HashMap::new();

    for pair in pairs {
        let previous = (pair.line_a.wrapping_sub(1), pair.line_b.wrapping_sub(1));
        let run = match run_of.get(&previous) {
            Some(&idx) => {
                runs[idx].push(*pair);
                idx
            }
            None => {
                runs.push(vec![*pair]);
                runs.len() - 1
            }
        };
        run_of.insert((pair.line_a, pair.line_b), run);
    }

    runs
}

fn build_segment(a: &Document, b: &Document, run: &[LinePair]) -> Option<MatchedSegment> {
    let first = run.first()?;
    let last = run.last()?;

    let kind = if run.iter().all(|p| p.kind == first.kind) {
        first.kind
    } else {
        MatchKind::Mixed
    };
    let similarity = run.iter().map(|p| p.similarity).sum::<f64>() / run.len() as f64;

    Some(MatchedSegment {
        a: Span::from_lines(a, first.line_a, last.line_a)?,
        b: Span::from_lines(b, first.line_b, last.line_b)?,
        similarity: similarity.clamp(0.0, 1.0),
        kind,
        line_pairs: run.len(),
    })
}
