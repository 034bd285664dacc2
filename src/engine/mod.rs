//! # Comparison Engine
//!
//! - `segments` — direct and token-overlap line matching, coalesced spans
//! - `lines` — per-line records against the opposing submission
//! - `scoring` — weighted mean aggregation and the flag decision
//! - `analytics` — distributions, heatmaps, summary counts
//! - `batch` — all-pairs driver on a bounded worker pool

pub mod segments;
pub mod lines;
pub mod scoring;
pub mod analytics;
pub mod batch;

use crate::detection::semantic::EmbeddingProvider;
use crate::detection::structural::StructuralFingerprinter;
use crate::detection::{self, Algorithm, AlgorithmScores, DocumentPair, OmissionReason, ScoringContext};
use crate::policy::PolicyConfig;
use crate::text::Document;
use crate::VeritextResult;
use analytics::{ComparisonDetail, SideDetail};
use chrono::{DateTime, Utc};
use lines::LineMatchRecord;
use segments::{MatchedSegment, SegmentOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Inputs ─────────────────────────────────────────────────────────

/// A submission as supplied by storage; never mutated by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub author: String,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(id: impl Into<String>, author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            content: content.into(),
            submitted_at: Utc::now(),
        }
    }

    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }
}

/// A submission normalized once for any number of comparisons
#[derive(Debug, Clone)]
pub struct PreparedSubmission<'a> {
    pub submission: &'a Submission,
    pub document: Document,
}

// ─── Output ─────────────────────────────────────────────────────────

/// Result of comparing one pair of submissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlagiarismMatch {
    pub submission_a: String,
    pub submission_b: String,
    pub author_a: String,
    pub author_b: String,
    pub overall_score: f64,
    pub scores: AlgorithmScores,
    /// Algorithms with no score for this pair, and why
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub omitted: BTreeMap<Algorithm, OmissionReason>,
    pub segments: Vec<MatchedSegment>,
    pub flagged: bool,
    /// Token-overlap threshold selected from `overall_score`
    pub token_threshold: f64,
}

impl PlagiarismMatch {
    /// Sorted pair of ids, used for stable ordering and lookups
    pub fn pair_key(&self) -> (&str, &str) {
        if self.submission_a <= self.submission_b {
            (&self.submission_a, &self.submission_b)
        } else {
            (&self.submission_b, &self.submission_a)
        }
    }
}

// ─── Engine ─────────────────────────────────────────────────────────

/// Pairwise comparison engine. Holds a validated policy and the optional
/// collaborators; comparisons never mutate it, so one engine is shared
/// across worker threads.
pub struct ComparisonEngine {
    config: PolicyConfig,
    structural: Option<Box<dyn StructuralFingerprinter>>,
    embeddings: Option<Box<dyn EmbeddingProvider>>,
}

impl ComparisonEngine {
    pub fn new(config: PolicyConfig) -> VeritextResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            structural: None,
            embeddings: None,
        })
    }

    pub fn with_structural(mut self, fingerprinter: impl StructuralFingerprinter + 'static) -> Self {
        self.structural = Some(Box::new(fingerprinter));
        self
    }

    pub fn with_embeddings(mut self, provider: impl EmbeddingProvider + 'static) -> Self {
        self.embeddings = Some(Box::new(provider));
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    fn scoring_context(&self) -> ScoringContext<'_> {
        ScoringContext {
            config: &self.config,
            structural: self.structural.as_deref(),
            embeddings: self.embeddings.as_deref(),
        }
    }

    pub fn prepare<'a>(&self, submission: &'a Submission) -> PreparedSubmission<'a> {
        PreparedSubmission {
            submission,
            document: Document::from_text(&submission.content),
        }
    }

    pub fn compare(&self, a: &Submission, b: &Submission) -> PlagiarismMatch {
        self.compare_prepared(&self.prepare(a), &self.prepare(b))
    }

    /// Score, aggregate and segment one prepared pair
    pub fn compare_prepared(&self, a: &PreparedSubmission<'_>, b: &PreparedSubmission<'_>) -> PlagiarismMatch {
        let pair = DocumentPair::new(&a.document, &b.document);
        let (scores, omitted) = detection::evaluate(&pair, &self.scoring_context());

        for (algorithm, reason) in &omitted {
            let collaborator_failed = matches!(reason, OmissionReason::Unavailable { .. })
                && (!algorithm.is_optional()
                    || match algorithm {
                        Algorithm::Structural => self.structural.is_some(),
                        _ => self.embeddings.is_some(),
                    });
            if collaborator_failed {
                tracing::warn!(
                    "{} omitted for {} ↔ {}: {}",
                    algorithm,
                    a.submission.id,
                    b.submission.id,
                    reason
                );
            }
        }

        let overall_score = scoring::aggregate(&scores, &self.config);
        let options = SegmentOptions::for_score(&self.config, overall_score);
        let segments = segments::match_segments(&a.document, &b.document, &options);
        let flagged = scoring::is_flagged(overall_score, &self.config);

        tracing::debug!(
            "{} ↔ {}: overall {:.3} ({} scores, {} omitted, {} segments){}",
            a.submission.id,
            b.submission.id,
            overall_score,
            scores.len(),
            omitted.len(),
            segments.len(),
            if flagged { " FLAGGED" } else { "" }
        );

        PlagiarismMatch {
            submission_a: a.submission.id.clone(),
            submission_b: b.submission.id.clone(),
            author_a: a.submission.author.clone(),
            author_b: b.submission.author.clone(),
            overall_score,
            scores,
            omitted,
            segments,
            flagged,
            token_threshold: options.token_threshold,
        }
    }

    /// Per-line records of `this` against `other` for a pair with this overall score
    pub fn classify_lines(
        &self,
        this: &PreparedSubmission<'_>,
        other: &PreparedSubmission<'_>,
        overall_score: f64,
    ) -> Vec<LineMatchRecord> {
        lines::classify_lines(&this.document, &other.document, overall_score, &self.config)
    }

    /// Compare and build the line-level detail for both sides
    pub fn compare_detailed(&self, a: &Submission, b: &Submission) -> (PlagiarismMatch, ComparisonDetail) {
        let prepared_a = self.prepare(a);
        let prepared_b = self.prepare(b);
        let result = self.compare_prepared(&prepared_a, &prepared_b);

        let records_a = self.classify_lines(&prepared_a, &prepared_b, result.overall_score);
        let records_b = self.classify_lines(&prepared_b, &prepared_a, result.overall_score);
        let detail = ComparisonDetail {
            a: SideDetail::new(&a.id, records_a),
            b: SideDetail::new(&b.id, records_b),
            segments: result.segments.clone(),
            token_threshold: result.token_threshold,
        };

        (result, detail)
    }
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self {
            config: PolicyConfig::default(),
            structural: None,
            embeddings: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::structural::KeywordSkeleton;
    use crate::VeritextError;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = PolicyConfig {
            kgram_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            ComparisonEngine::new(config),
            Err(VeritextError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_flag_matches_threshold() {
        let engine = ComparisonEngine::default();
        let a = Submission::new("a", "alice", "the quick brown fox jumps over the lazy dog");
        let b = Submission::new("b", "bob", "the quick brown fox jumps over the lazy dog");
        let result = engine.compare(&a, &b);
        assert_eq!(result.flagged, result.overall_score >= engine.config().flag_threshold);
        assert_eq!(result.author_a, "alice");
        assert_eq!(result.author_b, "bob");
    }

    #[test]
    fn test_pair_key_ignores_argument_order() {
        let engine = ComparisonEngine::default();
        let a = Submission::new("zeta", "x", "one two three");
        let b = Submission::new("alpha", "y", "four five six");
        let forward = engine.compare(&a, &b);
        let backward = engine.compare(&b, &a);
        assert_eq!(forward.pair_key(), ("alpha", "zeta"));
        assert_eq!(forward.pair_key(), backward.pair_key());
    }

    #[test]
    fn test_compare_is_deterministic() {
        let engine = ComparisonEngine::default();
        let a = Submission::new("a", "x", "fn main() {\n    let total = sum(values);\n}");
        let b = Submission::new("b", "y", "fn main() {\n    let result = sum(items);\n}");
        assert_eq!(engine.compare(&a, &b), engine.compare(&a, &b));
    }

    #[test]
    fn test_structural_collaborator_scores() {
        let engine = ComparisonEngine::default().with_structural(KeywordSkeleton::default());
        let a = Submission::new("a", "x", "for item in list {\n    if item { return item; }\n}");
        let b = Submission::new("b", "y", "for entry in rows {\n    if entry { return entry; }\n}");
        let result = engine.compare(&a, &b);
        assert_eq!(result.scores.get(Algorithm::Structural), Some(1.0));
        assert!(!result.omitted.contains_key(&Algorithm::Structural));
    }

    #[test]
    fn test_detail_covers_both_sides() {
        let engine = ComparisonEngine::default();
        let a = Submission::new("a", "x", "shared line of text\nonly in first");
        let b = Submission::new("b", "y", "shared line of text\n\nonly the second has this");
        let (result, detail) = engine.compare_detailed(&a, &b);
        assert_eq!(detail.a.records.len(), 2);
        assert_eq!(detail.b.records.len(), 3);
        assert_eq!(detail.a.analytics.distribution.total(), 2);
        assert_eq!(detail.b.analytics.distribution.total(), 3);
        assert_eq!(detail.segments, result.segments);
        assert!(detail.a.records[0].matched);
    }

    #[test]
    fn test_match_serializes_omissions_by_name() {
        let engine = ComparisonEngine::default();
        let a = Submission::new("a", "x", "some text to compare");
        let result = engine.compare(&a, &a);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["omitted"]["semantic"]["kind"], "unavailable");
        assert_eq!(json["scores"]["jaccard"], 1.0);
    }
}
