//! Ordered `(lower_bound, value)` tables
//!
//! The token-overlap threshold and the similarity buckets are both small
//! step functions over a score in [0,1]. Rows are kept in strictly
//! descending order of lower bound and the first row whose bound the score
//! reaches wins.

use crate::{VeritextError, VeritextResult};
use serde::{Deserialize, Serialize};

// ─── Token Threshold Table ──────────────────────────────────────────

/// Pairs whose overall score reaches `min_score` use `threshold` for
/// token-overlap line matching
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRow {
    pub min_score: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable(Vec<ThresholdRow>);

impl ThresholdTable {
    pub fn new(rows: Vec<ThresholdRow>) -> Self {
        Self(rows)
    }

    pub fn rows(&self) -> &[ThresholdRow] {
        &self.0
    }

    /// Token threshold for a pair with this overall score.
    ///
    /// Scores below every bound fall through to the last row.
    pub fn select(&self, overall_score: f64) -> f64 {
        self.0
            .iter()
            .find(|row| overall_score >= row.min_score)
            .or_else(|| self.0.last())
            .map(|row| row.threshold)
            .unwrap_or(1.0)
    }

    pub fn validate(&self) -> VeritextResult<()> {
        let bounds: Vec<f64> = self.0.iter().map(|r| r.min_score).collect();
        check_descending("token_thresholds", &bounds)?;
        for row in &self.0 {
            check_unit("token_thresholds.threshold", row.threshold)?;
        }
        Ok(())
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self(vec![
            ThresholdRow { min_score: 0.8, threshold: 0.2 },
            ThresholdRow { min_score: 0.6, threshold: 0.3 },
            ThresholdRow { min_score: 0.4, threshold: 0.4 },
            ThresholdRow { min_score: 0.0, threshold: 0.5 },
        ])
    }
}

// ─── Similarity Buckets ─────────────────────────────────────────────

/// Display category of a line similarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityBucket {
    Exact,
    High,
    Medium,
    Low,
    None,
}

impl SimilarityBucket {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for SimilarityBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketRow {
    pub min_similarity: f64,
    pub bucket: SimilarityBucket,
}

/// Explicit bucket bounds. Exactly 0 is always `None`; anything positive
/// below the lowest bound is `Low`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketTable(Vec<BucketRow>);

impl BucketTable {
    pub fn new(rows: Vec<BucketRow>) -> Self {
        Self(rows)
    }

    pub fn rows(&self) -> &[BucketRow] {
        &self.0
    }

    pub fn classify(&self, similarity: f64) -> SimilarityBucket {
        if !(similarity > 0.0) {
            return SimilarityBucket::None;
        }
        self.0
            .iter()
            .find(|row| similarity >= row.min_similarity)
            .map(|row| row.bucket)
            .unwrap_or(SimilarityBucket::Low)
    }

    pub fn validate(&self) -> VeritextResult<()> {
        let bounds: Vec<f64> = self.0.iter().map(|r| r.min_similarity).collect();
        check_descending("buckets", &bounds)?;
        if let Some(row) = self.0.iter().find(|r| r.bucket == SimilarityBucket::None) {
            return Err(VeritextError::InvalidConfig(format!(
                "buckets: 'none' is reserved for similarity 0 (row at {})",
                row.min_similarity
            )));
        }
        if self.0.iter().any(|r| r.min_similarity <= 0.0) {
            return Err(VeritextError::InvalidConfig(
                "buckets: lower bounds must be above 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BucketTable {
    fn default() -> Self {
        Self(vec![
            BucketRow { min_similarity: 0.9, bucket: SimilarityBucket::Exact },
            BucketRow { min_similarity: 0.7, bucket: SimilarityBucket::High },
            BucketRow { min_similarity: 0.4, bucket: SimilarityBucket::Medium },
        ])
    }
}

// ─── Validation Helpers ─────────────────────────────────────────────

pub(crate) fn check_unit(name: &str, value: f64) -> VeritextResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(VeritextError::InvalidConfig(format!(
            "{} must be within [0,1], got {}",
            name, value
        )))
    }
}

fn check_descending(name: &str, bounds: &[f64]) -> VeritextResult<()> {
    if bounds.is_empty() {
        return Err(VeritextError::InvalidConfig(format!("{} table is empty", name)));
    }
    for &bound in bounds {
        check_unit(name, bound)?;
    }
    if bounds.windows(2).any(|w| w[0] <= w[1]) {
        return Err(VeritextError::InvalidConfig(format!(
            "{} rows must be strictly descending by lower bound",
            name
        )));
    }
    Ok(())
}
