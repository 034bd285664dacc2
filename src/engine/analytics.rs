//! Line analytics — distributions, heatmaps and summary counts
//!
//! Pure aggregation over [`LineMatchRecord`]s; nothing here recomputes a
//! similarity.

use super::lines::LineMatchRecord;
use super::segments::MatchedSegment;
use crate::policy::SimilarityBucket;
use serde::{Deserialize, Serialize};

// ─── Distribution ───────────────────────────────────────────────────

/// Line counts per similarity bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityDistribution {
    pub exact: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub none: usize,
}

impl SimilarityDistribution {
    pub fn total(&self) -> usize {
        self.exact + self.high + self.medium + self.low + self.none
    }

    pub fn count(&self, bucket: SimilarityBucket) -> usize {
        match bucket {
            SimilarityBucket::Exact => self.exact,
            SimilarityBucket::High => self.high,
            SimilarityBucket::Medium => self.medium,
            SimilarityBucket::Low => self.low,
            SimilarityBucket::None => self.none,
        }
    }

    fn add(&mut self, bucket: SimilarityBucket) {
        match bucket {
            SimilarityBucket::Exact => self.exact += 1,
            SimilarityBucket::High => self.high += 1,
            SimilarityBucket::Medium => self.medium += 1,
            SimilarityBucket::Low => self.low += 1,
            SimilarityBucket::None => self.none += 1,
        }
    }
}

pub fn build_distribution(records: &[LineMatchRecord]) -> SimilarityDistribution {
    let mut distribution = SimilarityDistribution::default();
    for record in records {
        distribution.add(record.bucket);
    }
    distribution
}

// ─── Summary ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineAnalytics {
    pub distribution: SimilarityDistribution,
    pub total_lines: usize,
    pub matched_lines: usize,
    /// `matched_lines / total_lines * 100`, 0 for an empty submission
    pub match_percentage: f64,
    pub average_similarity: f64,
}

impl LineAnalytics {
    pub fn from_records(records: &[LineMatchRecord]) -> Self {
        let total_lines = records.len();
        let matched_lines = records.iter().filter(|r| r.matched).count();
        let (match_percentage, average_similarity) = if total_lines == 0 {
            (0.0, 0.0)
        } else {
            let sum: f64 = records.iter().map(|r| r.similarity).sum();
            (
                matched_lines as f64 / total_lines as f64 * 100.0,
                sum / total_lines as f64,
            )
        };

        Self {
            distribution: build_distribution(records),
            total_lines,
            matched_lines,
            match_percentage,
            average_similarity,
        }
    }
}

// ─── Heatmap ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatCell {
    pub line: usize,
    pub similarity: f64,
    pub bucket: SimilarityBucket,
    /// Similarity quantized to 0–255
    pub intensity: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub lines: Vec<HeatCell>,
}

impl Heatmap {
    pub fn from_records(records: &[LineMatchRecord]) -> Self {
        let lines = records
            .iter()
            .map(|r| HeatCell {
                line: r.line,
                similarity: r.similarity,
                bucket: r.bucket,
                intensity: (r.similarity.clamp(0.0, 1.0) * 255.0).round() as u8,
            })
            .collect();
        Self { lines }
    }

    /// Contiguous line ranges at or above `min_similarity`, 1-based inclusive
    pub fn hot_ranges(&self, min_similarity: f64) -> Vec<(usize, usize)> {
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for cell in self.lines.iter().filter(|c| c.similarity > 0.0 && c.similarity >= min_similarity) {
            match ranges.last_mut() {
                Some((_, end)) if *end + 1 == cell.line => *end = cell.line,
                _ => ranges.push((cell.line, cell.line)),
            }
        }
        ranges
    }
}

// ─── Detail ─────────────────────────────────────────────────────────

/// Line-level view of one side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideDetail {
    pub submission_id: String,
    pub records: Vec<LineMatchRecord>,
    pub heatmap: Heatmap,
    pub analytics: LineAnalytics,
}

impl SideDetail {
    pub fn new(submission_id: impl Into<String>, records: Vec<LineMatchRecord>) -> Self {
        Self {
            submission_id: submission_id.into(),
            heatmap: Heatmap::from_records(&records),
            analytics: LineAnalytics::from_records(&records),
            records,
        }
    }
}

/// Everything a renderer needs beyond the match itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDetail {
    pub a: SideDetail,
    pub b: SideDetail,
    pub segments: Vec<MatchedSegment>,
    pub token_threshold: f64,
}
