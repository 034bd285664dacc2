//! Detection — the algorithm suite and its registry
//!
//! Each scorer is a plain function `(pair, context) -> Result<score, omission>`
//! listed in [`REGISTRY`]. The engine walks the registry in parallel; a scorer
//! that cannot run for a pair reports an [`OmissionReason`] and is left out of
//! the [`AlgorithmScores`] map instead of contributing a zero.

pub mod jaccard;
pub mod cosine;
pub mod levenshtein;
pub mod lcs;
pub mod winnowing;
pub mod structural;
pub mod semantic;

use crate::policy::PolicyConfig;
use crate::text::Document;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use structural::StructuralFingerprinter;
use semantic::EmbeddingProvider;

// ─── Algorithm Taxonomy ─────────────────────────────────────────────

/// Every similarity algorithm the engine knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Token-set intersection over union
    Jaccard,
    /// TF-IDF weighted cosine
    Cosine,
    /// Character edit distance over normalized text
    Levenshtein,
    /// Longest common token subsequence
    Lcs,
    /// Winnowed k-gram fingerprint overlap
    Winnowing,
    /// Structural fingerprint overlap (needs a fingerprinter)
    Structural,
    /// Embedding cosine (needs an embedding provider)
    Semantic,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::Jaccard,
        Algorithm::Cosine,
        Algorithm::Levenshtein,
        Algorithm::Lcs,
        Algorithm::Winnowing,
        Algorithm::Structural,
        Algorithm::Semantic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jaccard => "jaccard",
            Self::Cosine => "cosine",
            Self::Levenshtein => "levenshtein",
            Self::Lcs => "lcs",
            Self::Winnowing => "winnowing",
            Self::Structural => "structural",
            Self::Semantic => "semantic",
        }
    }

    /// Optional algorithms depend on an external collaborator
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Structural | Self::Semantic)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| format!("unknown algorithm '{}'", s))
    }
}

// ─── Scores & Omissions ─────────────────────────────────────────────

/// Algorithm name → score in [0,1]; absent entries were not computed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlgorithmScores(BTreeMap<Algorithm, f64>);

impl AlgorithmScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a score, clamped into [0,1]. Non-finite scores are dropped.
    pub fn insert(&mut self, algorithm: Algorithm, score: f64) {
        if score.is_finite() {
            self.0.insert(algorithm, score.clamp(0.0, 1.0));
        }
    }

    pub fn get(&self, algorithm: Algorithm) -> Option<f64> {
        self.0.get(&algorithm).copied()
    }

    pub fn remove(&mut self, algorithm: Algorithm) -> Option<f64> {
        self.0.remove(&algorithm)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Algorithm, f64)> + '_ {
        self.0.iter().map(|(a, s)| (*a, *s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Algorithm, f64)> for AlgorithmScores {
    fn from_iter<I: IntoIterator<Item = (Algorithm, f64)>>(iter: I) -> Self {
        let mut scores = Self::new();
        for (algorithm, score) in iter {
            scores.insert(algorithm, score);
        }
        scores
    }
}

/// Why an algorithm has no entry in [`AlgorithmScores`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OmissionReason {
    /// Excluded or zero-weighted by policy
    Disabled,
    /// Collaborator missing or unable to handle this pair
    Unavailable { reason: String },
    /// Document longer than the ceiling for quadratic algorithms
    ComputationOverflow { length: usize, ceiling: usize },
}

impl OmissionReason {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }
}

impl std::fmt::Display for OmissionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled by policy"),
            Self::Unavailable { reason } => write!(f, "unavailable: {}", reason),
            Self::ComputationOverflow { length, ceiling } => write!(
                f,
                "document length {} exceeds ceiling {}",
                length, ceiling
            ),
        }
    }
}

// ─── Registry ───────────────────────────────────────────────────────

/// The two documents being compared
#[derive(Debug, Clone, Copy)]
pub struct DocumentPair<'a> {
    pub a: &'a Document,
    pub b: &'a Document,
}

impl<'a> DocumentPair<'a> {
    pub fn new(a: &'a Document, b: &'a Document) -> Self {
        Self { a, b }
    }

    /// Longer of the two normalized lengths, in characters
    pub fn max_char_len(&self) -> usize {
        self.a.char_len.max(self.b.char_len)
    }

    pub fn is_identical(&self) -> bool {
        self.a.digest == self.b.digest
    }
}

/// Read-only inputs shared by every scorer for one comparison
#[derive(Clone, Copy)]
pub struct ScoringContext<'a> {
    pub config: &'a PolicyConfig,
    pub structural: Option<&'a dyn StructuralFingerprinter>,
    pub embeddings: Option<&'a dyn EmbeddingProvider>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(config: &'a PolicyConfig) -> Self {
        Self {
            config,
            structural: None,
            embeddings: None,
        }
    }
}

/// Time complexity class of a scorer in document length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cost {
    Linear,
    /// O(n·m); subject to `max_document_chars`
    Quadratic,
}

pub type ScoreFn = fn(&DocumentPair<'_>, &ScoringContext<'_>) -> Result<f64, OmissionReason>;

/// One named scorer in the registry
#[derive(Clone, Copy)]
pub struct ScorerEntry {
    pub algorithm: Algorithm,
    pub cost: Cost,
    pub score: ScoreFn,
}

pub static REGISTRY: &[ScorerEntry] = &[
    ScorerEntry { algorithm: Algorithm::Jaccard, cost: Cost::Linear, score: jaccard::score },
    ScorerEntry { algorithm: Algorithm::Cosine, cost: Cost::Linear, score: cosine::score },
    ScorerEntry { algorithm: Algorithm::Levenshtein, cost: Cost::Quadratic, score: levenshtein::score },
    ScorerEntry { algorithm: Algorithm::Lcs, cost: Cost::Quadratic, score: lcs::score },
    ScorerEntry { algorithm: Algorithm::Winnowing, cost: Cost::Linear, score: winnowing::score },
    ScorerEntry { algorithm: Algorithm::Structural, cost: Cost::Linear, score: structural::score },
    ScorerEntry { algorithm: Algorithm::Semantic, cost: Cost::Linear, score: semantic::score },
];

/// Run a single registry entry, applying policy and the size ceiling
pub fn run_entry(
    entry: &ScorerEntry,
    pair: &DocumentPair<'_>,
    ctx: &ScoringContext<'_>,
) -> Result<f64, OmissionReason> {
    if !ctx.config.is_enabled(entry.algorithm) {
        return Err(OmissionReason::Disabled);
    }

    if entry.cost == Cost::Quadratic {
        // Identical normalized text needs no DP table
        if pair.is_identical() {
            return Ok(1.0);
        }
        let length = pair.max_char_len();
        let ceiling = ctx.config.max_document_chars;
        if length > ceiling {
            return Err(OmissionReason::ComputationOverflow { length, ceiling });
        }
    }

    (entry.score)(pair, ctx)
}

/// Evaluate the whole registry in parallel.
///
/// Returns the available scores and, for every other algorithm, the reason
/// it was left out.
pub fn evaluate(
    pair: &DocumentPair<'_>,
    ctx: &ScoringContext<'_>,
) -> (AlgorithmScores, BTreeMap<Algorithm, OmissionReason>) {
    let outcomes: Vec<(Algorithm, Result<f64, OmissionReason>)> = REGISTRY
        .par_iter()
        .map(|entry| (entry.algorithm, run_entry(entry, pair, ctx)))
        .collect();

    let mut scores = AlgorithmScores::new();
    let mut omitted = BTreeMap::new();
    for (algorithm, outcome) in outcomes {
        match outcome {
            Ok(score) if score.is_finite() => scores.insert(algorithm, score),
            Ok(_) => {
                omitted.insert(algorithm, OmissionReason::unavailable("non-finite score"));
            }
            Err(reason) => {
                omitted.insert(algorithm, reason);
            }
        }
    }

    (scores, omitted)
}

// ─── Tests ──────────────────────────────────────────────────────────
