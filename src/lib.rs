//! # veritext — Pairwise Submission Similarity Engine
//!
//! Compares two text or code submissions and produces a multi-algorithm
//! similarity profile, the aligned spans that matched, and per-line
//! analytics (heatmaps, distribution buckets) for whoever renders them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ComparisonEngine                         │
//! │  ┌──────────┐   ┌──────────────────────────────────────┐    │
//! │  │ Document │──▶│  Scorer registry (rayon parallel)    │    │
//! │  │ (text)   │   │  Jaccard │ Cosine │ Levenshtein │    │    │
//! │  └────┬─────┘   │  LCS │ Winnowing │ Structural │ Sem. │    │
//! │       │         └──────────────────┬───────────────────┘    │
//! │       │                            ▼                        │
//! │       │                 Aggregate → overall + flag          │
//! │       │                            │ (threshold table)      │
//! │       ▼                            ▼                        │
//! │  Segment matcher ◀──── dynamic token threshold              │
//! │  Line classifier ──▶ Heatmap ──▶ Line analytics             │
//! └─────────────────────────────────────────────────────────────┘
//!          ▲                                    │
//!     BatchRunner (pairwise, bounded pool) ─────┘──▶ BatchReport
//! ```
//!
//! ## Capabilities
//!
//! - **Token scorers**: set Jaccard, TF-IDF cosine, token LCS
//! - **Edit distance**: character Levenshtein with a length ceiling
//! - **Winnowing**: robust k-gram fingerprint overlap
//! - **Pluggable collaborators**: structural fingerprints and embeddings,
//!   omitted (never zeroed) when unavailable
//! - **Segments & lines**: direct and token-overlap line matching, coalesced
//!   into multi-line spans, plus per-line heatmap records
//! - **Policy**: `veritext.toml` thresholds, weights and tables, validated
//!   before any comparison runs

pub mod text;
pub mod detection;
pub mod engine;
pub mod policy;
pub mod report;

// Re-exports for convenience
pub use text::{normalize, tokenize, Document};
pub use detection::{Algorithm, AlgorithmScores, OmissionReason};
pub use detection::structural::{KeywordSkeleton, StructuralFingerprinter};
pub use detection::semantic::{EmbeddingProvider, HashedTokenEmbedder};
pub use engine::{ComparisonEngine, PlagiarismMatch, PreparedSubmission, Submission};
pub use engine::segments::{MatchKind, MatchedSegment, Span};
pub use engine::lines::LineMatchRecord;
pub use engine::analytics::{ComparisonDetail, Heatmap, LineAnalytics, SimilarityDistribution};
pub use engine::batch::{BatchReport, BatchRunner, PairSkip};
pub use policy::{PolicyConfig, SimilarityBucket};
pub use report::{render_report, write_report, ReportFormat};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeritextError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Algorithm {algorithm} unavailable: {reason}")]
    AlgorithmUnavailable { algorithm: String, reason: String },

    #[error("Submission error: {0}")]
    Submission(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type VeritextResult<T> = Result<T, VeritextError>;
