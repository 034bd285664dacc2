//! Semantic similarity — cosine of two embedding vectors
//!
//! Embeddings come from an [`EmbeddingProvider`] collaborator. A provider
//! error, an empty vector or mismatched dimensions omit the algorithm for
//! the pair instead of scoring it.

use super::{DocumentPair, OmissionReason, ScoringContext};
use crate::text::tokenize;
use crate::VeritextResult;

/// Turns submission content into a dense vector.
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    fn embed(&self, content: &str) -> VeritextResult<Vec<f32>>;
}

// ─── Hashed Token Embedder ──────────────────────────────────────────

const DEFAULT_DIMS: usize = 256;

/// Offline embedder: feature-hashes tokens into a fixed number of
/// dimensions and L2-normalizes the counts.
#[derive(Debug, Clone)]
pub struct HashedTokenEmbedder {
    dims: usize,
}

impl HashedTokenEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }
}

impl Default for HashedTokenEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMS)
    }
}

impl EmbeddingProvider for HashedTokenEmbedder {
    fn name(&self) -> &str {
        "hashed-token"
    }

    fn embed(&self, content: &str) -> VeritextResult<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dims];
        for token in tokenize(content) {
            vector[hash_to_dim(&token, self.dims)] += 1.0;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

// ─── Scorer ─────────────────────────────────────────────────────────

pub(crate) fn score(pair: &DocumentPair<'_>, ctx: &ScoringContext<'_>) -> Result<f64, OmissionReason> {
    let provider = ctx
        .embeddings
        .ok_or_else(|| OmissionReason::unavailable("no embedding provider configured"))?;

    if pair.is_identical() {
        return Ok(1.0);
    }

    let embed = |content: &str| {
        provider
            .embed(content)
            .map_err(|e| OmissionReason::unavailable(format!("{}: {}", provider.name(), e)))
    };
    let a = embed(&pair.a.content)?;
    let b = embed(&pair.b.content)?;

    if a.is_empty() || b.is_empty() {
        return Err(OmissionReason::unavailable(format!("{}: empty embedding", provider.name())));
    }
    if a.len() != b.len() {
        return Err(OmissionReason::unavailable(format!(
            "{}: dimension mismatch ({} vs {})",
            provider.name(),
            a.len(),
            b.len()
        )));
    }

    Ok(cosine_similarity(&a, &b))
}

// ─── Utilities ──────────────────────────────────────────────────────

/// Cosine of two equal-length vectors clamped into [0,1]; 0 for a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = (norm_a * norm_b).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}

fn hash_to_dim(token: &str, dims: usize) -> usize {
    // djb2
    let mut hash = 5381u64;
    for byte in token.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
    }
    (hash as usize) % dims
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyConfig;
    use crate::text::Document;
    use crate::VeritextError;

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn embed(&self, _content: &str) -> VeritextResult<Vec<f32>> {
            Err(VeritextError::AlgorithmUnavailable {
                algorithm: "semantic".into(),
                reason: "model offline".into(),
            })
        }
    }

    struct RaggedProvider;

    impl EmbeddingProvider for RaggedProvider {
        fn name(&self) -> &str {
            "ragged"
        }

        fn embed(&self, content: &str) -> VeritextResult<Vec<f32>> {
            Ok(vec![1.0; content.len() % 3 + 1])
        }
    }

    #[test]
    fn test_embedding_dimensions() {
        let embedder = HashedTokenEmbedder::new(64);
        let v = embedder.embed("function hello returns value").unwrap();
        assert_eq!(v.len(), 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_content_is_zero_vector() {
        let embedder = HashedTokenEmbedder::default();
        let v = embedder.embed("").unwrap();
        assert_eq!(v.len(), 256);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_similar_text_scores_high() {
        let config = PolicyConfig::default();
        let embedder = HashedTokenEmbedder::default();
        let ctx = ScoringContext {
            embeddings: Some(&embedder),
            ..ScoringContext::new(&config)
        };
        let a = Document::from_text("sort the list then return the sorted list");
        let b = Document::from_text("sort the array then return the sorted array");
        let score = score(&DocumentPair::new(&a, &b), &ctx).unwrap();
        assert!(score > 0.5, "similar text should embed close, got {}", score);
    }

    #[test]
    fn test_provider_error_is_omission() {
        let config = PolicyConfig::default();
        let ctx = ScoringContext {
            embeddings: Some(&FailingProvider),
            ..ScoringContext::new(&config)
        };
        let a = Document::from_text("alpha beta gamma");
        let b = Document::from_text("delta epsilon zeta");
        let result = score(&DocumentPair::new(&a, &b), &ctx);
        match result {
            Err(OmissionReason::Unavailable { reason }) => assert!(reason.contains("model offline")),
            other => panic!("expected omission, got {:?}", other),
        }
    }

    #[test]
    fn test_dimension_mismatch_is_omission() {
        let config = PolicyConfig::default();
        let ctx = ScoringContext {
            embeddings: Some(&RaggedProvider),
            ..ScoringContext::new(&config)
        };
        let a = Document::from_text("abc");
        let b = Document::from_text("abcd");
        let result = score(&DocumentPair::new(&a, &b), &ctx);
        assert!(matches!(result, Err(OmissionReason::Unavailable { .. })));
    }

    #[test]
    fn test_identical_empty_documents_score_one() {
        let config = PolicyConfig::default();
        let embedder = HashedTokenEmbedder::default();
        let ctx = ScoringContext {
            embeddings: Some(&embedder),
            ..ScoringContext::new(&config)
        };
        let a = Document::from_text("");
        let b = Document::from_text("   \n");
        assert_eq!(score(&DocumentPair::new(&a, &b), &ctx), Ok(1.0));
    }

    #[test]
    fn test_omitted_without_provider() {
        let config = PolicyConfig::default();
        let ctx = ScoringContext::new(&config);
        let doc = Document::from_text("some words here");
        assert!(score(&DocumentPair::new(&doc, &doc), &ctx).is_err());
    }
}
