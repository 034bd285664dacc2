//! Winnowing — robust k-gram fingerprinting
//!
//! 1. Hash every k-gram of the token stream (SHA-256, first 8 bytes) so
//!    fingerprints are reproducible across runs and platforms
//! 2. Slide a window of `w` hashes and keep each window's minimum, ties
//!    going to the rightmost position
//! 3. A window whose minimum sits at the position already selected by the
//!    previous window adds nothing
//!
//! Any shared run of at least `w + k - 1` tokens is guaranteed to share a
//! fingerprint, which is what makes the overlap score survive insertions,
//! deletions and reformatting.

use super::{DocumentPair, OmissionReason, ScoringContext};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// A selected k-gram hash and the token index its k-gram starts at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub hash: u64,
    pub position: usize,
}

/// Hash of each k-gram of `tokens`.
///
/// A non-empty stream shorter than `k` produces a single gram covering the
/// whole stream, so short submissions still fingerprint.
pub fn kgram_hashes<S: AsRef<str>>(tokens: &[S], k: usize) -> Vec<u64> {
    let k = k.max(1);
    if tokens.is_empty() {
        return vec![];
    }
    if tokens.len() < k {
        return vec![hash_gram(tokens)];
    }
    tokens.windows(k).map(hash_gram).collect()
}

/// Robust winnowing over a hash sequence.
pub fn winnow(hashes: &[u64], w: usize) -> Vec<Fingerprint> {
    let w = w.max(1);
    if hashes.is_empty() {
        return vec![];
    }
    // Fewer hashes than a window: treat the whole sequence as one window
    let window_count = hashes.len().saturating_sub(w) + 1;
    let width = w.min(hashes.len());

    let mut fingerprints = Vec::new();
    let mut last_selected: Option<usize> = None;

    for start in 0..window_count {
        let window = &hashes[start..start + width];
        let mut min_pos = 0usize;
        for (i, &h) in window.iter().enumerate() {
            // `<=` moves ties to the rightmost occurrence
            if h <= window[min_pos] {
                min_pos = i;
            }
        }
        let position = start + min_pos;
        if last_selected != Some(position) {
            fingerprints.push(Fingerprint {
                hash: window[min_pos],
                position,
            });
            last_selected = Some(position);
        }
    }

    fingerprints
}

/// Winnowed fingerprints of a token stream
pub fn fingerprint<S: AsRef<str>>(tokens: &[S], k: usize, w: usize) -> Vec<Fingerprint> {
    winnow(&kgram_hashes(tokens, k), w)
}

/// Deduplicated fingerprint hashes of a token stream
pub fn fingerprint_set<S: AsRef<str>>(tokens: &[S], k: usize, w: usize) -> HashSet<u64> {
    fingerprint(tokens, k, w).into_iter().map(|f| f.hash).collect()
}

/// Jaccard overlap of two fingerprint sets; 0 when both are empty.
pub fn overlap(a: &HashSet<u64>, b: &HashSet<u64>) -> f64 {
    super::jaccard::set_similarity(a, b)
}

pub(crate) fn score(pair: &DocumentPair<'_>, ctx: &ScoringContext<'_>) -> Result<f64, OmissionReason> {
    let k = ctx.config.kgram_size;
    let w = ctx.config.window_size;
    let set_a = fingerprint_set(&pair.a.tokens, k, w);
    let set_b = fingerprint_set(&pair.b.tokens, k, w);
    Ok(overlap(&set_a, &set_b))
}

// ─── Utility ────────────────────────────────────────────────────────

fn hash_gram<S: AsRef<str>>(gram: &[S]) -> u64 {
    let mut hasher = Sha256::new();
    for (i, token) in gram.iter().enumerate() {
        if i > 0 {
            hasher.update(b" ");
        }
        hasher.update(token.as_ref().as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Stable 64-bit hash of a single string
pub fn hash_str(s: &str) -> u64 {
    hash_gram(&[s])
}

// ─── Tests ──────────────────────────────────────────────────────────
