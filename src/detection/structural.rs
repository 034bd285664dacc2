//! Structural similarity — overlap of hashed structure fingerprints
//!
//! The engine never binds to a language's AST. A [`StructuralFingerprinter`]
//! collaborator reduces a submission to a set of hashed substructure shapes;
//! the score is the Jaccard overlap of the two sets. When the collaborator
//! cannot handle a submission the algorithm is omitted, not scored 0.
//!
//! [`KeywordSkeleton`] is the built-in fingerprinter for source code: it
//! keeps only control-flow keywords and their nesting depth, so renaming
//! every identifier or reformatting leaves the skeleton untouched.

use super::{winnowing, DocumentPair, OmissionReason, ScoringContext};
use crate::policy::PolicyConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Reduces content to a set of hashed structural features.
pub trait StructuralFingerprinter: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Fingerprint set, or `None` when the content has no parseable structure
    fn fingerprint(&self, content: &str) -> Option<HashSet<u64>>;
}

// ─── Keyword Skeleton ───────────────────────────────────────────────

const SKELETON_KEYWORDS: &[&str] = &[
    "if", "else", "elif", "for", "while", "do", "switch", "case", "match",
    "try", "catch", "except", "finally", "return", "break", "continue", "throw",
    "raise", "fn", "function", "def", "class", "struct", "enum", "impl",
    "trait", "interface", "async", "await", "yield", "loop", "select", "when",
    "lambda", "with",
];

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());

/// Control-flow skeleton fingerprinter (brace and indentation aware)
#[derive(Debug, Clone)]
pub struct KeywordSkeleton {
    kgram_size: usize,
    window_size: usize,
    /// Columns of indentation that count as one nesting level
    indent_width: usize,
}

impl KeywordSkeleton {
    pub fn new(kgram_size: usize, window_size: usize) -> Self {
        Self {
            kgram_size: kgram_size.max(1),
            window_size: window_size.max(1),
            indent_width: 4,
        }
    }

    /// Winnow with the policy's k-gram and window sizes
    pub fn from_policy(config: &PolicyConfig) -> Self {
        Self::new(config.kgram_size, config.window_size)
    }

    /// Ordered `depth:keyword` features of `content`
    pub fn skeleton(&self, content: &str) -> Vec<String> {
        let mut features = Vec::new();
        let mut brace_depth: usize = 0;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || is_comment(trimmed) {
                continue;
            }

            // Braces for C-family code, indentation for Python-like code
            let indent = indentation_columns(line) / self.indent_width;
            let depth = brace_depth.max(indent);
            for word in WORD_RE.find_iter(trimmed) {
                let word = word.as_str();
                if SKELETON_KEYWORDS.contains(&word) {
                    features.push(format!("{}:{}", depth, word));
                }
            }

            for ch in trimmed.chars() {
                match ch {
                    '{' => brace_depth += 1,
                    '}' => brace_depth = brace_depth.saturating_sub(1),
                    _ => {}
                }
            }
        }

        features
    }
}

impl Default for KeywordSkeleton {
    fn default() -> Self {
        Self::new(5, 4)
    }
}

impl StructuralFingerprinter for KeywordSkeleton {
    fn name(&self) -> &str {
        "keyword-skeleton"
    }

    fn fingerprint(&self, content: &str) -> Option<HashSet<u64>> {
        let skeleton = self.skeleton(content);
        if skeleton.is_empty() {
            return None;
        }
        Some(winnowing::fingerprint_set(
            &skeleton,
            self.kgram_size,
            self.window_size,
        ))
    }
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with('#') || trimmed.starts_with("/*")
        || trimmed.starts_with('*') || trimmed.starts_with("--")
}

fn indentation_columns(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

// ─── Scorer ─────────────────────────────────────────────────────────

pub(crate) fn score(pair: &DocumentPair<'_>, ctx: &ScoringContext<'_>) -> Result<f64, OmissionReason> {
    let fingerprinter = ctx
        .structural
        .ok_or_else(|| OmissionReason::unavailable("no structural fingerprinter configured"))?;

    let set_a = fingerprinter.fingerprint(&pair.a.content).ok_or_else(|| {
        OmissionReason::unavailable(format!("{}: first submission has no structure", fingerprinter.name()))
    })?;
    let set_b = fingerprinter.fingerprint(&pair.b.content).ok_or_else(|| {
        OmissionReason::unavailable(format!("{}: second submission has no structure", fingerprinter.name()))
    })?;

    Ok(winnowing::overlap(&set_a, &set_b))
}
