//! Text normalization and tokenization
//!
//! Every scorer, the segment matcher and the line classifier read the same
//! prepared [`Document`], so a submission is normalized exactly once no matter
//! how many pairs it takes part in.
//!
//! - [`normalize`] — trim, collapse whitespace runs to one space, lowercase
//! - [`tokenize`] — lowercase, non-alphanumerics become whitespace, tokens of
//!   two characters or fewer are dropped

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| {
    // Anything that is not a Unicode letter or digit separates tokens
    Regex::new(r"[^\p{L}\p{N}]+").unwrap()
});

/// Tokens this short carry no identifying signal (`a`, `if`, `x1`)
const MIN_TOKEN_CHARS: usize = 3;

// ─── Core Functions ────────────────────────────────────────────────

/// Canonical whitespace-collapsed, lowercased form of `text`.
pub fn normalize(text: &str) -> String {
    WHITESPACE_RE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// Token sequence of `text`, in order, duplicates kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_ALNUM_RE
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Hex SHA-256 of a string
pub fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

// ─── Prepared Document ─────────────────────────────────────────────

/// A single raw line with its normalized form and token set
#[derive(Debug, Clone)]
pub struct Line {
    /// 1-based line number
    pub number: usize,
    /// Raw text without the line terminator
    pub text: String,
    pub normalized: String,
    pub tokens: HashSet<String>,
    /// Byte offset of the first character in the raw content
    pub start_offset: usize,
    /// Byte offset one past the last character (terminator excluded)
    pub end_offset: usize,
}

impl Line {
    /// Whitespace-only lines never take part in matching
    pub fn is_blank(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Everything the algorithms need from one submission's content
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub normalized: String,
    pub tokens: Vec<String>,
    pub token_set: HashSet<String>,
    pub lines: Vec<Line>,
    /// SHA-256 of the normalized text
    pub digest: String,
    /// Length of the normalized text in characters
    pub char_len: usize,
}

impl Document {
    pub fn from_text(content: &str) -> Self {
        let normalized = normalize(content);
        let tokens = tokenize(content);
        let token_set = tokens.iter().cloned().collect();
        let digest = sha256_hex(&normalized);
        let char_len = normalized.chars().count();

        Self {
            content: content.to_string(),
            lines: split_lines(content),
            normalized,
            tokens,
            token_set,
            digest,
            char_len,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line by 1-based number
    pub fn line(&self, number: usize) -> Option<&Line> {
        number.checked_sub(1).and_then(|i| self.lines.get(i))
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Split raw content into lines with byte offsets.
///
/// Follows `str::lines` semantics: `\n` and `\r\n` terminate a line and a
/// trailing terminator does not start a new empty line.
fn split_lines(content: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut offset = 0usize;

    for (i, piece) in content.split_inclusive('\n').enumerate() {
        let without_lf = piece.strip_suffix('\n').unwrap_or(piece);
        let text = without_lf.strip_suffix('\r').unwrap_or(without_lf);
        let normalized = normalize(text);
        lines.push(Line {
            number: i + 1,
            text: text.to_string(),
            tokens: tokenize(text).into_iter().collect(),
            normalized,
            start_offset: offset,
            end_offset: offset + text.len(),
        });
        offset += piece.len();
    }

    lines
}

// ─── Tests ──────────────────────────────────────────────────────────
