//! Policy — `veritext.toml` configuration for comparisons
//!
//! Every threshold, weight and table the engine uses lives here and is
//! passed explicitly to each comparison. A config is validated once,
//! before any pair is compared; a malformed config never reaches a scorer.

pub mod tables;

pub use tables::{BucketRow, BucketTable, SimilarityBucket, ThresholdRow, ThresholdTable};

use crate::detection::Algorithm;
use crate::{VeritextError, VeritextResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tables::check_unit;

/// Comparison policy (loaded from `.veritext.toml` or `veritext.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Overall score at or above which a pair is flagged
    #[serde(default = "default_flag_threshold")]
    pub flag_threshold: f64,

    /// Batch output drops pairs scoring below this
    #[serde(default)]
    pub min_score_floor: f64,

    /// Tokens per winnowing k-gram
    #[serde(default = "default_kgram_size")]
    pub kgram_size: usize,

    /// Hashes per winnowing window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Normalized length ceiling for Levenshtein and LCS
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,

    /// Direct line similarity needed to count a line as matched
    #[serde(default = "default_direct_line_threshold")]
    pub direct_line_threshold: f64,

    /// Merge diagonal runs of matched lines into multi-line segments
    #[serde(default = "default_true")]
    pub coalesce_segments: bool,

    /// Algorithms that take part in the aggregate, with their weights
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<AlgorithmSetting>,

    /// Overall score → token-overlap threshold
    #[serde(default)]
    pub token_thresholds: ThresholdTable,

    /// Line similarity → display bucket
    #[serde(default)]
    pub buckets: BucketTable,

    /// Batch worker threads (rayon default when absent)
    #[serde(default)]
    pub workers: Option<usize>,

    /// Keep only this many highest-scoring batch matches
    #[serde(default)]
    pub max_matches: Option<usize>,
}

fn default_flag_threshold() -> f64 {
    0.5
}
fn default_kgram_size() -> usize {
    5
}
fn default_window_size() -> usize {
    4
}
fn default_max_document_chars() -> usize {
    20_000
}
fn default_direct_line_threshold() -> f64 {
    0.8
}
fn default_true() -> bool {
    true
}
fn default_weight() -> f64 {
    1.0
}
fn default_algorithms() -> Vec<AlgorithmSetting> {
    Algorithm::ALL.iter().map(|&a| AlgorithmSetting::new(a)).collect()
}

/// Per-algorithm inclusion and weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSetting {
    pub algorithm: Algorithm,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl AlgorithmSetting {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            weight: 1.0,
            enabled: true,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            flag_threshold: default_flag_threshold(),
            min_score_floor: 0.0,
            kgram_size: default_kgram_size(),
            window_size: default_window_size(),
            max_document_chars: default_max_document_chars(),
            direct_line_threshold: default_direct_line_threshold(),
            coalesce_segments: true,
            algorithms: default_algorithms(),
            token_thresholds: ThresholdTable::default(),
            buckets: BucketTable::default(),
            workers: None,
            max_matches: None,
        }
    }
}

impl PolicyConfig {
    fn setting(&self, algorithm: Algorithm) -> Option<&AlgorithmSetting> {
        self.algorithms.iter().find(|s| s.algorithm == algorithm)
    }

    /// Listed, enabled and carrying a positive weight
    pub fn is_enabled(&self, algorithm: Algorithm) -> bool {
        self.weight(algorithm).is_some()
    }

    /// Aggregation weight, `None` when the algorithm does not take part
    pub fn weight(&self, algorithm: Algorithm) -> Option<f64> {
        self.setting(algorithm)
            .filter(|s| s.enabled && s.weight > 0.0)
            .map(|s| s.weight)
    }

    /// Enable or disable an algorithm, adding it with weight 1 if unlisted
    pub fn set_enabled(&mut self, algorithm: Algorithm, enabled: bool) {
        match self.algorithms.iter_mut().find(|s| s.algorithm == algorithm) {
            Some(setting) => setting.enabled = enabled,
            None => self.algorithms.push(AlgorithmSetting {
                enabled,
                ..AlgorithmSetting::new(algorithm)
            }),
        }
    }

    /// Reject any configuration a comparison could not run under
    pub fn validate(&self) -> VeritextResult<()> {
        check_unit("flag_threshold", self.flag_threshold)?;
        check_unit("min_score_floor", self.min_score_floor)?;
        check_unit("direct_line_threshold", self.direct_line_threshold)?;

        if self.kgram_size == 0 {
            return Err(VeritextError::InvalidConfig("kgram_size must be at least 1".into()));
        }
        if self.window_size == 0 {
            return Err(VeritextError::InvalidConfig("window_size must be at least 1".into()));
        }
        if self.max_document_chars == 0 {
            return Err(VeritextError::InvalidConfig(
                "max_document_chars must be at least 1".into(),
            ));
        }
        if self.workers == Some(0) {
            return Err(VeritextError::InvalidConfig("workers must be at least 1".into()));
        }

        for (i, setting) in self.algorithms.iter().enumerate() {
            if !setting.weight.is_finite() || setting.weight < 0.0 {
                return Err(VeritextError::InvalidConfig(format!(
                    "weight for {} must be a non-negative number, got {}",
                    setting.algorithm, setting.weight
                )));
            }
            if self.algorithms[..i].iter().any(|s| s.algorithm == setting.algorithm) {
                return Err(VeritextError::InvalidConfig(format!(
                    "algorithm {} listed more than once",
                    setting.algorithm
                )));
            }
        }
        if !Algorithm::ALL.iter().any(|&a| self.is_enabled(a)) {
            return Err(VeritextError::InvalidConfig(
                "at least one algorithm must be enabled with a positive weight".into(),
            ));
        }

        self.token_thresholds.validate()?;
        self.buckets.validate()?;
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> VeritextResult<Self> {
        let config: PolicyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load policy from a `.veritext.toml` file
    pub fn from_file(path: &Path) -> VeritextResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            VeritextError::InvalidConfig(msg) => {
                VeritextError::InvalidConfig(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Load from a project root, falling back to defaults when no file exists.
    ///
    /// A file that exists but fails to parse or validate is an error.
    pub fn from_project_root(root: &Path) -> VeritextResult<Self> {
        for name in [".veritext.toml", "veritext.toml"] {
            let path = root.join(name);
            if path.is_file() {
                let config = Self::from_file(&path)?;
                tracing::info!("Loaded policy from {}", path.display());
                return Ok(config);
            }
        }

        tracing::debug!("No policy file under {}, using defaults", root.display());
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = PolicyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.flag_threshold, 0.5);
        for algorithm in Algorithm::ALL {
            assert_eq!(config.weight(algorithm), Some(1.0));
        }
    }

    #[test]
    fn test_policy_toml_parse() {
        let toml_str = r#"
            flag_threshold = 0.7
            kgram_size = 3
            window_size = 2
            coalesce_segments = false

            [[algorithms]]
            algorithm = "jaccard"
            weight = 2.0

            [[algorithms]]
            algorithm = "levenshtein"
            enabled = false

            [[token_thresholds]]
            min_score = 0.5
            threshold = 0.25

            [[token_thresholds]]
            min_score = 0.0
            threshold = 0.6
        "#;
        let config = PolicyConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.flag_threshold, 0.7);
        assert_eq!(config.kgram_size, 3);
        assert!(!config.coalesce_segments);
        assert_eq!(config.weight(Algorithm::Jaccard), Some(2.0));
        assert!(!config.is_enabled(Algorithm::Levenshtein));
        assert!(!config.is_enabled(Algorithm::Cosine), "unlisted algorithms are excluded");
        assert_eq!(config.token_thresholds.select(0.9), 0.25);
        assert_eq!(config.token_thresholds.select(0.1), 0.6);
        // Untouched keys keep their defaults
        assert_eq!(config.max_document_chars, 20_000);
        assert_eq!(config.buckets, BucketTable::default());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let config = PolicyConfig {
            flag_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(VeritextError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_kgram() {
        let err = PolicyConfig::from_toml_str("kgram_size = 0").unwrap_err();
        assert!(err.to_string().contains("kgram_size"));
    }

    #[test]
    fn test_rejects_negative_kgram_as_parse_error() {
        assert!(matches!(
            PolicyConfig::from_toml_str("kgram_size = -3"),
            Err(VeritextError::Toml(_))
        ));
    }

    #[test]
    fn test_rejects_all_algorithms_disabled() {
        let mut config = PolicyConfig::default();
        for algorithm in Algorithm::ALL {
            config.set_enabled(algorithm, false);
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_and_negative_weights() {
        let mut config = PolicyConfig::default();
        config.algorithms.push(AlgorithmSetting::new(Algorithm::Lcs));
        assert!(config.validate().is_err());

        let mut config = PolicyConfig::default();
        config.algorithms[0].weight = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_weight_disables() {
        let mut config = PolicyConfig::default();
        config.algorithms[0].weight = 0.0;
        assert!(config.validate().is_ok());
        assert!(!config.is_enabled(config.algorithms[0].algorithm));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let config = PolicyConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_project_root_prefers_dotfile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".veritext.toml"), "flag_threshold = 0.9").unwrap();
        std::fs::write(dir.path().join("veritext.toml"), "flag_threshold = 0.1").unwrap();
        let config = PolicyConfig::from_project_root(dir.path()).unwrap();
        assert_eq!(config.flag_threshold, 0.9);
    }

    #[test]
    fn test_from_project_root_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = PolicyConfig::from_project_root(dir.path()).unwrap();
        assert_eq!(config, PolicyConfig::default());
    }

    #[test]
    fn test_from_project_root_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("veritext.toml"), "window_size = 0").unwrap();
        let err = PolicyConfig::from_project_root(dir.path()).unwrap_err();
        assert!(err.to_string().contains("veritext.toml"));
    }
}
