//! Batch driver — every unordered pair of a submission set
//!
//! Submissions are normalized once, then pairs `(i, j)` with `i < j` are
//! compared on a bounded rayon pool. A pair that fails (a collaborator
//! panic, cancellation) becomes a [`PairSkip`]; the batch itself always
//! completes with whatever pairs did finish.

use super::{ComparisonEngine, PlagiarismMatch, PreparedSubmission, Submission};
use crate::policy::PolicyConfig;
use crate::{VeritextError, VeritextResult};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;
use walkdir::WalkDir;

/// A pair that produced no match record, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSkip {
    pub a: String,
    pub b: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub config: PolicyConfig,
    pub submissions: usize,
    pub pairs_total: usize,
    pub pairs_compared: usize,
    /// Matches at or above the score floor, highest score first
    pub matches: Vec<PlagiarismMatch>,
    pub skipped: Vec<PairSkip>,
    /// Flagged pairs among all compared pairs, floor notwithstanding
    pub flagged_count: usize,
    pub duration_ms: u64,
}

enum PairOutcome {
    Compared(PlagiarismMatch),
    Skipped(PairSkip),
}

pub struct BatchRunner {
    engine: ComparisonEngine,
    cancel: Arc<AtomicBool>,
}

impl BatchRunner {
    pub fn new(engine: ComparisonEngine) -> Self {
        Self {
            engine,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an external cancellation flag
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn engine(&self) -> &ComparisonEngine {
        &self.engine
    }

    /// Compare every unordered pair of `submissions`
    pub fn run(&self, submissions: &[Submission]) -> VeritextResult<BatchReport> {
        let start = std::time::Instant::now();
        let config = self.engine.config();

        let mut seen = HashSet::new();
        for submission in submissions {
            if !seen.insert(submission.id.as_str()) {
                return Err(VeritextError::Submission(format!(
                    "duplicate submission id '{}'",
                    submission.id
                )));
            }
        }

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = config.workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder.build()?;

        let pairs: Vec<(usize, usize)> = (0..submissions.len())
            .flat_map(|i| (i + 1..submissions.len()).map(move |j| (i, j)))
            .collect();

        tracing::info!(
            "Batch: {} submissions, {} pairs, {} workers",
            submissions.len(),
            pairs.len(),
            pool.current_num_threads()
        );

        let outcomes: Vec<PairOutcome> = pool.install(|| {
            let prepared: Vec<PreparedSubmission<'_>> =
                submissions.par_iter().map(|s| self.engine.prepare(s)).collect();

            pairs
                .par_iter()
                .map(|&(i, j)| self.run_pair(&prepared[i], &prepared[j]))
                .collect()
        });

        let mut matches = Vec::new();
        let mut skipped = Vec::new();
        let mut flagged_count = 0;
        let mut pairs_compared = 0;

        for outcome in outcomes {
            match outcome {
                PairOutcome::Compared(m) => {
                    pairs_compared += 1;
                    if m.flagged {
                        flagged_count += 1;
                    }
                    if m.overall_score >= config.min_score_floor {
                        matches.push(m);
                    }
                }
                PairOutcome::Skipped(skip) => skipped.push(skip),
            }
        }

        matches.sort_by(|x, y| {
            y.overall_score
                .total_cmp(&x.overall_score)
                .then_with(|| x.pair_key().cmp(&y.pair_key()))
        });
        if let Some(cap) = config.max_matches {
            matches.truncate(cap);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Batch complete: {} compared, {} flagged, {} reported, {} skipped ({}ms)",
            pairs_compared,
            flagged_count,
            matches.len(),
            skipped.len(),
            duration_ms
        );

        Ok(BatchReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            config: config.clone(),
            submissions: submissions.len(),
            pairs_total: pairs.len(),
            pairs_compared,
            matches,
            skipped,
            flagged_count,
            duration_ms,
        })
    }

    fn run_pair(&self, a: &PreparedSubmission<'_>, b: &PreparedSubmission<'_>) -> PairOutcome {
        let skip = |reason: String| {
            PairOutcome::Skipped(PairSkip {
                a: a.submission.id.clone(),
                b: b.submission.id.clone(),
                reason,
            })
        };

        if self.cancel.load(Ordering::Relaxed) {
            return skip("cancelled".to_string());
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.engine.compare_prepared(a, b)
        }));

        match result {
            Ok(m) => PairOutcome::Compared(m),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<String>()
                    .cloned()
                    .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::warn!(
                    "Pair {} ↔ {} skipped: {}",
                    a.submission.id,
                    b.submission.id,
                    message
                );
                skip(format!("comparison panicked: {}", message))
            }
        }
    }
}

// ─── Directory Loading ──────────────────────────────────────────────

/// Load every regular file under `dir` as a submission.
///
/// `extensions` filters by file extension (case-insensitive) when non-empty.
/// The id is the path relative to `dir`; the author is the first directory
/// under `dir`, or the file stem for top-level files. Hidden entries and
/// files that are not valid UTF-8 are skipped.
pub fn collect_submissions(dir: &Path, extensions: &[String]) -> VeritextResult<Vec<Submission>> {
    if !dir.is_dir() {
        return Err(VeritextError::Submission(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let wanted: Vec<String> = extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect();
    let mut submissions = Vec::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if !wanted.is_empty() {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            if !wanted.contains(&ext) {
                continue;
            }
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let relative = path.strip_prefix(dir).unwrap_or(path);
        let components: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let id = components.join("/");
        let author = if components.len() > 1 {
            components[0].clone()
        } else {
            relative
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| id.clone())
        };

        let mut submission = Submission::new(id, author, content);
        if let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) {
            submission = submission.submitted_at(DateTime::<Utc>::from(modified));
        }
        submissions.push(submission);
    }

    tracing::info!("Loaded {} submissions from {}", submissions.len(), dir.display());
    Ok(submissions)
}
