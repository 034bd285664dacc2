//! Markdown report renderer
//!
//! Produces a review document: run summary, ranked pair table, then a
//! per-pair breakdown of algorithm scores, omissions and matched segments.

use crate::engine::analytics::{ComparisonDetail, LineAnalytics};
use crate::engine::batch::BatchReport;
use crate::engine::PlagiarismMatch;
use crate::policy::SimilarityBucket;

/// Render a batch report as Markdown
pub fn render(report: &BatchReport) -> String {
    let mut md = String::with_capacity(4096);

    md.push_str("# Veritext Similarity Report\n\n");

    md.push_str("| Field | Value |\n|---|---|\n");
    md.push_str(&format!("| **Run** | `{}` |\n", report.run_id));
    md.push_str(&format!(
        "| **Generated** | {} |\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("| **Submissions** | {} |\n", report.submissions));
    md.push_str(&format!(
        "| **Pairs Compared** | {} / {} |\n",
        report.pairs_compared, report.pairs_total
    ));
    md.push_str(&format!(
        "| **Flag Threshold** | {:.2} |\n",
        report.config.flag_threshold
    ));
    md.push_str(&format!("| **Flagged Pairs** | **{}** |\n", report.flagged_count));
    md.push_str(&format!("| **Duration** | {}ms |\n", report.duration_ms));
    md.push('\n');

    md.push_str("## Summary\n\n");
    if report.matches.is_empty() {
        md.push_str("No pairs at or above the score floor.\n\n");
    } else {
        md.push_str("| # | Submission A | Submission B | Overall | Segments | Status |\n");
        md.push_str("|---:|---|---|---:|---:|---|\n");
        for (i, m) in report.matches.iter().enumerate() {
            md.push_str(&format!(
                "| {} | `{}` ({}) | `{}` ({}) | {:.1}% | {} | {} |\n",
                i + 1,
                truncate(&m.submission_a, 60),
                m.author_a,
                truncate(&m.submission_b, 60),
                m.author_b,
                m.overall_score * 100.0,
                m.segments.len(),
                status_badge(m.flagged)
            ));
        }
        md.push('\n');
    }

    let flagged: Vec<&PlagiarismMatch> = report.matches.iter().filter(|m| m.flagged).collect();
    if !flagged.is_empty() {
        md.push_str("## Flagged Pairs\n\n");
        for m in flagged {
            md.push_str(&render_match_section(m, "###"));
        }
    }

    if !report.skipped.is_empty() {
        md.push_str("## Skipped Pairs\n\n");
        md.push_str("| Submission A | Submission B | Reason |\n|---|---|---|\n");
        for skip in &report.skipped {
            md.push_str(&format!("| `{}` | `{}` | {} |\n", skip.a, skip.b, skip.reason));
        }
        md.push('\n');
    }

    md
}

/// Render a single comparison, with line analytics when detail is given
pub fn render_match(result: &PlagiarismMatch, detail: Option<&ComparisonDetail>) -> String {
    let mut md = String::with_capacity(2048);
    md.push_str("# Veritext Comparison\n\n");
    md.push_str(&render_match_section(result, "##"));

    if let Some(detail) = detail {
        md.push_str("## Line Analytics\n\n");
        md.push_str(&render_analytics(&detail.a.submission_id, &detail.a.analytics));
        md.push_str(&render_analytics(&detail.b.submission_id, &detail.b.analytics));

        md.push_str(&format!(
            "Token-overlap threshold for this pair: {:.2}\n\n",
            detail.token_threshold
        ));
    }

    md
}

fn render_match_section(m: &PlagiarismMatch, heading: &str) -> String {
    let mut md = String::new();
    md.push_str(&format!(
        "{} `{}` ↔ `{}` — {:.1}% {}\n\n",
        heading,
        m.submission_a,
        m.submission_b,
        m.overall_score * 100.0,
        status_badge(m.flagged)
    ));

    md.push_str("| Algorithm | Score |\n|---|---:|\n");
    for (algorithm, score) in m.scores.iter() {
        md.push_str(&format!("| {} | {:.3} |\n", algorithm, score));
    }
    for (algorithm, reason) in &m.omitted {
        md.push_str(&format!("| {} | _omitted: {}_ |\n", algorithm, reason));
    }
    md.push('\n');

    if !m.segments.is_empty() {
        md.push_str("| Lines A | Lines B | Similarity | Kind |\n|---|---|---:|---|\n");
        for seg in &m.segments {
            md.push_str(&format!(
                "| {}–{} | {}–{} | {:.2} | {:?} |\n",
                seg.a.start_line, seg.a.end_line, seg.b.start_line, seg.b.end_line, seg.similarity, seg.kind
            ));
        }
        md.push('\n');
    }

    md
}

/// Markdown block with one side's distribution and summary counts
pub fn render_analytics(submission_id: &str, analytics: &LineAnalytics) -> String {
    let mut md = String::new();
    md.push_str(&format!(
        "**`{}`**: {} of {} lines matched ({:.1}%), mean line similarity {:.2}\n\n",
        submission_id,
        analytics.matched_lines,
        analytics.total_lines,
        analytics.match_percentage,
        analytics.average_similarity
    ));

    md.push_str("| Bucket | Lines |\n|---|---:|\n");
    for bucket in [
        SimilarityBucket::Exact,
        SimilarityBucket::High,
        SimilarityBucket::Medium,
        SimilarityBucket::Low,
        SimilarityBucket::None,
    ] {
        md.push_str(&format!("| {} | {} |\n", bucket, analytics.distribution.count(bucket)));
    }
    md.push('\n');
    md
}

fn status_badge(flagged: bool) -> &'static str {
    if flagged {
        "🚩 **FLAGGED**"
    } else {
        "✅ below threshold"
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::batch::BatchRunner;
    use crate::engine::{ComparisonEngine, Submission};

    #[test]
    fn test_render_batch_markdown() {
        let runner = BatchRunner::new(ComparisonEngine::default());
        let subs = vec![
            Submission::new("a.py", "ann", "def add(a, b):\n    return a + b"),
            Submission::new("b.py", "ben", "def add(x, y):\n    return x + y"),
        ];
        let report = runner.run(&subs).unwrap();
        let md = render(&report);
        assert!(md.contains("# Veritext Similarity Report"));
        assert!(md.contains("## Flagged Pairs"));
        assert!(md.contains("`a.py` ↔ `b.py`"));
        assert!(md.contains("| levenshtein |"));
        assert!(md.contains("_omitted: unavailable"));
        assert!(md.contains("| 1–2 | 1–2 |"));
    }

    #[test]
    fn test_render_match_with_detail() {
        let engine = ComparisonEngine::default();
        let a = Submission::new("left", "x", "same line\nother line");
        let (result, detail) = engine.compare_detailed(&a, &a);
        let md = render_match(&result, Some(&detail));
        assert!(md.contains("## Line Analytics"));
        assert!(md.contains("2 of 2 lines matched (100.0%)"));
        assert!(md.contains("| exact | 2 |"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("ééééé", 3), "ééé…");
        assert_eq!(truncate("short", 10), "short");
    }
}
