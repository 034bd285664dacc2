//! Batch driver over a directory of submissions, with TOML policy loading

use std::fs;
use std::path::Path;
use veritext::engine::batch::collect_submissions;
use veritext::{
    render_report, write_report, Algorithm, BatchRunner, ComparisonEngine, PolicyConfig,
    ReportFormat, VeritextError,
};

// ─── Helper ─────────────────────────────────────────────────────────

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn classroom() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "alice/solution.py",
        "def mean(values):\n    total = sum(values)\n    return total / len(values)\n",
    );
    write(
        root,
        "bob/solution.py",
        "def mean(values):\n    total = sum(values)\n    return total / len(values)\n",
    );
    write(
        root,
        "carol/solution.py",
        "import statistics\n\nprint(statistics.fmean([1, 2, 3]))\n",
    );
    write(root, "carol/README.md", "notes that should not be compared");
    dir
}

// ═══════════════════════════════════════════════════════════════════
// Section 1: Directory Batches
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_batch_over_directory() {
    let dir = classroom();
    let submissions = collect_submissions(dir.path(), &["py".to_string()]).unwrap();
    assert_eq!(submissions.len(), 3);
    assert_eq!(submissions[0].author, "alice");

    let report = BatchRunner::new(ComparisonEngine::default())
        .run(&submissions)
        .unwrap();
    assert_eq!(report.pairs_total, 3);
    assert_eq!(report.flagged_count, 1);

    let top = &report.matches[0];
    assert_eq!(top.submission_a, "alice/solution.py");
    assert_eq!(top.submission_b, "bob/solution.py");
    assert_eq!(top.overall_score, 1.0);
    assert!(top.flagged);
}

#[test]
fn test_report_written_in_both_formats() {
    let dir = classroom();
    let submissions = collect_submissions(dir.path(), &["py".to_string()]).unwrap();
    let report = BatchRunner::new(ComparisonEngine::default())
        .run(&submissions)
        .unwrap();

    let out = tempfile::tempdir().unwrap();
    let json_path = out.path().join("report.json");
    write_report(&report, ReportFormat::Json, &json_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["flagged_count"], 1);
    assert_eq!(value["matches"][0]["author_a"], "alice");
    assert!(value["run_id"].is_string());

    let md = render_report(&report, ReportFormat::Markdown).unwrap();
    assert!(md.contains("`alice/solution.py` ↔ `bob/solution.py`"));
}

// ═══════════════════════════════════════════════════════════════════
// Section 2: Policy Files
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_project_policy_applies_to_batch() {
    let dir = classroom();
    write(
        dir.path(),
        "veritext.toml",
        r#"
            flag_threshold = 0.95
            min_score_floor = 0.5

            [[algorithms]]
            algorithm = "jaccard"

            [[algorithms]]
            algorithm = "winnowing"
            weight = 2.0
        "#,
    );

    let config = PolicyConfig::from_project_root(dir.path()).unwrap();
    assert_eq!(config.flag_threshold, 0.95);
    assert!(!config.is_enabled(Algorithm::Levenshtein));

    let engine = ComparisonEngine::new(config).unwrap();
    let submissions = collect_submissions(dir.path(), &["py".to_string()]).unwrap();
    let report = BatchRunner::new(engine).run(&submissions).unwrap();

    assert_eq!(report.matches.len(), 1, "only the copied pair clears the floor");
    let m = &report.matches[0];
    assert_eq!(m.scores.len(), 2);
    assert!(m.flagged);
}

#[test]
fn test_malformed_policy_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".veritext.toml", "flag_threshold = \"high\"");
    assert!(matches!(
        PolicyConfig::from_project_root(dir.path()),
        Err(VeritextError::Toml(_))
    ));

    write(dir.path(), ".veritext.toml", "flag_threshold = 2.0");
    assert!(matches!(
        PolicyConfig::from_project_root(dir.path()),
        Err(VeritextError::InvalidConfig(_))
    ));
}
