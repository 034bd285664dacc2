//! # Veritext CLI (`veritext`)
//!
//! Batch driver for the comparison engine.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `veritext compare <a> <b>` | Compare two files, optionally with line analytics |
//! | `veritext batch <dir>` | Compare every pair of files under a directory |
//!
//! Exits with status 2 when any compared pair is flagged, so the command can
//! gate a CI job. Log output goes to stderr and honours `RUST_LOG`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use veritext::engine::batch::collect_submissions;
use veritext::report::{json, markdown};
use veritext::{
    render_report, write_report, BatchRunner, ComparisonEngine, HashedTokenEmbedder,
    KeywordSkeleton, PolicyConfig, ReportFormat, Submission,
};

#[derive(Parser)]
#[command(
    name = "veritext",
    about = "Pairwise submission similarity and plagiarism detection",
    version
)]
struct Cli {
    /// Policy file (TOML). Defaults to `.veritext.toml` or `veritext.toml`
    /// in the working directory (or the batch directory), if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format: `json` or `markdown`
    #[arg(long, global = true, default_value = "markdown")]
    format: ReportFormat,

    /// Enable the keyword-skeleton structural fingerprinter
    #[arg(long, global = true)]
    structural: bool,

    /// Enable the hashed-token embedding provider
    #[arg(long, global = true)]
    semantic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two files.
    Compare {
        file_a: PathBuf,
        file_b: PathBuf,

        /// Include per-line analytics for both sides
        #[arg(long)]
        detail: bool,
    },

    /// Compare every pair of files under a directory.
    ///
    /// Each file becomes a submission whose id is its path relative to the
    /// directory and whose author is the first directory component.
    Batch {
        dir: PathBuf,

        /// Only load files with these extensions (comma separated)
        #[arg(long, value_delimiter = ',')]
        ext: Vec<String>,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let flagged = match &cli.command {
        Commands::Compare { file_a, file_b, detail } => {
            let config = load_config(cli.config.as_deref(), Path::new("."))?;
            let engine = build_engine(config, cli.structural, cli.semantic)?;
            cmd_compare(&engine, file_a, file_b, *detail, cli.format)?
        }
        Commands::Batch { dir, ext, output } => {
            let config = load_config(cli.config.as_deref(), dir)?;
            let engine = build_engine(config, cli.structural, cli.semantic)?;
            cmd_batch(engine, dir, ext, output.as_deref(), cli.format)?
        }
    };

    Ok(if flagged { ExitCode::from(2) } else { ExitCode::SUCCESS })
}

fn load_config(explicit: Option<&Path>, root: &Path) -> Result<PolicyConfig> {
    match explicit {
        Some(path) => PolicyConfig::from_file(path)
            .with_context(|| format!("loading policy {}", path.display())),
        None => PolicyConfig::from_project_root(root).context("loading project policy"),
    }
}

fn build_engine(config: PolicyConfig, structural: bool, semantic: bool) -> Result<ComparisonEngine> {
    let skeleton = KeywordSkeleton::from_policy(&config);
    let mut engine = ComparisonEngine::new(config)?;
    if structural {
        engine = engine.with_structural(skeleton);
    }
    if semantic {
        engine = engine.with_embeddings(HashedTokenEmbedder::default());
    }
    Ok(engine)
}

fn read_submission(path: &Path) -> Result<Submission> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let author = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Submission::new(path.display().to_string(), author, content))
}

fn cmd_compare(
    engine: &ComparisonEngine,
    file_a: &Path,
    file_b: &Path,
    detail: bool,
    format: ReportFormat,
) -> Result<bool> {
    let a = read_submission(file_a)?;
    let b = read_submission(file_b)?;

    let (result, detail) = if detail {
        let (result, detail) = engine.compare_detailed(&a, &b);
        (result, Some(detail))
    } else {
        (engine.compare(&a, &b), None)
    };

    let rendered = match format {
        ReportFormat::Json => json::render_match(&result, detail.as_ref())?,
        ReportFormat::Markdown => markdown::render_match(&result, detail.as_ref()),
    };
    println!("{}", rendered);
    Ok(result.flagged)
}

fn cmd_batch(
    engine: ComparisonEngine,
    dir: &Path,
    extensions: &[String],
    output: Option<&Path>,
    format: ReportFormat,
) -> Result<bool> {
    let submissions = collect_submissions(dir, extensions)?;
    let report = BatchRunner::new(engine).run(&submissions)?;

    match output {
        Some(path) => {
            write_report(&report, format, path)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "Wrote report to {} ({} flagged of {} pairs)",
                path.display(),
                report.flagged_count,
                report.pairs_compared
            );
        }
        None => println!("{}", render_report(&report, format)?),
    }

    Ok(report.flagged_count > 0)
}
