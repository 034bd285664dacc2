//! Report generation — JSON and Markdown output
//!
//! Transforms a `BatchReport` (or a single `PlagiarismMatch`) into a
//! machine-readable or human-readable document.

pub mod json;
pub mod markdown;

use crate::engine::batch::BatchReport;
use crate::VeritextResult;
use std::path::Path;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Structured JSON (machine-readable)
    Json,
    /// Human-readable Markdown with tables and summaries
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

/// Write a report in the specified format
pub fn write_report(report: &BatchReport, format: ReportFormat, output: &Path) -> VeritextResult<()> {
    let content = render_report(report, format)?;
    std::fs::write(output, content)?;
    Ok(())
}

/// Render a report to a string
pub fn render_report(report: &BatchReport, format: ReportFormat) -> VeritextResult<String> {
    match format {
        ReportFormat::Json => json::render(report),
        ReportFormat::Markdown => Ok(markdown::render(report)),
    }
}
