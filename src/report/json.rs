//! JSON report renderer

use crate::engine::analytics::ComparisonDetail;
use crate::engine::batch::BatchReport;
use crate::engine::PlagiarismMatch;
use crate::VeritextResult;
use serde::Serialize;

/// Render a batch report as pretty-printed JSON
pub fn render(report: &BatchReport) -> VeritextResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[derive(Serialize)]
struct MatchDocument<'a> {
    #[serde(rename = "match")]
    result: &'a PlagiarismMatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a ComparisonDetail>,
}

/// Render a single comparison, with its line detail when given
pub fn render_match(result: &PlagiarismMatch, detail: Option<&ComparisonDetail>) -> VeritextResult<String> {
    Ok(serde_json::to_string_pretty(&MatchDocument { result, detail })?)
}
