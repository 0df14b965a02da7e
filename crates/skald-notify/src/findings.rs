use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::mrkdwn::escape_text;

/// `[P<n>]` prefix some titles already carry; stripped to avoid doubling
/// the tag the renderer adds itself.
static PRIORITY_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[P\d+\]\s*").unwrap());

/// Code-review findings payload, as embedded in the assistant message.
#[derive(Debug, Deserialize)]
pub struct FindingsReport {
    #[serde(default)]
    pub overall_correctness: String,
    #[serde(default)]
    pub overall_explanation: String,
    #[serde(default)]
    pub overall_confidence_score: f64,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

/// One code-review observation.
#[derive(Debug, Deserialize)]
pub struct Finding {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub code_location: Option<CodeLocation>,
}

#[derive(Debug, Deserialize)]
pub struct CodeLocation {
    #[serde(default)]
    pub absolute_file_path: String,
    #[serde(default)]
    pub line_range: Option<LineRange>,
}

#[derive(Debug, Deserialize)]
pub struct LineRange {
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
}

/// Render the findings report as one prioritized message.
///
/// Ranking: stable ascending sort by `(priority, confidence_score)`, then
/// the whole sequence reversed — the highest priority number with the
/// highest confidence within it surfaces first.
pub fn render_findings(report: &FindingsReport) -> String {
    let mut ranked: Vec<&Finding> = report.findings.iter().collect();
    ranked.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(a.confidence_score.total_cmp(&b.confidence_score))
    });
    ranked.reverse();

    let mut out = String::from(":rotating_light: *Code Review Findings*\n\n");

    for (idx, finding) in ranked.iter().enumerate() {
        let title = escape_text(&finding.title);
        let title = PRIORITY_PREFIX.replace(&title, "");
        let confidence_pct = (finding.confidence_score * 100.0).round() as i64;
        out.push_str(&format!(
            "*{}) [P{}] {} [{}%]*\n",
            idx + 1,
            finding.priority,
            title,
            confidence_pct
        ));

        if let Some(location) = &finding.code_location {
            if !location.absolute_file_path.is_empty() {
                let lines = location
                    .line_range
                    .as_ref()
                    .map(|r| format!(":{}–{}", r.start, r.end))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "• _Code Reference:_ `{}{}`\n",
                    escape_text(&location.absolute_file_path),
                    lines
                ));
            }
        }

        let body = escape_text(&finding.body);
        if !body.is_empty() {
            out.push_str(&format!("> {}\n", body.replace('\n', "\n> ")));
        }

        out.push('\n');
    }

    if !report.overall_explanation.is_empty()
        || report.overall_confidence_score > 0.0
        || !report.overall_correctness.is_empty()
    {
        out.push_str("*Overall Summary*\n");
        if !report.overall_correctness.is_empty() {
            out.push_str(&format!(
                "*Correctness:* {}\n",
                escape_text(&report.overall_correctness)
            ));
        }
        if !report.overall_explanation.is_empty() {
            out.push_str(&format!(
                "*Explanation:* {}\n",
                escape_text(&report.overall_explanation)
            ));
        }
    }

    out
}
