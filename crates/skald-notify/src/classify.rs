use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::findings::FindingsReport;
use crate::mrkdwn::{json_unescape, to_mrkdwn};

/// The only actionable event type; everything else is ignored.
pub const TURN_COMPLETE_EVENT: &str = "agent-turn-complete";

const MERGE_REQUEST_MARKER: &str = "Gitlab-MR";
const JIRA_EXPLAIN_PREFIX: &str = "[JIRA-EXPLAIN";
/// Byte length of `[JIRA-EXPLAIN-`; the ticket id runs from here to the first `]`.
const JIRA_TICKET_START: usize = 14;

static JIRA_TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[JIRA-EXPLAIN-[^\]]+\]\n").unwrap());

/// Mutually exclusive classification of one incoming event.
///
/// `Ignored` and `Malformed` both produce no side effect; they are kept
/// apart so callers can tell "nothing to do" from "looked routable but did
/// not deserialize".
#[derive(Debug)]
pub enum Outcome {
    Ignored,
    Malformed,
    Findings(FindingsReport),
    MergeRequest(MergeRequestNotice),
    JiraSummary(JiraSummary),
}

/// Merge-request notice embedded as JSON in the assistant message.
#[derive(Debug, Deserialize)]
pub struct MergeRequestNotice {
    #[serde(default)]
    pub ticket: String,
    #[serde(default)]
    pub pr: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
}

/// A tagged Jira explanation: ticket id plus the unescaped, tag-stripped body.
#[derive(Debug)]
pub struct JiraSummary {
    pub ticket: String,
    pub text: String,
}

/// Classify one event payload into exactly one [`Outcome`].
///
/// Precedence: wrong/missing event type → `Ignored`; missing assistant
/// message → `Ignored`; embedded JSON with a `findings` field → `Findings`
/// (even when a `type` field also matches the merge-request marker);
/// embedded JSON typed `Gitlab-MR` (case-insensitive) → `MergeRequest`;
/// raw text starting with the Jira tag → `JiraSummary`; anything else →
/// `Ignored`. Embedded JSON that fails to deserialize is `Malformed`,
/// never an error.
pub fn classify(event: &Value) -> Outcome {
    if event.get("type").and_then(Value::as_str) != Some(TURN_COMPLETE_EVENT) {
        return Outcome::Ignored;
    }
    let Some(message) = event.get("last-assistant-message").and_then(Value::as_str) else {
        return Outcome::Ignored;
    };

    if let Some(embedded) = try_parse_json(message) {
        if embedded.get("findings").is_some() {
            return match serde_json::from_value::<FindingsReport>(embedded) {
                Ok(report) => Outcome::Findings(report),
                Err(_) => Outcome::Malformed,
            };
        }
        let is_merge_request = embedded
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t.eq_ignore_ascii_case(MERGE_REQUEST_MARKER));
        if is_merge_request {
            return match serde_json::from_value::<MergeRequestNotice>(embedded) {
                Ok(notice) => Outcome::MergeRequest(notice),
                Err(_) => Outcome::Malformed,
            };
        }
    }

    if message.starts_with(JIRA_EXPLAIN_PREFIX) {
        return match parse_jira_summary(message) {
            Some(summary) => Outcome::JiraSummary(summary),
            None => Outcome::Malformed,
        };
    }

    Outcome::Ignored
}

/// Parse the message as embedded JSON only when it plausibly is JSON —
/// plain prose never pays a parse attempt.
fn try_parse_json(message: &str) -> Option<Value> {
    let first = message.chars().next()?;
    if first != '{' && first != '[' {
        return None;
    }
    serde_json::from_str(message).ok()
}

/// Split a `[JIRA-EXPLAIN-<ticket>]` tagged message into ticket id and body.
///
/// The body is the full message with JSON escape sequences decoded, then
/// the tag line removed. A tag with no closing bracket (or one closing
/// inside the prefix) yields `None`.
fn parse_jira_summary(message: &str) -> Option<JiraSummary> {
    let close = message.find(']')?;
    let ticket = message.get(JIRA_TICKET_START..close)?.trim().to_string();
    let unescaped = json_unescape(message);
    let text = JIRA_TAG_LINE.replace(&unescaped, "").into_owned();
    Some(JiraSummary { ticket, text })
}

/// Render a merge-request notice in chat markup. The fields are already in
/// the target dialect, so this output skips the markdown translation pass.
pub fn render_merge_request(notice: &MergeRequestNotice) -> String {
    let ticket = notice.ticket.as_str();
    let mut out = String::new();

    out.push_str(":jira: ");
    if ticket.is_empty() {
        out.push_str("*Ticket:* -\n");
    } else {
        // Jira browse links get their ticket key as the readable label
        let label = if ticket.contains("/browse/") {
            ticket.rsplit('/').next().unwrap_or(ticket)
        } else {
            ticket
        };
        out.push_str(&format!("*Ticket:* <{ticket}|{label}>\n"));
    }

    out.push_str(":gitlab_rocks: ");
    let pr = if notice.pr.is_empty() { "-" } else { &notice.pr };
    if notice.target.is_empty() {
        out.push_str(&format!("*PR:* {pr}\n"));
    } else {
        out.push_str(&format!("*{} PR:* {pr}\n", notice.target));
    }

    out.push_str(&format!(
        ":merged: *[ {} → {} ]*",
        notice.source, notice.target
    ));
    out
}

/// Translate a Jira summary body to chat markup for delivery.
pub fn render_jira_summary(summary: &JiraSummary) -> String {
    to_mrkdwn(&summary.text)
}
