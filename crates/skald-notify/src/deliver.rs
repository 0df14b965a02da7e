use std::time::Duration;

use serde_json::Value;

use crate::classify::{render_jira_summary, render_merge_request, Outcome};
use crate::findings::render_findings;
use crate::mrkdwn::to_mrkdwn;

const TIMEOUT: Duration = Duration::from_secs(5);

// ── Config ──

/// Which webhook a routable outcome goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Jira,
    Review,
    MergeRequest,
}

/// Outbound webhook endpoints, resolved from the environment once at
/// process start and passed down — rendering code never reads env.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    pub jira: Option<String>,
    pub review: Option<String>,
    pub merge_request: Option<String>,
}

impl WebhookConfig {
    /// Read `SKALD_JIRA_WEBHOOK_URL`, `SKALD_REVIEW_WEBHOOK_URL`, and
    /// `SKALD_MR_WEBHOOK_URL`. Unset or blank vars leave the channel off.
    pub fn from_env() -> Self {
        Self {
            jira: env_url("SKALD_JIRA_WEBHOOK_URL"),
            review: env_url("SKALD_REVIEW_WEBHOOK_URL"),
            merge_request: env_url("SKALD_MR_WEBHOOK_URL"),
        }
    }

    pub fn url_for(&self, kind: ChannelKind) -> Option<&str> {
        match kind {
            ChannelKind::Jira => self.jira.as_deref(),
            ChannelKind::Review => self.review.as_deref(),
            ChannelKind::MergeRequest => self.merge_request.as_deref(),
        }
    }
}

fn env_url(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ── Dispatch ──

/// Render a routable outcome into its channel and payload.
/// `Ignored` and `Malformed` yield `None`.
pub fn render_payload(outcome: &Outcome) -> Option<(ChannelKind, Value)> {
    match outcome {
        Outcome::Ignored | Outcome::Malformed => None,
        Outcome::Findings(report) => Some((
            ChannelKind::Review,
            text_payload(&to_mrkdwn(&render_findings(report))),
        )),
        Outcome::MergeRequest(notice) => Some((
            ChannelKind::MergeRequest,
            text_payload(&render_merge_request(notice)),
        )),
        Outcome::JiraSummary(summary) => Some((
            ChannelKind::Jira,
            jira_payload(&render_jira_summary(summary), &summary.ticket),
        )),
    }
}

/// Deliver one classified outcome to its configured webhook.
/// Failures are logged to stderr but never propagated.
pub fn dispatch(config: &WebhookConfig, outcome: &Outcome) {
    let Some((kind, payload)) = render_payload(outcome) else {
        return;
    };
    let Some(url) = config.url_for(kind) else {
        eprintln!("[skald] no webhook configured for {kind:?} notifications");
        return;
    };
    if let Err(e) = post_json(url, &payload) {
        eprintln!("[skald] failed to deliver {kind:?} notification: {e}");
    }
}

// ── Payloads ──

/// Build the `{"text": ...}` payload. Carriage returns are dropped from the
/// text before encoding.
pub fn text_payload(text: &str) -> Value {
    serde_json::json!({ "text": text.replace('\r', "") })
}

/// Jira payload additionally carries the ticket id.
pub fn jira_payload(text: &str, ticket: &str) -> Value {
    serde_json::json!({ "text": text.replace('\r', ""), "ticket": ticket })
}

/// POST one JSON payload. Non-2xx responses are logged to stderr with
/// their body and are not retried; only transport errors return `Err`.
pub fn post_json(url: &str, payload: &Value) -> anyhow::Result<()> {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(TIMEOUT))
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = agent
        .post(url)
        .header("Content-Type", "application/json; charset=UTF-8")
        .send(payload.to_string())?;

    if !response.status().is_success() {
        let body = response.body_mut().read_to_string().unwrap_or_default();
        eprintln!("[skald] webhook returned {}: {body}", response.status());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{JiraSummary, MergeRequestNotice};
    use crate::findings::FindingsReport;

    #[test]
    fn ignored_and_malformed_render_nothing() {
        assert!(render_payload(&Outcome::Ignored).is_none());
        assert!(render_payload(&Outcome::Malformed).is_none());
    }

    #[test]
    fn findings_route_to_review_channel() {
        let report: FindingsReport = serde_json::from_str(r#"{"findings":[]}"#).unwrap();
        let (kind, payload) = render_payload(&Outcome::Findings(report)).unwrap();
        assert_eq!(kind, ChannelKind::Review);
        let text = payload["text"].as_str().unwrap();
        assert!(text.contains("Code Review Findings"));
    }

    #[test]
    fn merge_request_routes_to_merge_request_channel() {
        let notice = MergeRequestNotice {
            ticket: String::new(),
            pr: "!1".to_string(),
            source: "a".to_string(),
            target: "b".to_string(),
        };
        let (kind, payload) = render_payload(&Outcome::MergeRequest(notice)).unwrap();
        assert_eq!(kind, ChannelKind::MergeRequest);
        assert!(payload["text"].as_str().unwrap().contains("*[ a → b ]*"));
        assert!(payload.get("ticket").is_none());
    }

    #[test]
    fn jira_summary_routes_to_jira_channel_with_ticket() {
        let summary = JiraSummary {
            ticket: "OPS-7".to_string(),
            text: "summary body".to_string(),
        };
        let (kind, payload) = render_payload(&Outcome::JiraSummary(summary)).unwrap();
        assert_eq!(kind, ChannelKind::Jira);
        assert_eq!(payload["ticket"], "OPS-7");
        assert_eq!(payload["text"], "summary body");
    }

    #[test]
    fn payload_drops_carriage_returns() {
        let payload = text_payload("line one\r\nline two\r");
        assert_eq!(payload["text"], "line one\nline two");
    }

    #[test]
    fn payload_serializes_with_escaped_specials() {
        let payload = text_payload("quote \" backslash \\ tab\t");
        assert_eq!(
            payload.to_string(),
            r#"{"text":"quote \" backslash \\ tab\t"}"#
        );
    }

    #[test]
    fn dispatch_without_configured_url_is_a_no_op() {
        let config = WebhookConfig::default();
        let summary = JiraSummary {
            ticket: "OPS-1".to_string(),
            text: "body".to_string(),
        };
        // must not panic or attempt network I/O
        dispatch(&config, &Outcome::JiraSummary(summary));
    }

    #[test]
    fn url_for_maps_channels() {
        let config = WebhookConfig {
            jira: Some("http://j".to_string()),
            review: Some("http://r".to_string()),
            merge_request: None,
        };
        assert_eq!(config.url_for(ChannelKind::Jira), Some("http://j"));
        assert_eq!(config.url_for(ChannelKind::Review), Some("http://r"));
        assert_eq!(config.url_for(ChannelKind::MergeRequest), None);
    }
}
