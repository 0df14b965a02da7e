mod classify;
mod deliver;
mod findings;
mod mrkdwn;

pub use classify::{
    classify, render_jira_summary, render_merge_request, JiraSummary, MergeRequestNotice, Outcome,
    TURN_COMPLETE_EVENT,
};
pub use deliver::{
    dispatch, jira_payload, post_json, render_payload, text_payload, ChannelKind, WebhookConfig,
};
pub use findings::{render_findings, CodeLocation, Finding, FindingsReport, LineRange};
pub use mrkdwn::{escape_text, json_unescape, to_mrkdwn};
