use skald_notify::{ChannelKind, WebhookConfig};

const CHANNELS: [(&str, ChannelKind, &str); 3] = [
    ("jira", ChannelKind::Jira, "SKALD_JIRA_WEBHOOK_URL"),
    ("review", ChannelKind::Review, "SKALD_REVIEW_WEBHOOK_URL"),
    ("merge-request", ChannelKind::MergeRequest, "SKALD_MR_WEBHOOK_URL"),
];

/// Show which webhook endpoints are configured. URL values are never printed.
pub fn execute(config: &WebhookConfig) -> anyhow::Result<()> {
    if CHANNELS
        .iter()
        .all(|(_, kind, _)| config.url_for(*kind).is_none())
    {
        println!("No webhook channels configured.");
        println!();
        println!("Set SKALD_JIRA_WEBHOOK_URL, SKALD_REVIEW_WEBHOOK_URL, or SKALD_MR_WEBHOOK_URL.");
        return Ok(());
    }

    for (name, kind, var) in CHANNELS {
        match config.url_for(kind) {
            Some(_) => println!("  {name:<14} configured ({var})"),
            None => println!("  {name:<14} not set ({var})"),
        }
    }
    Ok(())
}
