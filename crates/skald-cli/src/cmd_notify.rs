use skald_notify::WebhookConfig;

/// Handle one raw event argument.
///
/// Never fails the process: a missing argument prints usage, an unparsable
/// event or a non-actionable outcome is a no-op, and delivery failures are
/// logged by the dispatcher.
pub fn execute(config: &WebhookConfig, event_json: Option<&str>, dry_run: bool) -> anyhow::Result<()> {
    let Some(raw) = event_json.filter(|s| !s.trim().is_empty()) else {
        eprintln!("usage: skald notify '<EVENT_JSON>'");
        return Ok(());
    };

    let Ok(event) = serde_json::from_str::<serde_json::Value>(raw) else {
        return Ok(());
    };

    let outcome = skald_notify::classify(&event);
    if dry_run {
        match skald_notify::render_payload(&outcome) {
            Some((kind, payload)) => println!("{kind:?} -> {payload}"),
            None => println!("nothing to send"),
        }
        return Ok(());
    }

    skald_notify::dispatch(config, &outcome);
    Ok(())
}
