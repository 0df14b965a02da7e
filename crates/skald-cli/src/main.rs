mod cmd_channels;
mod cmd_index;
mod cmd_notify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "skald",
    version,
    about = "Per-branch session index and webhook notifications for Codex agents"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the per-branch session index from transcript files
    Index {
        /// Sessions root directory (default: ~/.codex/sessions)
        root: Option<PathBuf>,
        /// Output index file (default: ~/.codex/codex_sessions_index.json)
        output: Option<PathBuf>,
    },
    /// Classify one agent event and deliver the matching webhook notification
    Notify {
        /// Raw event JSON
        event: Option<String>,
        /// Print the rendered payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show which webhook endpoints are configured
    Channels,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Index { root, output } => cmd_index::execute(root.as_deref(), output.as_deref()),
        Command::Notify { event, dry_run } => {
            let config = skald_notify::WebhookConfig::from_env();
            cmd_notify::execute(&config, event.as_deref(), dry_run)
        }
        Command::Channels => cmd_channels::execute(&skald_notify::WebhookConfig::from_env()),
    }
}
