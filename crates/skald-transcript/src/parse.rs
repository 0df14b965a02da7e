use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const NO_CWD: &str = "(no-cwd)";
pub const NO_BRANCH: &str = "(no-branch)";
pub const NO_USER_MESSAGE: &str = "(no user message)";

/// Max length of the extracted first user message, ellipsis included.
const MESSAGE_MAX_CHARS: usize = 120;

/// Angle-bracket tag spans injected into user text (`<environment_context>` etc.).
static TAG_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// One parsed session transcript.
///
/// `working_directory`, `branch`, and `first_user_message` are always
/// populated — transcripts missing those facts get the `(no-*)` defaults.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: Option<String>,
    pub working_directory: String,
    pub branch: String,
    pub timestamp: Option<String>,
    pub first_user_message: String,
    pub source_path: String,
}

#[derive(Default)]
struct SessionMeta {
    session_id: Option<String>,
    timestamp: Option<String>,
    cwd: Option<String>,
    branch: Option<String>,
}

/// Parse one transcript JSONL file into a [`SessionRecord`].
///
/// A transcript is a sequence of independent JSON objects, one per line.
/// The first `session_meta` record wins for metadata; the first useful
/// `input_text` block of a user message wins for the message. Scanning
/// stops early once both are found.
///
/// Returns `None` if the file cannot be opened or read — the caller skips
/// it and continues. Lines that fail to parse as JSON are skipped.
pub fn parse_transcript(path: &Path) -> Option<SessionRecord> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("[skald] failed to open {}: {e}", path.display());
            return None;
        }
    };
    let reader = BufReader::new(file);

    let mut meta: Option<SessionMeta> = None;
    let mut first_user_message: Option<String> = None;

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("[skald] failed to read {}: {e}", path.display());
                return None;
            }
        };
        if line.is_empty() {
            continue;
        }

        let parsed: serde_json::Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let record_type = parsed.get("type").and_then(|v| v.as_str()).unwrap_or("");

        if meta.is_none() && record_type == "session_meta" {
            meta = Some(read_session_meta(parsed.get("payload")));
            continue;
        }

        if first_user_message.is_none() && record_type == "response_item" {
            if let Some(payload) = parsed.get("payload") {
                if is_user_message(payload) {
                    first_user_message = first_useful_text(payload.get("content"));
                }
            }
        }

        if meta.is_some() && first_user_message.is_some() {
            break;
        }
    }

    let meta = meta.unwrap_or_default();
    Some(SessionRecord {
        session_id: meta.session_id,
        working_directory: meta.cwd.unwrap_or_else(|| NO_CWD.to_string()),
        branch: meta
            .branch
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| NO_BRANCH.to_string()),
        timestamp: meta.timestamp,
        first_user_message: first_user_message.unwrap_or_else(|| NO_USER_MESSAGE.to_string()),
        source_path: path.display().to_string(),
    })
}

fn read_session_meta(payload: Option<&serde_json::Value>) -> SessionMeta {
    let Some(payload) = payload else {
        return SessionMeta::default();
    };
    SessionMeta {
        session_id: str_field(payload, "id"),
        timestamp: str_field(payload, "timestamp"),
        cwd: str_field(payload, "cwd"),
        branch: payload.get("git").and_then(|git| str_field(git, "branch")),
    }
}

fn str_field(value: &serde_json::Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn is_user_message(payload: &serde_json::Value) -> bool {
    payload.get("type").and_then(|v| v.as_str()) == Some("message")
        && payload.get("role").and_then(|v| v.as_str()) == Some("user")
}

/// Scan content blocks in order for the first `input_text` whose text is
/// useful, returning it cleaned and shortened.
fn first_useful_text(content: Option<&serde_json::Value>) -> Option<String> {
    let blocks = content.and_then(|c| c.as_array())?;
    for block in blocks {
        if block.get("type").and_then(|v| v.as_str()) != Some("input_text") {
            continue;
        }
        if let Some(text) = block.get("text").and_then(|v| v.as_str()) {
            if is_useful_message(text) {
                return Some(shorten(&clean_message(text)));
            }
        }
    }
    None
}

/// Genuine human text: non-empty after trimming and not injected structured
/// content (environment context tags, JSON objects/arrays).
fn is_useful_message(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && !text.starts_with("<environment_context>")
        && !text.starts_with('{')
        && !text.starts_with('[')
}

/// Strip angle-bracket tag spans and trim.
fn clean_message(text: &str) -> String {
    TAG_SPAN.replace_all(text, "").trim().to_string()
}

/// Collapse whitespace runs to single spaces and truncate to
/// [`MESSAGE_MAX_CHARS`], replacing the last 3 chars with an ellipsis when
/// truncation occurs. Idempotent on already-short input.
fn shorten(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MESSAGE_MAX_CHARS {
        let head: String = collapsed.chars().take(MESSAGE_MAX_CHARS - 3).collect();
        format!("{head}...")
    } else {
        collapsed
    }
}
