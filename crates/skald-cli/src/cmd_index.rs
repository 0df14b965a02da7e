use std::path::{Path, PathBuf};

const CODEX_DIR: &str = ".codex";
const SESSIONS_DIR: &str = "sessions";
const INDEX_FILE: &str = "codex_sessions_index.json";

/// Scan the sessions root, parse every transcript, and write the grouped
/// index.
///
/// An unusable root is fatal (non-zero exit, no output written). A failed
/// output write is reported on stderr but leaves the exit code at zero.
pub fn execute(root: Option<&Path>, output: Option<&Path>) -> anyhow::Result<()> {
    let root = match root {
        Some(p) => p.to_path_buf(),
        None => default_codex_dir()?.join(SESSIONS_DIR),
    };
    let output = match output {
        Some(p) => p.to_path_buf(),
        None => default_codex_dir()?.join(INDEX_FILE),
    };

    let files = skald_transcript::discover_transcripts(&root)?;
    let records: Vec<_> = files
        .iter()
        .filter_map(|path| skald_transcript::parse_transcript(path))
        .collect();
    let index = skald_index::build_index(records);

    match skald_index::write_index(&output, &index) {
        Ok(()) => println!("index written to {}", output.display()),
        Err(e) => eprintln!("[skald] failed to write index: {e}"),
    }
    Ok(())
}

fn default_codex_dir() -> anyhow::Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CODEX_DIR))
        .ok_or_else(|| anyhow::anyhow!("could not determine home directory"))
}
