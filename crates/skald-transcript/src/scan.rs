use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Fatal scan failure — the sessions root itself is unusable.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("sessions directory not found: {0}")]
    RootNotFound(PathBuf),
}

/// Recursively collect transcript files (`*.jsonl`) under the sessions root.
///
/// Unreadable subtrees do not abort the scan; they are counted and surfaced
/// as one aggregate stderr warning. Order of the returned paths is whatever
/// the directory walk yields.
pub fn discover_transcripts(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let mut unreadable = 0usize;

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => {
                unreadable += 1;
                continue;
            }
        };
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "jsonl")
        {
            files.push(entry.into_path());
        }
    }

    if unreadable > 0 {
        eprintln!(
            "[skald] warning: skipped {unreadable} unreadable entries under {}",
            root.display()
        );
    }

    Ok(files)
}
