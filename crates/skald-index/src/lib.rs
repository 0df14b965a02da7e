use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use skald_transcript::SessionRecord;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// The assembled index: working directory → branch → sessions, newest first.
///
/// BTreeMap keys give deterministic lexicographic order at both levels.
pub type SessionIndex = BTreeMap<String, BTreeMap<String, Vec<SessionRecord>>>;

/// Group session records by working directory, then branch, and sort each
/// group descending by parsed timestamp.
///
/// Timestamps that fail to parse as RFC 3339 instants (and missing ones)
/// pin to the epoch and therefore sort after every valid timestamp in the
/// same group. The sort is stable.
pub fn build_index(records: Vec<SessionRecord>) -> SessionIndex {
    let mut index = SessionIndex::new();
    for record in records {
        index
            .entry(record.working_directory.clone())
            .or_default()
            .entry(record.branch.clone())
            .or_default()
            .push(record);
    }
    for by_branch in index.values_mut() {
        for sessions in by_branch.values_mut() {
            sessions.sort_by_key(|s| Reverse(parse_instant(s.timestamp.as_deref())));
        }
    }
    index
}

fn parse_instant(timestamp: Option<&str>) -> OffsetDateTime {
    timestamp
        .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Serialize the index pretty-printed and write it atomically
/// (write-then-persist, so readers never observe a half-written file).
pub fn write_index(path: &Path, index: &SessionIndex) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(index)?;
    write_atomic(path, json.as_bytes())
}

fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cwd: &str, branch: &str, timestamp: Option<&str>, id: &str) -> SessionRecord {
        SessionRecord {
            session_id: Some(id.to_string()),
            working_directory: cwd.to_string(),
            branch: branch.to_string(),
            timestamp: timestamp.map(|s| s.to_string()),
            first_user_message: "msg".to_string(),
            source_path: format!("/sessions/{id}.jsonl"),
        }
    }

    fn ids(sessions: &[SessionRecord]) -> Vec<&str> {
        sessions
            .iter()
            .map(|s| s.session_id.as_deref().unwrap())
            .collect()
    }

    #[test]
    fn groups_by_cwd_then_branch() {
        let index = build_index(vec![
            record("/a", "main", Some("2025-01-01T00:00:00Z"), "s1"),
            record("/a", "feature", Some("2025-01-02T00:00:00Z"), "s2"),
            record("/b", "main", Some("2025-01-03T00:00:00Z"), "s3"),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index["/a"].len(), 2);
        assert_eq!(ids(&index["/a"]["main"]), vec!["s1"]);
        assert_eq!(ids(&index["/a"]["feature"]), vec!["s2"]);
        assert_eq!(ids(&index["/b"]["main"]), vec!["s3"]);
    }

    #[test]
    fn sessions_sorted_newest_first() {
        let index = build_index(vec![
            record("/a", "main", Some("2025-01-01T00:00:00Z"), "old"),
            record("/a", "main", Some("2025-03-01T00:00:00Z"), "new"),
            record("/a", "main", Some("2025-02-01T00:00:00Z"), "mid"),
        ]);

        assert_eq!(ids(&index["/a"]["main"]), vec!["new", "mid", "old"]);
    }

    #[test]
    fn unparsable_timestamp_sorts_last() {
        let index = build_index(vec![
            record("/a", "main", Some("not-a-timestamp"), "bad"),
            record("/a", "main", Some("2025-01-01T00:00:00Z"), "good"),
            record("/a", "main", None, "missing"),
        ]);

        let order = ids(&index["/a"]["main"]);
        assert_eq!(order[0], "good");
        // epoch-pinned records keep their relative input order (stable sort)
        assert_eq!(&order[1..], &["bad", "missing"]);
    }

    #[test]
    fn empty_input_yields_empty_index() {
        let index = build_index(vec![]);
        assert!(index.is_empty());
        assert_eq!(serde_json::to_string(&index).unwrap(), "{}");
    }

    #[test]
    fn serializes_camel_case_fields_in_nested_shape() {
        let index = build_index(vec![record(
            "/repo",
            "main",
            Some("2025-10-20T10:00:00Z"),
            "s1",
        )]);
        let json = serde_json::to_value(&index).unwrap();
        let entry = &json["/repo"]["main"][0];
        assert_eq!(entry["sessionId"], "s1");
        assert_eq!(entry["workingDirectory"], "/repo");
        assert_eq!(entry["branch"], "main");
        assert_eq!(entry["timestamp"], "2025-10-20T10:00:00Z");
        assert_eq!(entry["firstUserMessage"], "msg");
        assert_eq!(entry["sourcePath"], "/sessions/s1.jsonl");
    }

    #[test]
    fn write_index_overwrites_previous_file() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("index.json");

        let first = build_index(vec![record("/a", "main", None, "s1")]);
        write_index(&out, &first).unwrap();

        let second = build_index(vec![record("/b", "dev", None, "s2")]);
        write_index(&out, &second).unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.contains("\"/b\""));
        assert!(!content.contains("\"/a\""));
        // pretty-printed output
        assert!(content.contains('\n'));
    }

    #[test]
    fn write_index_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("deep").join("nested").join("index.json");
        write_index(&out, &SessionIndex::new()).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "{}");
    }
}
