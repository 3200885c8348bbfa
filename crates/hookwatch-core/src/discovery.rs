//! Log discovery: which event-log files exist and which view they belong to.
//!
//! A log directory holds per-session logs (`<sessionId>.jsonl`), project
//! aggregate logs (`project_<hash>.jsonl`) and session info files
//! (`<sessionId>.json`). Files with a fixture or in-progress prefix are
//! never surfaced.

use crate::project::{normalize_path, project_hash, AGGREGATE_PREFIX};
use crate::{session_index, HookwatchError, Result};
use hookwatch_types::ProjectHash;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Extension of event-log files.
pub const LOG_EXTENSION: &str = "jsonl";

/// Prefix reserved for test fixtures.
pub const FIXTURE_PREFIX: &str = "test-";

/// Prefix the dispatcher uses while a file is still being created.
pub const IN_PROGRESS_PREFIX: &str = "tmp-";

/// What an event-log file is, derived from its name alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogKind {
    Session(String),
    Aggregate(ProjectHash),
}

/// Classify a path by name. Returns `None` for anything that is not a
/// surfaced event log.
pub fn classify(path: &Path) -> Option<LogKind> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(LOG_EXTENSION) => {}
        _ => return None,
    }

    let stem = path.file_stem().and_then(|s| s.to_str())?;
    if stem.is_empty() || stem.starts_with(FIXTURE_PREFIX) || stem.starts_with(IN_PROGRESS_PREFIX)
    {
        return None;
    }

    match stem.strip_prefix(AGGREGATE_PREFIX) {
        Some(hash) => Some(LogKind::Aggregate(ProjectHash::new(hash))),
        None => Some(LogKind::Session(stem.to_string())),
    }
}

/// Path of a session's event log (may not exist).
pub fn session_log_path(dir: &Path, session_id: &str) -> PathBuf {
    dir.join(format!("{}.{}", session_id, LOG_EXTENSION))
}

/// Every surfaced event log in `dir`, sorted by file name.
///
/// A missing directory is not an error; it simply has no logs.
pub fn list_all(dir: &Path) -> Vec<PathBuf> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    target: "hookwatch::discovery",
                    "Cannot read log directory {}: {}",
                    dir.display(),
                    e
                );
            }
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| classify(path).is_some())
        .collect();

    paths.sort();
    paths
}

/// Session ids of every per-session log in `dir`, sorted.
pub fn list_session_ids(dir: &Path) -> Vec<String> {
    list_all(dir)
        .iter()
        .filter_map(|path| match classify(path) {
            Some(LogKind::Session(id)) => Some(id),
            _ => None,
        })
        .collect()
}

/// The project's aggregate log (if present) followed by every per-session
/// log whose info names the same project directory.
pub fn list_for_project(dir: &Path, project_dir: &Path) -> Vec<PathBuf> {
    let hash = project_hash(project_dir);
    let target = normalize_path(project_dir);

    let mut aggregate = Vec::new();
    let mut sessions = Vec::new();

    for path in list_all(dir) {
        match classify(&path) {
            Some(LogKind::Aggregate(h)) if h == hash => aggregate.push(path),
            Some(LogKind::Session(id)) if session_index::in_project(dir, &id, &target) => {
                sessions.push(path)
            }
            _ => {}
        }
    }

    debug!(
        target: "hookwatch::discovery",
        "Project {} has {} aggregate and {} session logs",
        target.display(),
        aggregate.len(),
        sessions.len()
    );

    aggregate.extend(sessions);
    aggregate
}

/// The most recently modified per-session log. Ties go to the
/// lexicographically smallest id.
pub fn find_latest(dir: &Path) -> Option<String> {
    list_all(dir)
        .into_iter()
        .filter_map(|path| match classify(&path) {
            Some(LogKind::Session(id)) => Some((modified_time(&path), id)),
            _ => None,
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map(|(_, id)| id)
}

/// Result of a session-id prefix lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixMatch {
    None,
    Unique(String),
    Ambiguous(Vec<String>),
}

/// Case-sensitive prefix match over a set of session ids.
pub fn match_prefix(ids: &[String], prefix: &str) -> PrefixMatch {
    let mut matches: Vec<String> = ids
        .iter()
        .filter(|id| id.starts_with(prefix))
        .cloned()
        .collect();
    matches.sort();

    match matches.len() {
        0 => PrefixMatch::None,
        1 => PrefixMatch::Unique(matches.remove(0)),
        _ => PrefixMatch::Ambiguous(matches),
    }
}

/// Prefix match over the per-session logs in `dir`.
pub fn find_by_prefix(dir: &Path, prefix: &str) -> PrefixMatch {
    match_prefix(&list_session_ids(dir), prefix)
}

/// Resolve a user-supplied session reference to a session id.
///
/// An exact id wins over prefix matching; `None` means the latest session.
pub fn resolve_session(dir: &Path, reference: Option<&str>) -> Result<String> {
    let ids = list_session_ids(dir);
    if ids.is_empty() {
        return Err(HookwatchError::NoSessions(dir.to_path_buf()));
    }

    let Some(reference) = reference else {
        return find_latest(dir).ok_or_else(|| HookwatchError::NoSessions(dir.to_path_buf()));
    };

    if ids.iter().any(|id| id == reference) {
        return Ok(reference.to_string());
    }

    match match_prefix(&ids, reference) {
        PrefixMatch::Unique(id) => Ok(id),
        PrefixMatch::None => Err(HookwatchError::SessionNotFound(reference.to_string())),
        PrefixMatch::Ambiguous(candidates) => Err(HookwatchError::AmbiguousSession {
            prefix: reference.to_string(),
            candidates,
        }),
    }
}

fn modified_time(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "").unwrap();
        path
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
    }

    // ==================== Classification ====================

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(Path::new("/logs/abc.jsonl")),
            Some(LogKind::Session("abc".to_string()))
        );
        assert_eq!(
            classify(Path::new("/logs/project_0123456789ab.jsonl")),
            Some(LogKind::Aggregate(ProjectHash::new("0123456789ab")))
        );
        assert_eq!(classify(Path::new("/logs/abc.json")), None);
        assert_eq!(classify(Path::new("/logs/test-fixture.jsonl")), None);
        assert_eq!(classify(Path::new("/logs/tmp-abc.jsonl")), None);
        assert_eq!(classify(Path::new("/logs/.jsonl")), None);
    }

    // ==================== Listing ====================

    #[test]
    fn test_list_all_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.jsonl");
        touch(tmp.path(), "a.jsonl");
        touch(tmp.path(), "a.json");
        touch(tmp.path(), "project_0123456789ab.jsonl");
        touch(tmp.path(), "test-sample.jsonl");
        touch(tmp.path(), "tmp-writing.jsonl");
        touch(tmp.path(), "notes.txt");
        fs::create_dir(tmp.path().join("dir.jsonl")).unwrap();

        let names: Vec<String> = list_all(tmp.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jsonl", "b.jsonl", "project_0123456789ab.jsonl"]);
    }

    #[test]
    fn test_list_all_missing_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(list_all(&tmp.path().join("nope")).is_empty());
    }

    // ==================== Latest ====================

    #[test]
    fn test_find_latest_by_mtime() {
        let tmp = TempDir::new().unwrap();
        let old = touch(tmp.path(), "old.jsonl");
        let new = touch(tmp.path(), "new.jsonl");
        let agg = touch(tmp.path(), "project_0123456789ab.jsonl");
        set_mtime(&old, 1_000);
        set_mtime(&new, 2_000);
        set_mtime(&agg, 3_000);

        assert_eq!(find_latest(tmp.path()), Some("new".to_string()));
    }

    #[test]
    fn test_find_latest_tie_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        let b = touch(tmp.path(), "bbb.jsonl");
        let a = touch(tmp.path(), "aaa.jsonl");
        set_mtime(&a, 5_000);
        set_mtime(&b, 5_000);

        assert_eq!(find_latest(tmp.path()), Some("aaa".to_string()));
    }

    #[test]
    fn test_find_latest_empty() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "test-only.jsonl");
        assert_eq!(find_latest(tmp.path()), None);
    }

    // ==================== Prefix lookup ====================

    #[test]
    fn test_find_by_prefix() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "abc123.jsonl");
        touch(tmp.path(), "abc999.jsonl");
        touch(tmp.path(), "xyz000.jsonl");

        assert_eq!(
            find_by_prefix(tmp.path(), "abc"),
            PrefixMatch::Ambiguous(vec!["abc123".to_string(), "abc999".to_string()])
        );
        assert_eq!(
            find_by_prefix(tmp.path(), "xyz"),
            PrefixMatch::Unique("xyz000".to_string())
        );
        assert_eq!(find_by_prefix(tmp.path(), "qqq"), PrefixMatch::None);
        assert_eq!(find_by_prefix(tmp.path(), "ABC"), PrefixMatch::None);
    }

    #[test]
    fn test_resolve_session_errors() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            resolve_session(tmp.path(), None),
            Err(HookwatchError::NoSessions(_))
        ));

        touch(tmp.path(), "abc123.jsonl");
        touch(tmp.path(), "abc999.jsonl");

        match resolve_session(tmp.path(), Some("abc")) {
            Err(HookwatchError::AmbiguousSession { candidates, .. }) => {
                assert_eq!(candidates, vec!["abc123", "abc999"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
        assert!(matches!(
            resolve_session(tmp.path(), Some("zzz")),
            Err(HookwatchError::SessionNotFound(_))
        ));
        assert_eq!(resolve_session(tmp.path(), Some("abc9")).unwrap(), "abc999");
    }

    #[test]
    fn test_resolve_exact_match_over_prefix() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "abc.jsonl");
        touch(tmp.path(), "abcdef.jsonl");
        assert_eq!(resolve_session(tmp.path(), Some("abc")).unwrap(), "abc");
    }

    #[test]
    fn test_ambiguous_error_lists_candidates() {
        let err = HookwatchError::AmbiguousSession {
            prefix: "abc".to_string(),
            candidates: vec!["abc123".to_string(), "abc999".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("abc123"));
        assert!(message.contains("abc999"));
    }
}
