//! Session metadata lookup.
//!
//! Info files are advisory: they feed the list view and project matching,
//! but tailing never depends on them, so a missing or corrupt file is just
//! `None`.

use crate::codec::read_log;
use crate::discovery::{list_session_ids, session_log_path};
use crate::project::normalize_path;
use hookwatch_types::{SessionInfo, SessionSummary};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of session info files.
pub const INFO_EXTENSION: &str = "json";

/// Path of a session's info file (may not exist).
pub fn info_path(dir: &Path, session_id: &str) -> PathBuf {
    dir.join(format!("{}.{}", session_id, INFO_EXTENSION))
}

/// Load a session's info file.
pub fn load(dir: &Path, session_id: &str) -> Option<SessionInfo> {
    let path = info_path(dir, session_id);
    let content = std::fs::read_to_string(&path).ok()?;

    match serde_json::from_str(&content) {
        Ok(info) => Some(info),
        Err(e) => {
            debug!(
                target: "hookwatch::discovery",
                "Ignoring corrupt session info {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Whether a session's info names `project_dir`, which must already be
/// normalized.
pub fn in_project(dir: &Path, session_id: &str, project_dir: &Path) -> bool {
    load(dir, session_id)
        .map(|info| normalize_path(Path::new(&info.project_dir)) == project_dir)
        .unwrap_or(false)
}

/// Summary of one session for the list view.
pub fn summarize(dir: &Path, session_id: &str) -> SessionSummary {
    let info = load(dir, session_id);
    SessionSummary {
        session_id: session_id.to_string(),
        project_dir: info.as_ref().map(|i| PathBuf::from(&i.project_dir)),
        started_at: info.as_ref().and_then(|i| i.started_at()),
        entry_count: read_log(&session_log_path(dir, session_id)).len(),
    }
}

/// Every session in `dir`, optionally restricted to one project.
///
/// Sorted by start time descending; sessions without a usable start time go
/// last, ordered by id.
pub fn list_sessions(dir: &Path, project_dir: Option<&Path>) -> Vec<SessionSummary> {
    let target = project_dir.map(normalize_path);

    let mut sessions: Vec<SessionSummary> = list_session_ids(dir)
        .iter()
        .filter(|id| match &target {
            Some(target) => in_project(dir, id, target),
            None => true,
        })
        .map(|id| summarize(dir, id))
        .collect();

    sessions.sort_by(|a, b| match (&a.started_at, &b.started_at) {
        (Some(x), Some(y)) => y.cmp(x).then_with(|| a.session_id.cmp(&b.session_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.session_id.cmp(&b.session_id),
    });
    sessions
}
