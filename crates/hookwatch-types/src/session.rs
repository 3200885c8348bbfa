//! Session metadata types.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Metadata the dispatcher stores next to a session's event log
/// (`<sessionId>.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Project directory the session was started in.
    pub project_dir: String,
    /// ISO-8601 start time.
    pub started_at: String,
}

impl SessionInfo {
    /// Parsed start time, `None` when the stored value is not RFC 3339.
    pub fn started_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.started_at).ok()
    }
}

/// Summary view of a session for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub project_dir: Option<PathBuf>,
    pub started_at: Option<DateTime<FixedOffset>>,
    /// Number of decodable entries in the session's log.
    pub entry_count: usize,
}

/// Truncated digest naming a project's aggregate log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectHash(String);

impl ProjectHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_at_parses_rfc3339() {
        let info = SessionInfo {
            project_dir: "/repo".to_string(),
            started_at: "2026-03-01T09:30:00.000Z".to_string(),
        };
        let parsed = info.started_at().unwrap();
        assert_eq!(parsed.timestamp(), 1_772_357_400);
    }

    #[test]
    fn test_started_at_invalid_is_none() {
        let info = SessionInfo {
            project_dir: "/repo".to_string(),
            started_at: "yesterday".to_string(),
        };
        assert!(info.started_at().is_none());
    }
}
