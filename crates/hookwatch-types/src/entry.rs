//! Event-log entry types.
//!
//! One `Entry` is one line of a `.jsonl` event log written by the hook
//! dispatcher. Field names on the wire are camelCase.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Outcome of a single check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
    Skip,
    Crash,
    Running,
    Appeal,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Pass,
        Status::Fail,
        Status::Skip,
        Status::Crash,
        Status::Running,
        Status::Appeal,
    ];

    /// Wire spelling, also used as the rendered label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Skip => "SKIP",
            Status::Crash => "CRASH",
            Status::Running => "RUNNING",
            Status::Appeal => "APPEAL",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| {
                format!(
                    "Invalid status: '{}'. Use one of PASS, FAIL, SKIP, CRASH, RUNNING, APPEAL.",
                    s
                )
            })
    }
}

/// Detail recorded by an AI reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDetail {
    pub prompt: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backchannel: Option<Value>,
}

/// Detail recorded by a script check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptDetail {
    pub command: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

/// Verbose payload attached to an entry.
///
/// The wire format carries no tag; the variant is picked from which fields
/// are present. Agent detail wins when both shapes would match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerboseDetail {
    Agent(AgentDetail),
    Script(ScriptDetail),
}

/// One structured record describing the outcome of a single check run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Epoch milliseconds.
    pub at: i64,
    pub status: Status,
    pub reviewer: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_progress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// A payload matching neither shape is dropped rather than failing the
    /// whole entry.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_verbose"
    )]
    pub verbose: Option<VerboseDetail>,
}

impl Entry {
    /// Minimal entry with no optional fields set.
    pub fn new(
        at: i64,
        status: Status,
        reviewer: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            at,
            status,
            reviewer: reviewer.into(),
            reason: reason.into(),
            duration_ms: None,
            hook_event: None,
            trigger_progress: None,
            session_id: None,
            verbose: None,
        }
    }

    /// First line of the reason, used by the compact view.
    pub fn summary(&self) -> &str {
        let first = self.reason.split('\n').next().unwrap_or_default();
        first.strip_suffix('\r').unwrap_or(first)
    }
}

fn lenient_verbose<'de, D>(deserializer: D) -> Result<Option<VerboseDetail>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!("fail".parse::<Status>().unwrap(), Status::Fail);
        assert_eq!(" Running ".parse::<Status>().unwrap(), Status::Running);
        assert!("broken".parse::<Status>().is_err());
    }

    #[test]
    fn test_verbose_agent_shape() {
        let entry: Entry = serde_json::from_value(json!({
            "at": 1, "status": "PASS", "reviewer": "r", "reason": "ok",
            "verbose": {"prompt": "p", "response": "r", "model": "m"}
        }))
        .unwrap();
        match entry.verbose {
            Some(VerboseDetail::Agent(detail)) => assert_eq!(detail.model.as_deref(), Some("m")),
            other => panic!("expected agent detail, got {:?}", other),
        }
    }

    #[test]
    fn test_verbose_script_shape() {
        let entry: Entry = serde_json::from_value(json!({
            "at": 1, "status": "FAIL", "reviewer": "tests", "reason": "exit 1",
            "verbose": {"command": "cargo test", "output": "boom", "exitCode": 1}
        }))
        .unwrap();
        match entry.verbose {
            Some(VerboseDetail::Script(detail)) => assert_eq!(detail.exit_code, Some(1)),
            other => panic!("expected script detail, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognised_verbose_is_dropped() {
        let entry: Entry = serde_json::from_value(json!({
            "at": 1, "status": "SKIP", "reviewer": "r", "reason": "n/a",
            "verbose": {"something": "else"}
        }))
        .unwrap();
        assert!(entry.verbose.is_none());
    }

    #[test]
    fn test_summary_takes_first_line() {
        let entry = Entry::new(0, Status::Pass, "r", "first\r\nsecond\nthird");
        assert_eq!(entry.summary(), "first");
    }
}
