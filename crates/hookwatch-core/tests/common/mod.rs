//! Common test utilities for integration tests.

#![allow(dead_code)]

use hookwatch_core::codec::encode_line;
use hookwatch_core::session_index::info_path;
use hookwatch_core::EntrySink;
use hookwatch_types::{Entry, Status};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sink that records everything it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub entries: Vec<Entry>,
    pub sources: Vec<PathBuf>,
}

impl EntrySink for RecordingSink {
    fn on_entry(&mut self, entry: &Entry) {
        self.entries.push(entry.clone());
    }

    fn on_new_source(&mut self, path: &Path) {
        self.sources.push(path.to_path_buf());
    }
}

/// Append one entry as a complete line.
pub fn append_entry(path: &Path, at: i64, status: Status, reviewer: &str) {
    let entry = Entry::new(at, status, reviewer, format!("{} says {}", reviewer, status));
    let mut file = std::fs::File::options()
        .create(true)
        .append(true)
        .open(path)
        .unwrap_or_else(|e| panic!("Failed to open {}: {}", path.display(), e));
    writeln!(file, "{}", encode_line(&entry).unwrap()).unwrap();
}

/// Write a session info file pointing at `project_dir`.
pub fn write_session_info(log_dir: &Path, session_id: &str, project_dir: &Path) {
    let info = serde_json::json!({
        "project_dir": project_dir.to_string_lossy(),
        "started_at": "2026-01-01T12:00:00Z",
    });
    std::fs::write(info_path(log_dir, session_id), info.to_string()).unwrap();
}
