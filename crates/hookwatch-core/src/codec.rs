//! Line codec for `.jsonl` event logs.
//!
//! Decoding never fails loudly: blank lines and lines that are not a valid
//! entry are dropped, since a log is written by other processes and may
//! contain anything from half-flushed writes to foreign records.

use crate::Result;
use hookwatch_types::Entry;
use std::path::Path;
use tracing::trace;

/// Decode one log line. Returns `None` for blank or malformed input.
pub fn decode_line(line: &str) -> Option<Entry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Entry>(line) {
        Ok(entry) => Some(entry),
        Err(e) => {
            trace!(
                target: "hookwatch::codec",
                "Skipping malformed log line: {} - {}",
                e,
                line.chars().take(100).collect::<String>()
            );
            None
        }
    }
}

/// Decode every line of a chunk of log text, in order.
pub fn decode_lines(text: &str) -> Vec<Entry> {
    text.lines().filter_map(decode_line).collect()
}

/// Encode an entry as a single log line (without the trailing newline).
pub fn encode_line(entry: &Entry) -> Result<String> {
    Ok(serde_json::to_string(entry)?)
}

/// Read and decode a whole log file. A missing or unreadable file yields no
/// entries.
pub fn read_log(path: &Path) -> Vec<Entry> {
    match std::fs::read(path) {
        Ok(bytes) => decode_lines(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            trace!(
                target: "hookwatch::codec",
                "Could not read {}: {}",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}
