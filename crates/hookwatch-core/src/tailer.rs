//! Live tailing of a single append-only event log.
//!
//! Growth is detected by polling the file size on a fixed interval rather
//! than through filesystem notifications, which are unreliable on network
//! and virtual filesystems. Only the bytes appended since the last poll are
//! read, and only up to the last complete line, so a line being written
//! while we poll is picked up whole on a later poll.

use crate::codec::decode_lines;
use crate::Result;
use hookwatch_types::Entry;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Default size-poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Entries read from one file in one poll.
#[derive(Debug, Clone)]
pub struct TailEvent {
    pub path: PathBuf,
    pub entries: Vec<Entry>,
}

/// Lifecycle of a tailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailState {
    /// Holding an offset, nothing scheduled.
    Idle,
    /// Polling on a timer.
    Watching,
}

/// Byte-offset cursor over one log file.
#[derive(Debug)]
pub struct LiveTailer {
    path: PathBuf,
    offset: u64,
    state: TailState,
}

impl LiveTailer {
    /// Create a tailer that will report data after `offset`.
    pub fn new(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            state: TailState::Idle,
        }
    }

    /// Create a tailer positioned after the last complete line currently in
    /// the file. Existing content is skipped.
    pub fn at_end(path: impl Into<PathBuf>) -> Self {
        let mut tailer = Self::new(path, 0);
        if let Err(e) = tailer.poll() {
            debug!(
                target: "hookwatch::tail",
                "Could not position at end of {}: {}",
                tailer.path.display(),
                e
            );
        }
        tailer
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn state(&self) -> TailState {
        self.state
    }

    /// Read complete lines appended since the last poll.
    ///
    /// A missing file is treated as no growth. A file that shrank is
    /// rebased to its new length and yields nothing for this poll.
    pub fn poll(&mut self) -> Result<Vec<Entry>> {
        let len = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if len <= self.offset {
            if len < self.offset {
                debug!(
                    target: "hookwatch::tail",
                    "{} shrank from {} to {} bytes, rebasing",
                    self.path.display(),
                    self.offset,
                    len
                );
                self.offset = len;
            }
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.offset))?;

        let delta = len - self.offset;
        let mut buf = Vec::with_capacity(delta as usize);
        file.take(delta).read_to_end(&mut buf)?;

        // Hold back a trailing partial line until its newline is written.
        let complete = match buf.iter().rposition(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None => return Ok(Vec::new()),
        };
        self.offset += complete as u64;

        let entries = decode_lines(&String::from_utf8_lossy(&buf[..complete]));
        trace!(
            target: "hookwatch::tail",
            "Read {} bytes ({} entries) from {}",
            complete,
            entries.len(),
            self.path.display()
        );
        Ok(entries)
    }

    /// Start polling on `interval`, sending every non-empty batch to
    /// `event_tx`. Must be called from within a tokio runtime.
    pub fn attach(
        mut self,
        interval: Duration,
        event_tx: mpsc::UnboundedSender<TailEvent>,
    ) -> TailHandle {
        let (stop_tx, mut stop_rx) = mpsc::unbounded_channel::<()>();
        let path = self.path.clone();
        self.state = TailState::Watching;

        debug!(
            target: "hookwatch::tail",
            "Watching {} from offset {}",
            self.path.display(),
            self.offset
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.poll() {
                            Ok(entries) if entries.is_empty() => {}
                            Ok(entries) => {
                                let event = TailEvent {
                                    path: self.path.clone(),
                                    entries,
                                };
                                if event_tx.send(event).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                // Retried on the next tick.
                                debug!(
                                    target: "hookwatch::tail",
                                    "Poll of {} failed: {}",
                                    self.path.display(),
                                    e
                                );
                            }
                        }
                    }
                    _ = stop_rx.recv() => {
                        break;
                    }
                }
            }
        });

        TailHandle {
            path,
            stop_tx,
            task,
            detached: false,
        }
    }
}

/// Handle to a running tailer.
pub struct TailHandle {
    path: PathBuf,
    stop_tx: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
    detached: bool,
}

impl TailHandle {
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn state(&self) -> TailState {
        if self.detached || self.task.is_finished() {
            TailState::Idle
        } else {
            TailState::Watching
        }
    }

    /// Stop polling. Safe to call any number of times.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        let _ = self.stop_tx.send(());
        self.task.abort();
        debug!(
            target: "hookwatch::tail",
            "Stopped watching {}",
            self.path.display()
        );
    }
}

impl Drop for TailHandle {
    fn drop(&mut self) {
        self.detach();
    }
}
