//! Aggregation of many live logs into one stream.
//!
//! An [`Aggregator`] owns the tailers for one view (a single session, every
//! log, or one project's logs). Existing content is loaded once and merged
//! in timestamp order; after that, entries are forwarded in arrival order
//! as each tailer reports them, and the "all" and "project" views rescan
//! the log directory periodically to pick up new files.

use crate::discovery::{classify, list_all, list_for_project, session_log_path, LogKind};
use crate::project::aggregate_log_path;
use crate::session_index;
use crate::tailer::{LiveTailer, TailEvent, TailHandle, DEFAULT_POLL_INTERVAL};
use hookwatch_types::{Entry, SessionInfo, Status};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Default period between directory rescans.
pub const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of entries shown from existing content in merged views.
pub const DEFAULT_BACKLOG: usize = 20;

/// Status allow-list. An empty filter allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter {
    allowed: HashSet<Status>,
}

impl StatusFilter {
    pub fn new(statuses: impl IntoIterator<Item = Status>) -> Self {
        Self {
            allowed: statuses.into_iter().collect(),
        }
    }

    pub fn allows(&self, status: Status) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&status)
    }
}

/// Which logs a view covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// One resolved session, plus its project's aggregate log.
    Session(String),
    /// Every log in the directory.
    All,
    /// One project's aggregate log and sessions.
    Project(PathBuf),
}

impl Scope {
    fn rescans(&self) -> bool {
        !matches!(self, Scope::Session(_))
    }
}

/// Tunables for an [`Aggregator`].
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub log_dir: PathBuf,
    pub poll_interval: Duration,
    pub rescan_interval: Duration,
    /// Entries kept from existing content in "all"/"project" views.
    pub backlog: usize,
    pub filter: StatusFilter,
}

impl MonitorOptions {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            rescan_interval: DEFAULT_RESCAN_INTERVAL,
            backlog: DEFAULT_BACKLOG,
            filter: StatusFilter::default(),
        }
    }
}

/// Receiver of everything a monitor produces.
pub trait EntrySink {
    fn on_entry(&mut self, entry: &Entry);

    /// Called when a newly discovered log starts being watched.
    fn on_new_source(&mut self, _path: &Path) {}

    /// The consumer went away (e.g. a closed pipe); the monitor stops.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Merges the logs of one [`Scope`] into a single stream.
pub struct Aggregator {
    options: MonitorOptions,
    scope: Scope,
    /// Offsets reached by the initial load, waiting to be attached.
    pending: Vec<(PathBuf, u64)>,
    /// Paths seen so far, watched or pending.
    known: HashSet<PathBuf>,
    tailers: HashMap<PathBuf, TailHandle>,
    event_tx: mpsc::UnboundedSender<TailEvent>,
    event_rx: mpsc::UnboundedReceiver<TailEvent>,
}

impl Aggregator {
    pub fn new(options: MonitorOptions, scope: Scope) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            options,
            scope,
            pending: Vec::new(),
            known: HashSet::new(),
            tailers: HashMap::new(),
            event_tx,
            event_rx,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Number of tailers currently attached.
    pub fn tailer_count(&self) -> usize {
        self.tailers.len()
    }

    /// Session info of the watched session, for single-session views.
    pub fn session_info(&self) -> Option<SessionInfo> {
        match &self.scope {
            Scope::Session(id) => session_index::load(&self.options.log_dir, id),
            _ => None,
        }
    }

    fn discover(&self) -> Vec<PathBuf> {
        match &self.scope {
            Scope::Session(id) => vec![session_log_path(&self.options.log_dir, id)],
            Scope::All => list_all(&self.options.log_dir),
            Scope::Project(dir) => list_for_project(&self.options.log_dir, dir),
        }
    }

    /// Read the existing content of every log in scope and return what
    /// should be shown before live tailing starts.
    ///
    /// Single-session views return every entry of the session log in file
    /// order. Merged views return the most recent `backlog` entries after
    /// filtering, ordered by `(at, discovery index, line index)`.
    pub fn load_existing(&mut self) -> Vec<Entry> {
        let paths = self.discover();
        let mut merged: Vec<(i64, usize, usize, Entry)> = Vec::new();

        for (file_idx, path) in paths.iter().enumerate() {
            let mut tailer = LiveTailer::new(path, 0);
            let entries = tailer.poll().unwrap_or_else(|e| {
                debug!(
                    target: "hookwatch::aggregate",
                    "Initial read of {} failed: {}",
                    path.display(),
                    e
                );
                Vec::new()
            });

            for (line_idx, mut entry) in entries.into_iter().enumerate() {
                fill_session_id(path, &mut entry);
                if self.options.filter.allows(entry.status) {
                    merged.push((entry.at, file_idx, line_idx, entry));
                }
            }

            self.known.insert(path.clone());
            self.pending.push((path.clone(), tailer.offset()));
        }

        if let Scope::Session(id) = &self.scope {
            // Only new aggregate entries are shown for a single session.
            if let Some(info) = session_index::load(&self.options.log_dir, id) {
                let aggregate =
                    aggregate_log_path(&self.options.log_dir, Path::new(&info.project_dir));
                if aggregate.is_file() && self.known.insert(aggregate.clone()) {
                    let offset = LiveTailer::at_end(&aggregate).offset();
                    self.pending.push((aggregate, offset));
                }
            }
            return merged.into_iter().map(|(_, _, _, entry)| entry).collect();
        }

        merged.sort_by_key(|(at, file_idx, line_idx, _)| (*at, *file_idx, *line_idx));
        let skip = merged.len().saturating_sub(self.options.backlog);

        info!(
            target: "hookwatch::aggregate",
            "Loaded {} logs, showing {} of {} entries",
            paths.len(),
            merged.len() - skip,
            merged.len()
        );

        merged
            .into_iter()
            .skip(skip)
            .map(|(_, _, _, entry)| entry)
            .collect()
    }

    fn attach(&mut self, path: PathBuf, offset: u64) {
        if self.tailers.contains_key(&path) {
            return;
        }
        let handle = LiveTailer::new(&path, offset)
            .attach(self.options.poll_interval, self.event_tx.clone());
        self.tailers.insert(path, handle);
    }

    /// Attach tailers for newly appeared logs. Logs that disappeared keep
    /// their tailer; it simply stops emitting.
    fn rescan<S: EntrySink>(&mut self, sink: &mut S) {
        for path in self.discover() {
            if self.known.insert(path.clone()) {
                info!(
                    target: "hookwatch::aggregate",
                    "Discovered new log {}",
                    path.display()
                );
                sink.on_new_source(&path);
                self.attach(path, 0);
            }
        }
    }

    fn forward<S: EntrySink>(&self, event: TailEvent, sink: &mut S) {
        for mut entry in event.entries {
            if !self.options.filter.allows(entry.status) {
                continue;
            }
            fill_session_id(&event.path, &mut entry);
            sink.on_entry(&entry);
        }
    }

    /// Tail every log in scope until `shutdown` resolves, forwarding
    /// entries to `sink`. Every tailer is detached before this returns.
    ///
    /// Call [`Aggregator::load_existing`] first; logs it did not see are
    /// tailed from their start.
    pub async fn run<S, F>(&mut self, sink: &mut S, shutdown: F)
    where
        S: EntrySink,
        F: Future<Output = ()>,
    {
        for (path, offset) in std::mem::take(&mut self.pending) {
            self.attach(path, offset);
        }

        let mut rescan = tokio::time::interval(self.options.rescan_interval);
        rescan.set_missed_tick_behavior(MissedTickBehavior::Delay);
        rescan.tick().await;

        if self.scope.rescans() {
            self.rescan(sink);
        }

        tokio::pin!(shutdown);

        while !sink.is_closed() {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!(target: "hookwatch::aggregate", "Shutdown requested");
                    break;
                }
                Some(event) = self.event_rx.recv() => {
                    self.forward(event, sink);
                }
                _ = rescan.tick(), if self.scope.rescans() => {
                    self.rescan(sink);
                }
            }
        }

        if sink.is_closed() {
            debug!(target: "hookwatch::aggregate", "Output closed, stopping");
        }
        self.detach_all();
    }

    /// Stop every tailer. Idempotent.
    pub fn detach_all(&mut self) {
        for (_, mut handle) in self.tailers.drain() {
            handle.detach();
        }
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        self.detach_all();
    }
}

/// Entries in a per-session log belong to that session even when the
/// writer left `sessionId` out.
fn fill_session_id(path: &Path, entry: &mut Entry) {
    if entry.session_id.is_some() {
        return;
    }
    if let Some(LogKind::Session(id)) = classify(path) {
        entry.session_id = Some(id);
    }
}
