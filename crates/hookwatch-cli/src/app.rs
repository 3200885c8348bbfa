//! Mode dispatch for the `hookwatch` binary.

use anyhow::Result;
use hookwatch_core::discovery::resolve_session;
use hookwatch_core::render::{
    render_entry, render_notice, render_session_header, render_session_list_header,
    render_session_row,
};
use hookwatch_core::session_index::list_sessions;
use hookwatch_core::{Aggregator, EntrySink, MonitorOptions, RenderOptions, Scope};
use hookwatch_types::Entry;
use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What the user asked to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// One session by exact id or unique prefix; `None` means the latest.
    Session(Option<String>),
    All,
    Project(PathBuf),
    /// Session listing, optionally restricted to one project.
    List(Option<PathBuf>),
}

/// Everything needed to run one invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: Mode,
    pub monitor: MonitorOptions,
    pub render: RenderOptions,
    /// Keep tailing after the existing content is printed.
    pub follow: bool,
}

/// Writes rendered entries and notices to a stream.
pub struct ConsoleSink<W: Write> {
    out: W,
    opts: RenderOptions,
    /// Set once the reader hung up.
    closed: bool,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, opts: RenderOptions) -> Self {
        Self {
            out,
            opts,
            closed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if self.closed {
            return;
        }
        match writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!(target: "hookwatch::startup", "Output closed by reader");
                self.closed = true;
            }
            Err(e) => {
                debug!(target: "hookwatch::startup", "Write to output failed: {}", e);
            }
        }
    }

    fn notice(&mut self, text: &str) {
        let line = render_notice(text, &self.opts);
        self.emit(&line);
    }
}

impl<W: Write> EntrySink for ConsoleSink<W> {
    fn on_entry(&mut self, entry: &Entry) {
        let text = render_entry(entry, &self.opts);
        self.emit(&text);
    }

    fn on_new_source(&mut self, path: &Path) {
        self.notice(&format!("Watching new log {}", path.display()));
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Run one invocation, writing to `out` until `shutdown` resolves (or
/// immediately after the existing content when not following).
pub async fn execute<W, F>(options: RunOptions, out: W, shutdown: F) -> Result<W>
where
    W: Write,
    F: Future<Output = ()>,
{
    let RunOptions {
        mode,
        monitor,
        mut render,
        follow,
    } = options;
    let log_dir = monitor.log_dir.clone();

    let scope = match mode {
        Mode::List(project) => {
            let mut sink = ConsoleSink::new(out, render);
            list(&mut sink, &log_dir, project.as_deref());
            return Ok(sink.into_inner());
        }
        Mode::Session(reference) => Scope::Session(resolve_session(&log_dir, reference.as_deref())?),
        Mode::All => Scope::All,
        Mode::Project(dir) => Scope::Project(dir),
    };

    if !matches!(scope, Scope::Session(_)) {
        render.show_session = true;
    }

    info!(target: "hookwatch::startup", "Monitoring {:?} in {}", scope, log_dir.display());

    let mut aggregator = Aggregator::new(monitor, scope);
    let mut sink = ConsoleSink::new(out, render);

    if let Scope::Session(id) = aggregator.scope().clone() {
        let info = aggregator.session_info();
        let project = info.as_ref().map(|i| PathBuf::from(&i.project_dir));
        let started = info.as_ref().and_then(|i| i.started_at());
        let header = render_session_header(&id, project.as_deref(), started.as_ref(), &render);
        sink.emit(&header);
    }

    let initial = aggregator.load_existing();
    for entry in &initial {
        sink.on_entry(entry);
    }

    if initial.is_empty() && !matches!(aggregator.scope(), Scope::Session(_)) {
        sink.notice(&format!("Waiting for logs in {}", log_dir.display()));
    }

    if follow && !sink.is_closed() {
        aggregator.run(&mut sink, shutdown).await;
    }

    Ok(sink.into_inner())
}

fn list<W: Write>(sink: &mut ConsoleSink<W>, log_dir: &Path, project: Option<&Path>) {
    let sessions = list_sessions(log_dir, project);
    if sessions.is_empty() {
        sink.notice(&format!("No sessions found in {}", log_dir.display()));
        return;
    }

    let header = render_session_list_header(&sink.opts);
    sink.emit(&header);
    for summary in &sessions {
        let row = render_session_row(summary, &sink.opts);
        sink.emit(&row);
    }
}
