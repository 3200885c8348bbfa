//! Terminal rendering of entries and session listings.
//!
//! Every function here is pure: terminal width and color support are
//! resolved once by the caller and passed in through [`RenderOptions`].
//! Width is measured the way a terminal draws the text: wide characters
//! take two columns, zero-width ones none, and tabs expand to the next
//! multiple of eight columns.

use chrono::{DateTime, FixedOffset, Local, TimeZone};
use hookwatch_types::{AgentDetail, Entry, ScriptDetail, SessionSummary, Status, VerboseDetail};
use once_cell::sync::Lazy;
use owo_colors::OwoColorize;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use unicode_width::UnicodeWidthChar;

/// Column width a tab advances to.
pub const TAB_WIDTH: usize = 8;

/// Characters of a session id shown in compact views.
pub const SHORT_ID_LEN: usize = 8;

/// Marker appended to clipped text.
pub const ELLIPSIS: char = '…';

const STATUS_WIDTH: usize = 7;
const REVIEWER_WIDTH: usize = 16;
const STARTED_WIDTH: usize = 16;
const COUNT_WIDTH: usize = 7;

/// Per-invocation rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Maximum visual width of a line.
    pub width: usize,
    pub color: bool,
    pub show_session: bool,
    pub verbose: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 120,
            color: false,
            show_session: false,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    Dim,
    Bold,
    Status(Status),
}

#[derive(Debug, Clone)]
struct Segment {
    text: String,
    style: Style,
}

impl Segment {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

// ==================== Width helpers ====================

/// CSI escape sequences, as emitted by the color layer.
static ANSI_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

fn advance(col: usize, c: char) -> usize {
    if c == '\t' {
        (col / TAB_WIDTH + 1) * TAB_WIDTH
    } else {
        col + char_width(c)
    }
}

/// Visual width of plain text, starting at column zero.
pub fn visual_width(text: &str) -> usize {
    text.chars().fold(0, advance)
}

/// Remove ANSI CSI escape sequences.
pub fn strip_ansi(text: &str) -> String {
    ANSI_REGEX.replace_all(text, "").into_owned()
}

/// Replace control characters other than tab so field text cannot move the
/// cursor or inject escape sequences.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() && c != '\t' { ' ' } else { c })
        .collect()
}

/// Keep the trailing part of `text` that fits in `max` columns, marking the
/// cut with a leading ellipsis.
pub fn elide_left(text: &str, max: usize) -> String {
    if visual_width(text) <= max {
        return text.to_string();
    }
    let budget = match max.checked_sub(char_width(ELLIPSIS)) {
        Some(budget) => budget,
        None => return String::new(),
    };

    let mut kept = Vec::new();
    let mut used = 0;
    for c in text.chars().rev() {
        let w = if c == '\t' { TAB_WIDTH } else { char_width(c) };
        if used + w > budget {
            break;
        }
        used += w;
        kept.push(c);
    }
    std::iter::once(ELLIPSIS).chain(kept.into_iter().rev()).collect()
}

/// Pad `text` with spaces to `width` columns.
fn pad_right(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(visual_width(text));
    format!("{}{}", text, " ".repeat(pad))
}

/// Leading characters of a session id.
pub fn short_id(session_id: &str) -> &str {
    match session_id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &session_id[..idx],
        None => session_id,
    }
}

// ==================== Field formatting ====================

/// `HH:MM:SS` in local time.
pub fn format_time(at_ms: i64) -> String {
    Local
        .timestamp_millis_opt(at_ms)
        .single()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// Compact human duration: `850ms`, `4.2s`, `2m05s`.
pub fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        return format!("{}ms", ms);
    }
    let tenths = ms.saturating_add(50) / 100;
    if tenths < 600 {
        format!("{}.{}s", tenths / 10, tenths % 10)
    } else {
        let secs = ms.saturating_add(500) / 1_000;
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

fn format_started(started_at: Option<&DateTime<FixedOffset>>) -> String {
    started_at
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

// ==================== Assembly ====================

/// Clip `prefix` to `max` columns, then append `tail` after a two-space gap
/// if at least one column is left for it. A clipped tail ends in an
/// ellipsis; a tail with no room is dropped.
fn fit(prefix: Vec<Segment>, tail: Option<Segment>, max: usize) -> Vec<Segment> {
    let mut out = Vec::with_capacity(prefix.len() + 2);
    let mut col = 0;

    for segment in prefix {
        let mut kept = String::new();
        let mut clipped = false;
        for c in segment.text.chars() {
            let next = advance(col, c);
            if next > max {
                clipped = true;
                break;
            }
            kept.push(c);
            col = next;
        }
        out.push(Segment::new(kept, segment.style));
        if clipped {
            return trim_trailing(out);
        }
    }

    let Some(tail) = tail.filter(|t| !t.text.is_empty()) else {
        return trim_trailing(out);
    };

    let ellipsis = char_width(ELLIPSIS);
    let start = col + 2;
    if start + ellipsis > max {
        return trim_trailing(out);
    }

    let end = tail.text.chars().fold(start, advance);
    out.push(Segment::new("  ", Style::Plain));
    if end <= max {
        out.push(tail);
        return out;
    }

    let mut kept = String::new();
    let mut col = start;
    for c in tail.text.chars() {
        let next = advance(col, c);
        if next + ellipsis > max {
            break;
        }
        kept.push(c);
        col = next;
    }
    kept.push(ELLIPSIS);
    out.push(Segment::new(kept, tail.style));
    out
}

fn trim_trailing(mut segments: Vec<Segment>) -> Vec<Segment> {
    while let Some(last) = segments.last_mut() {
        let trimmed_len = last.text.trim_end_matches(' ').len();
        last.text.truncate(trimmed_len);
        if last.text.is_empty() {
            segments.pop();
        } else {
            break;
        }
    }
    segments
}

fn paint(segment: &Segment, color: bool) -> String {
    let text = segment.text.as_str();
    if !color || text.is_empty() {
        return text.to_string();
    }
    match segment.style {
        Style::Plain => text.to_string(),
        Style::Dim => text.dimmed().to_string(),
        Style::Bold => text.bold().to_string(),
        Style::Status(status) => match status {
            Status::Pass => text.green().to_string(),
            Status::Fail => text.red().bold().to_string(),
            Status::Skip => text.yellow().to_string(),
            Status::Crash => text.magenta().bold().to_string(),
            Status::Running => text.cyan().to_string(),
            Status::Appeal => text.blue().to_string(),
        },
    }
}

fn join(segments: &[Segment], color: bool) -> String {
    segments.iter().map(|s| paint(s, color)).collect()
}

// ==================== Entries ====================

/// Render the compact one-line view of an entry:
/// `[session] time  status  reviewer  [duration] [hookEvent] [progress]  reason`.
pub fn render_line(entry: &Entry, opts: &RenderOptions) -> String {
    let gap = || Segment::new("  ", Style::Plain);
    let mut prefix = Vec::new();

    if opts.show_session {
        let id = entry.session_id.as_deref().map(short_id).unwrap_or("-");
        prefix.push(Segment::new(
            pad_right(&sanitize(id), SHORT_ID_LEN),
            Style::Dim,
        ));
        prefix.push(gap());
    }

    prefix.push(Segment::new(format_time(entry.at), Style::Dim));
    prefix.push(gap());
    prefix.push(Segment::new(
        format!("{:<width$}", entry.status.as_str(), width = STATUS_WIDTH),
        Style::Status(entry.status),
    ));
    prefix.push(gap());
    prefix.push(Segment::new(
        pad_right(&sanitize(&entry.reviewer), REVIEWER_WIDTH),
        Style::Bold,
    ));

    let meta: Vec<String> = [
        entry.duration_ms.map(format_duration),
        entry.hook_event.as_deref().map(sanitize),
        entry.trigger_progress.as_deref().map(sanitize),
    ]
    .into_iter()
    .flatten()
    .filter(|field| !field.is_empty())
    .collect();
    if !meta.is_empty() {
        prefix.push(gap());
        prefix.push(Segment::new(meta.join(" "), Style::Dim));
    }

    let reason = Segment::new(sanitize(entry.summary()), Style::Plain);
    join(&fit(prefix, Some(reason), opts.width), opts.color)
}

/// Render the boxed detail block for an entry, if it carries one.
pub fn render_verbose(entry: &Entry, opts: &RenderOptions) -> Option<String> {
    let sections = match entry.verbose.as_ref()? {
        VerboseDetail::Agent(detail) => agent_sections(detail),
        VerboseDetail::Script(detail) => script_sections(detail),
    };

    let mut lines = Vec::new();
    for (i, (title, body)) in sections.iter().enumerate() {
        let corner = if i == 0 { "  ┌─ " } else { "  ├─ " };
        lines.push(join(
            &fit(
                vec![
                    Segment::new(corner, Style::Dim),
                    Segment::new(title.as_str(), Style::Bold),
                ],
                None,
                opts.width,
            ),
            opts.color,
        ));

        let body = if body.trim().is_empty() { "(empty)" } else { body.as_str() };
        for text in body.lines() {
            lines.push(join(
                &fit(
                    vec![
                        Segment::new("  │ ", Style::Dim),
                        Segment::new(sanitize(text), Style::Plain),
                    ],
                    None,
                    opts.width,
                ),
                opts.color,
            ));
        }
    }
    lines.push(join(
        &fit(vec![Segment::new("  └─", Style::Dim)], None, opts.width),
        opts.color,
    ));

    Some(lines.join("\n"))
}

fn agent_sections(detail: &AgentDetail) -> Vec<(String, String)> {
    let prompt_title = match detail.model.as_deref() {
        Some(model) if !model.is_empty() => format!("prompt · {}", model),
        _ => "prompt".to_string(),
    };

    let mut sections = vec![
        (prompt_title, detail.prompt.clone()),
        ("response".to_string(), detail.response.clone()),
    ];
    if let Some(backchannel) = &detail.backchannel {
        let text = match backchannel {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        };
        sections.push(("backchannel".to_string(), text));
    }
    sections
}

fn script_sections(detail: &ScriptDetail) -> Vec<(String, String)> {
    let output_title = match detail.exit_code {
        Some(code) => format!("output · exit {}", code),
        None => "output".to_string(),
    };
    vec![
        ("command".to_string(), format!("$ {}", detail.command)),
        (output_title, detail.output.clone()),
    ]
}

/// Compact line plus, when verbose output is on, the detail block.
pub fn render_entry(entry: &Entry, opts: &RenderOptions) -> String {
    let line = render_line(entry, opts);
    if !opts.verbose {
        return line;
    }
    match render_verbose(entry, opts) {
        Some(block) => format!("{}\n{}", line, block),
        None => line,
    }
}

// ==================== Notices and listings ====================

/// A dimmed informational line, clipped to width.
pub fn render_notice(text: &str, opts: &RenderOptions) -> String {
    join(
        &fit(vec![Segment::new(sanitize(text), Style::Dim)], None, opts.width),
        opts.color,
    )
}

/// Banner printed before a single session's entries.
pub fn render_session_header(
    session_id: &str,
    project_dir: Option<&Path>,
    started_at: Option<&DateTime<FixedOffset>>,
    opts: &RenderOptions,
) -> String {
    let mut prefix = vec![
        Segment::new("Session ", Style::Dim),
        Segment::new(sanitize(session_id), Style::Bold),
    ];
    if started_at.is_some() {
        prefix.push(Segment::new(
            format!("  started {}", format_started(started_at)),
            Style::Dim,
        ));
    }
    let project = project_dir
        .map(|p| Segment::new(sanitize(&p.to_string_lossy()), Style::Plain));
    join(&fit(prefix, project, opts.width), opts.color)
}

fn project_column_width(width: usize) -> usize {
    let fixed = SHORT_ID_LEN + 2 + 2 + STARTED_WIDTH + 2 + COUNT_WIDTH;
    width.saturating_sub(fixed).max(10)
}

/// Column titles for the session list.
pub fn render_session_list_header(opts: &RenderOptions) -> String {
    let project_width = project_column_width(opts.width);
    let text = format!(
        "{:<id$}  {:<project$}  {:<started$}  {:>count$}",
        "SESSION",
        "PROJECT",
        "STARTED",
        "ENTRIES",
        id = SHORT_ID_LEN,
        project = project_width,
        started = STARTED_WIDTH,
        count = COUNT_WIDTH,
    );
    join(&fit(vec![Segment::new(text, Style::Bold)], None, opts.width), opts.color)
}

/// One row of the session list.
pub fn render_session_row(summary: &SessionSummary, opts: &RenderOptions) -> String {
    let project_width = project_column_width(opts.width);
    let project = summary
        .project_dir
        .as_ref()
        .map(|p| sanitize(&p.to_string_lossy()))
        .unwrap_or_else(|| "-".to_string());

    let segments = vec![
        Segment::new(
            pad_right(&sanitize(short_id(&summary.session_id)), SHORT_ID_LEN),
            Style::Bold,
        ),
        Segment::new("  ", Style::Plain),
        Segment::new(
            pad_right(&elide_left(&project, project_width), project_width),
            Style::Plain,
        ),
        Segment::new("  ", Style::Plain),
        Segment::new(
            format!(
                "{:<width$}",
                format_started(summary.started_at.as_ref()),
                width = STARTED_WIDTH
            ),
            Style::Dim,
        ),
        Segment::new("  ", Style::Plain),
        Segment::new(
            format!("{:>width$}", summary.entry_count, width = COUNT_WIDTH),
            Style::Plain,
        ),
    ];
    join(&fit(segments, None, opts.width), opts.color)
}
