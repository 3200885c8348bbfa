//! End-to-end scenarios for the log monitor: discovery, filtering,
//! project scoping and live tailing working together.

mod common;

use common::{append_entry, write_session_info, RecordingSink};
use hookwatch_core::discovery::{find_by_prefix, list_for_project};
use hookwatch_core::project::{aggregate_log_path, project_hash};
use hookwatch_core::render::{render_line, strip_ansi, visual_width};
use hookwatch_core::{Aggregator, MonitorOptions, PrefixMatch, RenderOptions, Scope, StatusFilter};
use hookwatch_types::Status;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn options(dir: &Path, filter: StatusFilter) -> MonitorOptions {
    MonitorOptions {
        poll_interval: Duration::from_millis(10),
        rescan_interval: Duration::from_millis(50),
        filter,
        ..MonitorOptions::new(dir)
    }
}

// ============================================================================
// STATUS FILTER
// ============================================================================

#[tokio::test]
async fn test_all_logs_with_fail_filter() {
    let tmp = TempDir::new().unwrap();
    let s1 = tmp.path().join("s1.jsonl");
    let s2 = tmp.path().join("s2.jsonl");
    append_entry(&s1, 1_000, Status::Pass, "lint");
    append_entry(&s1, 2_000, Status::Fail, "tests");
    append_entry(&s2, 1_500, Status::Skip, "docs");

    let mut aggregator = Aggregator::new(
        options(tmp.path(), StatusFilter::new([Status::Fail])),
        Scope::All,
    );

    let initial = aggregator.load_existing();
    assert_eq!(initial.len(), 1);
    assert_eq!(initial[0].status, Status::Fail);
    assert_eq!(initial[0].session_id.as_deref(), Some("s1"));

    append_entry(&s2, 3_000, Status::Pass, "lint");
    append_entry(&s2, 3_500, Status::Fail, "security");

    let mut sink = RecordingSink::default();
    aggregator
        .run(&mut sink, tokio::time::sleep(Duration::from_millis(300)))
        .await;

    assert_eq!(sink.entries.len(), 1);
    assert_eq!(sink.entries[0].reviewer, "security");
    assert_eq!(sink.entries[0].session_id.as_deref(), Some("s2"));
}

// ============================================================================
// PROJECT SCOPING
// ============================================================================

#[test]
fn test_project_discovery_matches_hash_and_session_info() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let other = tmp.path().join("repo-other");
    std::fs::create_dir(&repo).unwrap();
    std::fs::create_dir(&other).unwrap();
    let logs = tmp.path().join("logs");
    std::fs::create_dir(&logs).unwrap();

    assert_eq!(project_hash(&repo), project_hash(&repo));

    let aggregate = aggregate_log_path(&logs, &repo);
    append_entry(&aggregate, 1, Status::Pass, "pre-commit");
    append_entry(&aggregate_log_path(&logs, &other), 1, Status::Pass, "pre-commit");

    append_entry(&logs.join("mine.jsonl"), 2, Status::Pass, "lint");
    write_session_info(&logs, "mine", &repo);
    append_entry(&logs.join("theirs.jsonl"), 3, Status::Pass, "lint");
    write_session_info(&logs, "theirs", &other);
    append_entry(&logs.join("orphan.jsonl"), 4, Status::Pass, "lint");

    let found = list_for_project(&logs, &repo);
    assert_eq!(found, vec![aggregate, logs.join("mine.jsonl")]);
}

#[tokio::test]
async fn test_project_scope_picks_up_new_sessions() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    std::fs::create_dir(&repo).unwrap();
    let logs = tmp.path().join("logs");
    std::fs::create_dir(&logs).unwrap();

    append_entry(&logs.join("a.jsonl"), 1, Status::Pass, "lint");
    write_session_info(&logs, "a", &repo);

    let mut aggregator = Aggregator::new(
        options(&logs, StatusFilter::default()),
        Scope::Project(repo.clone()),
    );
    assert_eq!(aggregator.load_existing().len(), 1);

    write_session_info(&logs, "b", &repo);
    append_entry(&logs.join("b.jsonl"), 2, Status::Appeal, "review");
    append_entry(&logs.join("elsewhere.jsonl"), 3, Status::Fail, "lint");

    let mut sink = RecordingSink::default();
    aggregator
        .run(&mut sink, tokio::time::sleep(Duration::from_millis(300)))
        .await;

    assert_eq!(sink.sources, vec![logs.join("b.jsonl")]);
    assert_eq!(sink.entries.len(), 1);
    assert_eq!(sink.entries[0].status, Status::Appeal);
}

// ============================================================================
// PREFIX LOOKUP
// ============================================================================

#[test]
fn test_prefix_lookup_over_discovered_sessions() {
    let tmp = TempDir::new().unwrap();
    for id in ["abc123", "abc999", "xyz000"] {
        append_entry(&tmp.path().join(format!("{}.jsonl", id)), 1, Status::Pass, "r");
    }

    match find_by_prefix(tmp.path(), "abc") {
        PrefixMatch::Ambiguous(ids) => assert_eq!(ids, vec!["abc123", "abc999"]),
        other => panic!("expected ambiguity, got {:?}", other),
    }
    assert_eq!(
        find_by_prefix(tmp.path(), "xyz"),
        PrefixMatch::Unique("xyz000".to_string())
    );
    assert_eq!(find_by_prefix(tmp.path(), "qqq"), PrefixMatch::None);
}

// ============================================================================
// RENDERING OF LOADED ENTRIES
// ============================================================================

#[test]
fn test_loaded_entries_render_within_width() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("wide.jsonl");
    append_entry(&path, 1, Status::Crash, &"reviewer\t".repeat(20));

    let mut aggregator = Aggregator::new(options(tmp.path(), StatusFilter::default()), Scope::All);
    let opts = RenderOptions {
        width: 72,
        color: true,
        show_session: true,
        verbose: false,
    };
    for entry in aggregator.load_existing() {
        let line = strip_ansi(&render_line(&entry, &opts));
        assert!(visual_width(&line) <= 72);
        assert!(line.starts_with("wide"));
    }
}
