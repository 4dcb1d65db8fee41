// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{FakeWatcher, TestProject};
use crate::BriefingGenerator;
use engram_adapters::{FakeFoldAgent, FakeRun, HeaderLinter, WatchEvent, WatchEventKind};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts invocations instead of rendering anything.
#[derive(Default)]
struct CountingBriefing {
    calls: AtomicUsize,
}

impl BriefingGenerator for CountingBriefing {
    fn regenerate(&self, _config: &Config, _paths: &EngramPaths) -> Result<(), EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl CountingBriefing {
    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn concept_edit() -> FakeRun {
    FakeRun::edits(vec![(
        "docs/knowledge/concepts.md".into(),
        "# Concept Registry\n\n## C001 New doc\nStatus: ACTIVE\nCode: `docs/note.md`\n".to_string(),
    )])
}

// ── L0 drain timing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn stale_flag_with_drained_queue_regenerates_once() {
    let project = TestProject::new();
    let mut store = project.store();
    store.set_l0_stale().unwrap();

    let agent = FakeFoldAgent::default();
    let linter = HeaderLinter;
    let briefing = CountingBriefing::default();
    let mut server = Server::new(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        &linter,
        &briefing,
        Box::new(FakeWatcher::default()),
    );

    server.iterate().await.unwrap();
    server.iterate().await.unwrap();

    // One drain episode, one regeneration
    assert_eq!(briefing.count(), 1);
    assert!(!store.state().server.l0_stale);
    assert!(store.state().server.l0_regenerated_at.is_some());
}

#[tokio::test]
async fn stale_flag_with_pending_queue_waits() {
    let project = TestProject::new();
    project.write("docs/note.md", "note body\n");
    crate::queue::write_queue(
        &project.paths,
        &[engram_core::test_support::doc_entry(
            "docs/note.md",
            "2026-01-01",
            engram_core::DocPhase::Initial,
        )],
    )
    .unwrap();
    let mut store = project.store();
    store.set_l0_stale().unwrap();

    let agent = FakeFoldAgent::default();
    let linter = HeaderLinter;
    let briefing = CountingBriefing::default();
    let mut server = Server::new(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        &linter,
        &briefing,
        Box::new(FakeWatcher::default()),
    );

    // The queue feeds content and is not drained: no regeneration even
    // though the flag is set. (Nothing triggers a dispatch: the buffer is
    // empty and no drift is over threshold.)
    server.iterate().await.unwrap();
    assert_eq!(briefing.count(), 0);
    assert!(store.state().server.l0_stale);
}

// ── Buffer-triggered dispatch ────────────────────────────────────────────────

#[tokio::test]
async fn watcher_events_fill_the_buffer_and_trigger_dispatch() {
    let mut project = TestProject::new();
    project.config.budget.dispatch_threshold_chars = 100;
    let body = "fresh notes about the cache design\n".repeat(20);
    project.write("docs/note.md", &body);
    let mut store = project.store();

    let agent = FakeFoldAgent::scripted(vec![concept_edit()]);
    let linter = HeaderLinter;
    let briefing = CountingBriefing::default();
    let watcher = FakeWatcher::scripted(vec![vec![WatchEvent {
        path: project.root().join("docs/note.md"),
        kind: WatchEventKind::Modified,
    }]]);
    let mut server = Server::new(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        &linter,
        &briefing,
        Box::new(watcher),
    );

    server.iterate().await.unwrap();

    // The buffered document crossed the threshold: a chunk was built from
    // the buffer, dispatched, and committed
    assert_eq!(agent.invocation_count(), 1);
    let record = &store.state().dispatches[&1];
    assert_eq!(record.state, engram_core::DispatchState::Committed);
    // Consumed with the building transition
    assert!(store.state().buffer.is_empty());
    // Post-dispatch drain: staleness from the commit regenerated L0
    assert_eq!(briefing.count(), 1);
    assert!(!store.state().server.l0_stale);
}

#[tokio::test]
async fn below_threshold_buffer_does_not_dispatch() {
    let mut project = TestProject::new();
    project.config.budget.dispatch_threshold_chars = 10_000;
    project.write("docs/note.md", "small note\n");
    let mut store = project.store();

    let agent = FakeFoldAgent::default();
    let linter = HeaderLinter;
    let briefing = CountingBriefing::default();
    let watcher = FakeWatcher::scripted(vec![vec![WatchEvent {
        path: project.root().join("docs/note.md"),
        kind: WatchEventKind::Modified,
    }]]);
    let mut server = Server::new(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        &linter,
        &briefing,
        Box::new(watcher),
    );

    server.iterate().await.unwrap();

    assert_eq!(agent.invocation_count(), 0);
    // The item waits in the buffer for the next trigger
    assert_eq!(store.state().buffer.len(), 1);
}

// ── Classification ───────────────────────────────────────────────────────────

#[tokio::test]
async fn own_artifacts_never_enter_the_buffer() {
    let project = TestProject::new();
    let mut store = project.store();

    let agent = FakeFoldAgent::default();
    let linter = HeaderLinter;
    let briefing = CountingBriefing::default();
    let watcher = FakeWatcher::scripted(vec![vec![
        WatchEvent {
            path: project.root().join("docs/knowledge/concepts.md"),
            kind: WatchEventKind::Modified,
        },
        WatchEvent {
            path: project.paths.queue(),
            kind: WatchEventKind::Created,
        },
        WatchEvent {
            path: project.root().join("src/main.rs"),
            kind: WatchEventKind::Modified,
        },
    ]]);
    let mut server = Server::new(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        &linter,
        &briefing,
        Box::new(watcher),
    );

    server.iterate().await.unwrap();

    // Living docs, .engram internals, and non-source files all ignored
    assert!(store.state().buffer.is_empty());
}

#[tokio::test]
async fn issue_files_classify_as_issues() {
    let mut project = TestProject::new();
    project.config.budget.dispatch_threshold_chars = 1_000_000;
    project.write(".issues/42.json", r#"{"title": "T", "created_at": "2026-01-01"}"#);
    let mut store = project.store();

    let agent = FakeFoldAgent::default();
    let linter = HeaderLinter;
    let briefing = CountingBriefing::default();
    let watcher = FakeWatcher::scripted(vec![vec![WatchEvent {
        path: project.root().join(".issues/42.json"),
        kind: WatchEventKind::Created,
    }]]);
    let mut server = Server::new(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        &linter,
        &briefing,
        Box::new(watcher),
    );

    server.iterate().await.unwrap();

    assert_eq!(store.state().buffer.len(), 1);
    assert_eq!(store.state().buffer[0].kind, engram_core::ItemKind::Issue);
}

// ── Server lock ──────────────────────────────────────────────────────────────

#[test]
fn second_server_instance_is_refused() {
    let project = TestProject::new();

    let _held = acquire_server_lock(&project.paths).unwrap();
    let err = acquire_server_lock(&project.paths).unwrap_err();
    assert!(matches!(err, EngineError::ServerLockHeld(_)));
}
