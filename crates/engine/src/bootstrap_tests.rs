// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{day, TestProject};
use engram_adapters::{FakeFoldAgent, FakeRun, HeaderLinter};

fn doc_edit() -> FakeRun {
    FakeRun::edits(vec![(
        "docs/knowledge/concepts.md".into(),
        "# Concept Registry\n\n## C001 Harvested concept\nStatus: ACTIVE\nCode: `docs/knowledge/concepts.md`\n".to_string(),
    )])
}

// ── Seed ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seed_only_runs_agent_at_root_and_flags_staleness() {
    let project = TestProject::new();
    let mut store = project.store();
    let agent = FakeFoldAgent::scripted(vec![doc_edit()]);

    seed(&mut store, &project.config, &project.paths, &agent, None)
        .await
        .unwrap();

    assert!(store.state().server.l0_stale);
    assert!(store.state().server.fold_from.is_none());
    let invocations = agent.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].project_root, project.root());
}

#[tokio::test]
async fn seed_failure_propagates_without_staleness() {
    let project = TestProject::new();
    let mut store = project.store();
    let agent = FakeFoldAgent::scripted(vec![FakeRun::crash(2)]);

    let err = seed(&mut store, &project.config, &project.paths, &agent, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AgentInvocation(_)));
    assert!(!store.state().server.l0_stale);
}

#[tokio::test]
async fn seed_from_date_uses_a_worktree_and_sets_the_marker() {
    let project = TestProject::new();
    project.git_init();
    project.git_commit_file("src/early.rs", "fn f() {}\n", "2026-01-01");
    project.git_commit_file("src/late.rs", "fn g() {}\n", "2026-03-01");
    let mut store = project.store();

    // The seed agent writes docs inside its working directory (the
    // worktree); they must be copied back into the real project
    let agent = FakeFoldAgent::scripted(vec![doc_edit()]);

    seed(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        Some(day("2026-01-01")),
    )
    .await
    .unwrap();

    assert_eq!(store.state().server.fold_from, Some(day("2026-01-01")));
    assert!(store.state().server.l0_stale);

    // The agent ran in the worktree, not the project root
    let invocations = agent.invocations();
    assert_ne!(invocations[0].project_root, project.root());
    // The seeded doc landed back in the project
    assert!(project.read("docs/knowledge/concepts.md").contains("C001"));
    // The ephemeral worktree is gone
    assert!(
        std::fs::read_dir(project.paths.worktrees_dir())
            .map(|entries| entries.count() == 0)
            .unwrap_or(true)
    );
}

#[tokio::test]
async fn seed_before_first_commit_is_a_resolution_error() {
    let project = TestProject::new();
    project.git_init();
    project.git_commit_file("src/a.rs", "", "2026-01-01");
    let mut store = project.store();
    let agent = FakeFoldAgent::default();

    let err = seed(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        Some(day("2025-07-01")),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::GitResolution { .. }));
}

// ── Forward fold ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_queue_clears_the_marker_early() {
    let project = TestProject::new();
    project.git_init();
    let mut store = project.store();
    let agent = FakeFoldAgent::default();
    let linter = HeaderLinter;

    let stats = forward_fold(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        &linter,
        day("2026-01-01"),
    )
    .await
    .unwrap();

    assert_eq!(stats.chunks, 0);
    assert!(store.state().server.fold_from.is_none());
    assert_eq!(agent.invocation_count(), 0);
}

#[tokio::test]
async fn forward_fold_replays_history_then_clears_the_marker() {
    let project = TestProject::new();
    project.git_init();
    // Three dated documents; the marker excludes the first
    project.git_commit_file("docs/old.md", "before the marker\n", "2025-12-01");
    project.git_commit_file("docs/mid.md", &"middle history\n".repeat(30), "2026-01-01");
    project.git_commit_file("docs/new.md", &"recent history\n".repeat(30), "2026-02-01");
    let mut store = project.store();

    let agent = FakeFoldAgent::scripted(vec![FakeRun::edits(vec![(
        "docs/knowledge/concepts.md".into(),
        "# Concept Registry\n\n## C001 Replayed\nStatus: ACTIVE\nCode: `docs/mid.md`\n".to_string(),
    )])]);
    let linter = HeaderLinter;

    let stats = forward_fold(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        &linter,
        day("2026-01-01"),
    )
    .await
    .unwrap();

    assert!(stats.chunks >= 1);
    // Marker cleared on completion; staleness left for the L0 drain
    assert!(store.state().server.fold_from.is_none());
    assert!(store.state().server.l0_stale);
    assert!(crate::queue::queue_is_drained(&project.paths));

    // The chunk saw only entries at or after the marker
    let input = std::fs::read_to_string(project.paths.chunk_input(1)).unwrap();
    assert!(!input.contains("old.md"));
    assert!(input.contains("mid.md"));
}

#[tokio::test]
async fn failed_chunk_preserves_the_marker() {
    let project = TestProject::new();
    project.git_init();
    project.git_commit_file("docs/doc.md", &"history\n".repeat(40), "2026-01-15");
    let mut store = project.store();

    // Exhaust every retry without edits
    let agent = FakeFoldAgent::scripted(vec![
        FakeRun::no_edits(),
        FakeRun::no_edits(),
        FakeRun::no_edits(),
    ]);
    let linter = HeaderLinter;

    let err = forward_fold(
        &mut store,
        &project.config,
        &project.paths,
        &agent,
        &linter,
        day("2026-01-01"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EngineError::DispatchFailed { .. }));
    assert_eq!(store.state().server.fold_from, Some(day("2026-01-01")));
}
