//! Specs for `engram build-queue`.

use crate::prelude::*;

#[test]
fn build_queue_filters_by_start_date() {
    let project = Project::initialized();
    project.git_init();
    project.git_commit_file("docs/early.md", "early notes\n", "2025-12-01");
    project.git_commit_file("docs/late.md", "late notes\n", "2026-02-01");

    project
        .engram()
        .args(&["build-queue", "--start-date", "2026-01-01"])
        .passes()
        .stdout_has("1 entry")
        .stdout_has("from 2026-01-01");

    let queue = project.read(".engram/queue.jsonl");
    assert!(queue.contains("late.md"));
    assert!(!queue.contains("early.md"));
}

#[test]
fn iso_datetime_start_date_is_rejected() {
    let project = Project::initialized();
    project.git_init();

    project
        .engram()
        .args(&["build-queue", "--start-date", "2026-01-01T00:00:00Z"])
        .fails()
        .stderr_has("expected YYYY-MM-DD");

    // Rejected before any side effect
    assert!(!project.exists(".engram/queue.jsonl"));
}

#[test]
fn full_history_without_a_date() {
    let project = Project::initialized();
    project.git_init();
    project.git_commit_file("docs/a.md", "notes\n", "2026-01-01");

    project
        .engram()
        .args(&["build-queue"])
        .passes()
        .stdout_has("full history");

    // The inventory maps each path to its character size
    let sizes: serde_json::Value =
        serde_json::from_str(&project.read(".engram/item_sizes.json")).unwrap();
    assert_eq!(sizes["docs/a.md"], 6);
}
