//! Specs for `engram status`.

use crate::prelude::*;

#[test]
fn fresh_project_status_shows_empty_state() {
    let project = Project::initialized();

    project
        .engram()
        .args(&["status"])
        .passes()
        .stdout_has("Buffer: 0 chars")
        .stdout_has("Queue: 0 pending")
        .stdout_has("Last dispatch: never")
        .stdout_has("fold_from: (unset)")
        .stdout_has("l0_stale: false");
}

#[test]
fn status_reports_the_active_chunk() {
    let project = Project::initialized();
    project.git_init();
    project.git_commit_file("docs/a.md", "notes\n", "2026-01-04");
    project.engram().args(&["build-queue"]).passes();
    project.engram().args(&["next-chunk"]).passes();

    project
        .engram()
        .args(&["status"])
        .passes()
        .stdout_has("Active chunk: 1")
        .stdout_has("In flight: chunk 1 (fold) in state building");
}

#[test]
fn migrate_sets_the_marker_and_status_shows_it() {
    let project = Project::initialized();

    project
        .engram()
        .args(&["migrate", "--fold-from", "2026-01-01"])
        .passes()
        .stdout_has("fold_from set");

    project
        .engram()
        .args(&["status"])
        .passes()
        .stdout_has("fold_from: 2026-01-01");
}

#[test]
fn migrate_backfills_identifiers() {
    let project = Project::initialized();
    project.file(
        "docs/knowledge/workflows.md",
        "# Workflow Registry\n\n## Release checklist\nStatus: CURRENT\n",
    );

    project
        .engram()
        .args(&["migrate"])
        .passes()
        .stdout_has("1 identifier(s) assigned");

    assert!(project
        .read("docs/knowledge/workflows.md")
        .contains("## W001 Release checklist"));
}
