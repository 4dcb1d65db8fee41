//! Specs for `engram next-chunk` and the active-chunk lock.

use crate::prelude::*;

#[test]
fn next_chunk_writes_input_prompt_and_lock() {
    let project = Project::initialized();
    project.git_init();
    project.git_commit_file("docs/design.md", "design notes\n", "2026-01-04");
    project.engram().args(&["build-queue"]).passes();

    project
        .engram()
        .args(&["next-chunk"])
        .passes()
        .stdout_has("Chunk 1 (fold)");

    assert!(project.exists(".engram/chunks/chunk_001_input.md"));
    assert!(project.exists(".engram/chunks/chunk_001_prompt.txt"));
    assert!(project.exists(".engram/active_chunk.json"));

    let input = project.read(".engram/chunks/chunk_001_input.md");
    assert!(input.contains("Reserved identifiers:"));
    assert!(input.contains("design notes"));
}

#[test]
fn second_next_chunk_refuses_while_lock_is_held() {
    let project = Project::initialized();
    project.git_init();
    project.git_commit_file("docs/a.md", "notes a\n", "2026-01-04");
    project.git_commit_file("docs/b.md", "notes b\n", "2026-01-05");
    project.engram().args(&["build-queue"]).passes();
    project.engram().args(&["next-chunk"]).passes();

    // The refusal names the remedy and produces no second chunk
    project
        .engram()
        .args(&["next-chunk"])
        .fails()
        .stderr_has("clear-active-chunk");
    assert!(!project.exists(".engram/chunks/chunk_002_input.md"));
}

#[test]
fn clear_active_chunk_releases_the_lock() {
    let project = Project::initialized();
    project.git_init();
    project.git_commit_file("docs/a.md", "notes\n", "2026-01-04");
    project.engram().args(&["build-queue"]).passes();
    project.engram().args(&["next-chunk"]).passes();

    project
        .engram()
        .args(&["clear-active-chunk"])
        .passes()
        .stdout_has("cleared");
    assert!(!project.exists(".engram/active_chunk.json"));

    project
        .engram()
        .args(&["clear-active-chunk"])
        .passes()
        .stdout_has("No active-chunk lock");
}

#[test]
fn empty_queue_schedules_nothing() {
    let project = Project::initialized();
    project.git_init();

    project
        .engram()
        .args(&["next-chunk"])
        .passes()
        .stdout_has("Nothing to do");
    assert!(!project.exists(".engram/active_chunk.json"));
}
