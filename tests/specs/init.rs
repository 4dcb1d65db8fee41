//! Specs for `engram init`.

use crate::prelude::*;

#[test]
fn init_creates_config_docs_and_state() {
    let project = Project::empty();

    project
        .engram()
        .args(&["init"])
        .passes()
        .stdout_has("Initialized engram project");

    assert!(project.exists("engram.yaml"));
    assert!(project.exists(".engram/wal.jsonl"));
    assert!(project.exists("docs/knowledge/timeline.md"));
    assert!(project.exists("docs/knowledge/concepts.md"));
    assert!(project.exists("docs/knowledge/epistemic.md"));
    assert!(project.exists("docs/knowledge/workflows.md"));
    assert!(project.exists("docs/knowledge/graveyard/concepts.md"));
    assert!(project.exists("docs/knowledge/graveyard/epistemic.md"));
}

#[test]
fn init_is_idempotent_and_preserves_existing_docs() {
    let project = Project::initialized();
    project.file("docs/knowledge/concepts.md", "# Concepts\n\n## C001 Kept\nCode: `a.rs`\n");

    project.engram().args(&["init"]).passes();

    assert!(project.read("docs/knowledge/concepts.md").contains("C001 Kept"));
}

#[test]
fn living_docs_carry_schema_titles() {
    let project = Project::initialized();
    assert!(project.read("docs/knowledge/timeline.md").starts_with("# Timeline"));
    assert!(project
        .read("docs/knowledge/concepts.md")
        .starts_with("# Concept Registry"));
}

#[test]
fn commands_without_init_fail_with_guidance() {
    let project = Project::empty();
    project
        .engram()
        .args(&["status"])
        .fails()
        .stderr_has("engram init");
}
