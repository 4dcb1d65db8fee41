//! Specs for `engram lint`.

use crate::prelude::*;

#[test]
fn fresh_project_lints_clean() {
    let project = Project::initialized();
    project
        .engram()
        .args(&["lint"])
        .passes()
        .stdout_has("Lint passed");
}

#[test]
fn missing_code_field_is_reported_with_location() {
    let project = Project::initialized();
    project.file(
        "docs/knowledge/concepts.md",
        "# Concept Registry\n\n## C001 Parser\nStatus: ACTIVE\n",
    );

    project
        .engram()
        .args(&["lint"])
        .fails()
        .stderr_has("schema violation");
}

#[test]
fn unknown_claim_status_is_reported() {
    let project = Project::initialized();
    project.file(
        "docs/knowledge/epistemic.md",
        "# Claim Registry\n\n## E001 Claim\nStatus: dubious\n",
    );

    let run = project.engram().args(&["lint"]).fails();
    assert!(run.stdout().contains("dubious"));
}
