// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn write_issue(dir: &Path, name: &str, json: &str) {
    std::fs::write(dir.join(name), json).unwrap();
}

// ── Harvest ──────────────────────────────────────────────────────────────────

#[test]
fn harvests_and_renders_issue_files() {
    let dir = tempfile::tempdir().unwrap();
    write_issue(
        dir.path(),
        "001.json",
        r#"{"title": "Crash on empty queue", "body": "Steps to reproduce...", "created_at": "2026-01-03", "labels": ["bug"]}"#,
    );

    let artifacts = harvest_issues(dir.path()).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].date.to_string(), "2026-01-03");
    assert!(artifacts[0].rendered.contains("### Issue: Crash on empty queue"));
    assert!(artifacts[0].rendered.contains("Labels: bug"));
    assert!(artifacts[0].rendered.contains("Steps to reproduce..."));
}

#[test]
fn iso_datetime_created_at_is_truncated_to_date() {
    let dir = tempfile::tempdir().unwrap();
    write_issue(
        dir.path(),
        "a.json",
        r#"{"title": "T", "created_at": "2026-01-03T10:30:00Z"}"#,
    );

    let artifacts = harvest_issues(dir.path()).unwrap();
    assert_eq!(artifacts[0].date.to_string(), "2026-01-03");
}

#[test]
fn malformed_issues_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_issue(dir.path(), "bad.json", "{not json");
    write_issue(
        dir.path(),
        "undated.json",
        r#"{"title": "No date", "created_at": "someday"}"#,
    );
    write_issue(
        dir.path(),
        "good.json",
        r#"{"title": "Fine", "created_at": "2026-01-01"}"#,
    );

    let artifacts = harvest_issues(dir.path()).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].rendered.contains("Fine"));
}

#[test]
fn missing_directory_yields_empty_set() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = harvest_issues(&dir.path().join("absent")).unwrap();
    assert!(artifacts.is_empty());
}

#[test]
fn non_json_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("README.md"), "# notes").unwrap();
    write_issue(
        dir.path(),
        "a.json",
        r#"{"title": "T", "created_at": "2026-01-01"}"#,
    );

    assert_eq!(harvest_issues(dir.path()).unwrap().len(), 1);
}

// ── On-demand re-render ──────────────────────────────────────────────────────

#[test]
fn render_issue_file_matches_harvest_output() {
    let dir = tempfile::tempdir().unwrap();
    write_issue(
        dir.path(),
        "a.json",
        r#"{"title": "T", "body": "B", "created_at": "2026-01-01"}"#,
    );

    let harvested = harvest_issues(dir.path()).unwrap().remove(0);
    let rerendered = render_issue_file(&dir.path().join("a.json")).unwrap();
    assert_eq!(harvested.rendered, rerendered);
}
