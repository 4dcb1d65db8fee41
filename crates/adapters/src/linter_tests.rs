// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeLinter;
use super::*;

fn lint_docs(docs: &[(&str, &str)]) -> LintReport {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = docs
        .iter()
        .map(|(name, content)| {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path
        })
        .collect();
    HeaderLinter.lint(&paths).unwrap()
}

// ── Document shape ───────────────────────────────────────────────────────────

#[test]
fn well_formed_docs_pass() {
    let report = lint_docs(&[(
        "concepts.md",
        "# Concept Registry\n\n## C001 Parser\nStatus: ACTIVE\nCode: `src/parse.rs`\n\n## C002 Queue\nCode: `src/queue.rs`\n",
    )]);
    assert!(report.passed(), "violations: {:?}", report.violations);
}

#[test]
fn missing_title_is_flagged() {
    let report = lint_docs(&[("concepts.md", "## C001 Parser\nCode: `a.rs`\n")]);
    assert!(!report.passed());
    assert!(report.violations[0].message.contains("title"));
}

#[test]
fn empty_document_is_flagged() {
    let report = lint_docs(&[("concepts.md", "\n\n")]);
    assert!(report.violations[0].message.contains("empty"));
}

#[test]
fn missing_file_is_flagged() {
    let report = HeaderLinter
        .lint(&[PathBuf::from("/nonexistent/concepts.md")])
        .unwrap();
    assert!(report.violations[0].message.contains("missing"));
}

// ── Entry fields ─────────────────────────────────────────────────────────────

#[test]
fn concept_without_code_field_is_flagged() {
    let report = lint_docs(&[(
        "concepts.md",
        "# Concepts\n\n## C001 Parser\nStatus: ACTIVE\n",
    )]);
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].message.contains("`Code:`"));
    assert_eq!(report.violations[0].line, 3);
}

#[yare::parameterized(
    verified = { "verified" },
    unverified = { "unverified" },
    contested = { "contested" },
    retired = { "retired" },
)]
fn known_claim_statuses_pass(status: &str) {
    let report = lint_docs(&[(
        "epistemic.md",
        &format!("# Claims\n\n## E001 Claim\nStatus: {status}\n"),
    )]);
    assert!(report.passed(), "violations: {:?}", report.violations);
}

#[test]
fn claim_statuses_are_validated() {
    let report = lint_docs(&[(
        "epistemic.md",
        "# Claims\n\n## E001 Fast path\nStatus: contested\n\n## E002 Slow path\nStatus: dubious\n\n## E003 No status\n",
    )]);
    assert_eq!(report.violations.len(), 2);
    assert!(report.violations[0].message.contains("dubious"));
    assert!(report.violations[1].message.contains("`Status:`"));
}

#[test]
fn workflow_statuses_are_validated() {
    let report = lint_docs(&[(
        "workflows.md",
        "# Workflows\n\n## W001 Release\nStatus: CURRENT\n\n## W002 Old release\nStatus: obsolete\n",
    )]);
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].message.contains("obsolete"));
}

#[test]
fn unidentified_headings_are_not_entries() {
    // Chunk inputs contain plain headings; only `## C001`-style lines are
    // schema entries
    let report = lint_docs(&[(
        "chunk_001_input.md",
        "# Knowledge Fold Chunk 1\n\n## Item 1: docs/a.md\ncontent\n",
    )]);
    assert!(report.passed());
}

// ── Cross-file identity ──────────────────────────────────────────────────────

#[test]
fn duplicate_ids_across_files_are_flagged() {
    let report = lint_docs(&[
        (
            "concepts.md",
            "# Concepts\n\n## C001 Parser\nCode: `a.rs`\n",
        ),
        (
            "graveyard.md",
            "# Graveyard\n\n## C001 Parser (retired)\nCode: `a.rs`\n",
        ),
    ]);
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].message.contains("duplicate identifier C001"));
}

// ── Fake ─────────────────────────────────────────────────────────────────────

#[test]
fn fake_linter_pops_scripted_reports_then_passes() {
    let failing = LintReport {
        violations: vec![Violation {
            file: "concepts.md".into(),
            line: 3,
            message: "C001 is missing its `Code:` field".to_string(),
        }],
    };
    let linter = FakeLinter::scripted(vec![failing]);

    assert!(!linter.lint(&[]).unwrap().passed());
    assert!(linter.lint(&[]).unwrap().passed());
    assert_eq!(linter.call_count(), 2);
}
