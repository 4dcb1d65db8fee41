// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema linter interface and the built-in header linter.
//!
//! The rule set is deliberately shallow: the linter is a black-box
//! validator from the pipeline's point of view, returning pass/fail plus a
//! violation list that feeds correction prompts.

use crate::AdapterError;
use engram_core::{extract_ids, Category, EntityId};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// One schema violation, pointing at its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.message)
    }
}

/// Pass/fail plus the violation list.
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub violations: Vec<Violation>,
}

impl LintReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Validates living and graveyard docs (and chunk inputs) for schema shape.
pub trait SchemaLinter: Send + Sync {
    fn lint(&self, docs: &[PathBuf]) -> Result<LintReport, AdapterError>;
}

#[allow(clippy::expect_used)]
static ENTRY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^##\s+([CEW]\d{3,})\b").expect("constant regex pattern is valid")
});

const CLAIM_STATUSES: [&str; 4] = ["verified", "unverified", "contested", "retired"];
const WORKFLOW_STATUSES: [&str; 2] = ["CURRENT", "SUPERSEDED"];

/// The built-in rule set: titles, per-entry required fields, unique ids.
#[derive(Debug, Default)]
pub struct HeaderLinter;

impl SchemaLinter for HeaderLinter {
    fn lint(&self, docs: &[PathBuf]) -> Result<LintReport, AdapterError> {
        let mut report = LintReport::default();
        let mut seen_ids: HashMap<EntityId, PathBuf> = HashMap::new();

        for path in docs {
            let Ok(text) = std::fs::read_to_string(path) else {
                report.violations.push(Violation {
                    file: path.clone(),
                    line: 0,
                    message: "file is missing".to_string(),
                });
                continue;
            };
            lint_file(path, &text, &mut seen_ids, &mut report);
        }

        Ok(report)
    }
}

fn lint_file(
    path: &Path,
    text: &str,
    seen_ids: &mut HashMap<EntityId, PathBuf>,
    report: &mut LintReport,
) {
    let mut push = |line: usize, message: String| {
        report.violations.push(Violation {
            file: path.to_path_buf(),
            line,
            message,
        });
    };

    // Rule 1: first non-blank line is the document title
    match text.lines().enumerate().find(|(_, l)| !l.trim().is_empty()) {
        Some((n, line)) if !line.starts_with("# ") => {
            push(n + 1, "document must start with a `# ` title".to_string());
        }
        None => push(1, "document is empty".to_string()),
        _ => {}
    }

    // Rules 2+3: per-entry required fields and unique ids
    for entry in split_entries(text) {
        let Some(id) = entry.id else { continue };

        if let Some(first_file) = seen_ids.get(&id) {
            push(
                entry.line,
                format!("duplicate identifier {id} (first seen in {})", first_file.display()),
            );
        } else {
            seen_ids.insert(id, path.to_path_buf());
        }

        match id.category {
            Category::Concept => {
                if field_value(&entry.body, "Code:").is_none() {
                    push(entry.line, format!("{id} is missing its `Code:` field"));
                }
            }
            Category::Epistemic => match field_value(&entry.body, "Status:") {
                None => push(entry.line, format!("{id} is missing its `Status:` field")),
                Some(value) if !CLAIM_STATUSES.contains(&value.as_str()) => push(
                    entry.line,
                    format!("{id} has unknown claim status '{value}'"),
                ),
                _ => {}
            },
            Category::Workflow => match field_value(&entry.body, "Status:") {
                None => push(entry.line, format!("{id} is missing its `Status:` field")),
                Some(value) if !WORKFLOW_STATUSES.contains(&value.as_str()) => push(
                    entry.line,
                    format!("{id} has unknown workflow status '{value}'"),
                ),
                _ => {}
            },
        }
    }
}

struct Entry {
    id: Option<EntityId>,
    /// 1-based line number of the entry heading
    line: usize,
    body: Vec<String>,
}

/// Split a document into `## `-delimited entries, tagging identified ones.
fn split_entries(text: &str) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if line.starts_with("## ") {
            let id = ENTRY_HEADING
                .captures(line)
                .and_then(|cap| cap.get(1))
                .and_then(|m| extract_ids(m.as_str()).into_iter().next());
            entries.push(Entry {
                id,
                line: n + 1,
                body: Vec::new(),
            });
        } else if let Some(entry) = entries.last_mut() {
            entry.body.push(line.to_string());
        }
    }
    entries
}

fn field_value(body: &[String], field: &str) -> Option<String> {
    body.iter().find_map(|line| {
        line.trim()
            .strip_prefix(field)
            .map(|rest| rest.trim().to_string())
    })
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    //! Scriptable linter for tests.

    use super::{LintReport, SchemaLinter};
    use crate::AdapterError;
    use parking_lot::Mutex;
    use std::path::PathBuf;

    /// Pops one queued report per lint call; passes once the queue drains.
    #[derive(Default)]
    pub struct FakeLinter {
        reports: Mutex<Vec<LintReport>>,
        calls: Mutex<usize>,
    }

    impl FakeLinter {
        pub fn scripted(reports: Vec<LintReport>) -> Self {
            Self {
                reports: Mutex::new(reports),
                calls: Mutex::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            *self.calls.lock()
        }
    }

    impl SchemaLinter for FakeLinter {
        fn lint(&self, _docs: &[PathBuf]) -> Result<LintReport, AdapterError> {
            *self.calls.lock() += 1;
            let mut reports = self.reports.lock();
            if reports.is_empty() {
                Ok(LintReport::default())
            } else {
                Ok(reports.remove(0))
            }
        }
    }
}

#[cfg(test)]
#[path = "linter_tests.rs"]
mod tests;
