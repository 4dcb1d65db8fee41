// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue adapter: a directory of issue JSON files, rendered to markdown.

use crate::AdapterError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One issue, dated and rendered.
#[derive(Debug, Clone)]
pub struct IssueArtifact {
    pub date: NaiveDate,
    pub path: PathBuf,
    pub rendered: String,
}

#[derive(Debug, Deserialize)]
struct IssueRecord {
    title: String,
    #[serde(default)]
    body: String,
    /// `YYYY-MM-DD` or an ISO datetime; only the date part is used
    created_at: String,
    #[serde(default)]
    labels: Vec<String>,
}

/// Read every `*.json` issue under `issues_dir`.
///
/// Malformed records are skipped with a warning; a missing directory yields
/// an empty set.
pub fn harvest_issues(issues_dir: &Path) -> Result<Vec<IssueArtifact>, AdapterError> {
    let mut artifacts = Vec::new();
    if !issues_dir.is_dir() {
        return Ok(artifacts);
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(issues_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    for path in entries {
        match read_issue(&path) {
            Some(artifact) => artifacts.push(artifact),
            None => warn!(path = %path.display(), "skipping malformed issue record"),
        }
    }

    Ok(artifacts)
}

fn read_issue(path: &Path) -> Option<IssueArtifact> {
    let text = std::fs::read_to_string(path).ok()?;
    let record: IssueRecord = serde_json::from_str(&text).ok()?;
    let date: NaiveDate = record.created_at.get(..10)?.parse().ok()?;
    Some(IssueArtifact {
        date,
        path: path.to_path_buf(),
        rendered: render_issue(&record.title, &record.body, date, &record.labels),
    })
}

/// Render an issue to the markdown form embedded in fold chunks.
pub fn render_issue(title: &str, body: &str, date: NaiveDate, labels: &[String]) -> String {
    let mut out = format!("### Issue: {title}\n\nOpened: {date}\n");
    if !labels.is_empty() {
        out.push_str(&format!("Labels: {}\n", labels.join(", ")));
    }
    out.push('\n');
    out.push_str(body.trim());
    out.push('\n');
    out
}

/// Re-render an issue file for chunk assembly.
///
/// The queue stores only the JSON path; chunk content is produced on demand
/// so the queue stays small.
pub fn render_issue_file(path: &Path) -> Option<String> {
    read_issue(path).map(|a| a.rendered)
}

#[cfg(test)]
#[path = "issues_tests.rs"]
mod tests;
