// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document adapter: markdown files under the configured source roots.
//!
//! Each document yields an INITIAL entry at its git first-commit date and a
//! REVISIT entry at its last-commit date. The pair is emitted only when the
//! two dates differ, so an unchanged document folds exactly once. Dates
//! resolve in order: frontmatter `date:`, `YYYY-MM-DD-*` filename prefix,
//! git commit time.

use crate::{git, AdapterError};
use chrono::NaiveDate;
use engram_core::{date, DocPhase, ItemKind, QueueEntry};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Scan `doc_roots` for markdown documents and date them.
///
/// `exclude` removes Engram's own artifacts (living docs, graveyards, the
/// briefing target) from the scan. Documents git knows nothing about are
/// skipped with a warning.
pub async fn harvest_docs(
    root: &Path,
    doc_roots: &[PathBuf],
    exclude: &[PathBuf],
) -> Result<Vec<QueueEntry>, AdapterError> {
    let mut entries = Vec::new();

    for doc_root in doc_roots {
        let mut files = Vec::new();
        collect_markdown(&root.join(doc_root), &mut files)?;
        files.sort();

        for path in files {
            if exclude.iter().any(|e| *e == path) {
                continue;
            }
            let Some((initial, revisit)) = date_document(root, &path).await? else {
                warn!(path = %path.display(), "skipping undatable document");
                continue;
            };

            let chars = std::fs::metadata(&path)?.len();
            let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();

            entries.push(QueueEntry {
                date: initial,
                kind: ItemKind::Document,
                path: rel.clone(),
                chars,
                phase: Some(DocPhase::Initial),
                session_id: None,
            });
            if let Some(revisit) = revisit {
                entries.push(QueueEntry {
                    date: revisit,
                    kind: ItemKind::Document,
                    path: rel,
                    chars,
                    phase: Some(DocPhase::Revisit),
                    session_id: None,
                });
            }
        }
    }

    Ok(entries)
}

fn collect_markdown(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), AdapterError> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_markdown(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "md") {
            out.push(path);
        }
    }
    Ok(())
}

/// Resolve `(initial, revisit)` dates for one document.
///
/// `revisit` is `None` when it would land on the initial date.
async fn date_document(
    root: &Path,
    path: &Path,
) -> Result<Option<(NaiveDate, Option<NaiveDate>)>, AdapterError> {
    let rel = path.strip_prefix(root).unwrap_or(path);

    let explicit = std::fs::read_to_string(path)
        .ok()
        .and_then(|text| date::date_from_frontmatter(&text))
        .or_else(|| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(date::date_from_filename)
        });

    let initial = match explicit {
        Some(date) => Some(date),
        None => git::first_commit_date(root, rel).await?,
    };
    let Some(initial) = initial else {
        return Ok(None);
    };

    let revisit = git::last_commit_date(root, rel)
        .await?
        .filter(|last| *last > initial);

    Ok(Some((initial, revisit)))
}

#[cfg(test)]
#[path = "docs_tests.rs"]
mod tests;
