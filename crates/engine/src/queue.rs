// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue builder: merge adapter outputs into a chronological queue.
//!
//! The queue (`queue.jsonl`) feeds chunk content; the buffer triggers
//! dispatches. They may diverge: the drain predicate for L0 regeneration
//! checks the queue, never the buffer.

use crate::{EngineError, EngramPaths};
use engram_adapters::{
    harvest_docs, harvest_issues, session_format, IssueArtifact, SessionDraft,
};
use engram_core::{parse_logical_date, BufferItem, Config, ItemKind, QueueEntry};
use indexmap::IndexMap;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Everything the adapters produced, before filtering.
#[derive(Debug, Default)]
pub struct Harvest {
    pub docs: Vec<QueueEntry>,
    pub issues: Vec<IssueArtifact>,
    pub sessions: Vec<SessionDraft>,
}

/// Run every configured adapter.
pub async fn harvest(config: &Config, root: &Path) -> Result<Harvest, EngineError> {
    let mut exclude = config.all_doc_paths(root);
    exclude.push(root.join(&config.briefing.file));

    let docs = harvest_docs(root, &config.sources.doc_roots, &exclude).await?;

    let issues = match &config.sources.issues_dir {
        Some(dir) => harvest_issues(&root.join(dir))?,
        None => Vec::new(),
    };

    let sessions = match &config.sources.sessions {
        Some(source) => {
            let format = session_format(source.format)?;
            match format.parse(&source.history_file, &source.project_match) {
                Ok(drafts) => drafts,
                Err(e) => {
                    warn!(error = %e, "session harvest failed, continuing without sessions");
                    Vec::new()
                }
            }
        }
        None => Vec::new(),
    };

    Ok(Harvest {
        docs,
        issues,
        sessions,
    })
}

/// What `build_queue` wrote.
#[derive(Debug, PartialEq, Eq)]
pub struct QueueSummary {
    pub entries: usize,
    pub total_chars: u64,
}

/// Merge, sort, filter, and persist the queue.
///
/// `start_date` must be a strict `YYYY-MM-DD` string; anything else is
/// rejected before any file is touched. Session markdown is written only
/// for entries that survive the filter; the item-size inventory covers the
/// full unfiltered set.
pub fn build_queue(
    paths: &EngramPaths,
    harvest: Harvest,
    start_date: Option<&str>,
) -> Result<QueueSummary, EngineError> {
    // Strict validation first: an ISO datetime would silently exclude
    // same-day entries via prefix comparison
    let cutoff = start_date.map(parse_logical_date).transpose()?;

    let root = paths.root().to_path_buf();
    let mut entries: Vec<QueueEntry> = Vec::new();
    let mut drafts: Vec<(QueueEntry, SessionDraft)> = Vec::new();

    entries.extend(harvest.docs);

    for issue in harvest.issues {
        let rel = issue
            .path
            .strip_prefix(&root)
            .unwrap_or(&issue.path)
            .to_path_buf();
        entries.push(QueueEntry {
            date: issue.date,
            kind: ItemKind::Issue,
            path: rel,
            chars: issue.rendered.len() as u64,
            phase: None,
            session_id: None,
        });
    }

    for draft in harvest.sessions {
        let session_path = paths.session_file(&draft.id);
        let rel = session_path
            .strip_prefix(&root)
            .unwrap_or(&session_path)
            .to_path_buf();
        let entry = QueueEntry {
            date: draft.date,
            kind: ItemKind::Session,
            path: rel,
            chars: draft.chars(),
            phase: None,
            session_id: Some(draft.id.clone()),
        };
        drafts.push((entry, draft));
    }

    // Inventory covers everything, unaffected by the filter
    let mut sizes: IndexMap<String, u64> = IndexMap::new();
    for entry in entries.iter().chain(drafts.iter().map(|(e, _)| e)) {
        sizes.insert(entry.path.display().to_string(), entry.chars);
    }

    // Chronological order; stable path ordering within a day
    entries.extend(drafts.iter().map(|(e, _)| e.clone()));
    entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    if let Some(cutoff) = cutoff {
        entries.retain(|e| e.date >= cutoff);
    }

    paths.ensure_layout()?;

    // Persist surviving session drafts; filtered-out drafts are discarded
    for (entry, draft) in &drafts {
        if entries.contains(entry) {
            std::fs::write(paths.session_file(&draft.id), &draft.rendered)?;
        }
    }

    write_queue(paths, &entries)?;
    let sizes_json = serde_json::to_string_pretty(&sizes)?;
    std::fs::write(paths.item_sizes(), sizes_json)?;

    let summary = QueueSummary {
        entries: entries.len(),
        total_chars: entries.iter().map(|e| e.chars).sum(),
    };
    info!(
        entries = summary.entries,
        total_chars = summary.total_chars,
        start_date = ?cutoff,
        "queue built",
    );
    Ok(summary)
}

/// Persist the queue as line-delimited records.
pub fn write_queue(paths: &EngramPaths, entries: &[QueueEntry]) -> Result<(), EngineError> {
    let mut out = Vec::new();
    for entry in entries {
        serde_json::to_writer(&mut out, entry)?;
        out.push(b'\n');
    }
    let mut file = std::fs::File::create(paths.queue())?;
    file.write_all(&out)?;
    file.sync_all()?;
    Ok(())
}

/// Load the persisted queue; absent file means empty.
pub fn load_queue(paths: &EngramPaths) -> Result<Vec<QueueEntry>, EngineError> {
    let path = paths.queue();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str(trimmed) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(error = %e, "skipping corrupt queue line"),
        }
    }
    Ok(entries)
}

/// The L0 drain predicate: queue file absent or empty.
pub fn queue_is_drained(paths: &EngramPaths) -> bool {
    load_queue(paths).map(|q| q.is_empty()).unwrap_or(false)
}

/// Fold freshly buffered artifacts into the persisted queue.
///
/// Steady-state counterpart of [`build_queue`]: the full harvest already
/// happened historically, so only the buffered deltas are appended.
/// Documents re-enter as REVISIT entries; session items re-run the session
/// adapter for drafts dated on or after the buffered change.
pub fn extend_queue_from_buffer(
    paths: &EngramPaths,
    config: &Config,
    buffer: &[BufferItem],
) -> Result<usize, EngineError> {
    let mut entries = load_queue(paths)?;
    let mut added = 0usize;

    let mut push = |entries: &mut Vec<QueueEntry>, entry: QueueEntry| {
        let dup = entries
            .iter()
            .any(|e| e.path == entry.path && e.date == entry.date && e.kind == entry.kind);
        if !dup {
            entries.push(entry);
            added += 1;
        }
    };

    for item in buffer {
        match item.kind {
            ItemKind::Document => push(
                &mut entries,
                QueueEntry {
                    date: item.date,
                    kind: ItemKind::Document,
                    path: item.path.clone(),
                    chars: item.chars,
                    phase: Some(engram_core::DocPhase::Revisit),
                    session_id: None,
                },
            ),
            ItemKind::Issue => push(
                &mut entries,
                QueueEntry {
                    date: item.date,
                    kind: ItemKind::Issue,
                    path: item.path.clone(),
                    chars: item.chars,
                    phase: None,
                    session_id: None,
                },
            ),
            ItemKind::Session => {
                let Some(source) = &config.sources.sessions else {
                    continue;
                };
                let format = session_format(source.format)?;
                let drafts = match format.parse(&source.history_file, &source.project_match) {
                    Ok(drafts) => drafts,
                    Err(e) => {
                        warn!(error = %e, "session re-harvest failed");
                        continue;
                    }
                };
                for draft in drafts {
                    if draft.date < item.date {
                        continue;
                    }
                    std::fs::create_dir_all(paths.sessions_dir())?;
                    std::fs::write(paths.session_file(&draft.id), &draft.rendered)?;
                    let rel = paths.session_file(&draft.id);
                    let rel = rel.strip_prefix(paths.root()).unwrap_or(&rel).to_path_buf();
                    push(
                        &mut entries,
                        QueueEntry {
                            date: draft.date,
                            kind: ItemKind::Session,
                            path: rel,
                            chars: draft.chars(),
                            phase: None,
                            session_id: Some(draft.id.clone()),
                        },
                    );
                }
            }
            // Drift markers trigger dispatches; they carry no content
            ItemKind::DriftMarker => {}
        }
    }

    if added > 0 {
        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        write_queue(paths, &entries)?;
    }
    Ok(added)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
