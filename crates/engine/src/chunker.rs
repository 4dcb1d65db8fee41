// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunk scheduler: decide what the fold agent works on next.
//!
//! Drift triage preempts chronology; chronology consumes the queue head
//! within the character budget. Chunk files are self-contained: the agent
//! needs nothing beyond the input file and the living docs on disk.

use crate::allocator::{pre_assign, NewEntryEstimate, PreAssigned};
use crate::drift::{scan_drift, DriftReport};
use crate::lock::{auto_clear_lock, ActiveChunkLock};
use crate::queue::{load_queue, write_queue};
use crate::{EngineError, EngramPaths};
use chrono::{NaiveDate, Utc};
use engram_core::{ChunkType, Config, DriftType, Event, ItemKind, ManifestEntry, QueueEntry};
use engram_storage::StateStore;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// A chunk produced and locked, awaiting dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledChunk {
    pub chunk_id: u64,
    pub chunk_type: ChunkType,
    pub input_path: std::path::PathBuf,
    pub prompt_path: std::path::PathBuf,
    /// Characters of item content packed into the input (drives the
    /// dispatcher's size guard)
    pub content_chars: u64,
}

enum Plan {
    Fold { entries: Vec<QueueEntry> },
    Triage { drift: DriftType, report: DriftReport, registry_hash: Option<String> },
}

/// Produce the next chunk, or `None` when there is nothing to do.
///
/// Refuses with [`EngineError::LockHeld`] while a chunk is active. On
/// success the chunk files are on disk, the building dispatch record and
/// buffer consumption are committed, and the active-chunk lock is written.
pub async fn next_chunk(
    store: &mut StateStore,
    config: &Config,
    paths: &EngramPaths,
    fold_from: Option<NaiveDate>,
) -> Result<Option<ScheduledChunk>, EngineError> {
    // Step 1: active-lock check, after the best-effort auto-clear
    auto_clear_lock(paths).await?;
    if let Some(lock) = ActiveChunkLock::load(paths)? {
        return Err(EngineError::LockHeld {
            chunk_id: lock.chunk_id,
        });
    }

    // Step 2: character budget
    let budget = compute_budget(config, paths.root());

    // Steps 3-5: drift triage beats chronology, subject to cooldown
    let report = scan_drift(config, paths, fold_from).await?;
    let plan = match select_drift(store, config, paths.root(), &report) {
        Some((drift, registry_hash)) => Plan::Triage {
            drift,
            report,
            registry_hash,
        },
        None => {
            let queue = load_queue(paths)?;
            if queue.is_empty() {
                return Ok(None);
            }
            let entries = take_prefix(&queue, budget);
            Plan::Fold { entries }
        }
    };

    let chunk_id = store.state().next_chunk_id();
    let input_path = paths.chunk_input(chunk_id);
    let prompt_path = paths.chunk_prompt(chunk_id);

    // Steps 6-7: assemble content and pre-assign identifiers (fold only;
    // triage chunks reuse existing ids)
    let (chunk_type, input, content_chars, consumed_upto) = match &plan {
        Plan::Fold { entries } => {
            let estimate = estimate_new_entries(entries);
            let assigned = pre_assign(store, config, paths.root(), &estimate)?;
            let (content, chars) =
                render_fold_input(paths, chunk_id, entries, &assigned, fold_from, budget);
            let upto = entries.last().map(|e| e.date);
            (ChunkType::Fold, content, chars, upto)
        }
        Plan::Triage {
            drift, report, ..
        } => {
            let content = render_triage_input(config, chunk_id, *drift, report);
            let chars = content.len() as u64;
            (drift.chunk_type(), content, chars, None)
        }
    };

    // Record building + consume the buffer atomically; the manifest entry
    // for workflow synthesis rides in the same transaction
    let mut events = vec![
        Event::DispatchBegan {
            chunk_id,
            chunk_type,
            input_path: input_path.clone(),
            prompt_path: prompt_path.clone(),
            at: Utc::now(),
        },
        Event::BufferConsumed {
            chunk_id,
            upto: consumed_upto,
        },
    ];
    if let Plan::Triage {
        drift: DriftType::WorkflowRepetition,
        registry_hash,
        ..
    } = &plan
    {
        events.push(Event::ManifestAppended {
            entry: ManifestEntry {
                chunk_id,
                chunk_type,
                created_at: Utc::now(),
                workflow_registry_hash: registry_hash.clone(),
            },
        });
    }
    store.commit(events)?;

    // Step 8: write chunk files durably, then consume the queue prefix
    std::fs::create_dir_all(paths.chunks_dir())?;
    write_durably(&input_path, &input)?;
    write_durably(&prompt_path, &render_prompt(config, paths, chunk_id, chunk_type))?;

    if let Plan::Fold { entries } = &plan {
        let queue = load_queue(paths)?;
        let remainder: Vec<QueueEntry> = queue
            .into_iter()
            .filter(|e| !entries.contains(e))
            .collect();
        write_queue(paths, &remainder)?;
    }

    // Step 9: the lock goes last, once the chunk files are fully written
    ActiveChunkLock {
        chunk_id,
        chunk_type,
        input_path: input_path.clone(),
        prompt_path: prompt_path.clone(),
        created_at: Utc::now(),
    }
    .save(paths)?;

    write_manifest_view(store, paths)?;

    info!(chunk_id, %chunk_type, content_chars, "chunk scheduled");
    Ok(Some(ScheduledChunk {
        chunk_id,
        chunk_type,
        input_path,
        prompt_path,
        content_chars,
    }))
}

/// `context_limit − living docs − instructions`, capped by `max_chunk_chars`.
fn compute_budget(config: &Config, root: &Path) -> u64 {
    let living: u64 = config
        .living_docs
        .paths(root)
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .sum();
    config
        .budget
        .context_limit_chars
        .saturating_sub(living)
        .saturating_sub(config.budget.instructions_overhead)
        .clamp(1, config.budget.max_chunk_chars)
}

/// First triggered drift type that survives the cooldown filter.
fn select_drift(
    store: &StateStore,
    config: &Config,
    root: &Path,
    report: &DriftReport,
) -> Option<(DriftType, Option<String>)> {
    for drift in report.triggered(&config.thresholds) {
        if drift != DriftType::WorkflowRepetition {
            return Some((drift, None));
        }

        let hash = hash_file(&config.workflow_registry(root));
        let candidate_id = store.state().next_chunk_id();
        let cooled_down = store
            .state()
            .last_manifest_of(ChunkType::WorkflowSynthesis)
            .is_some_and(|last| {
                last.workflow_registry_hash.is_some()
                    && last.workflow_registry_hash == hash
                    && candidate_id - last.chunk_id < config.thresholds.workflow_cooldown_chunks
            });
        if cooled_down {
            debug!("workflow registry unchanged within cooldown window; skipping synthesis");
            continue;
        }
        return Some((drift, hash));
    }
    None
}

fn hash_file(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Some(format!("{:x}", hasher.finalize()))
}

/// Queue prefix within budget; always at least one entry.
fn take_prefix(queue: &[QueueEntry], budget: u64) -> Vec<QueueEntry> {
    let mut taken = Vec::new();
    let mut used = 0u64;
    for entry in queue {
        if !taken.is_empty() && used + entry.chars > budget {
            break;
        }
        used += entry.chars;
        taken.push(entry.clone());
        if used >= budget {
            break;
        }
    }
    taken
}

fn estimate_new_entries(entries: &[QueueEntry]) -> NewEntryEstimate {
    let mut estimate = NewEntryEstimate::default();
    for entry in entries {
        match entry.kind {
            ItemKind::Document => estimate.documents += 1,
            ItemKind::Issue => estimate.issues += 1,
            ItemKind::Session => estimate.sessions += 1,
            ItemKind::DriftMarker => {}
        }
    }
    estimate
}

fn render_fold_input(
    paths: &EngramPaths,
    chunk_id: u64,
    entries: &[QueueEntry],
    assigned: &PreAssigned,
    fold_from: Option<NaiveDate>,
    budget: u64,
) -> (String, u64) {
    let mut out = format!("# Knowledge Fold Chunk {chunk_id}\n\nType: fold\n");
    out.push_str("\nReserved identifiers:\n");
    for line in assigned.header_lines() {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("\nUse only the identifiers listed above for new entries.\n");

    if let Some(date) = fold_from {
        out.push_str(&format!(
            "\nTemporal advisory: this fold replays history from {date}. \
             Concepts whose code paths look missing today may simply postdate \
             this point; do not retire them on that basis.\n"
        ));
    }

    let mut content_chars = 0u64;
    for (n, entry) in entries.iter().enumerate() {
        let phase = entry.phase.map(|p| format!(", {p}")).unwrap_or_default();
        out.push_str(&format!(
            "\n---\n\n## Item {}: {} ({}, {}{})\n\n",
            n + 1,
            entry.path.display(),
            entry.kind,
            entry.date,
            phase,
        ));

        let mut content = load_entry_content(paths, entry);
        if content.len() as u64 > budget {
            warn!(
                path = %entry.path.display(),
                chars = content.len(),
                budget,
                "entry exceeds chunk budget; truncating",
            );
            content = truncate_chars(&content, budget as usize);
        }
        content_chars += content.len() as u64;
        out.push_str(&content);
        out.push('\n');
    }

    (out, content_chars)
}

fn load_entry_content(paths: &EngramPaths, entry: &QueueEntry) -> String {
    let root = paths.root();
    match entry.kind {
        ItemKind::Document | ItemKind::Session => std::fs::read_to_string(root.join(&entry.path))
            .unwrap_or_else(|_| format!("(content unavailable: {})\n", entry.path.display())),
        ItemKind::Issue => engram_adapters::render_issue_file(&root.join(&entry.path))
            .unwrap_or_else(|| format!("(issue unavailable: {})\n", entry.path.display())),
        ItemKind::DriftMarker => String::new(),
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n\n(truncated to budget)\n", &text[..end])
}

fn render_triage_input(
    config: &Config,
    chunk_id: u64,
    drift: DriftType,
    report: &DriftReport,
) -> String {
    let mut out = String::new();
    let heading = match drift {
        DriftType::OrphanedConcepts => "Concept Triage",
        DriftType::ContestedClaims => "Contested Claim Review",
        DriftType::StaleUnverified => "Stale Unverified Claim Sweep",
        DriftType::WorkflowRepetition => "Workflow Synthesis",
    };
    out.push_str(&format!("# {heading} Chunk {chunk_id}\n\nType: {}\n", drift.chunk_type()));

    if let (Some(commit), Some(date)) = (&report.ref_commit, report.ref_date) {
        out.push_str(&format!(
            "\nReference commit: {commit} (repository state as of {date})\n"
        ));
    }

    match drift {
        DriftType::OrphanedConcepts => {
            out.push_str(
                "\nEvery code path of these ACTIVE concepts is missing:\n\n",
            );
            for concept in &report.orphaned {
                out.push_str(&format!(
                    "- {} {} (code: {})\n",
                    concept.id,
                    concept.title,
                    concept
                        .code_paths
                        .iter()
                        .map(|p| format!("`{p}`"))
                        .collect::<Vec<_>>()
                        .join(", "),
                ));
            }
            out.push_str(
                "\nFor each concept either update its `Code:` references to the \
                 current locations, or mark it RETIRED and move the full entry \
                 to the concept graveyard.\n",
            );
        }
        DriftType::ContestedClaims => {
            out.push_str("\nThese claims have been contested past the review window:\n\n");
            for claim in &report.contested {
                out.push_str(&format!(
                    "- {} {} (last touched: {})\n",
                    claim.id,
                    claim.title,
                    claim
                        .last_touched
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                ));
            }
            out.push_str(
                "\nResolve each claim: gather the deciding evidence, settle the \
                 status to verified or retired, and record the outcome in the \
                 claim history.\n",
            );
        }
        DriftType::StaleUnverified => {
            out.push_str("\nThese claims have sat unverified past the staleness window:\n\n");
            for claim in &report.stale_unverified {
                out.push_str(&format!(
                    "- {} {} (last touched: {})\n",
                    claim.id,
                    claim.title,
                    claim
                        .last_touched
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                ));
            }
            out.push_str(
                "\nVerify or retire each claim; stale unverified claims erode \
                 trust in the epistemic registry.\n",
            );
        }
        DriftType::WorkflowRepetition => {
            out.push_str(&format!(
                "\nThe workflow registry carries {} CURRENT workflows in {}.\n\
                 \nConsolidate overlapping workflows: merge near-duplicates, \
                 mark superseded ones SUPERSEDED, and move their full entries \
                 to the graveyard where appropriate.\n",
                report.current_workflows,
                config.living_docs.workflows.display(),
            ));
        }
    }
    out
}

fn render_prompt(
    config: &Config,
    paths: &EngramPaths,
    chunk_id: u64,
    chunk_type: ChunkType,
) -> String {
    let mut out = format!(
        "Knowledge fold dispatch, chunk {chunk_id} ({chunk_type}).\n\n\
         Read the chunk input at: {}\n\n\
         Apply its instructions to the living documents:\n",
        paths.chunk_input(chunk_id).display(),
    );
    for path in [
        &config.living_docs.timeline,
        &config.living_docs.concepts,
        &config.living_docs.epistemic,
        &config.living_docs.workflows,
    ] {
        out.push_str(&format!("- {}\n", path.display()));
    }
    out.push_str(&format!(
        "\nGraveyards (append-only):\n- {}\n- {}\n",
        config.graveyard.concepts.display(),
        config.graveyard.epistemic.display(),
    ));
    out.push_str(
        "\nRules:\n\
         - Edit only the documents listed above.\n\
         - New entries use only the pre-assigned identifiers from the chunk header.\n\
         - Keep required schema fields: every concept carries `Code:`, every \
           claim and workflow carries `Status:`.\n\
         - When finished, commit with the subject `Knowledge fold: chunk ",
    );
    out.push_str(&format!("{chunk_id}`.\n"));
    out
}

fn write_durably(path: &Path, content: &str) -> Result<(), EngineError> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

/// Refresh the human-readable manifest copy from state.
fn write_manifest_view(store: &StateStore, paths: &EngramPaths) -> Result<(), EngineError> {
    let json = serde_json::to_string_pretty(&store.state().manifest)?;
    std::fs::write(paths.manifest_view(), json)?;
    Ok(())
}

#[cfg(test)]
#[path = "chunker_tests.rs"]
mod tests;
