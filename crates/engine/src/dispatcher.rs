// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch lifecycle controller.
//!
//! Per chunk: `building → dispatched → validated → committed`, with
//! `dispatched → retry → dispatched` on lint failure (≤ 2 retries) and
//! `dispatched → failed` when the budget is spent. The success path commits
//! in two batches, `[l0_stale, validated]` then `[committed]`, so a crash
//! between them leaves a recoverable record whose staleness flag is already
//! set.

use crate::chunker::{next_chunk, ScheduledChunk};
use crate::lock::ActiveChunkLock;
use crate::{EngineError, EngramPaths};
use chrono::{NaiveDate, Utc};
use engram_adapters::{FoldAgent, FoldRequest, LintReport, SchemaLinter};
use engram_core::{ChunkType, Config, DispatchState, Event, MAX_LINT_RETRIES};
use engram_storage::StateStore;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Size-guard retries are budgeted separately from lint retries.
const MAX_SIZE_GUARD_RETRIES: u8 = 1;

/// How one dispatch attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Committed { chunk_id: u64, chunk_type: ChunkType },
    /// Queue empty and no drift over threshold
    NothingToDo,
    /// Terminal failure; the active lock is left for human review
    Failed { chunk_id: u64, reason: String },
}

/// Outcome of one validation pass.
enum Verdict {
    Pass,
    /// Retry with a correction prompt while budget remains
    Retryable(String),
    /// Mark failed regardless of remaining retries
    Terminal(String),
}

/// Content fingerprint of the documents the agent may edit.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DocsFingerprint {
    hashes: BTreeMap<PathBuf, String>,
    total_chars: u64,
}

impl DocsFingerprint {
    fn capture(docs: &[PathBuf]) -> Self {
        let mut hashes = BTreeMap::new();
        let mut total_chars = 0u64;
        for path in docs {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            total_chars += bytes.len() as u64;
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            hashes.insert(path.clone(), format!("{:x}", hasher.finalize()));
        }
        Self {
            hashes,
            total_chars,
        }
    }
}

/// Drives chunks through the dispatch state machine.
pub struct Dispatcher<'a> {
    store: &'a mut StateStore,
    config: &'a Config,
    paths: &'a EngramPaths,
    agent: &'a dyn FoldAgent,
    linter: &'a dyn SchemaLinter,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        store: &'a mut StateStore,
        config: &'a Config,
        paths: &'a EngramPaths,
        agent: &'a dyn FoldAgent,
        linter: &'a dyn SchemaLinter,
    ) -> Self {
        Self {
            store,
            config,
            paths,
            agent,
            linter,
        }
    }

    /// Produce and dispatch the next chunk.
    ///
    /// A lock pointing at a chunk still in `building` is resumed (the chunk
    /// was produced by `next-chunk` or an interrupted dispatch) rather than
    /// refused.
    pub async fn dispatch(
        &mut self,
        fold_from: Option<NaiveDate>,
    ) -> Result<DispatchOutcome, EngineError> {
        let scheduled = match self.resumable_chunk()? {
            Some(chunk) => chunk,
            None => match next_chunk(self.store, self.config, self.paths, fold_from).await? {
                Some(chunk) => chunk,
                None => return Ok(DispatchOutcome::NothingToDo),
            },
        };
        self.run_lifecycle(scheduled, 0, 0).await
    }

    /// A locked chunk whose record never left `building` can be dispatched
    /// as-is: its files are on disk and its identifiers are reserved.
    fn resumable_chunk(&self) -> Result<Option<ScheduledChunk>, EngineError> {
        let Some(lock) = ActiveChunkLock::load(self.paths)? else {
            return Ok(None);
        };
        let record = self.store.state().dispatches.get(&lock.chunk_id);
        match record {
            Some(record) if record.state == DispatchState::Building => {
                info!(chunk_id = lock.chunk_id, "resuming previously built chunk");
                Ok(Some(ScheduledChunk {
                    chunk_id: record.chunk_id,
                    chunk_type: record.chunk_type,
                    input_path: record.input_path.clone(),
                    prompt_path: record.prompt_path.clone(),
                    content_chars: std::fs::metadata(&record.input_path)
                        .map(|m| m.len())
                        .unwrap_or(0),
                }))
            }
            _ => Err(EngineError::LockHeld {
                chunk_id: lock.chunk_id,
            }),
        }
    }

    /// The invoke → lint → retry loop, from `dispatched` onward.
    async fn run_lifecycle(
        &mut self,
        chunk: ScheduledChunk,
        mut retries: u8,
        mut size_guard_retries: u8,
    ) -> Result<DispatchOutcome, EngineError> {
        let docs = self.config.all_doc_paths(self.paths.root());

        loop {
            self.set_state(chunk.chunk_id, DispatchState::Dispatched, retries)?;

            let before = DocsFingerprint::capture(&docs);
            let outcome = self
                .agent
                .invoke(&FoldRequest {
                    input_path: chunk.input_path.clone(),
                    prompt_path: chunk.prompt_path.clone(),
                    project_root: self.paths.root().to_path_buf(),
                    model: self.config.agent.model.clone(),
                })
                .await?;
            let after = DocsFingerprint::capture(&docs);

            // Non-zero exit and zero-edit runs are validation failures:
            // same retry budget, same correction loop
            let verdict = if !outcome.succeeded() {
                Verdict::Retryable(format!("fold agent exited {}", outcome.exit_code))
            } else if after == before {
                Verdict::Retryable("fold agent produced no edits".to_string())
            } else {
                self.validate(&chunk, &docs, &after, &before, &mut size_guard_retries)?
            };

            let reason = match verdict {
                Verdict::Pass => return self.finalize_success(&chunk).await,
                Verdict::Retryable(reason) => reason,
                Verdict::Terminal(reason) => {
                    warn!(chunk_id = chunk.chunk_id, %reason, "dispatch failed terminally");
                    self.set_state(chunk.chunk_id, DispatchState::Failed, retries)?;
                    return Ok(DispatchOutcome::Failed {
                        chunk_id: chunk.chunk_id,
                        reason,
                    });
                }
            };

            if retries < MAX_LINT_RETRIES {
                retries += 1;
                warn!(chunk_id = chunk.chunk_id, retries, %reason, "dispatch attempt failed; retrying");
                self.append_correction(&chunk, &reason)?;
                self.set_state(chunk.chunk_id, DispatchState::Retry, retries)?;
                continue;
            }

            warn!(chunk_id = chunk.chunk_id, %reason, "dispatch failed; leaving lock for review");
            self.set_state(chunk.chunk_id, DispatchState::Failed, retries)?;
            return Ok(DispatchOutcome::Failed {
                chunk_id: chunk.chunk_id,
                reason,
            });
        }
    }

    /// Lint plus the 2× size guard.
    fn validate(
        &mut self,
        chunk: &ScheduledChunk,
        docs: &[PathBuf],
        after: &DocsFingerprint,
        before: &DocsFingerprint,
        size_guard_retries: &mut u8,
    ) -> Result<Verdict, EngineError> {
        let mut lint_targets = docs.to_vec();
        lint_targets.push(chunk.input_path.clone());
        let report = self.linter.lint(&lint_targets)?;
        if !report.passed() {
            return Ok(Verdict::Retryable(summarize(&report)));
        }

        let grew = after.total_chars.saturating_sub(before.total_chars);
        let allowed = chunk.content_chars.saturating_mul(2).max(1);
        if grew > allowed {
            let reason =
                format!("size guard: docs grew {grew} chars, expected at most {allowed}");
            if *size_guard_retries < MAX_SIZE_GUARD_RETRIES {
                *size_guard_retries += 1;
                return Ok(Verdict::Retryable(reason));
            }
            return Ok(Verdict::Terminal(reason));
        }

        Ok(Verdict::Pass)
    }

    /// `validated → committed`, staleness first, then release the lock.
    async fn finalize_success(
        &mut self,
        chunk: &ScheduledChunk,
    ) -> Result<DispatchOutcome, EngineError> {
        let now = Utc::now();
        // l0_stale must be durable before the committed transition; a crash
        // here recovers as a validated record with staleness set
        self.store.commit(vec![
            Event::L0StaleSet,
            Event::DispatchStateChanged {
                chunk_id: chunk.chunk_id,
                state: DispatchState::Validated,
                retries: self.current_retries(chunk.chunk_id),
                at: now,
            },
        ])?;
        let mut committed_batch = vec![
            Event::DispatchStateChanged {
                chunk_id: chunk.chunk_id,
                state: DispatchState::Committed,
                retries: self.current_retries(chunk.chunk_id),
                at: Utc::now(),
            },
            Event::LastDispatchAt { at: Utc::now() },
        ];
        // The manifest records every historical chunk; workflow-synthesis
        // entries were already appended at generation with their cooldown
        // hash
        let already_recorded = self
            .store
            .state()
            .manifest
            .iter()
            .any(|e| e.chunk_id == chunk.chunk_id);
        if !already_recorded {
            committed_batch.push(Event::ManifestAppended {
                entry: engram_core::ManifestEntry {
                    chunk_id: chunk.chunk_id,
                    chunk_type: chunk.chunk_type,
                    created_at: Utc::now(),
                    workflow_registry_hash: None,
                },
            });
        }
        self.store.commit(committed_batch)?;

        ActiveChunkLock::clear(self.paths)?;
        self.store.checkpoint()?;

        info!(chunk_id = chunk.chunk_id, chunk_type = %chunk.chunk_type, "dispatch committed");
        Ok(DispatchOutcome::Committed {
            chunk_id: chunk.chunk_id,
            chunk_type: chunk.chunk_type,
        })
    }

    /// Crash recovery for non-terminal records, run once at startup.
    ///
    /// - `building` without a lock: discard (no chunk was produced).
    /// - `building` with its lock: left alone, `dispatch` resumes it.
    /// - `dispatched`/`retry`: re-lint; pass finishes the commit protocol,
    ///   fail re-enters the retry loop while budget remains.
    /// - `validated`: staleness is re-asserted (idempotent) and the record
    ///   committed.
    pub async fn recover(&mut self) -> Result<Vec<String>, EngineError> {
        let lock = ActiveChunkLock::load(self.paths)?;
        let pending: Vec<_> = self
            .store
            .state()
            .non_terminal_dispatches()
            .into_iter()
            .cloned()
            .collect();

        let mut actions = Vec::new();
        for record in pending {
            let chunk = ScheduledChunk {
                chunk_id: record.chunk_id,
                chunk_type: record.chunk_type,
                input_path: record.input_path.clone(),
                prompt_path: record.prompt_path.clone(),
                content_chars: std::fs::metadata(&record.input_path)
                    .map(|m| m.len())
                    .unwrap_or(0),
            };
            let locked_here = lock
                .as_ref()
                .is_some_and(|l| l.chunk_id == record.chunk_id);

            match record.state {
                DispatchState::Building if !locked_here => {
                    self.set_state(record.chunk_id, DispatchState::Failed, record.retries)?;
                    actions.push(format!(
                        "discarded interrupted chunk {} (never produced)",
                        record.chunk_id
                    ));
                }
                DispatchState::Building => {
                    actions.push(format!(
                        "chunk {} is built and locked; it will dispatch next",
                        record.chunk_id
                    ));
                }
                DispatchState::Dispatched | DispatchState::Retry => {
                    let docs = self.config.all_doc_paths(self.paths.root());
                    let mut lint_targets = docs.clone();
                    lint_targets.push(chunk.input_path.clone());
                    let report = self.linter.lint(&lint_targets)?;
                    if report.passed() {
                        self.finalize_success(&chunk).await?;
                        actions.push(format!(
                            "chunk {} passed post-crash lint; committed",
                            record.chunk_id
                        ));
                    } else if record.retries < MAX_LINT_RETRIES {
                        let reason = summarize(&report);
                        self.append_correction(&chunk, &reason)?;
                        self.set_state(record.chunk_id, DispatchState::Retry, record.retries + 1)?;
                        let outcome = self
                            .run_lifecycle(chunk, record.retries + 1, 0)
                            .await?;
                        actions.push(format!(
                            "chunk {} re-dispatched after crash: {outcome:?}",
                            record.chunk_id
                        ));
                    } else {
                        self.set_state(record.chunk_id, DispatchState::Failed, record.retries)?;
                        actions.push(format!(
                            "chunk {} failed post-crash lint with no retries left",
                            record.chunk_id
                        ));
                    }
                }
                DispatchState::Validated => {
                    self.finalize_success(&chunk).await?;
                    actions.push(format!(
                        "chunk {} recovered from validated to committed",
                        record.chunk_id
                    ));
                }
                DispatchState::Committed | DispatchState::Failed => {}
            }
        }
        Ok(actions)
    }

    fn current_retries(&self, chunk_id: u64) -> u8 {
        self.store
            .state()
            .dispatches
            .get(&chunk_id)
            .map(|r| r.retries)
            .unwrap_or(0)
    }

    fn set_state(
        &mut self,
        chunk_id: u64,
        state: DispatchState,
        retries: u8,
    ) -> Result<(), EngineError> {
        self.store.commit(vec![Event::DispatchStateChanged {
            chunk_id,
            state,
            retries,
            at: Utc::now(),
        }])?;
        Ok(())
    }

    /// Append the violation list to the prompt so the next attempt can fix
    /// exactly what failed.
    fn append_correction(
        &self,
        chunk: &ScheduledChunk,
        reason: &str,
    ) -> Result<(), EngineError> {
        let mut prompt = std::fs::read_to_string(&chunk.prompt_path).unwrap_or_default();
        prompt.push_str(&format!(
            "\nCORRECTION: the previous attempt failed validation.\n{reason}\n\
             Fix these violations and re-apply the chunk.\n"
        ));
        std::fs::write(&chunk.prompt_path, prompt)?;
        Ok(())
    }
}

fn summarize(report: &LintReport) -> String {
    let mut lines: Vec<String> = report
        .violations
        .iter()
        .take(10)
        .map(|v| v.to_string())
        .collect();
    if report.violations.len() > 10 {
        lines.push(format!("... and {} more", report.violations.len() - 10));
    }
    format!(
        "{} schema violation(s):\n{}",
        report.violations.len(),
        lines.join("\n")
    )
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
