// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstrap controller: seed and forward-fold.
//!
//! Seed creates the initial living and graveyard docs from the repo as it
//! stands; seed-from-date does the same inside an ephemeral worktree at a
//! historical commit, then replays history forward with the fold-from
//! marker threaded through drift scanning. The marker is cleared on both
//! the empty-queue early return and normal completion: it must never leak
//! into steady state.

use crate::dispatcher::{Dispatcher, DispatchOutcome};
use crate::queue::{build_queue, harvest, load_queue};
use crate::{EngineError, EngramPaths};
use chrono::NaiveDate;
use engram_adapters::{git, FoldAgent, FoldRequest, SchemaLinter};
use engram_core::Config;
use engram_storage::StateStore;
use rand::Rng;
use std::path::Path;
use tracing::{info, warn};

/// Forward-fold result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldStats {
    pub chunks: usize,
}

/// Seed the living docs, optionally from a historical repository state.
///
/// With `from_date`, the nearest commit on or before that date is checked
/// out into an ephemeral worktree, the seed agent runs there, the produced
/// docs are copied back, and `fold_from` is set so a forward fold can
/// replay the remaining history. Both paths leave `l0_stale` set.
pub async fn seed(
    store: &mut StateStore,
    config: &Config,
    paths: &EngramPaths,
    agent: &dyn FoldAgent,
    from_date: Option<NaiveDate>,
) -> Result<(), EngineError> {
    paths.ensure_layout()?;

    match from_date {
        None => {
            run_seed_agent(config, paths, agent, paths.root()).await?;
        }
        Some(date) => {
            let commit = git::resolve_commit_before(paths.root(), date)
                .await?
                .ok_or(EngineError::GitResolution { date })?;

            let suffix: u32 = rand::rng().random();
            let worktree = paths.worktrees_dir().join(format!("seed-{suffix:08x}"));
            std::fs::create_dir_all(paths.worktrees_dir())?;

            git::worktree_add(paths.root(), &worktree, &commit).await?;
            let seeded = run_seed_agent(config, paths, agent, &worktree).await;
            if seeded.is_ok() {
                copy_docs_back(config, &worktree, paths.root())?;
            }
            if let Err(e) = git::worktree_remove(paths.root(), &worktree).await {
                warn!(error = %e, "could not prune seed worktree");
            }
            seeded?;

            store.set_fold_from(date)?;
            info!(%date, %commit, "seeded from historical state");
        }
    }

    store.set_l0_stale()?;
    Ok(())
}

async fn run_seed_agent(
    config: &Config,
    paths: &EngramPaths,
    agent: &dyn FoldAgent,
    workdir: &Path,
) -> Result<(), EngineError> {
    let prompt = seed_prompt(config);
    std::fs::write(paths.seed_prompt(), &prompt)?;

    let outcome = agent
        .invoke(&FoldRequest {
            input_path: paths.seed_prompt(),
            prompt_path: paths.seed_prompt(),
            project_root: workdir.to_path_buf(),
            model: config.agent.model.clone(),
        })
        .await?;
    if !outcome.succeeded() {
        return Err(EngineError::AgentInvocation(format!(
            "seed agent exited {}",
            outcome.exit_code
        )));
    }
    Ok(())
}

fn seed_prompt(config: &Config) -> String {
    let mut out = String::from(
        "Seed the project knowledge base from the repository as it stands.\n\n\
         Create these living documents with their required schema:\n",
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
        "\nAnd these append-only graveyards:\n- {}\n- {}\n\n\
         Every document starts with a `# ` title. Concepts carry `Code:` \
         references; claims and workflows carry `Status:` fields.\n",
        config.graveyard.concepts.display(),
        config.graveyard.epistemic.display(),
    ));
    out
}

/// Copy seeded docs out of the worktree into the real project.
fn copy_docs_back(config: &Config, worktree: &Path, root: &Path) -> Result<(), EngineError> {
    let mut relative = vec![
        config.living_docs.timeline.clone(),
        config.living_docs.concepts.clone(),
        config.living_docs.epistemic.clone(),
        config.living_docs.workflows.clone(),
    ];
    relative.push(config.graveyard.concepts.clone());
    relative.push(config.graveyard.epistemic.clone());

    for rel in relative {
        let src = worktree.join(&rel);
        if !src.exists() {
            warn!(path = %rel.display(), "seed agent did not produce this document");
            continue;
        }
        let dest = root.join(&rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&src, &dest)?;
    }
    Ok(())
}

/// Replay history from the fold-from marker until the queue drains.
///
/// The marker is cleared on success (including the empty-queue early
/// return) and preserved when any chunk fails, so a re-run resumes the
/// same temporal reference.
pub async fn forward_fold(
    store: &mut StateStore,
    config: &Config,
    paths: &EngramPaths,
    agent: &dyn FoldAgent,
    linter: &dyn SchemaLinter,
    from: NaiveDate,
) -> Result<FoldStats, EngineError> {
    if store.state().server.fold_from != Some(from) {
        store.set_fold_from(from)?;
    }

    let harvested = harvest(config, paths.root()).await?;
    build_queue(paths, harvested, Some(&from.to_string()))?;

    if load_queue(paths)?.is_empty() {
        info!(%from, "queue empty at fold-from date; nothing to replay");
        store.clear_fold_from()?;
        return Ok(FoldStats { chunks: 0 });
    }

    let mut chunks = 0usize;
    loop {
        let mut dispatcher = Dispatcher::new(store, config, paths, agent, linter);
        match dispatcher.dispatch(Some(from)).await? {
            DispatchOutcome::Committed { chunk_id, .. } => {
                chunks += 1;
                info!(chunk_id, chunks, "forward-fold chunk committed");
            }
            DispatchOutcome::NothingToDo => break,
            DispatchOutcome::Failed { chunk_id, reason } => {
                // Marker preserved: the re-run resumes temporal mode
                return Err(EngineError::DispatchFailed { chunk_id, reason });
            }
        }
    }

    store.clear_fold_from()?;
    info!(chunks, "forward fold complete");
    Ok(FoldStats { chunks })
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
