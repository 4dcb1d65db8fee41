// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active-chunk lock: "a chunk has been produced and not yet terminally
//! processed."
//!
//! A file rather than an in-memory mutex because the process is restartable
//! and one-shot CLI commands run between server sessions. Written only
//! after the chunk files are durably on disk; cleared only when the
//! dispatch reaches a terminal state, by explicit user command, or by the
//! commit-subject heuristic.

use crate::{EngineError, EngramPaths};
use chrono::{DateTime, Utc};
use engram_adapters::git;
use engram_core::ChunkType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Commit subject prefix the auto-clear heuristic looks for.
pub const FOLD_COMMIT_PREFIX: &str = "Knowledge fold: chunk ";

/// How many recent commit subjects the heuristic inspects.
const AUTO_CLEAR_LOOKBACK: usize = 10;

/// The lock file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveChunkLock {
    pub chunk_id: u64,
    pub chunk_type: ChunkType,
    pub input_path: PathBuf,
    pub prompt_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl ActiveChunkLock {
    /// Read the lock if present. A corrupt lock file is treated as held;
    /// refusing to schedule is the safe direction.
    pub fn load(paths: &EngramPaths) -> Result<Option<Self>, EngineError> {
        let path = paths.active_chunk();
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        match serde_json::from_str(&text) {
            Ok(lock) => Ok(Some(lock)),
            Err(e) => {
                warn!(error = %e, "active-chunk lock is corrupt; treating as held");
                Ok(Some(ActiveChunkLock {
                    chunk_id: 0,
                    chunk_type: ChunkType::Fold,
                    input_path: PathBuf::new(),
                    prompt_path: PathBuf::new(),
                    created_at: Utc::now(),
                }))
            }
        }
    }

    /// Write the lock. The chunk files must already be on disk.
    pub fn save(&self, paths: &EngramPaths) -> Result<(), EngineError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.active_chunk(), json)?;
        Ok(())
    }

    /// Remove the lock. Returns whether a lock existed.
    pub fn clear(paths: &EngramPaths) -> Result<bool, EngineError> {
        let path = paths.active_chunk();
        if path.exists() {
            std::fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Best-effort auto-clear: drop the lock when a recent commit subject says
/// its chunk was folded (`Knowledge fold: chunk <id>`).
///
/// Returns whether the lock was cleared.
pub async fn auto_clear_lock(paths: &EngramPaths) -> Result<bool, EngineError> {
    let Some(lock) = ActiveChunkLock::load(paths)? else {
        return Ok(false);
    };
    if lock.chunk_id == 0 {
        return Ok(false);
    }

    let needle = format!("{FOLD_COMMIT_PREFIX}{}", lock.chunk_id);
    let subjects = git::recent_subjects(paths.root(), AUTO_CLEAR_LOOKBACK).await;
    if subjects.iter().any(|s| s.trim() == needle) {
        info!(chunk_id = lock.chunk_id, "fold commit found; clearing active-chunk lock");
        ActiveChunkLock::clear(paths)?;
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
