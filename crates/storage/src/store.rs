// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-store facade: WAL + materialized state + snapshot.
//!
//! The store is the single durable arbiter. Every mutation goes through
//! [`StateStore::commit`], which appends a batch of events to the WAL
//! (one fsync) and then applies them to the materialized state: one call,
//! one transaction. Callers composing multi-step updates (reserve ids and
//! record `building`; mark stale and commit) build the event batch and
//! commit it once.

use crate::{EngramState, Snapshot, SnapshotError, Wal, WalError};
use chrono::Utc;
use engram_core::{Category, Event, IdRange};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// WAL file name inside the state directory.
const WAL_FILE: &str = "wal.jsonl";
/// Snapshot file name inside the state directory.
const SNAPSHOT_FILE: &str = "snapshot.json";

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Durable, transactional state for one project.
pub struct StateStore {
    state: EngramState,
    wal: Wal,
    snapshot_path: PathBuf,
    /// Sequence number of the last applied event
    seq: u64,
}

impl StateStore {
    /// Open the store inside the project's state directory (`.engram/`).
    ///
    /// Loads the snapshot if present (rotating a corrupt one aside), then
    /// replays WAL entries past the snapshot sequence.
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        let snapshot_path = state_dir.join(SNAPSHOT_FILE);
        let wal = Wal::open(&state_dir.join(WAL_FILE))?;

        let (mut state, mut seq) = match Snapshot::load(&snapshot_path)? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (EngramState::default(), 0),
        };

        let replayed = wal.entries_after(seq)?;
        for entry in &replayed {
            state.apply_event(&entry.event);
            seq = entry.seq;
        }
        if !replayed.is_empty() {
            debug!(entries = replayed.len(), seq, "replayed WAL past snapshot");
        }

        Ok(Self {
            state,
            wal,
            snapshot_path,
            seq,
        })
    }

    /// Read access to the materialized state.
    pub fn state(&self) -> &EngramState {
        &self.state
    }

    /// Durably commit a batch of events as one transaction.
    ///
    /// Events are applied to the materialized state only after the WAL
    /// fsync succeeds, in batch order.
    pub fn commit(&mut self, events: Vec<Event>) -> Result<(), StoreError> {
        if events.is_empty() {
            return Ok(());
        }
        self.seq = self.wal.commit(&events)?;
        for event in &events {
            self.state.apply_event(event);
        }
        Ok(())
    }

    /// Reserve `k` identifiers for a category.
    ///
    /// Returns `[next_id, next_id + k)` and bumps the counter atomically.
    /// A zero-size reservation returns an empty range without touching the
    /// WAL.
    pub fn reserve_ids(&mut self, category: Category, k: u64) -> Result<IdRange, StoreError> {
        let start = self.state.next_id(category);
        if k == 0 {
            return Ok(IdRange::new(start, 0));
        }
        self.commit(vec![Event::IdsReserved {
            category,
            start,
            len: k,
        }])?;
        Ok(IdRange::new(start, k))
    }

    /// Guarantee `next_id >= min_next` for a category.
    ///
    /// Used before reservations so counters can never fall behind ids
    /// already present in the living docs after an external edit.
    pub fn bump_counter_floor(&mut self, category: Category, min_next: u64) -> Result<(), StoreError> {
        if self.state.next_id(category) >= min_next {
            return Ok(());
        }
        self.commit(vec![Event::CounterFloorBumped { category, min_next }])
    }

    /// Persist a snapshot of the current state and truncate the WAL.
    pub fn checkpoint(&mut self) -> Result<(), StoreError> {
        Snapshot::new(self.seq, self.state.clone()).save(&self.snapshot_path)?;
        self.wal.truncate_before(self.seq + 1)?;
        debug!(seq = self.seq, "checkpoint complete");
        Ok(())
    }

    /// Convenience: set the fold-from marker.
    pub fn set_fold_from(&mut self, date: chrono::NaiveDate) -> Result<(), StoreError> {
        self.commit(vec![Event::FoldFromSet { date }])
    }

    /// Convenience: clear the fold-from marker.
    pub fn clear_fold_from(&mut self) -> Result<(), StoreError> {
        if self.state.server.fold_from.is_none() {
            return Ok(());
        }
        self.commit(vec![Event::FoldFromCleared])
    }

    /// Convenience: flag the L0 briefing as stale.
    pub fn set_l0_stale(&mut self) -> Result<(), StoreError> {
        self.commit(vec![Event::L0StaleSet])
    }

    /// Convenience: record a successful L0 regeneration.
    pub fn mark_l0_regenerated(&mut self) -> Result<(), StoreError> {
        self.commit(vec![Event::L0Regenerated { at: Utc::now() }])
    }

    /// Convenience: advance the git poll cursor.
    pub fn advance_poll_cursor(&mut self, commit_hash: String) -> Result<(), StoreError> {
        if self.state.server.poll_cursor.as_deref() == Some(commit_hash.as_str()) {
            return Ok(());
        }
        self.commit(vec![Event::PollCursorAdvanced {
            commit: commit_hash,
        }])
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
