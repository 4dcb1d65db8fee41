// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch records: the per-chunk state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Maximum lint-failure retries per dispatch.
pub const MAX_LINT_RETRIES: u8 = 2;

/// What a chunk asks the fold agent to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// Chronological fold of queued artifacts
    Fold,
    /// Orphaned-concept triage
    ConceptTriage,
    /// Long-contested claim review
    ContestedReview,
    /// Stale unverified claim sweep
    StaleUnverified,
    /// Workflow registry consolidation
    WorkflowSynthesis,
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkType::Fold => write!(f, "fold"),
            ChunkType::ConceptTriage => write!(f, "concept_triage"),
            ChunkType::ContestedReview => write!(f, "contested_review"),
            ChunkType::StaleUnverified => write!(f, "stale_unverified"),
            ChunkType::WorkflowSynthesis => write!(f, "workflow_synthesis"),
        }
    }
}

/// Dispatch lifecycle state.
///
/// `building → dispatched → validated → committed` on the happy path;
/// `dispatched → retry → dispatched` on lint failure (bounded by
/// [`MAX_LINT_RETRIES`]), `dispatched → failed` when the budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Building,
    Dispatched,
    Validated,
    Committed,
    Retry,
    Failed,
}

impl DispatchState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Committed | DispatchState::Failed)
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchState::Building => write!(f, "building"),
            DispatchState::Dispatched => write!(f, "dispatched"),
            DispatchState::Validated => write!(f, "validated"),
            DispatchState::Committed => write!(f, "committed"),
            DispatchState::Retry => write!(f, "retry"),
            DispatchState::Failed => write!(f, "failed"),
        }
    }
}

/// One fold-agent invocation, keyed by its monotonic chunk id.
///
/// At most one record is in a non-terminal state at any time; chunk ids are
/// never reused, even for failed dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub chunk_id: u64,
    pub chunk_type: ChunkType,
    pub input_path: PathBuf,
    pub prompt_path: PathBuf,
    pub state: DispatchState,
    pub retries: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only manifest entry recording a historical chunk.
///
/// `workflow_registry_hash` is the cooldown key for `workflow_synthesis`
/// chunks: the SHA-256 of the workflow registry when the chunk was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub chunk_id: u64,
    pub chunk_type: ChunkType,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_registry_hash: Option<String>,
}
