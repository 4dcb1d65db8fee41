// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending artifacts: buffer items and queue entries.

use crate::dispatch::ChunkType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of artifact an adapter produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Document,
    Issue,
    Session,
    DriftMarker,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Document => write!(f, "document"),
            ItemKind::Issue => write!(f, "issue"),
            ItemKind::Session => write!(f, "session"),
            ItemKind::DriftMarker => write!(f, "drift-marker"),
        }
    }
}

/// A living-docs drift condition, in fixed triage priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftType {
    /// ACTIVE concepts whose every code path reference is missing
    OrphanedConcepts,
    /// Claims contested for longer than the review window
    ContestedClaims,
    /// Unverified claims older than the staleness window
    StaleUnverified,
    /// Too many CURRENT workflows in the registry
    WorkflowRepetition,
}

impl DriftType {
    /// Evaluation order for chunk-type selection.
    pub const PRIORITY: [DriftType; 4] = [
        DriftType::OrphanedConcepts,
        DriftType::ContestedClaims,
        DriftType::StaleUnverified,
        DriftType::WorkflowRepetition,
    ];

    /// The triage chunk type issued for this drift condition.
    pub fn chunk_type(&self) -> ChunkType {
        match self {
            DriftType::OrphanedConcepts => ChunkType::ConceptTriage,
            DriftType::ContestedClaims => ChunkType::ContestedReview,
            DriftType::StaleUnverified => ChunkType::StaleUnverified,
            DriftType::WorkflowRepetition => ChunkType::WorkflowSynthesis,
        }
    }
}

impl fmt::Display for DriftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftType::OrphanedConcepts => write!(f, "orphaned-concepts"),
            DriftType::ContestedClaims => write!(f, "contested-claims"),
            DriftType::StaleUnverified => write!(f, "stale-unverified"),
            DriftType::WorkflowRepetition => write!(f, "workflow-repetition"),
        }
    }
}

/// Whether a document queue entry is the first sighting or a revisit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocPhase {
    Initial,
    Revisit,
}

impl fmt::Display for DocPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocPhase::Initial => write!(f, "INITIAL"),
            DocPhase::Revisit => write!(f, "REVISIT"),
        }
    }
}

/// One pending artifact in the dispatch-trigger buffer.
///
/// Buffer items accumulate from watcher polls and are consumed wholesale
/// when a dispatch records its `building` transition. They trigger
/// dispatches; the queue feeds content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferItem {
    pub path: PathBuf,
    pub kind: ItemKind,
    pub chars: u64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftType>,
}

/// One entry of the persisted chronological queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub date: NaiveDate,
    pub kind: ItemKind,
    pub path: PathBuf,
    pub chars: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<DocPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl QueueEntry {
    /// Stable sort key: chronological, path-ordered within a day.
    pub fn sort_key(&self) -> (NaiveDate, &PathBuf) {
        (self.date, &self.path)
    }
}
