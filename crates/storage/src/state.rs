// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use chrono::{DateTime, NaiveDate, Utc};
use engram_core::{
    Category, ChunkType, DispatchRecord, DispatchState, Event, ManifestEntry,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The singleton server row.
///
/// Exactly one per project. Deserialization tolerates the legacy key/value
/// shape (`{"kv": {...}}`) written by an earlier migration tool: the shape
/// is dropped, the canonical struct rebuilt, and `fold_from` preserved.
/// New fields are added with `#[serde(default)]` so old snapshots keep
/// loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ServerStateRepr")]
pub struct ServerState {
    /// Last git commit seen by the server poll loop
    pub poll_cursor: Option<String>,
    pub last_dispatch_at: Option<DateTime<Utc>>,
    /// Total characters across pending buffer items
    pub buffer_chars: u64,
    /// Temporal reference for forward folds (None in steady state)
    pub fold_from: Option<NaiveDate>,
    /// Briefing needs regeneration at the next queue drain
    pub l0_stale: bool,
    pub l0_regenerated_at: Option<DateTime<Utc>>,
}

/// Accepted singleton shapes. The legacy variant must be tried first:
/// canonical deserialization ignores no fields, but an all-default canonical
/// row would otherwise swallow `{"kv": ...}` and lose `fold_from`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ServerStateRepr {
    Legacy {
        kv: HashMap<String, serde_json::Value>,
    },
    Canonical {
        #[serde(default)]
        poll_cursor: Option<String>,
        #[serde(default)]
        last_dispatch_at: Option<DateTime<Utc>>,
        #[serde(default)]
        buffer_chars: u64,
        #[serde(default)]
        fold_from: Option<NaiveDate>,
        #[serde(default)]
        l0_stale: bool,
        #[serde(default)]
        l0_regenerated_at: Option<DateTime<Utc>>,
    },
}

impl From<ServerStateRepr> for ServerState {
    fn from(repr: ServerStateRepr) -> Self {
        match repr {
            // Announced at snapshot load; only fold_from survives the rebuild
            ServerStateRepr::Legacy { kv } => {
                let fold_from = kv
                    .get("fold_from")
                    .and_then(|v| v.as_str())
                    .and_then(|s| engram_core::parse_logical_date(s).ok());
                ServerState {
                    fold_from,
                    ..ServerState::default()
                }
            }
            ServerStateRepr::Canonical {
                poll_cursor,
                last_dispatch_at,
                buffer_chars,
                fold_from,
                l0_stale,
                l0_regenerated_at,
            } => ServerState {
                poll_cursor,
                last_dispatch_at,
                buffer_chars,
                fold_from,
                l0_stale,
                l0_regenerated_at,
            },
        }
    }
}

/// Materialized state built from WAL events.
///
/// # Idempotency requirement
///
/// **All event handlers MUST be idempotent.** Snapshot + replay can apply an
/// event that the snapshot already reflects. Guidelines:
/// - Use `max()` assignment for counters, never increments
/// - Guard inserts with existence checks
/// - Recompute derived totals (`buffer_chars`) from the collection
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EngramState {
    /// `next_id` per category; absent means 1
    #[serde(default)]
    pub counters: BTreeMap<Category, u64>,
    #[serde(default)]
    pub buffer: Vec<engram_core::BufferItem>,
    /// Every dispatch ever begun, keyed by chunk id
    #[serde(default)]
    pub dispatches: BTreeMap<u64, DispatchRecord>,
    /// Append-only chunk history
    #[serde(default)]
    pub manifest: Vec<ManifestEntry>,
    #[serde(default)]
    pub server: ServerState,
}

impl EngramState {
    /// The next id a reservation for this category would return.
    pub fn next_id(&self, category: Category) -> u64 {
        self.counters.get(&category).copied().unwrap_or(1)
    }

    /// The next chunk id. Never reused: failed and committed chunks both
    /// occupy their id forever.
    pub fn next_chunk_id(&self) -> u64 {
        let from_dispatches = self.dispatches.keys().max().copied().unwrap_or(0);
        let from_manifest = self.manifest.iter().map(|e| e.chunk_id).max().unwrap_or(0);
        from_dispatches.max(from_manifest) + 1
    }

    /// Dispatch records not yet in a terminal state.
    pub fn non_terminal_dispatches(&self) -> Vec<&DispatchRecord> {
        self.dispatches
            .values()
            .filter(|d| !d.state.is_terminal())
            .collect()
    }

    /// Most recent manifest entry of the given chunk type.
    pub fn last_manifest_of(&self, chunk_type: ChunkType) -> Option<&ManifestEntry> {
        self.manifest
            .iter()
            .filter(|e| e.chunk_type == chunk_type)
            .max_by_key(|e| e.chunk_id)
    }

    fn recompute_buffer_chars(&mut self) {
        self.server.buffer_chars = self.buffer.iter().map(|i| i.chars).sum();
    }

    /// Apply an event to derive state changes.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::CounterFloorBumped { category, min_next } => {
                let entry = self.counters.entry(*category).or_insert(1);
                *entry = (*entry).max(*min_next);
            }

            Event::IdsReserved {
                category,
                start,
                len,
            } => {
                // max() keeps replay idempotent and tolerates interleaved floors
                let entry = self.counters.entry(*category).or_insert(1);
                *entry = (*entry).max(start + len);
            }

            Event::BufferAppended { item } => {
                let exists = self
                    .buffer
                    .iter()
                    .any(|i| i.path == item.path && i.date == item.date && i.kind == item.kind);
                if !exists {
                    self.buffer.push(item.clone());
                }
                self.recompute_buffer_chars();
            }

            Event::BufferConsumed { upto, .. } => {
                match upto {
                    Some(date) => self.buffer.retain(|i| i.date > *date),
                    None => self.buffer.clear(),
                }
                self.recompute_buffer_chars();
            }

            Event::DispatchBegan {
                chunk_id,
                chunk_type,
                input_path,
                prompt_path,
                at,
            } => {
                self.dispatches.entry(*chunk_id).or_insert(DispatchRecord {
                    chunk_id: *chunk_id,
                    chunk_type: *chunk_type,
                    input_path: input_path.clone(),
                    prompt_path: prompt_path.clone(),
                    state: DispatchState::Building,
                    retries: 0,
                    created_at: *at,
                    updated_at: *at,
                });
            }

            Event::DispatchStateChanged {
                chunk_id,
                state,
                retries,
                at,
            } => {
                if let Some(record) = self.dispatches.get_mut(chunk_id) {
                    record.state = *state;
                    record.retries = *retries;
                    record.updated_at = *at;
                }
            }

            Event::ManifestAppended { entry } => {
                if !self.manifest.iter().any(|e| e.chunk_id == entry.chunk_id) {
                    self.manifest.push(entry.clone());
                }
            }

            Event::FoldFromSet { date } => {
                self.server.fold_from = Some(*date);
            }

            Event::FoldFromCleared => {
                self.server.fold_from = None;
            }

            Event::L0StaleSet => {
                self.server.l0_stale = true;
            }

            Event::L0Regenerated { at } => {
                self.server.l0_stale = false;
                self.server.l0_regenerated_at = Some(*at);
            }

            Event::PollCursorAdvanced { commit } => {
                self.server.poll_cursor = Some(commit.clone());
            }

            Event::LastDispatchAt { at } => {
                self.server.last_dispatch_at = Some(*at);
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests/mod.rs"]
mod tests;
