// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events that mutate persisted state.
//!
//! Every durable change is an event appended to the WAL; the materialized
//! state is derived by replay. Serializes with `{"type": "noun:verb", ...}`.

use crate::artifact::BufferItem;
use crate::dispatch::{ChunkType, DispatchState, ManifestEntry};
use crate::id::Category;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- identifier counters --
    /// Raise a counter so `next_id > max(existing ids)` after external edits
    #[serde(rename = "counter:floor")]
    CounterFloorBumped { category: Category, min_next: u64 },

    /// A reservation of `[start, start + len)` for one category
    #[serde(rename = "counter:reserved")]
    IdsReserved {
        category: Category,
        start: u64,
        len: u64,
    },

    // -- buffer --
    #[serde(rename = "buffer:appended")]
    BufferAppended { item: BufferItem },

    /// Consume buffer items dated on or before `upto` (all items when None),
    /// attributed to the dispatch that recorded its `building` transition
    #[serde(rename = "buffer:consumed")]
    BufferConsumed {
        chunk_id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upto: Option<NaiveDate>,
    },

    // -- dispatch lifecycle --
    #[serde(rename = "dispatch:began")]
    DispatchBegan {
        chunk_id: u64,
        chunk_type: ChunkType,
        input_path: PathBuf,
        prompt_path: PathBuf,
        at: DateTime<Utc>,
    },

    #[serde(rename = "dispatch:state")]
    DispatchStateChanged {
        chunk_id: u64,
        state: DispatchState,
        retries: u8,
        at: DateTime<Utc>,
    },

    #[serde(rename = "manifest:appended")]
    ManifestAppended { entry: ManifestEntry },

    // -- server singleton --
    #[serde(rename = "server:fold_from_set")]
    FoldFromSet { date: NaiveDate },

    #[serde(rename = "server:fold_from_cleared")]
    FoldFromCleared,

    #[serde(rename = "server:l0_stale")]
    L0StaleSet,

    #[serde(rename = "server:l0_regenerated")]
    L0Regenerated { at: DateTime<Utc> },

    #[serde(rename = "server:poll_cursor")]
    PollCursorAdvanced { commit: String },

    #[serde(rename = "server:dispatched_at")]
    LastDispatchAt { at: DateTime<Utc> },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
