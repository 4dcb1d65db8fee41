// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use engram_core::test_support::{day, doc_item};
use engram_core::{BufferItem, ItemKind};

mod buffer;
mod counters;
mod dispatches;
mod singleton;

pub(super) fn began_event(chunk_id: u64, chunk_type: ChunkType) -> Event {
    Event::DispatchBegan {
        chunk_id,
        chunk_type,
        input_path: format!(".engram/chunks/chunk_{chunk_id:03}_input.md").into(),
        prompt_path: format!(".engram/chunks/chunk_{chunk_id:03}_prompt.txt").into(),
        at: Utc::now(),
    }
}

pub(super) fn state_event(chunk_id: u64, state: DispatchState, retries: u8) -> Event {
    Event::DispatchStateChanged {
        chunk_id,
        state,
        retries,
        at: Utc::now(),
    }
}

pub(super) fn manifest_event(chunk_id: u64, chunk_type: ChunkType, hash: Option<&str>) -> Event {
    Event::ManifestAppended {
        entry: ManifestEntry {
            chunk_id,
            chunk_type,
            created_at: Utc::now(),
            workflow_registry_hash: hash.map(str::to_string),
        },
    }
}
