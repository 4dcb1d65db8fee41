// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[test]
fn began_creates_building_record() {
    let mut state = EngramState::default();
    state.apply_event(&began_event(1, ChunkType::Fold));

    let record = &state.dispatches[&1];
    assert_eq!(record.state, DispatchState::Building);
    assert_eq!(record.retries, 0);
    assert_eq!(state.non_terminal_dispatches().len(), 1);
}

#[test]
fn state_changes_advance_the_record() {
    let mut state = EngramState::default();
    state.apply_event(&began_event(1, ChunkType::Fold));
    state.apply_event(&state_event(1, DispatchState::Dispatched, 0));
    state.apply_event(&state_event(1, DispatchState::Validated, 0));
    state.apply_event(&state_event(1, DispatchState::Committed, 0));

    assert_eq!(state.dispatches[&1].state, DispatchState::Committed);
    assert!(state.non_terminal_dispatches().is_empty());
}

#[test]
fn retry_count_is_recorded() {
    let mut state = EngramState::default();
    state.apply_event(&began_event(1, ChunkType::Fold));
    state.apply_event(&state_event(1, DispatchState::Retry, 1));
    state.apply_event(&state_event(1, DispatchState::Dispatched, 1));

    assert_eq!(state.dispatches[&1].retries, 1);
}

#[test]
fn began_replay_does_not_reset_state() {
    let mut state = EngramState::default();
    let began = began_event(1, ChunkType::Fold);
    state.apply_event(&began);
    state.apply_event(&state_event(1, DispatchState::Dispatched, 0));
    state.apply_event(&began);

    assert_eq!(state.dispatches[&1].state, DispatchState::Dispatched);
}

#[yare::parameterized(
    building = { DispatchState::Building, false },
    dispatched = { DispatchState::Dispatched, false },
    validated = { DispatchState::Validated, false },
    retry = { DispatchState::Retry, false },
    committed = { DispatchState::Committed, true },
    failed = { DispatchState::Failed, true },
)]
fn terminal_states_admit_no_transitions(state: DispatchState, terminal: bool) {
    assert_eq!(state.is_terminal(), terminal);
}

// ── Chunk id allocation ──────────────────────────────────────────────────────

#[test]
fn chunk_ids_never_reuse_failed_ids() {
    let mut state = EngramState::default();
    assert_eq!(state.next_chunk_id(), 1);

    state.apply_event(&began_event(1, ChunkType::Fold));
    state.apply_event(&state_event(1, DispatchState::Failed, 2));

    assert_eq!(state.next_chunk_id(), 2);
}

#[test]
fn chunk_ids_respect_manifest_history() {
    // Manifest can outlive dispatch records after pruning
    let mut state = EngramState::default();
    state.apply_event(&manifest_event(7, ChunkType::WorkflowSynthesis, Some("abc")));
    assert_eq!(state.next_chunk_id(), 8);
}

// ── Manifest ─────────────────────────────────────────────────────────────────

#[test]
fn manifest_append_dedups_by_chunk_id() {
    let mut state = EngramState::default();
    let event = manifest_event(3, ChunkType::WorkflowSynthesis, Some("hash-a"));
    state.apply_event(&event);
    state.apply_event(&event);
    assert_eq!(state.manifest.len(), 1);
}

#[test]
fn last_manifest_of_returns_latest_of_type() {
    let mut state = EngramState::default();
    state.apply_event(&manifest_event(2, ChunkType::WorkflowSynthesis, Some("old")));
    state.apply_event(&manifest_event(5, ChunkType::Fold, None));
    state.apply_event(&manifest_event(9, ChunkType::WorkflowSynthesis, Some("new")));

    let latest = state.last_manifest_of(ChunkType::WorkflowSynthesis).unwrap();
    assert_eq!(latest.chunk_id, 9);
    assert_eq!(latest.workflow_registry_hash.as_deref(), Some("new"));
    assert!(state.last_manifest_of(ChunkType::ConceptTriage).is_none());
}
