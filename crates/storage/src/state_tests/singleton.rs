// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── Fold-from marker ─────────────────────────────────────────────────────────

#[test]
fn fold_from_set_and_cleared() {
    let mut state = EngramState::default();
    assert!(state.server.fold_from.is_none());

    state.apply_event(&Event::FoldFromSet {
        date: day("2026-01-01"),
    });
    assert_eq!(state.server.fold_from, Some(day("2026-01-01")));

    state.apply_event(&Event::FoldFromCleared);
    assert!(state.server.fold_from.is_none());
}

// ── L0 staleness ─────────────────────────────────────────────────────────────

#[test]
fn l0_stale_set_is_idempotent() {
    let mut state = EngramState::default();
    state.apply_event(&Event::L0StaleSet);
    state.apply_event(&Event::L0StaleSet);
    assert!(state.server.l0_stale);
}

#[test]
fn regeneration_clears_staleness() {
    let mut state = EngramState::default();
    state.apply_event(&Event::L0StaleSet);
    state.apply_event(&Event::L0Regenerated { at: Utc::now() });
    assert!(!state.server.l0_stale);
    assert!(state.server.l0_regenerated_at.is_some());
}

// ── Legacy key/value migration ───────────────────────────────────────────────

#[test]
fn legacy_kv_shape_preserves_fold_from() {
    let json = r#"{"kv": {"fold_from": "2026-01-01", "schema_version": "2"}}"#;
    let server: ServerState = serde_json::from_str(json).unwrap();
    assert_eq!(server.fold_from, Some(day("2026-01-01")));
    // Everything else rebuilds to defaults
    assert!(server.poll_cursor.is_none());
    assert!(!server.l0_stale);
}

#[test]
fn legacy_kv_without_fold_from_rebuilds_empty() {
    let json = r#"{"kv": {"schema_version": "1"}}"#;
    let server: ServerState = serde_json::from_str(json).unwrap();
    assert_eq!(server, ServerState::default());
}

#[test]
fn canonical_shape_round_trips() {
    let server = ServerState {
        poll_cursor: Some("abc123".into()),
        fold_from: Some(day("2026-02-01")),
        l0_stale: true,
        buffer_chars: 42,
        ..ServerState::default()
    };
    let json = serde_json::to_string(&server).unwrap();
    let back: ServerState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, server);
}

#[test]
fn old_canonical_snapshot_without_new_fields_loads() {
    // A snapshot written before l0_regenerated_at existed
    let json = r#"{"poll_cursor": null, "last_dispatch_at": null, "buffer_chars": 0, "fold_from": null, "l0_stale": false}"#;
    let server: ServerState = serde_json::from_str(json).unwrap();
    assert!(server.l0_regenerated_at.is_none());
}
