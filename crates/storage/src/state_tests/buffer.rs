// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── Append ───────────────────────────────────────────────────────────────────

#[test]
fn append_tracks_total_chars() {
    let mut state = EngramState::default();
    state.apply_event(&Event::BufferAppended {
        item: doc_item("docs/a.md", "2026-01-01"),
    });
    state.apply_event(&Event::BufferAppended {
        item: doc_item("docs/b.md", "2026-01-02"),
    });

    assert_eq!(state.buffer.len(), 2);
    assert_eq!(state.server.buffer_chars, 2_000);
}

#[test]
fn duplicate_append_is_idempotent() {
    let mut state = EngramState::default();
    let event = Event::BufferAppended {
        item: doc_item("docs/a.md", "2026-01-01"),
    };
    state.apply_event(&event);
    state.apply_event(&event);

    assert_eq!(state.buffer.len(), 1);
    assert_eq!(state.server.buffer_chars, 1_000);
}

#[test]
fn same_path_on_new_date_is_a_new_item() {
    let mut state = EngramState::default();
    state.apply_event(&Event::BufferAppended {
        item: doc_item("docs/a.md", "2026-01-01"),
    });
    state.apply_event(&Event::BufferAppended {
        item: doc_item("docs/a.md", "2026-01-05"),
    });
    assert_eq!(state.buffer.len(), 2);
}

// ── Consume ──────────────────────────────────────────────────────────────────

#[test]
fn consume_all_clears_buffer_and_total() {
    let mut state = EngramState::default();
    state.apply_event(&Event::BufferAppended {
        item: doc_item("docs/a.md", "2026-01-01"),
    });
    state.apply_event(&Event::BufferConsumed {
        chunk_id: 1,
        upto: None,
    });

    assert!(state.buffer.is_empty());
    assert_eq!(state.server.buffer_chars, 0);
}

#[test]
fn consume_before_date_keeps_newer_items() {
    let mut state = EngramState::default();
    for (path, date) in [
        ("docs/a.md", "2026-01-01"),
        ("docs/b.md", "2026-01-15"),
        ("docs/c.md", "2026-02-01"),
    ] {
        state.apply_event(&Event::BufferAppended {
            item: doc_item(path, date),
        });
    }

    state.apply_event(&Event::BufferConsumed {
        chunk_id: 1,
        upto: Some(day("2026-01-15")),
    });

    assert_eq!(state.buffer.len(), 1);
    assert_eq!(state.buffer[0].path, std::path::PathBuf::from("docs/c.md"));
    assert_eq!(state.server.buffer_chars, 1_000);
}

#[test]
fn drift_markers_keep_their_type() {
    let mut state = EngramState::default();
    state.apply_event(&Event::BufferAppended {
        item: BufferItem {
            path: "docs/knowledge/concepts.md".into(),
            kind: ItemKind::DriftMarker,
            chars: 0,
            date: day("2026-01-01"),
            drift: Some(engram_core::DriftType::OrphanedConcepts),
        },
    });
    assert_eq!(
        state.buffer[0].drift,
        Some(engram_core::DriftType::OrphanedConcepts)
    );
}
