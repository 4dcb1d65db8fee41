// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use engram_core::Event;

fn event(n: u64) -> Event {
    Event::CounterFloorBumped {
        category: engram_core::Category::Concept,
        min_next: n,
    }
}

fn wal_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("wal.jsonl")
}

// ── Commit and replay ────────────────────────────────────────────────────────

#[test]
fn commit_assigns_increasing_sequences() {
    let dir = tempfile::tempdir().unwrap();
    let mut wal = Wal::open(&wal_path(&dir)).unwrap();

    assert_eq!(wal.commit(&[event(1), event(2)]).unwrap(), 2);
    assert_eq!(wal.commit(&[event(3)]).unwrap(), 3);
    assert_eq!(wal.write_seq(), 3);
}

#[test]
fn reopen_resumes_sequence_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let path = wal_path(&dir);

    {
        let mut wal = Wal::open(&path).unwrap();
        wal.commit(&[event(1), event(2)]).unwrap();
    }

    let mut wal = Wal::open(&path).unwrap();
    assert_eq!(wal.write_seq(), 2);
    assert_eq!(wal.commit(&[event(3)]).unwrap(), 3);
}

#[test]
fn entries_after_skips_processed_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let mut wal = Wal::open(&wal_path(&dir)).unwrap();
    wal.commit(&[event(1), event(2), event(3)]).unwrap();

    let entries = wal.entries_after(1).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 2);
    assert_eq!(entries[1].seq, 3);
}

#[test]
fn empty_commit_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut wal = Wal::open(&wal_path(&dir)).unwrap();
    assert_eq!(wal.commit(&[]).unwrap(), 0);
}

// ── Corruption handling ──────────────────────────────────────────────────────

#[test]
fn corrupt_tail_rotates_and_preserves_valid_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = wal_path(&dir);

    {
        let mut wal = Wal::open(&path).unwrap();
        wal.commit(&[event(1), event(2)]).unwrap();
    }

    // Simulate a torn write
    {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap();
        file.write_all(b"{\"seq\":3,\"event\":{\"type\":\"count").unwrap();
    }

    let wal = Wal::open(&path).unwrap();
    assert_eq!(wal.write_seq(), 2);
    assert_eq!(wal.entries_after(0).unwrap().len(), 2);
    assert!(path.with_extension("bak").exists());
}

// ── Truncation ───────────────────────────────────────────────────────────────

#[test]
fn truncate_before_drops_old_entries() {
    let dir = tempfile::tempdir().unwrap();
    let mut wal = Wal::open(&wal_path(&dir)).unwrap();
    wal.commit(&[event(1), event(2), event(3)]).unwrap();

    wal.truncate_before(3).unwrap();

    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].seq, 3);
    // New appends continue past the retained suffix
    assert_eq!(wal.commit(&[event(4)]).unwrap(), 4);
}

#[test]
fn truncate_everything_leaves_empty_wal() {
    let dir = tempfile::tempdir().unwrap();
    let mut wal = Wal::open(&wal_path(&dir)).unwrap();
    wal.commit(&[event(1), event(2)]).unwrap();

    wal.truncate_before(3).unwrap();
    assert!(wal.entries_after(0).unwrap().is_empty());
}
