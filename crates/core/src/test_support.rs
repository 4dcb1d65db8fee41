// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixture builders for other crates' tests (behind the `test-support` feature).

use crate::{BufferItem, DocPhase, ItemKind, QueueEntry};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Parse a `YYYY-MM-DD` literal, panicking on typos in test fixtures.
#[allow(clippy::expect_used)]
pub fn day(s: &str) -> NaiveDate {
    s.parse().expect("valid test date literal")
}

/// A document buffer item with a plausible size.
pub fn doc_item(path: &str, date: &str) -> BufferItem {
    BufferItem {
        path: PathBuf::from(path),
        kind: ItemKind::Document,
        chars: 1_000,
        date: day(date),
        drift: None,
    }
}

/// A document queue entry.
pub fn doc_entry(path: &str, date: &str, phase: DocPhase) -> QueueEntry {
    QueueEntry {
        date: day(date),
        kind: ItemKind::Document,
        path: PathBuf::from(path),
        chars: 1_000,
        phase: Some(phase),
        session_id: None,
    }
}

/// An issue queue entry.
pub fn issue_entry(path: &str, date: &str, chars: u64) -> QueueEntry {
    QueueEntry {
        date: day(date),
        kind: ItemKind::Issue,
        path: PathBuf::from(path),
        chars,
        phase: None,
        session_id: None,
    }
}
