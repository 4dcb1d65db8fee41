// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable state store for Engram
//!
//! Event-sourced: a JSONL write-ahead log is the durability point, a
//! materialized [`EngramState`] is the queryable view, and an atomic JSON
//! snapshot bounds replay time. One `commit` call is one transaction.

mod snapshot;
mod state;
mod store;
mod wal;

pub use snapshot::{Snapshot, SnapshotError};
pub use state::{EngramState, ServerState};
pub use store::{StateStore, StoreError};
pub use wal::{Wal, WalEntry, WalError};
