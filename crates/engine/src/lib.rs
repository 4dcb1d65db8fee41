// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Engram pipeline engine
//!
//! Queue building, drift scanning, chunk scheduling, the dispatch state
//! machine with crash recovery, the bootstrap controller, and the server
//! loop. Everything here is single-writer: one project root, one state
//! store handle, at most one dispatch in flight.

pub mod queue;

mod allocator;
mod bootstrap;
mod briefing;
mod chunker;
mod dispatcher;
mod drift;
mod error;
mod lock;
mod migrate;
mod paths;
mod server;

#[cfg(test)]
mod test_helpers;

pub use allocator::{pre_assign, NewEntryEstimate, PreAssigned};
pub use bootstrap::{forward_fold, seed, FoldStats};
pub use briefing::{BriefingGenerator, SectionBriefing};
pub use chunker::{next_chunk, ScheduledChunk};
pub use dispatcher::{Dispatcher, DispatchOutcome};
pub use drift::{scan_drift, DriftReport, OrphanedConcept, StaleClaim};
pub use error::EngineError;
pub use lock::{auto_clear_lock, ActiveChunkLock, FOLD_COMMIT_PREFIX};
pub use migrate::{migrate, MigrateReport};
pub use paths::{EngramPaths, STATE_DIR};
pub use server::{acquire_server_lock, Server};
