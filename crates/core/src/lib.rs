// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Core domain types for Engram

pub mod config;
pub mod date;

mod artifact;
mod dispatch;
mod event;
mod id;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use artifact::{BufferItem, DocPhase, DriftType, ItemKind, QueueEntry};
pub use config::{Budget, Config, ConfigError, SessionFormatKind, SessionSource, Thresholds};
pub use date::{parse_logical_date, DateError};
pub use dispatch::{ChunkType, DispatchRecord, DispatchState, ManifestEntry, MAX_LINT_RETRIES};
pub use event::Event;
pub use id::{extract_ids, max_id_per_category, Category, EntityId, IdRange};
