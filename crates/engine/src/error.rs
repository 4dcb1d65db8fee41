// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the pipeline engine

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in engine operations.
///
/// Each variant is a tag the caller can branch on; at the CLI boundary they
/// surface as a single human-readable line.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed after {retries} retries: {summary}")]
    Validation { retries: u8, summary: String },
    #[error("size guard tripped: docs grew {grew} chars, expected at most {allowed}")]
    SizeGuard { grew: u64, allowed: u64 },
    #[error("fold agent invocation failed: {0}")]
    AgentInvocation(String),
    #[error("dispatch failed for chunk {chunk_id}: {reason}")]
    DispatchFailed { chunk_id: u64, reason: String },
    #[error(transparent)]
    InvalidStartDate(#[from] engram_core::DateError),
    #[error("cannot resolve a commit on or before {date}")]
    GitResolution { date: NaiveDate },
    #[error("chunk {chunk_id} is already active; run `engram clear-active-chunk` to release it")]
    LockHeld { chunk_id: u64 },
    #[error("another engram server is already running (lock at {0})")]
    ServerLockHeld(PathBuf),
    #[error(transparent)]
    Config(#[from] engram_core::ConfigError),
    #[error(transparent)]
    Store(#[from] engram_storage::StoreError),
    #[error(transparent)]
    Adapter(#[from] engram_adapters::AdapterError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
