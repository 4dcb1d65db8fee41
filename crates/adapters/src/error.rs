// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for adapters

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in adapter operations
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("git {operation} failed: {message}")]
    Git { operation: String, message: String },
    #[error("fold agent failed to start: {0}")]
    AgentSpawn(String),
    #[error("session format '{0}' is not supported")]
    UnsupportedSessionFormat(String),
    #[error("session history not found at {0}")]
    HistoryNotFound(PathBuf),
}
