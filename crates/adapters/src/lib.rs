// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! External collaborators for Engram
//!
//! Source adapters (issues, documents, sessions), git subprocess queries,
//! the fold-agent and schema-linter interfaces, and the filesystem watcher.
//! Adapters are pure with respect to the state store: they read the outside
//! world and produce dated artifacts.

pub mod git;

mod docs;
mod error;
mod fold_agent;
mod issues;
mod linter;
mod sessions;
mod watcher;

pub use docs::harvest_docs;
pub use error::AdapterError;
pub use fold_agent::{AgentOutcome, CommandFoldAgent, FoldAgent, FoldRequest};
pub use issues::{harvest_issues, render_issue, render_issue_file, IssueArtifact};
pub use linter::{HeaderLinter, LintReport, SchemaLinter, Violation};
pub use sessions::{session_format, SessionDraft, SessionFormat};
pub use watcher::{is_markdown, NotifyWatcher, SourceWatcher, WatchEvent, WatchEventKind};

#[cfg(any(test, feature = "test-support"))]
pub use fold_agent::fake::{FakeFoldAgent, FakeRun};
#[cfg(any(test, feature = "test-support"))]
pub use linter::fake::FakeLinter;
