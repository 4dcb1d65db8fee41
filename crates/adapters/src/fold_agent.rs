// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fold agent invocation.
//!
//! The fold agent is opaque: it is handed the chunk input path, edits the
//! living docs on disk, and exits. There is no enforced timeout: the agent
//! is trusted to terminate; hung agents require an external kill.

use crate::AdapterError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// One invocation request.
#[derive(Debug, Clone)]
pub struct FoldRequest {
    /// Chunk input file (self-contained markdown)
    pub input_path: PathBuf,
    /// Prompt file naming the input by path
    pub prompt_path: PathBuf,
    /// Working directory for the agent (the project root, or a worktree
    /// during seed-from-date)
    pub project_root: PathBuf,
    /// Model identifier passed through the environment
    pub model: String,
}

/// What the agent process reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentOutcome {
    pub exit_code: i32,
}

impl AgentOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// An opaque subprocess that rewrites the living docs.
#[async_trait]
pub trait FoldAgent: Send + Sync {
    async fn invoke(&self, request: &FoldRequest) -> Result<AgentOutcome, AdapterError>;
}

/// Production agent: a configured argv with the chunk input path appended.
pub struct CommandFoldAgent {
    argv: Vec<String>,
}

impl CommandFoldAgent {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

#[async_trait]
impl FoldAgent for CommandFoldAgent {
    async fn invoke(&self, request: &FoldRequest) -> Result<AgentOutcome, AdapterError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(AdapterError::AgentSpawn("empty agent command".to_string()));
        };

        info!(
            program = %program,
            input = %request.input_path.display(),
            "invoking fold agent",
        );

        // No timeout: the fold run is the pipeline's suspension point
        let status = Command::new(program)
            .args(args)
            .arg(&request.input_path)
            .current_dir(&request.project_root)
            .env("ENGRAM_MODEL", &request.model)
            .env("ENGRAM_PROMPT_FILE", &request.prompt_path)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| AdapterError::AgentSpawn(format!("{program}: {e}")))?;

        Ok(AgentOutcome {
            exit_code: status.code().unwrap_or(-1),
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    //! Scriptable agent for tests.

    use super::{AgentOutcome, FoldAgent, FoldRequest};
    use crate::AdapterError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::PathBuf;

    /// One scripted invocation: the exit code and the file edits to apply.
    #[derive(Debug, Clone, Default)]
    pub struct FakeRun {
        pub exit_code: i32,
        /// `(path, content)` pairs written before exiting
        pub writes: Vec<(PathBuf, String)>,
    }

    impl FakeRun {
        /// A run that exits zero and writes the given files.
        pub fn edits(writes: Vec<(PathBuf, String)>) -> Self {
            Self {
                exit_code: 0,
                writes,
            }
        }

        /// A run that exits zero without touching anything.
        pub fn no_edits() -> Self {
            Self::default()
        }

        /// A run that fails outright.
        pub fn crash(exit_code: i32) -> Self {
            Self {
                exit_code,
                writes: Vec::new(),
            }
        }
    }

    /// Pops one [`FakeRun`] per invocation and records every request.
    #[derive(Default)]
    pub struct FakeFoldAgent {
        runs: Mutex<Vec<FakeRun>>,
        invocations: Mutex<Vec<FoldRequest>>,
    }

    impl FakeFoldAgent {
        pub fn scripted(runs: Vec<FakeRun>) -> Self {
            Self {
                runs: Mutex::new(runs),
                invocations: Mutex::new(Vec::new()),
            }
        }

        pub fn invocations(&self) -> Vec<FoldRequest> {
            self.invocations.lock().clone()
        }

        pub fn invocation_count(&self) -> usize {
            self.invocations.lock().len()
        }
    }

    #[async_trait]
    impl FoldAgent for FakeFoldAgent {
        async fn invoke(&self, request: &FoldRequest) -> Result<AgentOutcome, AdapterError> {
            self.invocations.lock().push(request.clone());
            let run = {
                let mut runs = self.runs.lock();
                if runs.is_empty() {
                    FakeRun::no_edits()
                } else {
                    runs.remove(0)
                }
            };
            for (path, content) in &run.writes {
                let target = if path.is_absolute() {
                    path.clone()
                } else {
                    request.project_root.join(path)
                };
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(target, content)?;
            }
            Ok(AgentOutcome {
                exit_code: run.exit_code,
            })
        }
    }
}

#[cfg(test)]
#[path = "fold_agent_tests.rs"]
mod tests;
