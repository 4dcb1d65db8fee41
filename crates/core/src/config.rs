// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration (`engram.yaml`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name, at the project root.
pub const CONFIG_FILE: &str = "engram.yaml";

/// Errors from config loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no {CONFIG_FILE} found at {0} (run `engram init` first)")]
    NotFound(PathBuf),
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Top-level project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub living_docs: LivingDocs,
    pub graveyard: Graveyard,
    pub briefing: Briefing,
    #[serde(default)]
    pub sources: Sources,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub budget: Budget,
    pub agent: AgentConfig,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    30
}

/// The four living documents, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LivingDocs {
    pub timeline: PathBuf,
    pub concepts: PathBuf,
    pub epistemic: PathBuf,
    pub workflows: PathBuf,
}

impl LivingDocs {
    /// All living docs, joined against the project root.
    pub fn paths(&self, root: &Path) -> Vec<PathBuf> {
        [&self.timeline, &self.concepts, &self.epistemic, &self.workflows]
            .into_iter()
            .map(|p| root.join(p))
            .collect()
    }
}

/// Append-only graveyard files, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Graveyard {
    pub concepts: PathBuf,
    pub epistemic: PathBuf,
}

impl Graveyard {
    pub fn paths(&self, root: &Path) -> Vec<PathBuf> {
        [&self.concepts, &self.epistemic]
            .into_iter()
            .map(|p| root.join(p))
            .collect()
    }
}

/// Where the L0 briefing is rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Briefing {
    /// Target file, relative to the project root
    pub file: PathBuf,
    /// Markdown heading of the section to rewrite
    pub section: String,
}

/// Artifact source roots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sources {
    /// Directory of issue JSON files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_dir: Option<PathBuf>,
    /// Roots scanned for markdown documents
    #[serde(default)]
    pub doc_roots: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<SessionSource>,
}

/// Session-history source description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSource {
    pub format: SessionFormatKind,
    /// JSON-lines history file; `~` is expanded on load
    pub history_file: PathBuf,
    /// Substring matched against each record's project path
    pub project_match: String,
}

/// Built-in session history formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionFormatKind {
    #[serde(rename = "claude-code")]
    ClaudeCode,
    #[serde(rename = "codex")]
    Codex,
}

impl fmt::Display for SessionFormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionFormatKind::ClaudeCode => write!(f, "claude-code"),
            SessionFormatKind::Codex => write!(f, "codex"),
        }
    }
}

/// Drift thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    /// Orphaned-concept count that triggers triage
    #[serde(default = "default_orphan_triage")]
    pub orphan_triage: usize,
    /// Age in days before a contested claim counts toward review
    #[serde(default = "default_contested_review_days")]
    pub contested_review_days: i64,
    /// Contested-claim count that triggers review
    #[serde(default = "default_contested_review_threshold")]
    pub contested_review_threshold: usize,
    /// Age in days before an unverified claim counts as stale
    #[serde(default = "default_stale_unverified_days")]
    pub stale_unverified_days: i64,
    /// Stale-claim count that triggers a sweep
    #[serde(default = "default_stale_unverified_threshold")]
    pub stale_unverified_threshold: usize,
    /// CURRENT workflow count that triggers synthesis
    #[serde(default = "default_workflow_repetition")]
    pub workflow_repetition: usize,
    /// Cooldown window for workflow synthesis, in chunk-id distance
    #[serde(default = "default_workflow_cooldown_chunks")]
    pub workflow_cooldown_chunks: u64,
}

fn default_orphan_triage() -> usize {
    5
}
fn default_contested_review_days() -> i64 {
    14
}
fn default_contested_review_threshold() -> usize {
    3
}
fn default_stale_unverified_days() -> i64 {
    30
}
fn default_stale_unverified_threshold() -> usize {
    5
}
fn default_workflow_repetition() -> usize {
    12
}
fn default_workflow_cooldown_chunks() -> u64 {
    3
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            orphan_triage: default_orphan_triage(),
            contested_review_days: default_contested_review_days(),
            contested_review_threshold: default_contested_review_threshold(),
            stale_unverified_days: default_stale_unverified_days(),
            stale_unverified_threshold: default_stale_unverified_threshold(),
            workflow_repetition: default_workflow_repetition(),
            workflow_cooldown_chunks: default_workflow_cooldown_chunks(),
        }
    }
}

/// Character budgets for chunk assembly and dispatch triggering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Budget {
    #[serde(default = "default_context_limit_chars")]
    pub context_limit_chars: u64,
    #[serde(default = "default_instructions_overhead")]
    pub instructions_overhead: u64,
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: u64,
    /// Buffer fill that triggers a dispatch in the server loop
    #[serde(default = "default_dispatch_threshold_chars")]
    pub dispatch_threshold_chars: u64,
    /// Cap on pre-assigned identifiers per category per chunk
    #[serde(default = "default_max_new_ids_per_category")]
    pub max_new_ids_per_category: u64,
}

fn default_context_limit_chars() -> u64 {
    160_000
}
fn default_instructions_overhead() -> u64 {
    12_000
}
fn default_max_chunk_chars() -> u64 {
    48_000
}
fn default_dispatch_threshold_chars() -> u64 {
    24_000
}
fn default_max_new_ids_per_category() -> u64 {
    8
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            context_limit_chars: default_context_limit_chars(),
            instructions_overhead: default_instructions_overhead(),
            max_chunk_chars: default_max_chunk_chars(),
            dispatch_threshold_chars: default_dispatch_threshold_chars(),
            max_new_ids_per_category: default_max_new_ids_per_category(),
        }
    }
}

/// Fold-agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Command argv; the chunk input path is appended on invocation
    pub fold_command: Vec<String>,
    /// Seed-agent argv; falls back to `fold_command` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_command: Option<Vec<String>>,
    pub model: String,
}

impl AgentConfig {
    pub fn seed_argv(&self) -> &[String] {
        self.seed_command.as_deref().unwrap_or(&self.fold_command)
    }
}

impl Config {
    /// Load and validate `engram.yaml` from the project root.
    pub fn load(root: &Path) -> Result<Config, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Err(ConfigError::NotFound(root.to_path_buf()));
        }
        let text = std::fs::read_to_string(&path)?;
        let mut config: Config = serde_yaml::from_str(&text)?;
        if let Some(sessions) = config.sources.sessions.as_mut() {
            sessions.history_file = expand_tilde(&sessions.history_file);
        }
        Ok(config)
    }

    /// The workflow registry file (the cooldown hash target).
    pub fn workflow_registry(&self, root: &Path) -> PathBuf {
        root.join(&self.living_docs.workflows)
    }

    /// Living + graveyard docs, the linter's full input set.
    pub fn all_doc_paths(&self, root: &Path) -> Vec<PathBuf> {
        let mut paths = self.living_docs.paths(root);
        paths.extend(self.graveyard.paths(root));
        paths
    }

    /// Commented starter config written by `engram init`.
    pub fn template() -> &'static str {
        r###"# Engram project configuration
living_docs:
  timeline: docs/knowledge/timeline.md
  concepts: docs/knowledge/concepts.md
  epistemic: docs/knowledge/epistemic.md
  workflows: docs/knowledge/workflows.md
graveyard:
  concepts: docs/knowledge/graveyard/concepts.md
  epistemic: docs/knowledge/graveyard/epistemic.md
briefing:
  file: CLAUDE.md
  section: "## Project briefing"
sources:
  # issues_dir: .issues
  doc_roots:
    - docs
  # sessions:
  #   format: claude-code
  #   history_file: ~/.claude/history.jsonl
  #   project_match: my-project
thresholds:
  orphan_triage: 5
  contested_review_days: 14
  contested_review_threshold: 3
  stale_unverified_days: 30
  stale_unverified_threshold: 5
  workflow_repetition: 12
  workflow_cooldown_chunks: 3
budget:
  context_limit_chars: 160000
  instructions_overhead: 12000
  max_chunk_chars: 48000
  dispatch_threshold_chars: 24000
  max_new_ids_per_category: 8
agent:
  fold_command: ["claude", "-p", "--dangerously-skip-permissions"]
  model: claude-sonnet-4-5
poll_interval_secs: 30
"###
    }
}

/// Expand a leading `~/` against the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(stripped) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(stripped),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
