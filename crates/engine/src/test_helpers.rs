// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use crate::EngramPaths;
use engram_adapters::{SourceWatcher, WatchEvent};
use engram_core::config::{AgentConfig, Briefing, Graveyard, LivingDocs, Sources};
use engram_core::{Budget, Config, Thresholds};
use engram_storage::StateStore;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Command;

pub use engram_core::test_support::day;

/// A temp project with valid living docs and a workable config.
pub struct TestProject {
    dir: tempfile::TempDir,
    pub config: Config,
    pub paths: EngramPaths,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = EngramPaths::new(dir.path());
        let config = test_config();
        let project = Self { dir, config, paths };

        project.paths.ensure_layout().unwrap();
        project.write("docs/knowledge/timeline.md", "# Timeline\n");
        project.write("docs/knowledge/concepts.md", "# Concept Registry\n");
        project.write("docs/knowledge/epistemic.md", "# Claim Registry\n");
        project.write("docs/knowledge/workflows.md", "# Workflow Registry\n");
        project.write("docs/knowledge/graveyard/concepts.md", "# Concept Graveyard\n");
        project.write("docs/knowledge/graveyard/epistemic.md", "# Claim Graveyard\n");
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> StateStore {
        StateStore::open(self.paths.state_dir()).unwrap()
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root().join(rel)).unwrap()
    }

    pub fn git_init(&self) {
        for args in [
            &["init", "-q", "-b", "main"][..],
            &["config", "user.email", "t@example.com"],
            &["config", "user.name", "T"],
        ] {
            let status = Command::new("git")
                .arg("-C")
                .arg(self.root())
                .args(args)
                .status()
                .unwrap();
            assert!(status.success());
        }
    }

    pub fn git_commit_file(&self, rel: &str, content: &str, date: &str) {
        self.write(rel, content);
        let timestamp = format!("{date}T12:00:00");
        for args in [&["add", rel][..], &["commit", "-q", "-m", "edit"]] {
            let status = Command::new("git")
                .arg("-C")
                .arg(self.root())
                .args(args)
                .env("GIT_COMMITTER_DATE", &timestamp)
                .env("GIT_AUTHOR_DATE", &timestamp)
                .status()
                .unwrap();
            assert!(status.success());
        }
    }

    pub fn git_commit_with_subject(&self, subject: &str) {
        let status = Command::new("git")
            .arg("-C")
            .arg(self.root())
            .args(["commit", "-q", "--allow-empty", "-m", subject])
            .status()
            .unwrap();
        assert!(status.success());
    }

    pub fn git_rm(&self, rel: &str, date: &str) {
        let timestamp = format!("{date}T12:00:00");
        for args in [&["rm", "-q", rel][..], &["commit", "-q", "-m", "remove"]] {
            let status = Command::new("git")
                .arg("-C")
                .arg(self.root())
                .args(args)
                .env("GIT_COMMITTER_DATE", &timestamp)
                .env("GIT_AUTHOR_DATE", &timestamp)
                .status()
                .unwrap();
            assert!(status.success());
        }
    }
}

pub fn test_config() -> Config {
    Config {
        living_docs: LivingDocs {
            timeline: "docs/knowledge/timeline.md".into(),
            concepts: "docs/knowledge/concepts.md".into(),
            epistemic: "docs/knowledge/epistemic.md".into(),
            workflows: "docs/knowledge/workflows.md".into(),
        },
        graveyard: Graveyard {
            concepts: "docs/knowledge/graveyard/concepts.md".into(),
            epistemic: "docs/knowledge/graveyard/epistemic.md".into(),
        },
        briefing: Briefing {
            file: "CLAUDE.md".into(),
            section: "## Project briefing".into(),
        },
        sources: Sources {
            issues_dir: Some(".issues".into()),
            doc_roots: vec!["docs".into()],
            sessions: None,
        },
        thresholds: Thresholds::default(),
        budget: Budget::default(),
        agent: AgentConfig {
            fold_command: vec!["true".into()],
            seed_command: None,
            model: "test-model".into(),
        },
        poll_interval_secs: 1,
    }
}

/// Scripted watcher: pops one batch of events per poll.
#[derive(Default)]
pub struct FakeWatcher {
    batches: VecDeque<Vec<WatchEvent>>,
}

impl FakeWatcher {
    pub fn scripted(batches: Vec<Vec<WatchEvent>>) -> Self {
        Self {
            batches: batches.into(),
        }
    }
}

impl SourceWatcher for FakeWatcher {
    fn poll(&mut self) -> Vec<WatchEvent> {
        self.batches.pop_front().unwrap_or_default()
    }
}
