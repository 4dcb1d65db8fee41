// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `.engram/` state-directory layout.

use std::path::{Path, PathBuf};

/// Per-project state directory name.
pub const STATE_DIR: &str = ".engram";

/// Resolved locations of every persisted artifact for one project.
#[derive(Debug, Clone)]
pub struct EngramPaths {
    root: PathBuf,
    dir: PathBuf,
}

impl EngramPaths {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            dir: root.join(STATE_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.engram/` directory; also where the state store lives.
    pub fn state_dir(&self) -> &Path {
        &self.dir
    }

    pub fn active_chunk(&self) -> PathBuf {
        self.dir.join("active_chunk.json")
    }

    pub fn queue(&self) -> PathBuf {
        self.dir.join("queue.jsonl")
    }

    pub fn item_sizes(&self) -> PathBuf {
        self.dir.join("item_sizes.json")
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.dir.join("chunks")
    }

    pub fn chunk_input(&self, chunk_id: u64) -> PathBuf {
        self.chunks_dir()
            .join(format!("chunk_{chunk_id:03}_input.md"))
    }

    pub fn chunk_prompt(&self, chunk_id: u64) -> PathBuf {
        self.chunks_dir()
            .join(format!("chunk_{chunk_id:03}_prompt.txt"))
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.dir.join("sessions")
    }

    pub fn session_file(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(format!("{session_id}.md"))
    }

    /// Human-readable copy of the chunks manifest.
    pub fn manifest_view(&self) -> PathBuf {
        self.dir.join("chunks_manifest.json")
    }

    pub fn seed_prompt(&self) -> PathBuf {
        self.dir.join("seed_prompt.txt")
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.dir.join("worktrees")
    }

    pub fn log_file(&self) -> PathBuf {
        self.dir.join("engram.log")
    }

    /// fs2 lock held by a running server.
    pub fn server_lock(&self) -> PathBuf {
        self.dir.join("server.lock")
    }

    /// Create the directory skeleton.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::create_dir_all(self.chunks_dir())?;
        std::fs::create_dir_all(self.sessions_dir())?;
        Ok(())
    }
}
