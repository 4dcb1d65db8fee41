// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem source watcher.
//!
//! The server loop polls rather than reacting: events accumulate in a
//! channel while a dispatch runs and are drained at the top of each
//! iteration. Only the event contract matters here: the backend is
//! whatever `notify` picks for the platform.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::warn;

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Created,
    Modified,
    Removed,
}

/// One filesystem change under a watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchEventKind,
}

/// Poll-style watcher facade.
pub trait SourceWatcher: Send {
    /// Drain every event observed since the last poll.
    fn poll(&mut self) -> Vec<WatchEvent>;
}

/// notify-backed watcher draining into an mpsc channel.
pub struct NotifyWatcher {
    // NOTE(lifetime): held so the backend keeps watching; dropped with self
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<notify::Result<notify::Event>>,
}

impl NotifyWatcher {
    /// Watch the given roots recursively. Missing roots are skipped with a
    /// warning so a half-configured project still runs.
    pub fn new(roots: &[PathBuf]) -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        for root in roots {
            if !root.exists() {
                warn!(path = %root.display(), "skipping missing watch root");
                continue;
            }
            watcher.watch(root, RecursiveMode::Recursive)?;
        }
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }
}

impl SourceWatcher for NotifyWatcher {
    fn poll(&mut self) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "watch backend error");
                    continue;
                }
            };
            let kind = match event.kind {
                notify::EventKind::Create(_) => WatchEventKind::Created,
                notify::EventKind::Modify(_) => WatchEventKind::Modified,
                notify::EventKind::Remove(_) => WatchEventKind::Removed,
                _ => continue,
            };
            for path in event.paths {
                events.push(WatchEvent {
                    path: path.clone(),
                    kind,
                });
            }
        }
        events
    }
}

/// Does this path look like a source document worth buffering?
pub fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
