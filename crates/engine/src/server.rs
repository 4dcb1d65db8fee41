// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server loop: poll sources, fill the buffer, dispatch when due.
//!
//! Single-threaded cooperative. Events accumulate while a dispatch runs and
//! are drained on the next iteration; the only suspension points are
//! subprocess waits and the polling sleep. At most one server runs per
//! project (fs2 lock on `server.lock`).

use crate::briefing::BriefingGenerator;
use crate::dispatcher::Dispatcher;
use crate::queue::{extend_queue_from_buffer, queue_is_drained};
use crate::{drift::scan_drift, EngineError, EngramPaths};
use chrono::Utc;
use engram_adapters::{is_markdown, FoldAgent, SchemaLinter, SourceWatcher};
use engram_core::{BufferItem, Config, Event, ItemKind};
use engram_storage::StateStore;
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Take the per-project server lock; refuse when another server holds it.
pub fn acquire_server_lock(paths: &EngramPaths) -> Result<File, EngineError> {
    std::fs::create_dir_all(paths.state_dir())?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(paths.server_lock())?;
    file.try_lock_exclusive()
        .map_err(|_| EngineError::ServerLockHeld(paths.server_lock()))?;
    Ok(file)
}

/// The polling server for one project root.
pub struct Server<'a> {
    store: &'a mut StateStore,
    config: &'a Config,
    paths: &'a EngramPaths,
    agent: &'a dyn FoldAgent,
    linter: &'a dyn SchemaLinter,
    briefing: &'a dyn BriefingGenerator,
    watcher: Box<dyn SourceWatcher>,
    /// Session-history mtime at the previous poll
    session_mtime: Option<SystemTime>,
}

impl<'a> Server<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: &'a mut StateStore,
        config: &'a Config,
        paths: &'a EngramPaths,
        agent: &'a dyn FoldAgent,
        linter: &'a dyn SchemaLinter,
        briefing: &'a dyn BriefingGenerator,
        watcher: Box<dyn SourceWatcher>,
    ) -> Self {
        // Prime the session cursor so pre-existing history is not
        // re-ingested; historical catch-up is the bootstrap's job
        let session_mtime = config
            .sources
            .sessions
            .as_ref()
            .and_then(|s| std::fs::metadata(&s.history_file).ok())
            .and_then(|m| m.modified().ok());
        Self {
            store,
            config,
            paths,
            agent,
            linter,
            briefing,
            watcher,
            session_mtime,
        }
    }

    /// Crash recovery, then the L0 check: run once before the loop.
    pub async fn startup(&mut self) -> Result<Vec<String>, EngineError> {
        let mut dispatcher = Dispatcher::new(
            self.store,
            self.config,
            self.paths,
            self.agent,
            self.linter,
        );
        let actions = dispatcher.recover().await?;
        for action in &actions {
            info!(action = %action, "recovery");
        }
        self.l0_check()?;
        Ok(actions)
    }

    /// Run until ctrl-c. Iteration errors are logged, never fatal.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        self.startup().await?;
        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            "server loop started",
        );
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("signal received; shutting down");
                    break;
                }
                _ = tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)) => {
                    if let Err(e) = self.iterate().await {
                        warn!(error = %e, "server iteration failed");
                    }
                }
            }
        }
        self.store.checkpoint()?;
        Ok(())
    }

    /// One poll-buffer-dispatch iteration.
    pub async fn iterate(&mut self) -> Result<(), EngineError> {
        // L0 check runs unconditionally at the top of every iteration
        self.l0_check()?;

        self.poll_sources().await?;

        let buffer_full =
            self.store.state().server.buffer_chars >= self.config.budget.dispatch_threshold_chars;
        let mut trigger = buffer_full;

        if !trigger {
            let report = scan_drift(
                self.config,
                self.paths,
                self.store.state().server.fold_from,
            )
            .await?;
            if let Some(drift) = report.triggered(&self.config.thresholds).first().copied() {
                let marker_doc = match drift {
                    engram_core::DriftType::OrphanedConcepts => &self.config.living_docs.concepts,
                    engram_core::DriftType::ContestedClaims
                    | engram_core::DriftType::StaleUnverified => &self.config.living_docs.epistemic,
                    engram_core::DriftType::WorkflowRepetition => &self.config.living_docs.workflows,
                };
                self.store.commit(vec![Event::BufferAppended {
                    item: BufferItem {
                        path: marker_doc.clone(),
                        kind: ItemKind::DriftMarker,
                        chars: 0,
                        date: Utc::now().date_naive(),
                        drift: Some(drift),
                    },
                }])?;
                trigger = true;
            }
        }

        if trigger {
            if queue_is_drained(self.paths) {
                let added = extend_queue_from_buffer(
                    self.paths,
                    self.config,
                    &self.store.state().buffer.clone(),
                )?;
                if added > 0 {
                    info!(added, "queue extended from buffer");
                }
            }

            let fold_from = self.store.state().server.fold_from;
            let mut dispatcher = Dispatcher::new(
                self.store,
                self.config,
                self.paths,
                self.agent,
                self.linter,
            );
            match dispatcher.dispatch(fold_from).await {
                Ok(outcome) => info!(?outcome, "dispatch finished"),
                Err(EngineError::LockHeld { chunk_id }) => {
                    warn!(chunk_id, "dispatch skipped; active chunk lock is held");
                }
                Err(e) => return Err(e),
            }

            // Post-dispatch L0 check: a drained queue regenerates at once
            self.l0_check()?;
        }

        Ok(())
    }

    /// Regenerate the briefing when stale AND the queue is drained.
    ///
    /// The predicate checks the queue, not the buffer: the queue feeds
    /// content, the buffer merely triggers dispatches.
    fn l0_check(&mut self) -> Result<(), EngineError> {
        if !self.store.state().server.l0_stale {
            return Ok(());
        }
        if !queue_is_drained(self.paths) {
            return Ok(());
        }
        self.briefing.regenerate(self.config, self.paths)?;
        self.store.mark_l0_regenerated()?;
        Ok(())
    }

    /// Drain watcher events, poll git, stat the session history.
    async fn poll_sources(&mut self) -> Result<(), EngineError> {
        let mut events = Vec::new();

        for watch_event in self.watcher.poll() {
            if let Some(item) = self.classify(&watch_event.path) {
                events.push(Event::BufferAppended { item });
            }
        }

        // Git poll: commits land doc edits the watcher may have missed
        // (rebases, checkouts). Tolerates non-repository roots. A missing
        // cursor is primed without ingesting: historical catch-up belongs
        // to the bootstrap, not the poll loop.
        match engram_adapters::git::head_commit(self.paths.root()).await {
            Ok(Some(head)) => {
                let cursor = self.store.state().server.poll_cursor.clone();
                match cursor {
                    None => events.push(Event::PollCursorAdvanced { commit: head }),
                    Some(cursor) if cursor != head => {
                        let changed = engram_adapters::git::changed_paths_since(
                            self.paths.root(),
                            Some(&cursor),
                        )
                        .await
                        .unwrap_or_default();
                        for rel in changed {
                            let abs = self.paths.root().join(&rel);
                            if let Some(item) = self.classify(&abs) {
                                events.push(Event::BufferAppended { item });
                            }
                        }
                        events.push(Event::PollCursorAdvanced { commit: head });
                    }
                    Some(_) => {}
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "git poll failed; continuing with watcher events only"),
        }

        if let Some(source) = &self.config.sources.sessions {
            let mtime = std::fs::metadata(&source.history_file)
                .ok()
                .and_then(|m| m.modified().ok());
            if mtime.is_some() && mtime != self.session_mtime {
                let chars = std::fs::metadata(&source.history_file)
                    .map(|m| m.len())
                    .unwrap_or(0);
                events.push(Event::BufferAppended {
                    item: BufferItem {
                        path: source.history_file.clone(),
                        kind: ItemKind::Session,
                        chars,
                        date: Utc::now().date_naive(),
                        drift: None,
                    },
                });
                self.session_mtime = mtime;
            }
        }

        self.store.commit(events)?;
        Ok(())
    }

    /// Map a filesystem path to a buffer item, if it is a source artifact.
    fn classify(&self, abs: &Path) -> Option<BufferItem> {
        let root = self.paths.root();
        let rel = abs.strip_prefix(root).ok()?;

        // Engram's own artifacts never feed the buffer
        if rel.starts_with(crate::STATE_DIR) {
            return None;
        }
        let excluded: Vec<PathBuf> = {
            let mut paths = self.config.all_doc_paths(root);
            paths.push(root.join(&self.config.briefing.file));
            paths
        };
        if excluded.iter().any(|e| e == abs) {
            return None;
        }

        let chars = std::fs::metadata(abs).ok()?.len();

        if let Some(issues_dir) = &self.config.sources.issues_dir {
            if abs.starts_with(root.join(issues_dir))
                && abs.extension().is_some_and(|ext| ext == "json")
            {
                return Some(BufferItem {
                    path: rel.to_path_buf(),
                    kind: ItemKind::Issue,
                    chars,
                    date: Utc::now().date_naive(),
                    drift: None,
                });
            }
        }

        let in_doc_root = self
            .config
            .sources
            .doc_roots
            .iter()
            .any(|doc_root| abs.starts_with(root.join(doc_root)));
        if in_doc_root && is_markdown(abs) {
            return Some(BufferItem {
                path: rel.to_path_buf(),
                kind: ItemKind::Document,
                chars,
                date: Utc::now().date_naive(),
                drift: None,
            });
        }
        None
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
