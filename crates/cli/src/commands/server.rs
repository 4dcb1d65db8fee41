// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `engram run`

use super::open_project;
use anyhow::Result;
use engram_adapters::{CommandFoldAgent, HeaderLinter, NotifyWatcher};
use engram_engine::{acquire_server_lock, SectionBriefing, Server};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub async fn run(root: &Path) -> Result<()> {
    let (config, paths, mut store) = open_project(root)?;

    // Refuse a second server before any logging or recovery side effects
    let _server_lock = acquire_server_lock(&paths)?;

    // Stderr plus a rolling file under .engram/
    let file_appender = tracing_appender::rolling::never(
        paths.state_dir(),
        paths
            .log_file()
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| "engram.log".into()),
    );
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    // Watch every configured source root
    let mut watch_roots: Vec<PathBuf> = config
        .sources
        .doc_roots
        .iter()
        .map(|r| root.join(r))
        .collect();
    if let Some(issues_dir) = &config.sources.issues_dir {
        watch_roots.push(root.join(issues_dir));
    }
    let watcher = NotifyWatcher::new(&watch_roots)?;

    let agent = CommandFoldAgent::new(config.agent.fold_command.clone());
    let linter = HeaderLinter;
    let briefing = SectionBriefing;

    let mut server = Server::new(
        &mut store,
        &config,
        &paths,
        &agent,
        &linter,
        &briefing,
        Box::new(watcher),
    );
    server.run().await?;
    Ok(())
}
