// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod bootstrap;
pub mod chunk;
pub mod init;
pub mod lint;
pub mod migrate;
pub mod queue;
pub mod server;
pub mod status;

use anyhow::Result;
use engram_core::Config;
use engram_engine::EngramPaths;
use engram_storage::StateStore;
use std::path::Path;

/// Load the per-project context every command needs.
pub(crate) fn open_project(root: &Path) -> Result<(Config, EngramPaths, StateStore)> {
    let config = Config::load(root)?;
    let paths = EngramPaths::new(root);
    paths.ensure_layout()?;
    let store = StateStore::open(paths.state_dir())?;
    Ok((config, paths, store))
}
