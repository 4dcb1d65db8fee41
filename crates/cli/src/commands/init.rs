// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `engram init`

use anyhow::Result;
use engram_core::{config, Config};
use engram_engine::EngramPaths;
use engram_storage::StateStore;
use std::path::Path;

pub fn run(root: &Path) -> Result<()> {
    let config_path = root.join(config::CONFIG_FILE);
    if !config_path.exists() {
        std::fs::write(&config_path, Config::template())?;
        println!("Wrote {}", config_path.display());
    }

    let config = Config::load(root)?;
    let paths = EngramPaths::new(root);
    paths.ensure_layout()?;

    // Opening the store creates the WAL
    let _store = StateStore::open(paths.state_dir())?;

    let docs = [
        (&config.living_docs.timeline, "# Timeline\n"),
        (&config.living_docs.concepts, "# Concept Registry\n"),
        (&config.living_docs.epistemic, "# Claim Registry\n"),
        (&config.living_docs.workflows, "# Workflow Registry\n"),
        (&config.graveyard.concepts, "# Concept Graveyard\n"),
        (&config.graveyard.epistemic, "# Claim Graveyard\n"),
    ];
    for (rel, header) in docs {
        write_if_absent(&root.join(rel), header)?;
    }

    println!("Initialized engram project in {}", root.display());
    Ok(())
}

fn write_if_absent(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    println!("Wrote {}", path.display());
    Ok(())
}
