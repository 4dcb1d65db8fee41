// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `engram status`

use super::open_project;
use anyhow::Result;
use engram_engine::{queue, ActiveChunkLock};
use std::path::Path;

pub fn run(root: &Path) -> Result<()> {
    let (_config, paths, store) = open_project(root)?;
    let state = store.state();

    println!("Project: {}", root.display());
    println!("Buffer: {} chars across {} item(s)", state.server.buffer_chars, state.buffer.len());

    let pending = queue::load_queue(&paths)?;
    println!("Queue: {} pending entr{}", pending.len(), if pending.len() == 1 { "y" } else { "ies" });

    match state.server.last_dispatch_at {
        Some(at) => println!("Last dispatch: {}", at.to_rfc3339()),
        None => println!("Last dispatch: never"),
    }

    let non_terminal = state.non_terminal_dispatches();
    for record in &non_terminal {
        println!(
            "In flight: chunk {} ({}) in state {}",
            record.chunk_id, record.chunk_type, record.state,
        );
    }
    if let Some(lock) = ActiveChunkLock::load(&paths)? {
        println!("Active chunk: {} (since {})", lock.chunk_id, lock.created_at.to_rfc3339());
    }

    match state.server.fold_from {
        Some(date) => println!("fold_from: {date}"),
        None => println!("fold_from: (unset)"),
    }
    println!("l0_stale: {}", state.server.l0_stale);

    Ok(())
}
