// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `engram next-chunk` and `engram clear-active-chunk`

use super::open_project;
use crate::exit_error::ExitError;
use anyhow::Result;
use engram_engine::{next_chunk, ActiveChunkLock, EngineError, EngramPaths};
use std::path::Path;

pub async fn next(root: &Path) -> Result<()> {
    let (config, paths, mut store) = open_project(root)?;
    let fold_from = store.state().server.fold_from;

    match next_chunk(&mut store, &config, &paths, fold_from).await {
        Ok(Some(chunk)) => {
            println!(
                "Chunk {} ({}) written to {}",
                chunk.chunk_id,
                chunk.chunk_type,
                chunk.input_path.display(),
            );
            Ok(())
        }
        Ok(None) => {
            println!("Nothing to do: queue is empty and no drift is over threshold");
            Ok(())
        }
        Err(e @ EngineError::LockHeld { .. }) => {
            Err(ExitError::new(2, e.to_string()).into())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn clear(root: &Path) -> Result<()> {
    let paths = EngramPaths::new(root);
    if ActiveChunkLock::clear(&paths)? {
        println!("Active-chunk lock cleared");
    } else {
        println!("No active-chunk lock present");
    }
    Ok(())
}
