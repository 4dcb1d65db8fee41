// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `engram seed` and `engram fold`

use super::open_project;
use anyhow::Result;
use engram_adapters::{CommandFoldAgent, HeaderLinter};
use engram_core::parse_logical_date;
use engram_engine::{forward_fold, seed as seed_docs};
use std::path::Path;

pub async fn seed(root: &Path, from_date: Option<&str>) -> Result<()> {
    let (config, paths, mut store) = open_project(root)?;
    let date = from_date.map(parse_logical_date).transpose()?;

    let seed_agent = CommandFoldAgent::new(config.agent.seed_argv().to_vec());
    seed_docs(&mut store, &config, &paths, &seed_agent, date).await?;

    match date {
        None => {
            println!("Seeded living docs from the current repository state");
            Ok(())
        }
        Some(date) => {
            println!("Seeded living docs as of {date}; forward-folding");
            run_forward_fold(root, date).await
        }
    }
}

pub async fn fold(root: &Path, from: &str) -> Result<()> {
    let date = parse_logical_date(from)?;
    run_forward_fold(root, date).await
}

async fn run_forward_fold(root: &Path, from: chrono::NaiveDate) -> Result<()> {
    let (config, paths, mut store) = open_project(root)?;
    let agent = CommandFoldAgent::new(config.agent.fold_command.clone());
    let linter = HeaderLinter;

    let stats = forward_fold(&mut store, &config, &paths, &agent, &linter, from).await?;
    println!(
        "Forward fold complete: {} chunk(s) from {from}",
        stats.chunks,
    );
    Ok(())
}
