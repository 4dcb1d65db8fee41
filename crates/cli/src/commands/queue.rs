// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `engram build-queue`

use super::open_project;
use anyhow::Result;
use engram_engine::queue::{build_queue, harvest};
use std::path::Path;

pub async fn run(root: &Path, start_date: Option<&str>) -> Result<()> {
    // Strict validation before the adapters touch anything
    if let Some(date) = start_date {
        engram_core::parse_logical_date(date)?;
    }

    let (config, paths, store) = open_project(root)?;

    // --start-date overrides the marker; the marker is the default
    let marker = store.state().server.fold_from.map(|d| d.to_string());
    let effective = start_date.map(str::to_string).or(marker);

    let harvested = harvest(&config, root).await?;
    let summary = build_queue(&paths, harvested, effective.as_deref())?;

    match effective {
        Some(date) => println!(
            "Queue: {} entr{} ({} chars) from {date}",
            summary.entries,
            if summary.entries == 1 { "y" } else { "ies" },
            summary.total_chars,
        ),
        None => println!(
            "Queue: {} entr{} ({} chars), full history",
            summary.entries,
            if summary.entries == 1 { "y" } else { "ies" },
            summary.total_chars,
        ),
    }
    Ok(())
}
