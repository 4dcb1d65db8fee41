// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `engram migrate`

use super::open_project;
use anyhow::Result;
use engram_core::parse_logical_date;
use std::path::Path;

pub fn run(root: &Path, fold_from: Option<&str>) -> Result<()> {
    let (config, paths, mut store) = open_project(root)?;
    let date = fold_from.map(parse_logical_date).transpose()?;

    let report = engram_engine::migrate(&mut store, &config, &paths, date)?;
    println!(
        "Migration complete: {} identifier(s) assigned, {} graveyard(s) created{}",
        report.assigned,
        report.graveyards_created,
        if report.fold_from_set {
            ", fold_from set"
        } else {
            ""
        },
    );
    Ok(())
}
