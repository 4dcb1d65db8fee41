// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration for pre-existing projects.
//!
//! Backfills stable identifiers onto headings that lack one, seeds the
//! graveyard files, floors the counters above everything now in use, and
//! optionally sets the fold-from marker. Idempotent: a second run finds
//! nothing to assign and the floors already high.

use crate::{EngineError, EngramPaths};
use chrono::NaiveDate;
use engram_core::{max_id_per_category, Category, Config, EntityId};
use engram_storage::StateStore;
use std::path::Path;
use tracing::info;

/// What a migration run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrateReport {
    /// Identifiers assigned to previously unidentified headings
    pub assigned: usize,
    /// Graveyard files created
    pub graveyards_created: usize,
    pub fold_from_set: bool,
}

/// Run the migration.
pub fn migrate(
    store: &mut StateStore,
    config: &Config,
    paths: &EngramPaths,
    fold_from: Option<NaiveDate>,
) -> Result<MigrateReport, EngineError> {
    paths.ensure_layout()?;
    let root = paths.root();
    let mut report = MigrateReport::default();

    // Backfill ids per identified category document. The timeline carries
    // no identifiers of its own.
    let targets = [
        (Category::Concept, root.join(&config.living_docs.concepts)),
        (Category::Epistemic, root.join(&config.living_docs.epistemic)),
        (Category::Workflow, root.join(&config.living_docs.workflows)),
    ];
    for (category, path) in &targets {
        report.assigned += backfill_ids(store, *category, path)?;
    }

    // Counters must clear every id in the docs, assigned or pre-existing
    let texts: Vec<String> = config
        .living_docs
        .paths(root)
        .iter()
        .chain(config.graveyard.paths(root).iter())
        .filter_map(|p| std::fs::read_to_string(p).ok())
        .collect();
    for (category, max) in max_id_per_category(texts.iter().map(String::as_str)) {
        store.bump_counter_floor(category, max + 1)?;
    }

    // Graveyards exist from migration onward, append-only thereafter
    for (title, path) in [
        ("Concept Graveyard", root.join(&config.graveyard.concepts)),
        ("Claim Graveyard", root.join(&config.graveyard.epistemic)),
    ] {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, format!("# {title}\n"))?;
            report.graveyards_created += 1;
        }
    }

    if let Some(date) = fold_from {
        store.set_fold_from(date)?;
        report.fold_from_set = true;
    }

    info!(
        assigned = report.assigned,
        graveyards = report.graveyards_created,
        "migration complete",
    );
    Ok(report)
}

/// Assign fresh ids to `## ` headings that lack one. Returns the count.
fn backfill_ids(
    store: &mut StateStore,
    category: Category,
    path: &Path,
) -> Result<usize, EngineError> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return Ok(0);
    };

    let needs: Vec<usize> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            line.starts_with("## ") && engram_core::extract_ids(line).is_empty()
        })
        .map(|(n, _)| n)
        .collect();
    if needs.is_empty() {
        return Ok(0);
    }

    // Floor above anything already in this doc, then reserve in one go
    let max = max_id_per_category([text.as_str()]);
    if let Some(existing) = max.get(&category) {
        store.bump_counter_floor(category, existing + 1)?;
    }
    let range = store.reserve_ids(category, needs.len() as u64)?;

    let mut numbers = range.numbers();
    let rewritten: Vec<String> = text
        .lines()
        .enumerate()
        .map(|(n, line)| {
            if needs.contains(&n) {
                match numbers.next() {
                    Some(number) => {
                        let title = line.trim_start_matches("## ").trim();
                        format!("## {} {title}", EntityId::new(category, number))
                    }
                    None => line.to_string(),
                }
            } else {
                line.to_string()
            }
        })
        .collect();

    let mut out = rewritten.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(needs.len())
}

#[cfg(test)]
#[path = "migrate_tests.rs"]
mod tests;
