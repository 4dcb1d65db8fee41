// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier pre-assignment.
//!
//! Chunks carry their identifier ranges up front; the fold agent uses only
//! those. Before each reservation the counters are floored above the
//! maximum id already present in the living docs, so externally edited
//! docs can never collide with a fresh reservation. Over-reserved ids are
//! simply skipped forever: monotonicity is the whole discipline.

use crate::EngineError;
use engram_core::{max_id_per_category, Category, Config, Event, IdRange};
use engram_storage::StateStore;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// How many new entries a planned chunk is likely to create.
///
/// Documents and issues tend to introduce concepts; issues also raise
/// claims; sessions surface workflows. A heuristic, deliberately generous:
/// unused ids cost nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewEntryEstimate {
    pub documents: usize,
    pub issues: usize,
    pub sessions: usize,
}

impl NewEntryEstimate {
    fn wanted(&self, category: Category, cap: u64) -> u64 {
        let raw = match category {
            Category::Concept => self.documents + self.issues,
            Category::Epistemic => self.issues,
            Category::Workflow => self.sessions,
        } as u64;
        raw.min(cap)
    }
}

/// Ranges reserved for one chunk, by category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreAssigned {
    pub ranges: BTreeMap<Category, IdRange>,
}

impl PreAssigned {
    /// Chunk-header lines, e.g. `- C: C013-C020`.
    pub fn header_lines(&self) -> Vec<String> {
        Category::ALL
            .iter()
            .map(|category| {
                let range = self
                    .ranges
                    .get(category)
                    .copied()
                    .unwrap_or(IdRange::new(0, 0));
                format!("- {}: {}", category.code(), range.render(*category))
            })
            .collect()
    }
}

/// Reserve identifier ranges for a chunk in one transaction.
///
/// Scans the living docs for the max existing id per category, floors each
/// counter to `max + 1`, then reserves the estimated count: floors and
/// reservations commit as a single batch.
pub fn pre_assign(
    store: &mut StateStore,
    config: &Config,
    root: &Path,
    estimate: &NewEntryEstimate,
) -> Result<PreAssigned, EngineError> {
    let texts: Vec<String> = config
        .living_docs
        .paths(root)
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .collect();
    let max_in_docs = max_id_per_category(texts.iter().map(String::as_str));

    let mut events = Vec::new();
    let mut ranges = BTreeMap::new();

    for category in Category::ALL {
        let mut next = store.state().next_id(category);
        if let Some(max) = max_in_docs.get(&category) {
            let floor = max + 1;
            if floor > next {
                events.push(Event::CounterFloorBumped {
                    category,
                    min_next: floor,
                });
                next = floor;
            }
        }

        let len = estimate.wanted(category, config.budget.max_new_ids_per_category);
        if len > 0 {
            events.push(Event::IdsReserved {
                category,
                start: next,
                len,
            });
        }
        ranges.insert(category, IdRange::new(next, len));
    }

    store.commit(events)?;
    debug!(?ranges, "pre-assigned identifier ranges");
    Ok(PreAssigned { ranges })
}

#[cfg(test)]
#[path = "allocator_tests.rs"]
mod tests;
