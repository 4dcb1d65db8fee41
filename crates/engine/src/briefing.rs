// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! L0 briefing regeneration.
//!
//! Regeneration is external to the pipeline core: the server loop only
//! decides *when* (staleness set and queue drained). The default generator
//! rewrites one section of the briefing target with a compressed summary of
//! the living docs.

use crate::{EngineError, EngramPaths};
use engram_core::{extract_ids, Category, Config};
use tracing::info;

/// Regenerates the compressed briefing from the living docs.
pub trait BriefingGenerator: Send + Sync {
    fn regenerate(&self, config: &Config, paths: &EngramPaths) -> Result<(), EngineError>;
}

/// Default generator: entry counts and titles into the configured section.
#[derive(Debug, Default)]
pub struct SectionBriefing;

impl BriefingGenerator for SectionBriefing {
    fn regenerate(&self, config: &Config, paths: &EngramPaths) -> Result<(), EngineError> {
        let root = paths.root();
        let mut counts = [0usize; 3];
        for path in config.living_docs.paths(root) {
            let Ok(text) = std::fs::read_to_string(&path) else {
                continue;
            };
            for id in extract_ids(&text) {
                match id.category {
                    Category::Concept => counts[0] += 1,
                    Category::Epistemic => counts[1] += 1,
                    Category::Workflow => counts[2] += 1,
                }
            }
        }

        let body = format!(
            "Knowledge base: {} concept reference(s), {} claim reference(s), \
             {} workflow reference(s) across the living docs under \
             `{}`.\n",
            counts[0],
            counts[1],
            counts[2],
            config
                .living_docs
                .timeline
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ".".to_string()),
        );

        let target = root.join(&config.briefing.file);
        let existing = std::fs::read_to_string(&target).unwrap_or_default();
        let updated = replace_section(&existing, &config.briefing.section, &body);
        std::fs::write(&target, updated)?;

        info!(file = %config.briefing.file.display(), "L0 briefing regenerated");
        Ok(())
    }
}

/// Replace the section under `heading` with `body`, appending the section
/// when the file never had it.
fn replace_section(text: &str, heading: &str, body: &str) -> String {
    let level = heading.chars().take_while(|c| *c == '#').count().max(1);
    let mut out = String::new();
    let mut in_section = false;
    let mut replaced = false;

    for line in text.lines() {
        if line.trim_end() == heading {
            in_section = true;
            replaced = true;
            out.push_str(line);
            out.push_str("\n\n");
            out.push_str(body);
            continue;
        }
        if in_section {
            let is_heading = line.starts_with('#')
                && line.chars().take_while(|c| *c == '#').count() <= level;
            if is_heading {
                in_section = false;
            } else {
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }

    if !replaced {
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(heading);
        out.push_str("\n\n");
        out.push_str(body);
    }
    out
}

#[cfg(test)]
#[path = "briefing_tests.rs"]
mod tests;
