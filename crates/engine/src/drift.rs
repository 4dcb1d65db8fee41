// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drift scanner: where have the living docs fallen out of agreement with
//! reality?
//!
//! Four metrics, evaluated against configurable thresholds. The docs are
//! parsed with line regexes only: identifiers map to source locations, no
//! object graph is built. With a fold-from marker set, orphan existence
//! checks resolve against the repository tree at that date instead of
//! today's filesystem.

use crate::{EngineError, EngramPaths};
use chrono::{DateTime, NaiveDate, Utc};
use engram_adapters::git;
use engram_core::{Config, DriftType, EntityId, Thresholds};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

#[allow(clippy::expect_used)]
static ENTRY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^##\s+([CEW]\d{3,})\s*(.*)$").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static CODE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static EVIDENCE_SHA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Evidence@([0-9a-f]{7,40})\b").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static HISTORY_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s+(\d{4}-\d{2}-\d{2})\b").expect("constant regex pattern is valid")
});

/// An ACTIVE concept whose every code path reference is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanedConcept {
    pub id: EntityId,
    pub title: String,
    pub code_paths: Vec<String>,
}

/// A contested or unverified claim with its last recognized activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleClaim {
    pub id: EntityId,
    pub title: String,
    pub status: String,
    pub last_touched: Option<NaiveDate>,
}

/// Scanner output, plus the temporal reference actually used.
#[derive(Debug, Clone, Default)]
pub struct DriftReport {
    pub orphaned: Vec<OrphanedConcept>,
    pub contested: Vec<StaleClaim>,
    pub stale_unverified: Vec<StaleClaim>,
    pub current_workflows: usize,
    /// Resolved commit when scanning at a historical reference point
    pub ref_commit: Option<String>,
    pub ref_date: Option<NaiveDate>,
}

impl DriftReport {
    /// Drift types over threshold, in fixed priority order.
    pub fn triggered(&self, thresholds: &Thresholds) -> Vec<DriftType> {
        DriftType::PRIORITY
            .into_iter()
            .filter(|drift| match drift {
                DriftType::OrphanedConcepts => self.orphaned.len() > thresholds.orphan_triage,
                DriftType::ContestedClaims => {
                    self.contested.len() > thresholds.contested_review_threshold
                }
                DriftType::StaleUnverified => {
                    self.stale_unverified.len() > thresholds.stale_unverified_threshold
                }
                DriftType::WorkflowRepetition => {
                    self.current_workflows > thresholds.workflow_repetition
                }
            })
            .collect()
    }
}

/// Run all four metrics.
pub async fn scan_drift(
    config: &Config,
    paths: &EngramPaths,
    fold_from: Option<NaiveDate>,
) -> Result<DriftReport, EngineError> {
    let root = paths.root();
    let mut report = DriftReport::default();

    // Temporal reference: resolution failure falls back to the filesystem
    if let Some(date) = fold_from {
        match git::resolve_commit_before(root, date).await {
            Ok(Some(commit)) => {
                report.ref_commit = Some(commit);
                report.ref_date = Some(date);
            }
            Ok(None) => {
                warn!(
                    %date,
                    "no commit on or before the fold-from date; orphan checks fall back to the filesystem",
                );
            }
            Err(e) => {
                warn!(%date, error = %e, "fold-from resolution failed; orphan checks fall back to the filesystem");
            }
        }
    }

    report.orphaned =
        scan_orphans(root, &root.join(&config.living_docs.concepts), report.ref_commit.as_deref())
            .await?;

    let now = Utc::now().date_naive();
    let mut evidence_cache = EvidenceCache::default();
    let claims = scan_claims(
        root,
        &root.join(&config.living_docs.epistemic),
        &mut evidence_cache,
    )
    .await?;
    for claim in claims {
        let Some(age) = claim.last_touched.map(|d| (now - d).num_days()) else {
            // No recognizable timestamp: ignored for recency
            continue;
        };
        match claim.status.as_str() {
            "contested" if age > config.thresholds.contested_review_days => {
                report.contested.push(claim);
            }
            "unverified" if age > config.thresholds.stale_unverified_days => {
                report.stale_unverified.push(claim);
            }
            _ => {}
        }
    }

    report.current_workflows = count_current_workflows(&root.join(&config.living_docs.workflows));

    Ok(report)
}

/// ACTIVE concepts whose every code path is missing.
async fn scan_orphans(
    root: &Path,
    concepts_doc: &Path,
    ref_commit: Option<&str>,
) -> Result<Vec<OrphanedConcept>, EngineError> {
    let Ok(text) = std::fs::read_to_string(concepts_doc) else {
        return Ok(Vec::new());
    };

    let mut orphans = Vec::new();
    for entry in parse_entries(&text) {
        if entry.id.category != engram_core::Category::Concept {
            continue;
        }
        if entry.field("Status:").as_deref() != Some("ACTIVE") {
            continue;
        }
        let code_paths = entry.code_paths();
        if code_paths.is_empty() {
            continue;
        }

        let mut any_alive = false;
        for code_path in &code_paths {
            let alive = match ref_commit {
                Some(commit) => {
                    git::path_exists_at(root, commit, Path::new(code_path)).await?
                }
                None => root.join(code_path).exists(),
            };
            if alive {
                any_alive = true;
                break;
            }
        }
        if !any_alive {
            orphans.push(OrphanedConcept {
                id: entry.id,
                title: entry.title.clone(),
                code_paths,
            });
        }
    }
    Ok(orphans)
}

/// Memoized `Evidence@sha` resolution, one process per sha per run.
#[derive(Default)]
struct EvidenceCache {
    times: HashMap<String, Option<DateTime<Utc>>>,
}

impl EvidenceCache {
    async fn resolve(&mut self, root: &Path, sha: &str) -> Option<DateTime<Utc>> {
        if let Some(cached) = self.times.get(sha) {
            return *cached;
        }
        let time = git::commit_time(root, sha).await;
        self.times.insert(sha.to_string(), time);
        time
    }
}

async fn scan_claims(
    root: &Path,
    epistemic_doc: &Path,
    cache: &mut EvidenceCache,
) -> Result<Vec<StaleClaim>, EngineError> {
    let Ok(text) = std::fs::read_to_string(epistemic_doc) else {
        return Ok(Vec::new());
    };

    let mut claims = Vec::new();
    for entry in parse_entries(&text) {
        if entry.id.category != engram_core::Category::Epistemic {
            continue;
        }
        let Some(status) = entry.field("Status:") else {
            continue;
        };

        let mut last: Option<NaiveDate> = None;
        for line in &entry.body {
            let touched = if let Some(cap) = HISTORY_DATE.captures(line) {
                cap.get(1).and_then(|m| m.as_str().parse().ok())
            } else if let Some(cap) = EVIDENCE_SHA.captures(line) {
                match cap.get(1) {
                    Some(sha) => cache
                        .resolve(root, sha.as_str())
                        .await
                        .map(|t| t.date_naive()),
                    None => None,
                }
            } else {
                // Lines without recognizable timestamps are ignored
                None
            };
            if let Some(date) = touched {
                last = Some(last.map_or(date, |l| l.max(date)));
            }
        }

        claims.push(StaleClaim {
            id: entry.id,
            title: entry.title.clone(),
            status,
            last_touched: last,
        });
    }
    Ok(claims)
}

fn count_current_workflows(workflows_doc: &Path) -> usize {
    let Ok(text) = std::fs::read_to_string(workflows_doc) else {
        return 0;
    };
    parse_entries(&text)
        .into_iter()
        .filter(|e| e.id.category == engram_core::Category::Workflow)
        .filter(|e| e.field("Status:").as_deref() == Some("CURRENT"))
        .count()
}

struct DocEntry {
    id: EntityId,
    title: String,
    body: Vec<String>,
}

impl DocEntry {
    fn field(&self, name: &str) -> Option<String> {
        self.body.iter().find_map(|line| {
            line.trim()
                .strip_prefix(name)
                .map(|rest| rest.trim().to_string())
        })
    }

    fn code_paths(&self) -> Vec<String> {
        self.body
            .iter()
            .filter(|line| line.trim_start().starts_with("Code:"))
            .flat_map(|line| {
                CODE_PATH
                    .captures_iter(line)
                    .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            })
            .collect()
    }
}

/// Flat split of a living doc into identified `## ` entries.
///
/// Unidentified headings still close the previous entry so stray prose
/// never leaks into another entry's body.
fn parse_entries(text: &str) -> Vec<DocEntry> {
    let mut raw: Vec<(Option<EntityId>, String, Vec<String>)> = Vec::new();
    for line in text.lines() {
        if line.starts_with("## ") {
            let parsed = ENTRY_HEADING.captures(line).and_then(|cap| {
                let id = engram_core::extract_ids(cap.get(1)?.as_str())
                    .into_iter()
                    .next()?;
                let title = cap.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
                Some((id, title))
            });
            match parsed {
                Some((id, title)) => raw.push((Some(id), title, Vec::new())),
                None => raw.push((None, String::new(), Vec::new())),
            }
        } else if let Some(last) = raw.last_mut() {
            last.2.push(line.to_string());
        }
    }
    raw.into_iter()
        .filter_map(|(id, title, body)| id.map(|id| DocEntry { id, title, body }))
        .collect()
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod tests;
