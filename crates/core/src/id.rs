// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable per-category identifiers.
//!
//! Living docs cross-reference entries by identifiers like `C042` or `E007`.
//! The number space is per-category, monotonic, and never reused; ranges are
//! reserved up front by the allocator and embedded in chunk headers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Identifier category, one counter per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// `C`: concept registry entries
    Concept,
    /// `E`: epistemic (claim) entries
    Epistemic,
    /// `W`: workflow registry entries
    Workflow,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Concept, Category::Epistemic, Category::Workflow];

    /// Single-letter code used in rendered identifiers.
    pub fn code(&self) -> char {
        match self {
            Category::Concept => 'C',
            Category::Epistemic => 'E',
            Category::Workflow => 'W',
        }
    }

    pub fn from_code(c: char) -> Option<Category> {
        match c {
            'C' => Some(Category::Concept),
            'E' => Some(Category::Epistemic),
            'W' => Some(Category::Workflow),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Concept => write!(f, "concept"),
            Category::Epistemic => write!(f, "epistemic"),
            Category::Workflow => write!(f, "workflow"),
        }
    }
}

/// A rendered stable identifier, e.g. `C042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub category: Category,
    pub number: u64,
}

impl EntityId {
    pub fn new(category: Category, number: u64) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.code(), self.number)
    }
}

/// A contiguous reserved identifier range `[start, start + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub start: u64,
    pub len: u64,
}

impl IdRange {
    pub fn new(start: u64, len: u64) -> Self {
        Self { start, len }
    }

    /// First number past the range.
    pub fn end(&self) -> u64 {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn numbers(&self) -> impl Iterator<Item = u64> {
        self.start..self.end()
    }

    pub fn contains(&self, n: u64) -> bool {
        n >= self.start && n < self.end()
    }

    /// Render for chunk headers: `C013-C020`, or `(none)` when empty.
    pub fn render(&self, category: Category) -> String {
        if self.is_empty() {
            "(none)".to_string()
        } else if self.len == 1 {
            EntityId::new(category, self.start).to_string()
        } else {
            format!(
                "{}-{}",
                EntityId::new(category, self.start),
                EntityId::new(category, self.end() - 1)
            )
        }
    }
}

#[allow(clippy::expect_used)]
static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([CEW])(\d{3,})\b").expect("constant regex pattern is valid"));

/// Extract every identifier occurrence from opaque markdown text.
///
/// This is the only way the system reads the living docs' reference graph:
/// a flat scan, no in-memory object graph.
pub fn extract_ids(text: &str) -> Vec<EntityId> {
    ID_PATTERN
        .captures_iter(text)
        .filter_map(|cap| {
            let code = cap.get(1)?.as_str().chars().next()?;
            let number: u64 = cap.get(2)?.as_str().parse().ok()?;
            Some(EntityId::new(Category::from_code(code)?, number))
        })
        .collect()
}

/// Maximum identifier number in use per category across the given texts.
///
/// Categories with no occurrences are absent from the map.
pub fn max_id_per_category<'a>(texts: impl IntoIterator<Item = &'a str>) -> HashMap<Category, u64> {
    let mut max: HashMap<Category, u64> = HashMap::new();
    for text in texts {
        for id in extract_ids(text) {
            let entry = max.entry(id.category).or_insert(0);
            *entry = (*entry).max(id.number);
        }
    }
    max
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
