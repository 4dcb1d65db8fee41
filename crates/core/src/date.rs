// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logical-date parsing and strict validation.
//!
//! Logical dates are bare `YYYY-MM-DD` strings. Validation is strict on
//! length: an ISO datetime like `2026-01-01T00:00:00Z` would silently
//! exclude same-day entries via prefix comparison, so anything other than a
//! 10-character calendar date is rejected.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors from logical-date parsing
#[derive(Debug, Error)]
pub enum DateError {
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    Invalid(String),
}

/// Parse a strict `YYYY-MM-DD` logical date.
pub fn parse_logical_date(s: &str) -> Result<NaiveDate, DateError> {
    if s.len() != 10 {
        return Err(DateError::Invalid(s.to_string()));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| DateError::Invalid(s.to_string()))
}

/// Extract a date from a `YYYY-MM-DD-*` filename prefix.
pub fn date_from_filename(name: &str) -> Option<NaiveDate> {
    let prefix = name.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Extract a `date:` value from a leading YAML frontmatter block.
///
/// Returns `None` when there is no frontmatter or no parseable date; the
/// caller falls back to filename and then git dates.
pub fn date_from_frontmatter(text: &str) -> Option<NaiveDate> {
    let mut lines = text.lines();
    if lines.next()?.trim() != "---" {
        return None;
    }
    for line in lines {
        let trimmed = line.trim();
        if trimmed == "---" {
            return None;
        }
        if let Some(value) = trimmed.strip_prefix("date:") {
            return parse_logical_date(value.trim()).ok();
        }
    }
    None
}

#[cfg(test)]
#[path = "date_tests.rs"]
mod tests;
