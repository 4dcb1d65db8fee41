// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `claude-code` session history parsing.
//!
//! The history is JSON lines; each record carries `sessionId`, `cwd`, an
//! ISO `timestamp`, and a user prompt under `display` or
//! `message.content`. Records are grouped into sessions by id and rendered
//! as one markdown document per session.

use super::{SessionDraft, SessionFormat};
use crate::AdapterError;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

#[derive(Debug)]
pub(super) struct ClaudeCodeFormat;

struct PromptLine {
    date: NaiveDate,
    text: String,
}

impl SessionFormat for ClaudeCodeFormat {
    fn parse(
        &self,
        history_file: &Path,
        project_match: &str,
    ) -> Result<Vec<SessionDraft>, AdapterError> {
        if !history_file.is_file() {
            return Err(AdapterError::HistoryNotFound(history_file.to_path_buf()));
        }
        let text = std::fs::read_to_string(history_file)?;

        // BTreeMap keeps session order stable across runs
        let mut sessions: BTreeMap<String, Vec<PromptLine>> = BTreeMap::new();
        let mut skipped = 0usize;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_line(trimmed, project_match) {
                LineResult::Prompt { session_id, prompt } => {
                    sessions.entry(session_id).or_default().push(prompt);
                }
                LineResult::OtherProject => {}
                LineResult::Malformed => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(
                path = %history_file.display(),
                skipped,
                "skipped malformed session history lines",
            );
        }

        Ok(sessions
            .into_iter()
            .filter_map(|(id, prompts)| render_session(id, prompts))
            .collect())
    }
}

enum LineResult {
    Prompt {
        session_id: String,
        prompt: PromptLine,
    },
    OtherProject,
    Malformed,
}

fn parse_line(line: &str, project_match: &str) -> LineResult {
    let Ok(value) = serde_json::from_str::<Value>(line) else {
        return LineResult::Malformed;
    };

    let Some(cwd) = value.get("cwd").and_then(Value::as_str) else {
        return LineResult::Malformed;
    };
    if !cwd.contains(project_match) {
        return LineResult::OtherProject;
    }

    let Some(session_id) = value.get("sessionId").and_then(Value::as_str) else {
        return LineResult::Malformed;
    };
    let Some(date) = value
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|ts| ts.get(..10))
        .and_then(|d| d.parse::<NaiveDate>().ok())
    else {
        return LineResult::Malformed;
    };

    let text = value
        .get("display")
        .and_then(Value::as_str)
        .or_else(|| {
            value
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(Value::as_str)
        })
        .unwrap_or_default()
        .trim()
        .to_string();
    if text.is_empty() {
        return LineResult::Malformed;
    }

    LineResult::Prompt {
        session_id: session_id.to_string(),
        prompt: PromptLine { date, text },
    }
}

fn render_session(id: String, prompts: Vec<PromptLine>) -> Option<SessionDraft> {
    let date = prompts.first()?.date;
    let mut rendered = format!("### Session {id} ({date})\n");
    for (n, prompt) in prompts.iter().enumerate() {
        rendered.push_str(&format!("\nPrompt {}:\n{}\n", n + 1, prompt.text));
    }
    Some(SessionDraft { id, date, rendered })
}
