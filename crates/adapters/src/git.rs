// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git subprocess queries.
//!
//! All calls are synchronous from the pipeline's point of view: the single
//! cooperative task awaits each subprocess to completion. Queries are
//! bounded by [`GIT_TIMEOUT`]; the repository is always addressed through
//! `-C <root>` so the working directory never matters.

use crate::AdapterError;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

/// Default timeout for git queries.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for git worktree operations.
pub const GIT_WORKTREE_TIMEOUT: Duration = Duration::from_secs(60);

/// Run a git subcommand with a timeout, failing on non-zero exit.
async fn run_git(
    root: &Path,
    args: &[&str],
    timeout: Duration,
    operation: &str,
) -> Result<String, AdapterError> {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(root).args(args);
    let output = run_with_timeout(cmd, timeout, operation).await?;
    if !output.status.success() {
        return Err(AdapterError::Git {
            operation: operation.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`; the child process
/// is killed automatically when the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, AdapterError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(AdapterError::Git {
            operation: description.to_string(),
            message: io_err.to_string(),
        }),
        Err(_elapsed) => Err(AdapterError::Git {
            operation: description.to_string(),
            message: format!("timed out after {}s", timeout.as_secs()),
        }),
    }
}

/// Date of the first commit touching `path`, if any.
///
/// Unborn branches and non-repository roots yield `None`: the caller
/// treats undatable documents as skippable, not fatal.
pub async fn first_commit_date(root: &Path, path: &Path) -> Result<Option<NaiveDate>, AdapterError> {
    let out = match run_git(
        root,
        &[
            "log",
            "--reverse",
            "--format=%cs",
            "--",
            &path.to_string_lossy(),
        ],
        GIT_TIMEOUT,
        "log --reverse",
    )
    .await
    {
        Ok(out) => out,
        Err(AdapterError::Git { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    Ok(out.lines().next().and_then(|l| l.trim().parse().ok()))
}

/// Date of the most recent commit touching `path`, if any.
pub async fn last_commit_date(root: &Path, path: &Path) -> Result<Option<NaiveDate>, AdapterError> {
    let out = match run_git(
        root,
        &["log", "-1", "--format=%cs", "--", &path.to_string_lossy()],
        GIT_TIMEOUT,
        "log -1",
    )
    .await
    {
        Ok(out) => out,
        Err(AdapterError::Git { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    Ok(out.lines().next().and_then(|l| l.trim().parse().ok()))
}

/// Resolve the most recent commit on or before the given date.
///
/// `--before` is exclusive of midnight, so the day after is passed to make
/// the reference date inclusive. Returns `None` when the repository has no
/// commit that early.
pub async fn resolve_commit_before(
    root: &Path,
    date: NaiveDate,
) -> Result<Option<String>, AdapterError> {
    let next_day = date + chrono::Days::new(1);
    let out = run_git(
        root,
        &[
            "log",
            &format!("--before={next_day}"),
            "-1",
            "--format=%H",
        ],
        GIT_TIMEOUT,
        "log --before",
    )
    .await?;
    let hash = out.trim();
    if hash.is_empty() {
        Ok(None)
    } else {
        Ok(Some(hash.to_string()))
    }
}

/// Whether `path` existed in the tree of the given commit.
pub async fn path_exists_at(
    root: &Path,
    commit: &str,
    path: &Path,
) -> Result<bool, AdapterError> {
    let out = run_git(
        root,
        &["ls-tree", commit, "--", &path.to_string_lossy()],
        GIT_TIMEOUT,
        "ls-tree",
    )
    .await?;
    Ok(!out.trim().is_empty())
}

/// Commit time for a sha, as UTC. `None` when the sha does not resolve.
pub async fn commit_time(root: &Path, sha: &str) -> Option<DateTime<Utc>> {
    let out = run_git(
        root,
        &["show", "-s", "--format=%ct", sha],
        GIT_TIMEOUT,
        "show -s",
    )
    .await
    .ok()?;
    let secs: i64 = out.trim().parse().ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// Subjects of the most recent `n` commits, newest first.
///
/// Empty on any failure (fresh repositories have no log).
pub async fn recent_subjects(root: &Path, n: usize) -> Vec<String> {
    match run_git(
        root,
        &["log", "-n", &n.to_string(), "--format=%s"],
        GIT_TIMEOUT,
        "log --format=%s",
    )
    .await
    {
        Ok(out) => out.lines().map(str::to_string).collect(),
        Err(e) => {
            warn!(error = %e, "could not read recent commit subjects");
            Vec::new()
        }
    }
}

/// Current HEAD commit hash, if the repository has one.
pub async fn head_commit(root: &Path) -> Result<Option<String>, AdapterError> {
    match run_git(root, &["rev-parse", "HEAD"], GIT_TIMEOUT, "rev-parse").await {
        Ok(out) => Ok(Some(out.trim().to_string())),
        // Unborn branch: no commits yet
        Err(AdapterError::Git { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Paths changed between `cursor` and HEAD (all tracked files when the
/// cursor is absent).
pub async fn changed_paths_since(
    root: &Path,
    cursor: Option<&str>,
) -> Result<Vec<String>, AdapterError> {
    let out = match cursor {
        Some(cursor) => {
            run_git(
                root,
                &["diff", "--name-only", &format!("{cursor}..HEAD")],
                GIT_TIMEOUT,
                "diff --name-only",
            )
            .await?
        }
        None => run_git(root, &["ls-files"], GIT_TIMEOUT, "ls-files").await?,
    };
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Create an ephemeral worktree at `dest` checked out at `commit`.
pub async fn worktree_add(root: &Path, dest: &Path, commit: &str) -> Result<(), AdapterError> {
    run_git(
        root,
        &[
            "worktree",
            "add",
            "--detach",
            &dest.to_string_lossy(),
            commit,
        ],
        GIT_WORKTREE_TIMEOUT,
        "worktree add",
    )
    .await?;
    Ok(())
}

/// Remove a worktree created by [`worktree_add`].
pub async fn worktree_remove(root: &Path, dest: &Path) -> Result<(), AdapterError> {
    run_git(
        root,
        &["worktree", "remove", "--force", &dest.to_string_lossy()],
        GIT_WORKTREE_TIMEOUT,
        "worktree remove",
    )
    .await?;
    Ok(())
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
