//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for running the engram binary against a throwaway
//! project directory.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Returns the path to the engram binary next to the test binary.
fn engram_binary() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let standard = manifest_dir.join("target/debug/engram");
    if standard.exists() {
        return standard;
    }

    // Fallback: resolve relative to the test binary itself. It lives at
    // target/debug/deps/specs-<hash>, so its grandparent is target/debug/.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("engram");
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// Fluent builder for one CLI run.
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
}

pub fn cli() -> CliBuilder {
    CliBuilder {
        args: Vec::new(),
        dir: None,
    }
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    fn output(self) -> Output {
        let mut cmd = Command::new(engram_binary());
        cmd.args(&self.args);
        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }
        cmd.env("RUST_LOG", "warn");
        cmd.output().expect("engram binary should run")
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.output();
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.output();
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    /// Prefer this for format specs - it catches format regressions.
    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = self.stdout();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }
}

/// Temporary test project directory with helper methods.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    /// Create an empty project
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Create an initialized project (`engram init` already run)
    pub fn initialized() -> Self {
        let project = Self::empty();
        project.engram().args(&["init"]).passes();
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file (parent directories created automatically)
    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full_path, content).unwrap();
    }

    pub fn read(&self, path: impl AsRef<Path>) -> String {
        std::fs::read_to_string(self.dir.path().join(path.as_ref())).unwrap()
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.dir.path().join(path.as_ref()).exists()
    }

    /// Initialize a git repository
    pub fn git_init(&self) {
        for args in [
            &["init", "-q", "-b", "main"][..],
            &["config", "user.email", "spec@example.com"],
            &["config", "user.name", "Spec"],
        ] {
            let status = Command::new("git")
                .arg("-C")
                .arg(self.path())
                .args(args)
                .status()
                .unwrap();
            assert!(status.success());
        }
    }

    /// Commit a file with a controlled date
    pub fn git_commit_file(&self, rel: &str, content: &str, date: &str) {
        self.file(rel, content);
        let timestamp = format!("{date}T12:00:00");
        for args in [&["add", rel][..], &["commit", "-q", "-m", "edit"]] {
            let status = Command::new("git")
                .arg("-C")
                .arg(self.path())
                .args(args)
                .env("GIT_COMMITTER_DATE", &timestamp)
                .env("GIT_AUTHOR_DATE", &timestamp)
                .status()
                .unwrap();
            assert!(status.success());
        }
    }

    /// Run engram in this project's directory
    pub fn engram(&self) -> CliBuilder {
        cli().pwd(self.path())
    }
}
