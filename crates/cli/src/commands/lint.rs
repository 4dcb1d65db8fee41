// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `engram lint`

use crate::exit_error::ExitError;
use anyhow::Result;
use engram_adapters::{HeaderLinter, SchemaLinter};
use engram_core::Config;
use std::path::Path;

pub fn run(root: &Path) -> Result<()> {
    let config = Config::load(root)?;
    let docs = config.all_doc_paths(root);

    let report = HeaderLinter.lint(&docs)?;
    if report.passed() {
        println!("Lint passed: {} document(s) clean", docs.len());
        return Ok(());
    }

    for violation in &report.violations {
        println!("{violation}");
    }
    Err(ExitError::new(
        1,
        format!("{} schema violation(s)", report.violations.len()),
    )
    .into())
}
