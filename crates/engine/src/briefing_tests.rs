// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::TestProject;

// ── Section replacement ──────────────────────────────────────────────────────

#[test]
fn regenerate_rewrites_only_the_configured_section() {
    let project = TestProject::new();
    project.write(
        "CLAUDE.md",
        "# Project guide\n\nIntro prose.\n\n## Project briefing\n\nstale summary\n\n## Build\n\ncargo build\n",
    );
    project.write(
        "docs/knowledge/concepts.md",
        "# Concepts\n\n## C001 Parser\nCode: `src/parse.rs`\n\n## C002 Queue\nCode: `src/q.rs`\n",
    );

    SectionBriefing
        .regenerate(&project.config, &project.paths)
        .unwrap();

    let text = project.read("CLAUDE.md");
    assert!(text.contains("Intro prose."));
    assert!(text.contains("## Build"));
    assert!(text.contains("cargo build"));
    assert!(!text.contains("stale summary"));
    assert!(text.contains("concept reference(s)"));
}

#[test]
fn missing_section_is_appended() {
    let project = TestProject::new();
    project.write("CLAUDE.md", "# Project guide\n");

    SectionBriefing
        .regenerate(&project.config, &project.paths)
        .unwrap();

    let text = project.read("CLAUDE.md");
    assert!(text.contains("# Project guide"));
    assert!(text.contains("## Project briefing"));
}

#[test]
fn missing_file_is_created() {
    let project = TestProject::new();

    SectionBriefing
        .regenerate(&project.config, &project.paths)
        .unwrap();

    assert!(project.read("CLAUDE.md").contains("## Project briefing"));
}

#[test]
fn replace_section_keeps_subsections_out() {
    let text = "## Project briefing\n\nold\n\n### Detail\n\nkept? no\n\n## Next\n\nyes\n";
    let out = replace_section(text, "## Project briefing", "new\n");
    assert!(out.contains("new"));
    assert!(!out.contains("old"));
    // Subsections of the replaced section go with it
    assert!(!out.contains("### Detail"));
    assert!(out.contains("## Next"));
    assert!(out.contains("yes"));
}
