// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::TestProject;

// ── Counter floor ────────────────────────────────────────────────────────────

#[test]
fn reservations_start_above_ids_already_in_docs() {
    let project = TestProject::new();
    project.write(
        "docs/knowledge/concepts.md",
        "# Concepts\n\n## C042 Externally added\nCode: `a.rs`\n",
    );
    let mut store = project.store();

    let assigned = pre_assign(
        &mut store,
        &project.config,
        project.root(),
        &NewEntryEstimate {
            documents: 2,
            ..Default::default()
        },
    )
    .unwrap();

    let range = assigned.ranges[&Category::Concept];
    // Property: no returned id collides with C042 or anything below it
    assert_eq!(range.start, 43);
    assert_eq!(range.len, 2);
    assert_eq!(store.state().next_id(Category::Concept), 45);
}

#[test]
fn floor_scan_covers_every_living_doc() {
    let project = TestProject::new();
    project.write(
        "docs/knowledge/timeline.md",
        "# Timeline\n\nOn 2026-01-01 we built W020 end to end.\n",
    );
    let mut store = project.store();

    let assigned = pre_assign(
        &mut store,
        &project.config,
        project.root(),
        &NewEntryEstimate {
            sessions: 1,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(assigned.ranges[&Category::Workflow].start, 21);
}

// ── Estimation ───────────────────────────────────────────────────────────────

#[test]
fn estimates_map_kinds_to_categories() {
    let project = TestProject::new();
    let mut store = project.store();

    let assigned = pre_assign(
        &mut store,
        &project.config,
        project.root(),
        &NewEntryEstimate {
            documents: 2,
            issues: 3,
            sessions: 1,
        },
    )
    .unwrap();

    assert_eq!(assigned.ranges[&Category::Concept].len, 5); // docs + issues
    assert_eq!(assigned.ranges[&Category::Epistemic].len, 3); // issues
    assert_eq!(assigned.ranges[&Category::Workflow].len, 1); // sessions
}

#[test]
fn estimates_are_capped_by_config() {
    let project = TestProject::new();
    let mut store = project.store();

    let assigned = pre_assign(
        &mut store,
        &project.config,
        project.root(),
        &NewEntryEstimate {
            documents: 100,
            issues: 100,
            sessions: 100,
        },
    )
    .unwrap();

    let cap = project.config.budget.max_new_ids_per_category;
    for category in Category::ALL {
        assert_eq!(assigned.ranges[&category].len, cap);
    }
}

#[test]
fn empty_estimate_reserves_nothing() {
    let project = TestProject::new();
    let mut store = project.store();

    let assigned = pre_assign(
        &mut store,
        &project.config,
        project.root(),
        &NewEntryEstimate::default(),
    )
    .unwrap();

    for category in Category::ALL {
        assert!(assigned.ranges[&category].is_empty());
        assert_eq!(store.state().next_id(category), 1);
    }
}

// ── Disjointness ─────────────────────────────────────────────────────────────

#[test]
fn successive_chunks_get_disjoint_ranges() {
    let project = TestProject::new();
    let mut store = project.store();
    let estimate = NewEntryEstimate {
        documents: 3,
        ..Default::default()
    };

    let first = pre_assign(&mut store, &project.config, project.root(), &estimate).unwrap();
    let second = pre_assign(&mut store, &project.config, project.root(), &estimate).unwrap();

    let a = first.ranges[&Category::Concept];
    let b = second.ranges[&Category::Concept];
    assert!(a.end() <= b.start);
}

// ── Header rendering ─────────────────────────────────────────────────────────

#[test]
fn header_lines_render_all_categories() {
    let project = TestProject::new();
    let mut store = project.store();

    let assigned = pre_assign(
        &mut store,
        &project.config,
        project.root(),
        &NewEntryEstimate {
            documents: 8,
            ..Default::default()
        },
    )
    .unwrap();

    let lines = assigned.header_lines();
    assert_eq!(lines[0], "- C: C001-C008");
    assert_eq!(lines[1], "- E: (none)");
    assert_eq!(lines[2], "- W: (none)");
}
