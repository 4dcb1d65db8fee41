// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── Reservation ──────────────────────────────────────────────────────────────

#[test]
fn fresh_counter_starts_at_one() {
    let state = EngramState::default();
    assert_eq!(state.next_id(Category::Concept), 1);
}

#[test]
fn reservation_advances_counter() {
    let mut state = EngramState::default();
    state.apply_event(&Event::IdsReserved {
        category: Category::Concept,
        start: 1,
        len: 5,
    });
    assert_eq!(state.next_id(Category::Concept), 6);
    // Other categories are untouched
    assert_eq!(state.next_id(Category::Epistemic), 1);
}

#[test]
fn reservation_replay_is_idempotent() {
    let mut state = EngramState::default();
    let event = Event::IdsReserved {
        category: Category::Workflow,
        start: 1,
        len: 3,
    };
    state.apply_event(&event);
    state.apply_event(&event);
    assert_eq!(state.next_id(Category::Workflow), 4);
}

// ── Floor bump ───────────────────────────────────────────────────────────────

#[test]
fn floor_bump_raises_counter() {
    let mut state = EngramState::default();
    state.apply_event(&Event::CounterFloorBumped {
        category: Category::Concept,
        min_next: 43,
    });
    assert_eq!(state.next_id(Category::Concept), 43);
}

#[test]
fn floor_bump_never_lowers_counter() {
    let mut state = EngramState::default();
    state.apply_event(&Event::IdsReserved {
        category: Category::Concept,
        start: 1,
        len: 50,
    });
    state.apply_event(&Event::CounterFloorBumped {
        category: Category::Concept,
        min_next: 10,
    });
    assert_eq!(state.next_id(Category::Concept), 51);
}

// ── Monotonicity across arbitrary histories ──────────────────────────────────

proptest::proptest! {
    /// Reserved ranges are strictly increasing and disjoint across any
    /// sequence of reservations and floor bumps, including replays.
    #[test]
    fn reserved_ranges_stay_disjoint(ops in proptest::collection::vec((0u8..2, 1u64..20), 1..40)) {
        let mut state = EngramState::default();
        let mut last_end = 0u64;
        for (kind, n) in ops {
            match kind {
                0 => {
                    let start = state.next_id(Category::Concept);
                    proptest::prop_assert!(start >= last_end.max(1));
                    let event = Event::IdsReserved {
                        category: Category::Concept,
                        start,
                        len: n,
                    };
                    state.apply_event(&event);
                    // Replay must not move the counter further
                    state.apply_event(&event);
                    last_end = start + n;
                }
                _ => {
                    state.apply_event(&Event::CounterFloorBumped {
                        category: Category::Concept,
                        min_next: n,
                    });
                }
            }
            proptest::prop_assert!(state.next_id(Category::Concept) >= last_end.max(1));
        }
    }
}
