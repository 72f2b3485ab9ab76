//! Property-based tests for the playback engine
//!
//! Uses proptest to verify invariants across many random inputs.

mod common;

use common::{playlist, Harness};
use lyre_playback::{Direction, History, PlayMode};
use proptest::prelude::*;

// ===== Helpers =====

#[derive(Debug, Clone, Copy)]
enum Step {
    Record(usize),
    Forward,
    Backward,
}

fn arbitrary_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0usize..50).prop_map(Step::Record),
        Just(Step::Forward),
        Just(Step::Backward),
    ]
}

fn arbitrary_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Next), Just(Direction::Previous)]
}

fn arbitrary_mode() -> impl Strategy<Value = PlayMode> {
    prop_oneof![
        Just(PlayMode::Sequence),
        Just(PlayMode::Random),
        Just(PlayMode::Loop),
    ]
}

// ===== Property Tests =====

proptest! {
    /// Property: history never exceeds capacity and the cursor stays on an entry
    #[test]
    fn history_cursor_stays_in_bounds(
        capacity in 1usize..20,
        steps in prop::collection::vec(arbitrary_step(), 0..200)
    ) {
        let mut history = History::new(capacity);

        for step in steps {
            match step {
                Step::Record(index) => history.record(index),
                Step::Forward => { history.step_forward(); }
                Step::Backward => { history.step_backward(); }
            }

            prop_assert!(history.len() <= capacity);
            match history.cursor() {
                Some(cursor) => prop_assert!(cursor < history.len()),
                None => prop_assert!(history.is_empty()),
            }
        }
    }

    /// Property: a recorded index is always the one under the cursor
    #[test]
    fn record_places_cursor_on_new_entry(
        capacity in 1usize..20,
        steps in prop::collection::vec(arbitrary_step(), 0..100),
        index in 0usize..50
    ) {
        let mut history = History::new(capacity);
        for step in steps {
            match step {
                Step::Record(i) => history.record(i),
                Step::Forward => { history.step_forward(); }
                Step::Backward => { history.step_backward(); }
            }
        }

        history.record(index);

        prop_assert_eq!(history.current(), Some(index));
        prop_assert_eq!(history.step_forward(), None);
    }

    /// Property: volume always lands in [0, 1]
    #[test]
    fn volume_is_always_clamped(volume in -10.0f64..10.0) {
        let mut h = Harness::new();
        h.engine.set_volume(volume);

        let stored = h.engine.session().volume;
        prop_assert!((0.0..=1.0).contains(&stored));
        prop_assert_eq!(stored, volume.clamp(0.0, 1.0));
    }

    /// Property: in sequence mode next then previous is the identity
    #[test]
    fn sequence_next_previous_is_identity(len in 1usize..30, start in 0usize..30) {
        let start = start % len;
        let tracks = playlist(len);
        let mut h = Harness::new();
        h.start(&tracks, start);

        h.engine.advance(Direction::Next);
        prop_assert_eq!(h.engine.session().current_index, (start + 1) % len);

        h.engine.advance(Direction::Previous);
        prop_assert_eq!(h.engine.session().current_index, start);
    }

    /// Property: session stays consistent under any traversal
    #[test]
    fn traversal_keeps_session_consistent(
        len in 1usize..15,
        modes in prop::collection::vec(arbitrary_mode(), 1..5),
        directions in prop::collection::vec(arbitrary_direction(), 0..60)
    ) {
        let tracks = playlist(len);
        let mut h = Harness::new();
        h.start(&tracks, 0);

        for (i, direction) in directions.into_iter().enumerate() {
            h.engine.set_mode(modes[i % modes.len()]);
            h.engine.advance(direction);

            let session = h.engine.session();
            prop_assert!(session.current_index < len);
            prop_assert_eq!(
                session.current_track.as_ref(),
                Some(&tracks[session.current_index])
            );
            prop_assert!(session.is_playing);
            prop_assert!(h.engine.history().len() <= h.engine.history().capacity());
        }
    }

    /// Property: stepping back through random picks replays them in reverse
    #[test]
    fn random_previous_replays_in_reverse(len in 2usize..20, picks in 1usize..10) {
        let tracks = playlist(len);
        let mut h = Harness::new();
        h.start(&tracks, 0);
        h.engine.set_mode(PlayMode::Random);

        let mut visited = Vec::new();
        for _ in 0..picks {
            h.engine.advance(Direction::Next);
            visited.push(h.engine.session().current_index);
        }

        for expected in visited.iter().rev().skip(1) {
            h.engine.advance(Direction::Previous);
            prop_assert_eq!(h.engine.session().current_index, *expected);
        }
    }
}
