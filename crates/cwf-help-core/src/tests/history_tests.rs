//! Property tests for the topic history
//!
//! Arbitrary sequences of adds and cursor moves must keep the history
//! bounded with a cursor that always points at a valid entry.

use cwf_help_types::HelpTopic;
use proptest::prelude::*;

use crate::history::HelpHistory;

#[derive(Debug, Clone)]
enum Op {
    Add(Option<u8>),
    AddUntitled,
    Previous,
    Next,
    SetPosition(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => proptest::option::weighted(0.9, 0u8..20).prop_map(Op::Add),
        1 => Just(Op::AddUntitled),
        2 => Just(Op::Previous),
        2 => Just(Op::Next),
        1 => (0usize..12).prop_map(Op::SetPosition),
    ]
}

fn topic(n: u8) -> HelpTopic {
    HelpTopic::with_url(format!("/web/help/{n}.htm"), format!("Topic {n}"))
}

fn apply(history: &mut HelpHistory, op: &Op) {
    match op {
        Op::Add(n) => history.add(n.map(topic)),
        Op::AddUntitled => history.add(Some(HelpTopic::new(None, "Heading", ""))),
        Op::Previous => {
            history.previous();
        }
        Op::Next => {
            history.next();
        }
        Op::SetPosition(position) => {
            let _ = history.set_position(*position);
        }
    }
}

proptest! {
    #[test]
    fn cursor_stays_within_bounds(
        capacity in 1usize..8,
        ops in proptest::collection::vec(op(), 0..60),
    ) {
        let mut history = HelpHistory::with_capacity(capacity);

        for op in &ops {
            apply(&mut history, op);

            prop_assert!(history.len() <= capacity);
            prop_assert_eq!(history.position().is_none(), history.is_empty());
            if let Some(position) = history.position() {
                prop_assert!(position < history.len());
            }
        }
    }

    #[test]
    fn added_topic_becomes_current(
        ops in proptest::collection::vec(op(), 0..40),
        n in 0u8..20,
    ) {
        let mut history = HelpHistory::with_capacity(5);
        for op in &ops {
            apply(&mut history, op);
        }

        history.add(Some(topic(n)));

        prop_assert_eq!(history.current(), Some(&topic(n)));
        prop_assert!(!history.has_next());
    }

    #[test]
    fn out_of_range_position_leaves_history_unchanged(
        ops in proptest::collection::vec(op(), 0..40),
        extra in 0usize..5,
    ) {
        let mut history = HelpHistory::with_capacity(6);
        for op in &ops {
            apply(&mut history, op);
        }

        let items = history.items().to_vec();
        let position = history.position();

        prop_assert!(history.set_position(history.len() + extra).is_err());
        prop_assert_eq!(history.items(), items.as_slice());
        prop_assert_eq!(history.position(), position);
    }
}
