//! Vote toggle state machine.
//!
//! Each (voter, target) pair is in one of three states: no vote, up, down.
//! A request (`UP`, `DOWN`, `NONE`) moves the pair to a new state; this
//! module decides which ledger mutation that takes and how the target's
//! counters must move so they stay equal to the ledger sums.
//!
//! | Current | Requested | Action  | Delta                 |
//! |---------|-----------|---------|-----------------------|
//! | none    | NONE      | keep    | -                     |
//! | none    | UP/DOWN   | insert  | +1 matching           |
//! | up      | UP        | keep    | -                     |
//! | up      | DOWN      | flip    | -1 up, +1 down        |
//! | up      | NONE      | remove  | -1 up                 |
//! | down    | (mirror of up)                              |
//!
//! Storage adapters call [`VoteTransition::plan`] inside their own atomic
//! unit so both adapters share the exact same rules.

use crate::domain::value_objects::{VoteDirection, VoteTally, VoteType};

/// Ledger mutation required by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    /// Nothing to write.
    Keep,
    /// Create a record with this direction.
    Insert(VoteType),
    /// Change the direction of the existing record.
    Flip { from: VoteType, to: VoteType },
    /// Delete the existing record, which had this direction.
    Remove(VoteType),
}

/// Change to apply to a target's up/down counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterDelta {
    pub upvotes: i32,
    pub downvotes: i32,
}

impl CounterDelta {
    fn unit(vote_type: VoteType, sign: i32) -> Self {
        match vote_type {
            VoteType::Up => Self {
                upvotes: sign,
                downvotes: 0,
            },
            VoteType::Down => Self {
                upvotes: 0,
                downvotes: sign,
            },
        }
    }

    fn plus(self, other: Self) -> Self {
        Self {
            upvotes: self.upvotes + other.upvotes,
            downvotes: self.downvotes + other.downvotes,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.upvotes == 0 && self.downvotes == 0
    }

    pub fn apply(&self, tally: VoteTally) -> VoteTally {
        VoteTally::new(tally.upvotes + self.upvotes, tally.downvotes + self.downvotes)
    }
}

/// A planned state change for one (voter, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub action: LedgerAction,
    pub delta: CounterDelta,
}

impl VoteTransition {
    /// Decide what a request does given the pair's current record.
    pub fn plan(current: Option<VoteType>, requested: VoteDirection) -> Self {
        let action = match (current, requested.as_vote_type()) {
            (None, None) => LedgerAction::Keep,
            (None, Some(to)) => LedgerAction::Insert(to),
            (Some(from), Some(to)) if from == to => LedgerAction::Keep,
            (Some(from), Some(to)) => LedgerAction::Flip { from, to },
            (Some(from), None) => LedgerAction::Remove(from),
        };

        let delta = match action {
            LedgerAction::Keep => CounterDelta::default(),
            LedgerAction::Insert(to) => CounterDelta::unit(to, 1),
            LedgerAction::Flip { from, to } => {
                CounterDelta::unit(from, -1).plus(CounterDelta::unit(to, 1))
            }
            LedgerAction::Remove(from) => CounterDelta::unit(from, -1),
        };

        Self { action, delta }
    }

    pub fn is_noop(&self) -> bool {
        self.action == LedgerAction::Keep
    }

    /// State of the pair after the transition.
    pub fn resulting_state(&self, current: Option<VoteType>) -> Option<VoteType> {
        match self.action {
            LedgerAction::Keep => current,
            LedgerAction::Insert(to) | LedgerAction::Flip { to, .. } => Some(to),
            LedgerAction::Remove(_) => None,
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self.action {
            LedgerAction::Keep => "noop",
            LedgerAction::Insert(_) => "cast",
            LedgerAction::Flip { .. } => "flip",
            LedgerAction::Remove(_) => "retract",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    use VoteDirection as Req;

    fn delta(upvotes: i32, downvotes: i32) -> CounterDelta {
        CounterDelta { upvotes, downvotes }
    }

    #[test_case(None, Req::None, LedgerAction::Keep, delta(0, 0) ; "none none")]
    #[test_case(None, Req::Up, LedgerAction::Insert(VoteType::Up), delta(1, 0) ; "none up")]
    #[test_case(None, Req::Down, LedgerAction::Insert(VoteType::Down), delta(0, 1) ; "none down")]
    #[test_case(Some(VoteType::Up), Req::Up, LedgerAction::Keep, delta(0, 0) ; "up up")]
    #[test_case(
        Some(VoteType::Up), Req::Down,
        LedgerAction::Flip { from: VoteType::Up, to: VoteType::Down }, delta(-1, 1) ; "up down"
    )]
    #[test_case(Some(VoteType::Up), Req::None, LedgerAction::Remove(VoteType::Up), delta(-1, 0) ; "up none")]
    #[test_case(Some(VoteType::Down), Req::Down, LedgerAction::Keep, delta(0, 0) ; "down down")]
    #[test_case(
        Some(VoteType::Down), Req::Up,
        LedgerAction::Flip { from: VoteType::Down, to: VoteType::Up }, delta(1, -1) ; "down up"
    )]
    #[test_case(Some(VoteType::Down), Req::None, LedgerAction::Remove(VoteType::Down), delta(0, -1) ; "down none")]
    fn test_transition_table(
        current: Option<VoteType>,
        requested: VoteDirection,
        action: LedgerAction,
        expected: CounterDelta,
    ) {
        let transition = VoteTransition::plan(current, requested);
        assert_eq!(transition.action, action);
        assert_eq!(transition.delta, expected);
    }

    fn all_sequences(len: usize) -> Vec<Vec<VoteDirection>> {
        let choices = [Req::Up, Req::Down, Req::None];
        let mut out = vec![vec![]];
        for _ in 0..len {
            out = out
                .into_iter()
                .flat_map(|seq| {
                    choices.iter().map(move |c| {
                        let mut next = seq.clone();
                        next.push(*c);
                        next
                    })
                })
                .collect();
        }
        out
    }

    #[test]
    fn test_every_sequence_ends_in_last_request() {
        for len in 1..=5 {
            for seq in all_sequences(len) {
                let mut state = None;
                let mut tally = VoteTally::default();
                for req in &seq {
                    let t = VoteTransition::plan(state, *req);
                    state = t.resulting_state(state);
                    tally = t.delta.apply(tally);
                }

                let last = *seq.last().unwrap();
                assert_eq!(state, last.as_vote_type(), "sequence {seq:?}");

                let expected = match state {
                    Some(VoteType::Up) => VoteTally::new(1, 0),
                    Some(VoteType::Down) => VoteTally::new(0, 1),
                    None => VoteTally::new(0, 0),
                };
                assert_eq!(tally, expected, "sequence {seq:?}");
            }
        }
    }

    #[test]
    fn test_repeat_is_noop() {
        let first = VoteTransition::plan(None, Req::Up);
        let state = first.resulting_state(None);
        let second = VoteTransition::plan(state, Req::Up);
        assert!(second.is_noop());
        assert!(second.delta.is_zero());
    }

    #[test]
    fn test_labels() {
        assert_eq!(VoteTransition::plan(None, Req::Up).label(), "cast");
        assert_eq!(VoteTransition::plan(Some(VoteType::Up), Req::Down).label(), "flip");
        assert_eq!(VoteTransition::plan(Some(VoteType::Up), Req::None).label(), "retract");
        assert_eq!(VoteTransition::plan(None, Req::None).label(), "noop");
    }
}
