use alloc::{sync::Arc, vec::Vec};

use crate::{
    expr::{ElementEqualityChecker, ElementPredicate, SpanPredicate},
    util::{captures::GroupInfo, primitives::StateID},
};

/// A Thompson NFA over sequences of `T`.
///
/// The NFA is a graph of [`State`]s stored in an arena and addressed by
/// [`StateID`]. Cycles are expected: unbounded repetitions loop back to
/// their own entry. Successor lists are ordered by priority, so the first
/// successor of a state is always the preferred one.
///
/// An NFA is built by the [`Compiler`](crate::nfa::thompson::Compiler) and is
/// immutable once built. It is usually not used directly, but through a
/// [`CompiledPattern`](crate::CompiledPattern).
pub struct NFA<T> {
    /// The state arena. Every state ID in this NFA is a valid index into it.
    states: Vec<State<T>>,
    /// The state a search begins in. This is always the `GroupStart` of the
    /// implicit group 0.
    start: StateID,
    /// The single `Match` state.
    matched: StateID,
    /// Capture group names and indices.
    group_info: GroupInfo,
}

impl<T> NFA<T> {
    pub(crate) fn new(
        states: Vec<State<T>>,
        start: StateID,
        matched: StateID,
        group_info: GroupInfo,
    ) -> NFA<T> {
        NFA { states, start, matched, group_info }
    }

    /// Return the starting state of this NFA.
    #[inline]
    pub fn start(&self) -> StateID {
        self.start
    }

    /// Return the identifier of the sole `Match` state.
    #[inline]
    pub fn match_state(&self) -> StateID {
        self.matched
    }

    /// Return the state with the given identifier.
    ///
    /// This panics if the identifier is not valid for this NFA.
    #[inline]
    pub fn state(&self, id: StateID) -> &State<T> {
        &self.states[id]
    }

    /// Return all states in this NFA, indexed by their identifiers.
    #[inline]
    pub fn states(&self) -> &[State<T>] {
        &self.states
    }

    /// Return the total number of states in this NFA.
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if this NFA has no states. This is never true for an NFA
    /// built by the compiler.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Return the capturing group metadata of this NFA.
    #[inline]
    pub fn group_info(&self) -> &GroupInfo {
        &self.group_info
    }

    /// Return the number of capturing groups, including group `0`.
    #[inline]
    pub fn group_len(&self) -> usize {
        self.group_info.group_len()
    }
}

impl<T> core::fmt::Debug for NFA<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "thompson::NFA(")?;
        for (i, state) in self.states.iter().enumerate() {
            let status = if i == self.start.as_usize() { '^' } else { ' ' };
            writeln!(f, "{}{:06?}: {:?}", status, i, state)?;
        }
        writeln!(f, ")")?;
        Ok(())
    }
}

/// A state in a Thompson NFA.
///
/// States fall into two camps. Consuming states (`Node`, `MultiNode` and
/// `BackRef`) only move forward when given an element of the sequence.
/// Every other state is an epsilon state that is followed during the
/// epsilon closure computed at each position.
pub enum State<T> {
    /// Consumes one element that satisfies `pred`.
    Node {
        /// The element predicate.
        pred: Arc<dyn ElementPredicate<T>>,
        /// The successors, in priority order.
        next: Vec<StateID>,
    },
    /// Consumes one of the intervals proposed by `pred`.
    MultiNode {
        /// The span predicate.
        pred: Arc<dyn SpanPredicate<T>>,
        /// The successors, in priority order.
        next: Vec<StateID>,
    },
    /// A counted loop around `body` whose count is tracked per branch at
    /// search time. Entering `body` repeats once more. Following `next`
    /// leaves the loop. The body's exits lead back to this state.
    Repeat {
        /// The entry state of the repeated body.
        body: StateID,
        /// The minimum number of iterations.
        min: usize,
        /// The maximum number of iterations, if bounded.
        max: Option<usize>,
        /// Whether another iteration is preferred over leaving.
        greedy: bool,
        /// The exits of the loop, in priority order.
        next: Vec<StateID>,
    },
    /// Consumes elements equal to the ones captured by `group`.
    BackRef {
        /// Decides element equality.
        checker: Arc<dyn ElementEqualityChecker<T>>,
        /// The referenced capture index.
        group: usize,
        /// The successors, in priority order.
        next: Vec<StateID>,
    },
    /// Records the start of a capture group.
    GroupStart {
        /// The capture index.
        group: usize,
        /// The successors, in priority order.
        next: Vec<StateID>,
    },
    /// Records the end of a capture group.
    GroupEnd {
        /// The capture index.
        group: usize,
        /// The successors, in priority order.
        next: Vec<StateID>,
    },
    /// An unconditional epsilon junction. With zero successors this state
    /// never leads to a match.
    Fanout {
        /// The successors, in priority order.
        next: Vec<StateID>,
    },
    /// An epsilon transition that only holds at the start of the sequence.
    SequenceStart {
        /// The successors, in priority order.
        next: Vec<StateID>,
    },
    /// An epsilon transition that only holds at the end of the sequence.
    SequenceEnd {
        /// The successors, in priority order.
        next: Vec<StateID>,
    },
    /// The match state. There is exactly one per NFA.
    Match,
}

impl<T> State<T> {
    /// Returns the successors of this state, in priority order. For a
    /// `Repeat` state, this only includes the exits of the loop.
    #[inline]
    pub fn next(&self) -> &[StateID] {
        match *self {
            State::Node { ref next, .. }
            | State::MultiNode { ref next, .. }
            | State::Repeat { ref next, .. }
            | State::BackRef { ref next, .. }
            | State::GroupStart { ref next, .. }
            | State::GroupEnd { ref next, .. }
            | State::Fanout { ref next }
            | State::SequenceStart { ref next }
            | State::SequenceEnd { ref next } => next,
            State::Match => &[],
        }
    }

    /// Returns true if this state consumes elements of the sequence.
    #[inline]
    pub fn is_consuming(&self) -> bool {
        matches!(
            *self,
            State::Node { .. }
                | State::MultiNode { .. }
                | State::BackRef { .. }
        )
    }

    /// Appends a successor to this state. The match state has no successors
    /// and silently ignores this.
    pub(crate) fn push_next(&mut self, to: StateID) {
        match *self {
            State::Node { ref mut next, .. }
            | State::MultiNode { ref mut next, .. }
            | State::Repeat { ref mut next, .. }
            | State::BackRef { ref mut next, .. }
            | State::GroupStart { ref mut next, .. }
            | State::GroupEnd { ref mut next, .. }
            | State::Fanout { ref mut next }
            | State::SequenceStart { ref mut next }
            | State::SequenceEnd { ref mut next } => next.push(to),
            State::Match => {}
        }
    }
}

impl<T> core::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let next = Next(self.next());
        match *self {
            State::Node { .. } => write!(f, "node => {:?}", next),
            State::MultiNode { .. } => write!(f, "multi-node => {:?}", next),
            State::Repeat { body, min, max, greedy, .. } => {
                let body = body.as_usize();
                write!(f, "repeat(body={:?}, min={:?}, ", body, min)?;
                match max {
                    None => write!(f, "max=inf, ")?,
                    Some(max) => write!(f, "max={:?}, ", max)?,
                }
                write!(f, "greedy={:?}) => {:?}", greedy, next)
            }
            State::BackRef { group, .. } => {
                write!(f, "backref(group={:?}) => {:?}", group, next)
            }
            State::GroupStart { group, .. } => {
                write!(f, "group-start({:?}) => {:?}", group, next)
            }
            State::GroupEnd { group, .. } => {
                write!(f, "group-end({:?}) => {:?}", group, next)
            }
            State::Fanout { .. } => write!(f, "fanout => {:?}", next),
            State::SequenceStart { .. } => write!(f, "start => {:?}", next),
            State::SequenceEnd { .. } => write!(f, "end => {:?}", next),
            State::Match => write!(f, "MATCH"),
        }
    }
}

/// Formats a successor list as a comma separated list of raw indices.
struct Next<'a>(&'a [StateID]);

impl<'a> core::fmt::Debug for Next<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[")?;
        for (i, sid) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", sid.as_usize())?;
        }
        write!(f, "]")
    }
}
