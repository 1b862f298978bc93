use alloc::{sync::Arc, vec, vec::Vec};

use crate::{
    expr::{ElementEqualityChecker, ElementPredicate, SpanPredicate},
    nfa::thompson::{
        error::BuildError,
        nfa::{State, NFA},
    },
    util::{captures::GroupInfo, primitives::StateID},
};

/// A low level builder for a Thompson NFA.
///
/// States are added one at a time and are assigned identifiers equivalent to
/// their position in the arena. A state may be added before all of its
/// successors exist. Its successors are filled in later via
/// [`Builder::patch`], which appends a transition. This is what makes it
/// possible to wire up cycles (e.g., a loop back to a repetition's entry)
/// without any mutable aliasing.
///
/// Most callers want the [`Compiler`](crate::nfa::thompson::Compiler), which
/// drives this builder from a pattern expression.
pub struct Builder<T> {
    /// A sequence of NFA states. Once a state is added to this sequence, it
    /// is assigned a state ID equivalent to its index.
    states: Vec<State<T>>,
    /// A limit on the number of states, if any.
    size_limit: Option<usize>,
}

impl<T> Builder<T> {
    /// Create a new builder with no states.
    pub fn new() -> Builder<T> {
        Builder { states: vec![], size_limit: None }
    }

    /// Clear this builder so that it may be reused.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Set a limit on the number of states the NFA may contain. Adding a
    /// state beyond the limit returns an error.
    pub fn set_size_limit(&mut self, limit: Option<usize>) {
        self.size_limit = limit;
    }

    /// Return the number of states added so far.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if no states have been added.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Finish building and return the NFA.
    ///
    /// `start` must be the entry of the whole pattern, `matched` the sole
    /// match state and `group_info` the groups of the pattern.
    pub fn build(
        &mut self,
        start: StateID,
        matched: StateID,
        group_info: GroupInfo,
    ) -> NFA<T> {
        let states = core::mem::replace(&mut self.states, vec![]);
        NFA::new(states, start, matched, group_info)
    }

    /// Add a transition from `from` to `to`. Transitions added earlier have
    /// priority over transitions added later.
    pub fn patch(&mut self, from: StateID, to: StateID) {
        self.states[from].push_next(to);
    }

    /// Add a state that consumes one element accepted by `pred`.
    pub fn add_node(
        &mut self,
        pred: Arc<dyn ElementPredicate<T>>,
    ) -> Result<StateID, BuildError> {
        self.add(State::Node { pred, next: vec![] })
    }

    /// Add a state that consumes one of the intervals proposed by `pred`.
    pub fn add_multi_node(
        &mut self,
        pred: Arc<dyn SpanPredicate<T>>,
    ) -> Result<StateID, BuildError> {
        self.add(State::MultiNode { pred, next: vec![] })
    }

    /// Add a counting state that runs `body` between `min` and `max`
    /// times. Its exits are added with [`Builder::patch`].
    pub fn add_repeat(
        &mut self,
        body: StateID,
        min: usize,
        max: Option<usize>,
        greedy: bool,
    ) -> Result<StateID, BuildError> {
        self.add(State::Repeat { body, min, max, greedy, next: vec![] })
    }

    /// Add a state that matches the elements captured by `group` again.
    pub fn add_backref(
        &mut self,
        checker: Arc<dyn ElementEqualityChecker<T>>,
        group: usize,
    ) -> Result<StateID, BuildError> {
        self.add(State::BackRef { checker, group, next: vec![] })
    }

    /// Add a state that opens the given capture group.
    pub fn add_group_start(
        &mut self,
        group: usize,
    ) -> Result<StateID, BuildError> {
        self.add(State::GroupStart { group, next: vec![] })
    }

    /// Add a state that closes the given capture group.
    pub fn add_group_end(
        &mut self,
        group: usize,
    ) -> Result<StateID, BuildError> {
        self.add(State::GroupEnd { group, next: vec![] })
    }

    /// Add an empty state whose transitions are tried in order.
    pub fn add_fanout(&mut self) -> Result<StateID, BuildError> {
        self.add(State::Fanout { next: vec![] })
    }

    /// Add a state that only passes at the start of the sequence.
    pub fn add_sequence_start(&mut self) -> Result<StateID, BuildError> {
        self.add(State::SequenceStart { next: vec![] })
    }

    /// Add a state that only passes at the end of the sequence.
    pub fn add_sequence_end(&mut self) -> Result<StateID, BuildError> {
        self.add(State::SequenceEnd { next: vec![] })
    }

    /// Add the match state.
    pub fn add_match(&mut self) -> Result<StateID, BuildError> {
        self.add(State::Match)
    }

    fn add(&mut self, state: State<T>) -> Result<StateID, BuildError> {
        let given = self.states.len() + 1;
        if let Some(limit) = self.size_limit {
            if given > limit {
                return Err(BuildError::too_many_states(given, limit));
            }
        }
        let id = StateID::new(self.states.len())
            .map_err(|_| BuildError::state_id_overflow(given))?;
        self.states.push(state);
        Ok(id)
    }
}

impl<T> Default for Builder<T> {
    fn default() -> Builder<T> {
        Builder::new()
    }
}

impl<T> core::fmt::Debug for Builder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "thompson::Builder(")?;
        for (i, state) in self.states.iter().enumerate() {
            writeln!(f, "  {:06?}: {:?}", i, state)?;
        }
        writeln!(f, ")")
    }
}
