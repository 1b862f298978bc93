use alloc::{sync::Arc, vec, vec::Vec};

use crate::{
    expr::{Expr, ExprKind, Group, Repeat},
    nfa::thompson::{builder::Builder, error::BuildError, nfa::NFA},
    util::{captures::GroupInfo, primitives::StateID},
};

/// The configuration used for compiling a Thompson NFA from an expression.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    unroll_limit: Option<usize>,
    nfa_size_limit: Option<Option<usize>>,
}

impl Config {
    /// Return a new default Thompson NFA compiler configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Set the largest repetition bound that is compiled by duplicating the
    /// repeated sub-NFA instead of emitting a counting `Repeat` state.
    ///
    /// Greedy repetitions whose minimum and (if bounded) maximum are both at
    /// most this limit are unrolled. Unrolling trades NFA size for a simpler
    /// search, since unrolled copies need no per-branch counters. Setting
    /// this to `0` disables unrolling for everything except `{0}` and `{0,}`
    /// forms.
    ///
    /// This is set to `10` by default.
    pub fn unroll_limit(mut self, limit: usize) -> Config {
        self.unroll_limit = Some(limit);
        self
    }

    /// Set a limit on the total number of states in the compiled NFA.
    ///
    /// When the limit is exceeded, compilation fails. By default there is no
    /// limit beyond what a [`StateID`] can represent.
    pub fn nfa_size_limit(mut self, limit: Option<usize>) -> Config {
        self.nfa_size_limit = Some(limit);
        self
    }

    /// Returns the unrolling limit, as set by [`Config::unroll_limit`].
    pub fn get_unroll_limit(&self) -> usize {
        self.unroll_limit.unwrap_or(10)
    }

    /// Returns the NFA size limit, as set by [`Config::nfa_size_limit`].
    pub fn get_nfa_size_limit(&self) -> Option<usize> {
        self.nfa_size_limit.unwrap_or(None)
    }

    /// Overwrite the default configuration such that the options in `o` are
    /// always used. If an option in `o` is not set, then the corresponding
    /// option in `self` is used. If it's not set in `self` either, then it
    /// remains not set.
    pub(crate) fn overwrite(self, o: Config) -> Config {
        Config {
            unroll_limit: o.unroll_limit.or(self.unroll_limit),
            nfa_size_limit: o.nfa_size_limit.or(self.nfa_size_limit),
        }
    }
}

/// A builder for compiling a pattern expression into a Thompson NFA.
///
/// Compilation happens in two passes. The first assigns capture indices to
/// every capturing group in pre-order (see [`Expr::assign_group_ids`]) and
/// validates backreferences against them. The second walks the expression
/// again, in the same order, producing NFA fragments and wiring them
/// together.
///
/// The whole expression is implicitly wrapped in capturing group `0`, which
/// is always followed by the NFA's single match state.
pub struct Compiler<T> {
    /// The configuration that determines how an NFA is compiled.
    config: Config,
    /// The builder for actually constructing an NFA.
    builder: Builder<T>,
    /// The capture index that the next capturing group receives.
    next_group: usize,
}

/// A fragment of an NFA under construction.
///
/// `entry` is the state through which the fragment is entered. `outs` are
/// the states whose successor lists still need to be connected to whatever
/// follows the fragment.
#[derive(Clone, Debug)]
struct Frag {
    entry: StateID,
    outs: Vec<StateID>,
}

impl<T> Compiler<T> {
    /// Create a new compiler with the default configuration.
    pub fn new() -> Compiler<T> {
        Compiler {
            config: Config::default(),
            builder: Builder::new(),
            next_group: 0,
        }
    }

    /// Apply the given NFA configuration options to this compiler.
    pub fn configure(&mut self, config: Config) -> &mut Compiler<T> {
        self.config = self.config.overwrite(config);
        self
    }

    /// Compile the given expression into an NFA.
    pub fn build(&mut self, expr: &Expr<T>) -> Result<NFA<T>, BuildError> {
        let mut names = vec![];
        expr.visit_groups(&mut |g: &Group<T>| names.push(g.name.clone()));
        let group_info = GroupInfo::new(names)?;
        check_backrefs(expr, group_info.group_len())?;

        self.builder.clear();
        self.builder.set_size_limit(self.config.get_nfa_size_limit());
        self.next_group = 1;

        let start = self.builder.add_group_start(0)?;
        let body = self.c(expr)?;
        let end = self.builder.add_group_end(0)?;
        let matched = self.builder.add_match()?;
        self.builder.patch(start, body.entry);
        self.patch_all(&body.outs, end);
        self.builder.patch(end, matched);
        debug_assert_eq!(self.next_group, group_info.group_len());

        debug!(
            "compiled pattern into {} NFA states with {} groups",
            self.builder.len(),
            group_info.group_len(),
        );
        Ok(self.builder.build(start, matched, group_info))
    }

    fn c(&mut self, expr: &Expr<T>) -> Result<Frag, BuildError> {
        match *expr.kind() {
            ExprKind::Node(ref pred) => {
                let sid = self.builder.add_node(Arc::clone(pred))?;
                Ok(Frag { entry: sid, outs: vec![sid] })
            }
            ExprKind::MultiNode(ref pred) => {
                let sid = self.builder.add_multi_node(Arc::clone(pred))?;
                Ok(Frag { entry: sid, outs: vec![sid] })
            }
            ExprKind::Sequence(ref children) => self.c_concat(children),
            ExprKind::Or(ref children) => self.c_alternation(children),
            ExprKind::Group(ref group) => self.c_group(group),
            ExprKind::Repeat(ref rep) => self.c_repeat(rep),
            ExprKind::BackRef(ref br) => {
                let sid = self
                    .builder
                    .add_backref(Arc::clone(&br.checker), br.group)?;
                Ok(Frag { entry: sid, outs: vec![sid] })
            }
            ExprKind::SequenceStart => {
                let sid = self.builder.add_sequence_start()?;
                Ok(Frag { entry: sid, outs: vec![sid] })
            }
            ExprKind::SequenceEnd => {
                let sid = self.builder.add_sequence_end()?;
                Ok(Frag { entry: sid, outs: vec![sid] })
            }
        }
    }

    fn c_concat(&mut self, children: &[Expr<T>]) -> Result<Frag, BuildError> {
        let mut it = children.iter();
        let mut frag = match it.next() {
            None => return self.c_empty(),
            Some(first) => self.c(first)?,
        };
        for child in it {
            let next = self.c(child)?;
            self.patch_all(&frag.outs, next.entry);
            frag.outs = next.outs;
        }
        Ok(frag)
    }

    fn c_alternation(
        &mut self,
        children: &[Expr<T>],
    ) -> Result<Frag, BuildError> {
        let fanout = self.builder.add_fanout()?;
        let mut outs = vec![];
        for child in children {
            let frag = self.c(child)?;
            self.builder.patch(fanout, frag.entry);
            outs.extend(frag.outs);
        }
        Ok(Frag { entry: fanout, outs })
    }

    fn c_group(&mut self, group: &Group<T>) -> Result<Frag, BuildError> {
        if !group.capture {
            return self.c(&group.child);
        }
        let index = self.next_group;
        self.next_group += 1;
        let start = self.builder.add_group_start(index)?;
        let inner = self.c(&group.child)?;
        let end = self.builder.add_group_end(index)?;
        self.builder.patch(start, inner.entry);
        self.patch_all(&inner.outs, end);
        Ok(Frag { entry: start, outs: vec![end] })
    }

    fn c_repeat(&mut self, rep: &Repeat<T>) -> Result<Frag, BuildError> {
        if rep.min == 1 && rep.max == Some(1) {
            return self.c(&rep.child);
        }
        // Every copy of the child must reuse the same capture indices, so we
        // rewind the group counter before each copy and skip past the
        // child's groups once at the end. (This also covers the case where
        // zero copies are emitted.)
        let first_group = self.next_group;
        let end_group = rep.child.assign_group_ids(first_group);
        let limit = self.config.get_unroll_limit();
        let small =
            rep.min <= limit && rep.max.map_or(true, |max| max <= limit);
        let frag = if rep.greedy && small {
            self.c_unrolled(rep, first_group)?
        } else {
            self.c_counted(rep, first_group)?
        };
        self.next_group = end_group;
        Ok(frag)
    }

    /// Compiles a repetition by duplicating the child `min` times followed
    /// by either a self-looping optional copy (unbounded) or `max - min`
    /// chained optional copies (bounded).
    fn c_unrolled(
        &mut self,
        rep: &Repeat<T>,
        first_group: usize,
    ) -> Result<Frag, BuildError> {
        let mut entry: Option<StateID> = None;
        let mut outs: Vec<StateID> = vec![];
        for _ in 0..rep.min {
            let copy = self.c_copy(&rep.child, first_group)?;
            self.link(&mut entry, &outs, copy.entry);
            outs = copy.outs;
        }
        match rep.max {
            None => {
                let fanout = self.builder.add_fanout()?;
                self.link(&mut entry, &outs, fanout);
                let copy = self.c_copy(&rep.child, first_group)?;
                self.builder.patch(fanout, copy.entry);
                self.patch_all(&copy.outs, fanout);
                outs = vec![fanout];
            }
            Some(max) => {
                // Each optional copy sits behind a fanout whose second
                // transition (added when this fragment is connected to what
                // follows) bypasses every remaining copy.
                let mut bypasses = vec![];
                for _ in rep.min..max {
                    let fanout = self.builder.add_fanout()?;
                    self.link(&mut entry, &outs, fanout);
                    let copy = self.c_copy(&rep.child, first_group)?;
                    self.builder.patch(fanout, copy.entry);
                    bypasses.push(fanout);
                    outs = copy.outs;
                }
                outs.extend(bypasses);
            }
        }
        match entry {
            Some(entry) => Ok(Frag { entry, outs }),
            None => self.c_empty(),
        }
    }

    /// Compiles a repetition into a single counting `Repeat` state whose
    /// body loops back to it.
    fn c_counted(
        &mut self,
        rep: &Repeat<T>,
        first_group: usize,
    ) -> Result<Frag, BuildError> {
        let body = self.c_copy(&rep.child, first_group)?;
        let sid =
            self.builder.add_repeat(body.entry, rep.min, rep.max, rep.greedy)?;
        self.patch_all(&body.outs, sid);
        Ok(Frag { entry: sid, outs: vec![sid] })
    }

    fn c_copy(
        &mut self,
        child: &Expr<T>,
        first_group: usize,
    ) -> Result<Frag, BuildError> {
        self.next_group = first_group;
        self.c(child)
    }

    fn c_empty(&mut self) -> Result<Frag, BuildError> {
        let sid = self.builder.add_fanout()?;
        Ok(Frag { entry: sid, outs: vec![sid] })
    }

    /// Connects `outs` to `to`, or makes `to` the entry if nothing has been
    /// emitted yet.
    fn link(
        &mut self,
        entry: &mut Option<StateID>,
        outs: &[StateID],
        to: StateID,
    ) {
        if entry.is_none() {
            *entry = Some(to);
        } else {
            self.patch_all(outs, to);
        }
    }

    fn patch_all(&mut self, outs: &[StateID], to: StateID) {
        for &out in outs {
            self.builder.patch(out, to);
        }
    }
}

impl<T> Default for Compiler<T> {
    fn default() -> Compiler<T> {
        Compiler::new()
    }
}

impl<T> core::fmt::Debug for Compiler<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Compiler").field("config", &self.config).finish()
    }
}

/// Returns an error if any backreference in `expr` refers to a group index
/// at or beyond `group_len`.
fn check_backrefs<T>(
    expr: &Expr<T>,
    group_len: usize,
) -> Result<(), BuildError> {
    match *expr.kind() {
        ExprKind::Node(_)
        | ExprKind::MultiNode(_)
        | ExprKind::SequenceStart
        | ExprKind::SequenceEnd => Ok(()),
        ExprKind::BackRef(ref br) => {
            if br.group >= group_len {
                return Err(BuildError::unknown_backref(br.group, group_len));
            }
            Ok(())
        }
        ExprKind::Sequence(ref children) | ExprKind::Or(ref children) => {
            for child in children {
                check_backrefs(child, group_len)?;
            }
            Ok(())
        }
        ExprKind::Group(ref group) => check_backrefs(&group.child, group_len),
        ExprKind::Repeat(ref rep) => check_backrefs(&rep.child, group_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::nfa::thompson::State;

    fn count<T>(nfa: &NFA<T>, pred: impl Fn(&State<T>) -> bool) -> usize {
        nfa.states().iter().filter(|s| pred(*s)).count()
    }

    fn is_node<T>(s: &State<T>) -> bool {
        matches!(*s, State::Node { .. })
    }

    fn is_repeat<T>(s: &State<T>) -> bool {
        matches!(*s, State::Repeat { .. })
    }

    #[test]
    fn root_is_group_zero() {
        let nfa = Compiler::new().build(&Expr::literal(1u8)).unwrap();
        match *nfa.state(nfa.start()) {
            State::GroupStart { group: 0, .. } => {}
            ref s => panic!("unexpected start state: {:?}", s),
        }
        assert!(matches!(*nfa.state(nfa.match_state()), State::Match));
        assert_eq!(1, nfa.group_len());
    }

    #[test]
    fn small_greedy_repeats_are_unrolled() {
        let rep = Expr::repeat(Expr::literal(1u8), 2, Some(4), true).unwrap();
        let nfa = Compiler::new().build(&rep).unwrap();
        assert_eq!(4, count(&nfa, is_node));
        assert_eq!(0, count(&nfa, is_repeat));

        let rep = Expr::repeat(Expr::literal(1u8), 3, None, true).unwrap();
        let nfa = Compiler::new().build(&rep).unwrap();
        assert_eq!(4, count(&nfa, is_node));
        assert_eq!(0, count(&nfa, is_repeat));
    }

    #[test]
    fn lazy_and_large_repeats_are_counted() {
        let rep = Expr::repeat(Expr::literal(1u8), 2, Some(4), false).unwrap();
        let nfa = Compiler::new().build(&rep).unwrap();
        assert_eq!(1, count(&nfa, is_node));
        assert_eq!(1, count(&nfa, is_repeat));

        let rep = Expr::repeat(Expr::literal(1u8), 11, None, true).unwrap();
        let nfa = Compiler::new().build(&rep).unwrap();
        assert_eq!(1, count(&nfa, is_node));
        assert_eq!(1, count(&nfa, is_repeat));

        let rep = Expr::repeat(Expr::literal(1u8), 2, Some(3), true).unwrap();
        let nfa = Compiler::new()
            .configure(Config::new().unroll_limit(1))
            .build(&rep)
            .unwrap();
        assert_eq!(1, count(&nfa, is_repeat));
    }

    #[test]
    fn unrolled_copies_share_group_indices() {
        // (a(b)){3} (c)
        let rep = Expr::repeat(
            Expr::group(Expr::sequence(vec![
                Expr::literal(b'a'),
                Expr::group(Expr::literal(b'b')),
            ])),
            3,
            Some(3),
            true,
        )
        .unwrap();
        let expr = Expr::sequence(vec![rep, Expr::group(Expr::literal(b'c'))]);
        let nfa = Compiler::new().build(&expr).unwrap();
        assert_eq!(4, nfa.group_len());
        let mut starts = vec![];
        for s in nfa.states() {
            if let State::GroupStart { group, .. } = *s {
                starts.push(group);
            }
        }
        assert_eq!(vec![0, 1, 2, 1, 2, 1, 2, 3], starts);
    }

    #[test]
    fn zero_repeat_still_consumes_group_indices() {
        let rep =
            Expr::repeat(Expr::group(Expr::literal(1u8)), 0, Some(0), true)
                .unwrap();
        let expr = Expr::sequence(vec![rep, Expr::group(Expr::literal(2u8))]);
        let nfa = Compiler::new().build(&expr).unwrap();
        assert_eq!(3, nfa.group_len());
        assert_eq!(1, count(&nfa, is_node));
    }

    #[test]
    fn backrefs_must_refer_to_existing_groups() {
        let expr = Expr::sequence(vec![
            Expr::group(Expr::literal(1u8)),
            Expr::backref(2).unwrap(),
        ]);
        let err = Compiler::new().build(&expr).unwrap_err();
        assert!(err.is_invalid_argument());

        let expr = Expr::sequence(vec![
            Expr::group(Expr::literal(1u8)),
            Expr::backref(1).unwrap(),
        ]);
        assert!(Compiler::new().build(&expr).is_ok());
    }

    #[test]
    fn duplicate_group_names_are_rejected() {
        let expr = Expr::sequence(vec![
            Expr::named_group("x", Expr::literal(1u8)),
            Expr::named_group("x", Expr::literal(2u8)),
        ]);
        assert!(Compiler::new().build(&expr).is_err());
    }

    #[test]
    fn size_limit_is_respected() {
        let expr =
            Expr::repeat(Expr::literal(1u8), 10, Some(10), true).unwrap();
        let result = Compiler::new()
            .configure(Config::new().nfa_size_limit(Some(5)))
            .build(&expr);
        assert!(result.is_err());
    }
}
