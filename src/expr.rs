/*!
The pattern expression tree and the predicate contracts it is built from.

An [`Expr`] is an immutable algebraic description of a sequence pattern. It
is the input to the Thompson NFA compiler in
[`nfa::thompson`](crate::nfa::thompson). There is no concrete syntax in this
crate: callers (typically a parser for some surface syntax) assemble
expressions directly from the constructors on [`Expr`].

Leaves of the tree are predicates supplied by the caller:

* [`ElementPredicate`] decides whether a single element matches.
* [`SpanPredicate`] proposes zero or more variable length intervals starting
at an index, which permits ambiguous multi-element matches.
* [`ElementEqualityChecker`] decides when two elements are "equal" for the
purposes of a backreference.

Each trait is implemented for closures of the obvious signature.

# Example

```
use seq_automata::Expr;

// the (cat|dog)
let expr = Expr::sequence(vec![
    Expr::group(Expr::literal("the")),
    Expr::group(Expr::or(vec![Expr::literal("cat"), Expr::literal("dog")])),
]);
assert_eq!(3, expr.assign_group_ids(1));
```
*/

use core::any::Any;

use alloc::{boxed::Box, sync::Arc, vec::Vec};

use crate::{nfa::thompson::BuildError, util::search::Span};

/// A value produced by [`ElementPredicate::match_with_extraction`].
///
/// The engine never inspects extracted values. It records them against the
/// index of the element that produced them and hands them back through
/// [`MatchResult::extraction`](crate::MatchResult::extraction).
pub type Extracted = Arc<dyn Any + Send + Sync>;

/// The outcome of evaluating an [`ElementPredicate`] in extraction mode.
#[derive(Clone)]
pub enum Extraction {
    /// The element did not match.
    NoMatch,
    /// The element matched but produced nothing worth keeping.
    Match,
    /// The element matched and produced a structured value.
    MatchWith(Extracted),
}

impl Extraction {
    /// Returns true if this outcome represents a match.
    pub fn is_match(&self) -> bool {
        !matches!(*self, Extraction::NoMatch)
    }
}

impl core::fmt::Debug for Extraction {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Extraction::NoMatch => write!(f, "NoMatch"),
            Extraction::Match => write!(f, "Match"),
            Extraction::MatchWith(_) => write!(f, "MatchWith(..)"),
        }
    }
}

/// A predicate over a single element of a sequence.
pub trait ElementPredicate<T>: Send + Sync {
    /// Returns true when the given element satisfies this predicate.
    fn matches(&self, elem: &T) -> bool;

    /// Like `matches`, but may also produce a structured value describing
    /// how the element matched (e.g., the result of a numeric comparison).
    ///
    /// This is only called by matchers configured with
    /// [`Config::extract`](crate::matcher::Config::extract) enabled.
    fn match_with_extraction(&self, elem: &T) -> Extraction {
        if self.matches(elem) {
            Extraction::Match
        } else {
            Extraction::NoMatch
        }
    }
}

impl<T, F> ElementPredicate<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, elem: &T) -> bool {
        (self)(elem)
    }
}

/// A predicate that matches a variable number of elements.
///
/// Given the sequence (truncated to the end of the matcher's region) and an
/// index `from`, an implementation returns every interval it is willing to
/// match that begins at `from`. Intervals that do not begin at `from` or
/// that are empty are ignored. Returning several intervals makes the match
/// ambiguous, and the matcher explores each one on its own branch in the
/// order given.
pub trait SpanPredicate<T>: Send + Sync {
    /// Return all candidate spans starting at `from`.
    fn candidate_spans(&self, seq: &[T], from: usize) -> Vec<Span>;
}

impl<T, F> SpanPredicate<T> for F
where
    F: Fn(&[T], usize) -> Vec<Span> + Send + Sync,
{
    fn candidate_spans(&self, seq: &[T], from: usize) -> Vec<Span> {
        (self)(seq, from)
    }
}

/// Defines element equality for backreferences.
pub trait ElementEqualityChecker<T>: Send + Sync {
    /// Returns true when `a` and `b` should be considered equal.
    fn equal(&self, a: &T, b: &T) -> bool;
}

impl<T, F> ElementEqualityChecker<T> for F
where
    F: Fn(&T, &T) -> bool + Send + Sync,
{
    fn equal(&self, a: &T, b: &T) -> bool {
        (self)(a, b)
    }
}

/// The default backreference equality, which defers to `PartialEq`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueEquality;

impl<T: PartialEq> ElementEqualityChecker<T> for ValueEquality {
    fn equal(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// An immutable pattern expression over elements of type `T`.
///
/// Cloning an expression produces a structurally independent copy of the
/// tree. Predicates and equality checkers are reference counted and shared
/// between copies, since they are never mutated by the engine. This makes it
/// safe to embed one sub-expression in several compiled patterns.
pub struct Expr<T> {
    kind: ExprKind<T>,
}

/// The kind of a pattern expression.
pub enum ExprKind<T> {
    /// Matches exactly one element satisfying the predicate.
    Node(Arc<dyn ElementPredicate<T>>),
    /// Matches one of the intervals proposed by the predicate.
    MultiNode(Arc<dyn SpanPredicate<T>>),
    /// Matches each child in turn. An empty sequence matches the empty
    /// sequence.
    Sequence(Vec<Expr<T>>),
    /// Matches any one of the children. Earlier children have priority over
    /// later children. An empty alternation never matches.
    Or(Vec<Expr<T>>),
    /// A capturing or non-capturing group.
    Group(Group<T>),
    /// A counted repetition.
    Repeat(Repeat<T>),
    /// A backreference to a previously captured group.
    BackRef(BackRef<T>),
    /// A zero-width assertion that holds at the start of the sequence.
    SequenceStart,
    /// A zero-width assertion that holds at the end of the sequence.
    SequenceEnd,
}

/// A group around a sub-expression.
pub struct Group<T> {
    /// The grouped expression.
    pub child: Box<Expr<T>>,
    /// Whether this group records its span. Capture indices are assigned to
    /// capturing groups in pre-order, starting at `1`.
    pub capture: bool,
    /// An optional name that can be used to look up the group's span.
    pub name: Option<Arc<str>>,
}

/// A repetition of a sub-expression.
pub struct Repeat<T> {
    /// The repeated expression.
    pub child: Box<Expr<T>>,
    /// The minimum number of repetitions.
    pub min: usize,
    /// The maximum number of repetitions, or `None` when unbounded.
    pub max: Option<usize>,
    /// Whether more repetitions are preferred over fewer.
    pub greedy: bool,
}

/// A backreference to a capturing group.
pub struct BackRef<T> {
    /// The equality used to compare elements against the captured span.
    pub checker: Arc<dyn ElementEqualityChecker<T>>,
    /// The capture index referred to. Never `0`.
    pub group: usize,
}

impl<T> Expr<T> {
    /// Matches a single element satisfying `pred`.
    pub fn node<P>(pred: P) -> Expr<T>
    where
        P: ElementPredicate<T> + 'static,
    {
        Expr { kind: ExprKind::Node(Arc::new(pred)) }
    }

    /// Like `node`, but accepts an already shared predicate.
    pub fn node_shared(pred: Arc<dyn ElementPredicate<T>>) -> Expr<T> {
        Expr { kind: ExprKind::Node(pred) }
    }

    /// Matches a variable number of elements as proposed by `pred`.
    pub fn multi_node<P>(pred: P) -> Expr<T>
    where
        P: SpanPredicate<T> + 'static,
    {
        Expr { kind: ExprKind::MultiNode(Arc::new(pred)) }
    }

    /// Matches each of the given expressions in order.
    pub fn sequence<I>(children: I) -> Expr<T>
    where
        I: IntoIterator<Item = Expr<T>>,
    {
        Expr { kind: ExprKind::Sequence(children.into_iter().collect()) }
    }

    /// Matches any one of the given expressions, preferring earlier ones.
    pub fn or<I>(children: I) -> Expr<T>
    where
        I: IntoIterator<Item = Expr<T>>,
    {
        Expr { kind: ExprKind::Or(children.into_iter().collect()) }
    }

    /// Wraps the given expression in an unnamed capturing group.
    pub fn group(child: Expr<T>) -> Expr<T> {
        Expr {
            kind: ExprKind::Group(Group {
                child: Box::new(child),
                capture: true,
                name: None,
            }),
        }
    }

    /// Wraps the given expression in a named capturing group.
    pub fn named_group(name: &str, child: Expr<T>) -> Expr<T> {
        Expr {
            kind: ExprKind::Group(Group {
                child: Box::new(child),
                capture: true,
                name: Some(Arc::from(name)),
            }),
        }
    }

    /// Wraps the given expression in a group that records nothing.
    pub fn non_capturing(child: Expr<T>) -> Expr<T> {
        Expr {
            kind: ExprKind::Group(Group {
                child: Box::new(child),
                capture: false,
                name: None,
            }),
        }
    }

    /// Repeats `child` at least `min` and at most `max` times. A `max` of
    /// `None` means there is no upper bound.
    ///
    /// This returns an error when `max < min`.
    pub fn repeat(
        child: Expr<T>,
        min: usize,
        max: Option<usize>,
        greedy: bool,
    ) -> Result<Expr<T>, BuildError> {
        if let Some(max) = max {
            if max < min {
                return Err(BuildError::invalid_repeat(min, max));
            }
        }
        Ok(Expr {
            kind: ExprKind::Repeat(Repeat {
                child: Box::new(child),
                min,
                max,
                greedy,
            }),
        })
    }

    /// Greedily repeats `child` zero or more times.
    pub fn star(child: Expr<T>) -> Expr<T> {
        Expr::unbounded(child, 0, true)
    }

    /// Greedily repeats `child` one or more times.
    pub fn plus(child: Expr<T>) -> Expr<T> {
        Expr::unbounded(child, 1, true)
    }

    /// Greedily matches `child` zero or one time.
    pub fn optional(child: Expr<T>) -> Expr<T> {
        Expr {
            kind: ExprKind::Repeat(Repeat {
                child: Box::new(child),
                min: 0,
                max: Some(1),
                greedy: true,
            }),
        }
    }

    /// Repeats `child` at least `min` times with no upper bound.
    pub fn unbounded(child: Expr<T>, min: usize, greedy: bool) -> Expr<T> {
        Expr {
            kind: ExprKind::Repeat(Repeat {
                child: Box::new(child),
                min,
                max: None,
                greedy,
            }),
        }
    }

    /// Matches the elements captured by `group` again, comparing elements
    /// with `checker`.
    ///
    /// This returns an error when `group` is `0`, since the implicit group
    /// that spans the whole match can never be referred to from inside the
    /// match.
    pub fn backref_with<C>(
        checker: C,
        group: usize,
    ) -> Result<Expr<T>, BuildError>
    where
        C: ElementEqualityChecker<T> + 'static,
    {
        if group == 0 {
            return Err(BuildError::invalid_backref(group));
        }
        Ok(Expr {
            kind: ExprKind::BackRef(BackRef {
                checker: Arc::new(checker),
                group,
            }),
        })
    }

    /// A zero-width assertion that only matches at index `0`.
    pub fn sequence_start() -> Expr<T> {
        Expr { kind: ExprKind::SequenceStart }
    }

    /// A zero-width assertion that only matches at the sequence's length.
    pub fn sequence_end() -> Expr<T> {
        Expr { kind: ExprKind::SequenceEnd }
    }

    /// Return the kind of this expression.
    pub fn kind(&self) -> &ExprKind<T> {
        &self.kind
    }

    /// Consume this expression and return its kind.
    pub fn into_kind(self) -> ExprKind<T> {
        self.kind
    }

    /// Assign capture indices to every capturing group in this expression,
    /// in pre-order, starting at `start`. Returns the next unused index.
    ///
    /// The compiler wraps the whole expression in group `0`, so the first
    /// explicit group of a compiled pattern always has index `1`.
    pub fn assign_group_ids(&self, start: usize) -> usize {
        let mut next = start;
        self.visit_groups(&mut |_| next += 1);
        next
    }

    /// Calls `f` with every capturing group in pre-order.
    pub(crate) fn visit_groups<F: FnMut(&Group<T>)>(&self, f: &mut F) {
        match self.kind {
            ExprKind::Node(_)
            | ExprKind::MultiNode(_)
            | ExprKind::BackRef(_)
            | ExprKind::SequenceStart
            | ExprKind::SequenceEnd => {}
            ExprKind::Sequence(ref children) | ExprKind::Or(ref children) => {
                for child in children {
                    child.visit_groups(f);
                }
            }
            ExprKind::Group(ref group) => {
                if group.capture {
                    f(group);
                }
                group.child.visit_groups(f);
            }
            ExprKind::Repeat(ref rep) => rep.child.visit_groups(f),
        }
    }
}

impl<T: 'static> Expr<T> {
    /// Matches any single element.
    pub fn any() -> Expr<T> {
        Expr::node(|_: &T| true)
    }
}

impl<T: PartialEq + Send + Sync + 'static> Expr<T> {
    /// Matches a single element equal to `value`.
    pub fn literal(value: T) -> Expr<T> {
        Expr::node(move |elem: &T| *elem == value)
    }

    /// Matches the elements captured by `group` again, using `PartialEq`.
    pub fn backref(group: usize) -> Result<Expr<T>, BuildError> {
        Expr::backref_with(ValueEquality, group)
    }
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Expr<T> {
        Expr { kind: self.kind.clone() }
    }
}

impl<T> Clone for ExprKind<T> {
    fn clone(&self) -> ExprKind<T> {
        match *self {
            ExprKind::Node(ref pred) => ExprKind::Node(Arc::clone(pred)),
            ExprKind::MultiNode(ref pred) => {
                ExprKind::MultiNode(Arc::clone(pred))
            }
            ExprKind::Sequence(ref children) => {
                ExprKind::Sequence(children.clone())
            }
            ExprKind::Or(ref children) => ExprKind::Or(children.clone()),
            ExprKind::Group(ref group) => ExprKind::Group(Group {
                child: group.child.clone(),
                capture: group.capture,
                name: group.name.clone(),
            }),
            ExprKind::Repeat(ref rep) => ExprKind::Repeat(Repeat {
                child: rep.child.clone(),
                min: rep.min,
                max: rep.max,
                greedy: rep.greedy,
            }),
            ExprKind::BackRef(ref br) => ExprKind::BackRef(BackRef {
                checker: Arc::clone(&br.checker),
                group: br.group,
            }),
            ExprKind::SequenceStart => ExprKind::SequenceStart,
            ExprKind::SequenceEnd => ExprKind::SequenceEnd,
        }
    }
}

impl<T> core::fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

impl<T> core::fmt::Debug for ExprKind<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ExprKind::Node(_) => write!(f, "Node(..)"),
            ExprKind::MultiNode(_) => write!(f, "MultiNode(..)"),
            ExprKind::Sequence(ref children) => {
                f.debug_tuple("Sequence").field(children).finish()
            }
            ExprKind::Or(ref children) => {
                f.debug_tuple("Or").field(children).finish()
            }
            ExprKind::Group(ref group) => f
                .debug_struct("Group")
                .field("child", &group.child)
                .field("capture", &group.capture)
                .field("name", &group.name)
                .finish(),
            ExprKind::Repeat(ref rep) => f
                .debug_struct("Repeat")
                .field("child", &rep.child)
                .field("min", &rep.min)
                .field("max", &rep.max)
                .field("greedy", &rep.greedy)
                .finish(),
            ExprKind::BackRef(ref br) => {
                f.debug_struct("BackRef").field("group", &br.group).finish()
            }
            ExprKind::SequenceStart => write!(f, "SequenceStart"),
            ExprKind::SequenceEnd => write!(f, "SequenceEnd"),
        }
    }
}
