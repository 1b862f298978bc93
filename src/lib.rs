/*!
A regular-expression style matching engine over sequences of arbitrary
elements.

Where a conventional regex engine matches characters, this crate matches
elements of any type `T` (tokens, annotated words, events) using predicates
supplied by the caller. A pattern is described by an expression tree
([`Expr`]), compiled into a Thompson NFA and then run over a sequence with a
[`Matcher`].

The engine supports the usual regex vocabulary:

* sequences and prioritized alternation,
* capturing groups, optionally named,
* greedy and lazy repetition with arbitrary bounds,
* backreferences with caller defined element equality,
* nodes that match a variable number of elements, possibly ambiguously
(e.g., a multi-word phrase), via [`SpanPredicate`],
* anchors at the start and end of the sequence.

Matching follows backtracking priority. When several paths through the
pattern match, the one reported is the one a backtracking engine would find
first. Internally every path is simulated in lockstep, with an optional
branch limit that bounds how many paths are alive at once.

# Example

```
use seq_automata::{CompiledPattern, Expr};

// the (cat|dog) \1?
let expr = Expr::sequence(vec![
    Expr::literal("the"),
    Expr::group(Expr::or(vec![Expr::literal("cat"), Expr::literal("dog")])),
    Expr::optional(Expr::backref(1)?),
]);
let pattern = CompiledPattern::new(expr)?;

let words = ["see", "the", "dog", "dog", "and", "the", "cat"];
let mut m = pattern.matcher(&words);
assert!(m.find());
assert_eq!(1..4, m.group(0).unwrap());
assert_eq!(Some(&["dog"][..]), m.group_nodes(1));
assert!(m.find());
assert_eq!(5..7, m.group(0).unwrap());
assert!(!m.find());

# Ok::<(), Box<dyn std::error::Error>>(())
```

# Crate features

* **std** - Enables `std::error::Error` implementations for the error
types. Without it, this crate only needs `alloc`.
* **logging** - Emits `log` messages while compiling and searching.
*/

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod expr;
pub mod matcher;
pub mod nfa;
pub mod pattern;
pub mod util;

pub use crate::{
    expr::{
        ElementEqualityChecker, ElementPredicate, Expr, Extracted, Extraction,
        SpanPredicate, ValueEquality,
    },
    matcher::{FindKind, MatchError, Matcher},
    nfa::thompson::BuildError,
    pattern::CompiledPattern,
    util::{
        captures::{GroupInfo, MatchResult},
        search::Span,
    },
};
