/*!
Nondeterministic finite automata over sequences.

Only one kind of NFA is provided: a Thompson NFA, found in the
[`thompson`] sub-module.
*/

pub mod thompson;
