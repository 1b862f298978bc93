/*!
A Thompson NFA compiled from a pattern expression.

The [`Compiler`] turns an [`Expr`](crate::Expr) into an [`NFA`] by building
a small fragment for every sub-expression and chaining the fragments
together with epsilon transitions. The lower level [`Builder`] adds states
to an arena and patches their transitions.
*/

mod builder;
mod compiler;
mod error;
mod nfa;

pub use self::{
    builder::Builder,
    compiler::{Compiler, Config},
    error::BuildError,
    nfa::{State, NFA},
};
