/*!
Compiled patterns and the builder that produces them.
*/

use core::marker::PhantomData;

use alloc::sync::Arc;

use crate::{
    expr::Expr,
    matcher::{self, Matcher},
    nfa::thompson::{self, BuildError, Compiler, NFA},
    util::captures::GroupInfo,
};

/// A pattern expression compiled into a Thompson NFA, ready to be run over
/// any number of sequences.
///
/// A compiled pattern is immutable and cheap to clone. It is `Send` and
/// `Sync`, so it may be shared freely between threads, with each thread
/// creating its own [`Matcher`]s.
///
/// # Example
///
/// ```
/// use seq_automata::{CompiledPattern, Expr};
///
/// // (?P<n>NUMBER+) "th"?
/// let pattern = CompiledPattern::new(Expr::sequence(vec![
///     Expr::named_group(
///         "n",
///         Expr::plus(Expr::node(|s: &String| s.parse::<u32>().is_ok())),
///     ),
///     Expr::optional(Expr::node(|s: &String| s == "th")),
/// ]))?;
///
/// let seq: Vec<String> =
///     "the 4 th of July".split(' ').map(String::from).collect();
/// let mut m = pattern.matcher(&seq);
/// assert!(m.find());
/// assert_eq!(1..3, m.group(0).unwrap());
/// assert_eq!(Some(&seq[1..2]), m.named_group_nodes("n"));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct CompiledPattern<T>(Arc<CompiledPatternInner<T>>);

struct CompiledPatternInner<T> {
    expr: Expr<T>,
    nfa: NFA<T>,
    priority: f64,
    matcher: matcher::Config,
}

impl<T> CompiledPattern<T> {
    /// Compile the given expression with the default configuration.
    pub fn new(expr: Expr<T>) -> Result<CompiledPattern<T>, BuildError> {
        Builder::new().build(expr)
    }

    /// Return a builder for configuring the compilation of a pattern.
    pub fn builder() -> Builder<T> {
        Builder::new()
    }

    /// Create a matcher that runs this pattern over `haystack`.
    pub fn matcher<'h>(&self, haystack: &'h [T]) -> Matcher<'h, T> {
        Matcher::new(self.clone(), haystack)
    }

    /// Returns true if this pattern matches anywhere in `haystack`.
    pub fn is_match(&self, haystack: &[T]) -> bool {
        self.matcher(haystack).find()
    }

    /// Return the expression this pattern was compiled from.
    pub fn expr(&self) -> &Expr<T> {
        &self.0.expr
    }

    /// Return the underlying NFA.
    pub fn nfa(&self) -> &NFA<T> {
        &self.0.nfa
    }

    /// Return the priority given to this pattern when it was built.
    ///
    /// The priority is never consulted while matching. It is carried into
    /// every match result so that callers running several patterns over the
    /// same sequence can rank their matches.
    pub fn priority(&self) -> f64 {
        self.0.priority
    }

    /// Return the capture group metadata of this pattern.
    pub fn group_info(&self) -> &GroupInfo {
        self.0.nfa.group_info()
    }

    /// Return the number of capture groups, including the implicit group
    /// `0`.
    pub fn group_len(&self) -> usize {
        self.0.nfa.group_len()
    }

    /// The matcher configuration that new matchers start with.
    pub(crate) fn matcher_config(&self) -> matcher::Config {
        self.0.matcher
    }
}

impl<T> Clone for CompiledPattern<T> {
    fn clone(&self) -> CompiledPattern<T> {
        CompiledPattern(Arc::clone(&self.0))
    }
}

impl<T> core::fmt::Debug for CompiledPattern<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("CompiledPattern").field(&self.0.expr).finish()
    }
}

/// A builder for a [`CompiledPattern`] over elements of type `T`.
///
/// This brings together the NFA compiler configuration, the default
/// configuration of matchers created from the pattern, and the pattern's
/// priority.
pub struct Builder<T> {
    thompson: thompson::Config,
    matcher: matcher::Config,
    priority: Option<f64>,
    _elements: PhantomData<fn() -> T>,
}

impl<T> Builder<T> {
    /// Create a new builder with the default configuration.
    pub fn new() -> Builder<T> {
        Builder {
            thompson: thompson::Config::default(),
            matcher: matcher::Config::default(),
            priority: None,
            _elements: PhantomData,
        }
    }

    /// Compile the given expression.
    pub fn build(
        &self,
        expr: Expr<T>,
    ) -> Result<CompiledPattern<T>, BuildError> {
        let nfa = Compiler::new().configure(self.thompson).build(&expr)?;
        Ok(CompiledPattern(Arc::new(CompiledPatternInner {
            expr,
            nfa,
            priority: self.priority.unwrap_or(0.0),
            matcher: self.matcher,
        })))
    }

    /// Set the default configuration of every matcher created from the
    /// pattern.
    pub fn configure(&mut self, config: matcher::Config) -> &mut Builder<T> {
        self.matcher = self.matcher.overwrite(config);
        self
    }

    /// Set the NFA compiler configuration.
    pub fn thompson(&mut self, config: thompson::Config) -> &mut Builder<T> {
        self.thompson = self.thompson.overwrite(config);
        self
    }

    /// Set the priority of the pattern. This defaults to `0.0`.
    pub fn priority(&mut self, priority: f64) -> &mut Builder<T> {
        self.priority = Some(priority);
        self
    }
}

impl<T> Default for Builder<T> {
    fn default() -> Builder<T> {
        Builder::new()
    }
}

impl<T> Clone for Builder<T> {
    fn clone(&self) -> Builder<T> {
        Builder {
            thompson: self.thompson,
            matcher: self.matcher,
            priority: self.priority,
            _elements: PhantomData,
        }
    }
}

impl<T> core::fmt::Debug for Builder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Builder")
            .field("thompson", &self.thompson)
            .field("matcher", &self.matcher)
            .field("priority", &self.priority)
            .finish()
    }
}
