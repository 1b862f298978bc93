/*!
Running a compiled pattern over a sequence.

A [`Matcher`] binds a [`CompiledPattern`] to one sequence and keeps the
state of an ongoing scan: the region being searched, where the next search
resumes and the current match, if any. A matcher is created with
[`CompiledPattern::matcher`] and is cheap to create.

# Search strategy

At every start position, the matcher simulates the pattern's NFA one
element at a time, tracking every live execution path as a separate
branch. Branches are ordered by the alternatives they took, so that the
match reported is the one a backtracking engine would find first: earlier
alternatives, greedy repetitions that take more and lazy repetitions that
take less.

In the default [`FindKind::NonOverlapping`] mode, a match is reported as
soon as no higher priority branch remains. To bound the number of branches
alive at once, a [branch limit](Config::branch_limit) may be set. When it
is exceeded, the lower priority branches are set aside and only resumed if
every higher priority branch fails, which trades time for memory without
changing which match is reported.

# Example

```
use seq_automata::{CompiledPattern, Expr};

let pattern = CompiledPattern::new(Expr::sequence(vec![
    Expr::literal("the"),
    Expr::group(Expr::plus(Expr::node(|w: &&str| w.ends_with("at")))),
]))?;
let words = ["the", "cat", "sat", "on", "the", "mat"];
let mut m = pattern.matcher(&words);

assert!(m.find());
assert_eq!(Some(&["cat", "sat"][..]), m.group_nodes(1));
assert!(m.find());
assert_eq!(Some(&["mat"][..]), m.group_nodes(1));
assert!(!m.find());

# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

use alloc::vec::Vec;

use crate::{
    expr::Extracted,
    pattern::CompiledPattern,
    util::{captures::MatchResult, search::Span},
};

pub use self::error::MatchError;

mod branch;
mod error;
mod vm;

/// The configuration used for searching with a [`Matcher`].
///
/// A configuration given to a pattern
/// [`Builder`](crate::pattern::Builder::configure) is the default of every
/// matcher created from that pattern. It may be overridden per matcher with
/// [`Matcher::configure`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    branch_limit: Option<Option<usize>>,
    find_kind: Option<FindKind>,
    extract: Option<bool>,
}

impl Config {
    /// Return a new default matcher configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Set the number of branches that may be alive at once before the
    /// lower priority ones are set aside for later.
    ///
    /// This only affects [`FindKind::NonOverlapping`] searches and never
    /// changes which match is found. `None` disables the limit, in which
    /// case every branch runs in lockstep.
    ///
    /// This is set to `Some(2)` by default.
    pub fn branch_limit(mut self, limit: Option<usize>) -> Config {
        self.branch_limit = Some(limit);
        self
    }

    /// Set how [`Matcher::find`] enumerates matches.
    ///
    /// This is set to [`FindKind::NonOverlapping`] by default.
    pub fn find_kind(mut self, kind: FindKind) -> Config {
        self.find_kind = Some(kind);
        self
    }

    /// Whether to ask node predicates for extracted values while matching.
    ///
    /// When enabled, [`ElementPredicate::match_with_extraction`] is called
    /// instead of [`ElementPredicate::matches`] and every extracted value is
    /// available from the match result.
    ///
    /// This is disabled by default.
    ///
    /// [`ElementPredicate::match_with_extraction`]:
    /// crate::ElementPredicate::match_with_extraction
    /// [`ElementPredicate::matches`]: crate::ElementPredicate::matches
    pub fn extract(mut self, yes: bool) -> Config {
        self.extract = Some(yes);
        self
    }

    /// Returns the branch limit, if one is set.
    pub fn get_branch_limit(&self) -> Option<usize> {
        self.branch_limit.unwrap_or(Some(2))
    }

    /// Returns how matches are enumerated.
    pub fn get_find_kind(&self) -> FindKind {
        self.find_kind.unwrap_or(FindKind::NonOverlapping)
    }

    /// Returns whether extracted values are recorded.
    pub fn get_extract(&self) -> bool {
        self.extract.unwrap_or(false)
    }

    /// Overwrite the default configuration such that the options in `o` are
    /// always used. If an option in `o` is not set, then the corresponding
    /// option in `self` is used. If it's not set in `self` either, then it
    /// remains not set.
    pub(crate) fn overwrite(self, o: Config) -> Config {
        Config {
            branch_limit: o.branch_limit.or(self.branch_limit),
            find_kind: o.find_kind.or(self.find_kind),
            extract: o.extract.or(self.extract),
        }
    }
}

/// The way successive calls to [`Matcher::find`] enumerate matches.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FindKind {
    /// Report the highest priority match at the leftmost start, then resume
    /// after its end.
    NonOverlapping,
    /// Report every match at a start, in priority order, then move the
    /// start forward by one. Matches may overlap.
    All,
}

impl Default for FindKind {
    fn default() -> FindKind {
        FindKind::NonOverlapping
    }
}

/// Where a matcher is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// No search has run since the matcher was created, reset or given a
    /// new region.
    Fresh,
    /// A search is in progress.
    Scanning,
    /// The last search found a match.
    Matched,
    /// The last search failed.
    Failed,
}

/// A pattern bound to a sequence, with the state of an ongoing scan.
///
/// The lifetime `'h` is the lifetime of the sequence being searched.
pub struct Matcher<'h, T> {
    pattern: CompiledPattern<T>,
    haystack: &'h [T],
    config: Config,
    cache: vm::Cache,
    region: Span,
    status: Status,
    /// Where the next `find` starts. `None` once a `find` has failed.
    next_start: Option<usize>,
    /// The end of the last match reported by `find`.
    last_match_end: Option<usize>,
    current: Option<MatchResult>,
    /// Matches at the last start that are yet to be reported, in reverse
    /// priority order. Only used by `FindKind::All`.
    pending: Vec<MatchResult>,
    /// Why the last search gave up, if it did.
    error: Option<MatchError>,
}

impl<'h, T> Matcher<'h, T> {
    pub(crate) fn new(
        pattern: CompiledPattern<T>,
        haystack: &'h [T],
    ) -> Matcher<'h, T> {
        let config = pattern.matcher_config();
        Matcher {
            pattern,
            haystack,
            config,
            cache: vm::Cache::new(),
            region: Span::new(0, haystack.len()),
            status: Status::Fresh,
            next_start: Some(0),
            last_match_end: None,
            current: None,
            pending: Vec::new(),
            error: None,
        }
    }

    /// Apply the given configuration options to this matcher. Options not
    /// set in `config` keep their current value.
    ///
    /// This resets the matcher's match state, but not its region.
    pub fn configure(&mut self, config: Config) -> &mut Matcher<'h, T> {
        self.config = self.config.overwrite(config);
        self.clear();
        self
    }

    /// Return the pattern this matcher runs.
    pub fn pattern(&self) -> &CompiledPattern<T> {
        &self.pattern
    }

    /// Return the sequence this matcher searches.
    pub fn haystack(&self) -> &'h [T] {
        self.haystack
    }

    /// Return where this matcher is in its lifecycle.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Restrict searching to `begin..end` of the sequence.
    ///
    /// Matches must lie entirely inside the region. Sequence anchors still
    /// refer to the ends of the whole sequence.
    ///
    /// This returns an error if `begin > end` or if `end` is greater than
    /// the length of the sequence. Otherwise, any current match is cleared
    /// and the next `find` starts at `begin`.
    pub fn region(
        &mut self,
        begin: usize,
        end: usize,
    ) -> Result<(), MatchError> {
        if begin > end || end > self.haystack.len() {
            return Err(MatchError::region_out_of_range(
                begin,
                end,
                self.haystack.len(),
            ));
        }
        self.region = Span::new(begin, end);
        self.clear();
        Ok(())
    }

    /// The start of the region, inclusive.
    pub fn region_start(&self) -> usize {
        self.region.start
    }

    /// The end of the region, exclusive.
    pub fn region_end(&self) -> usize {
        self.region.end
    }

    /// Clear any match state and restore the region to the whole sequence.
    pub fn reset(&mut self) -> &mut Matcher<'h, T> {
        self.region = Span::new(0, self.haystack.len());
        self.clear();
        self
    }

    /// Returns true if the pattern matches the entire region.
    ///
    /// This does not change where the next `find` starts.
    pub fn matches(&mut self) -> bool {
        self.status = Status::Scanning;
        self.pending.clear();
        self.error = None;
        match self.best_at(self.region.start, true) {
            Ok(found) => self.settle(found),
            Err(err) => self.give_up(err),
        }
    }

    /// Search for the next match in the region.
    ///
    /// The first call searches from the start of the region. Each further
    /// call resumes where the previous one left off, as determined by the
    /// configured [`FindKind`]. Once a call fails, every further call fails
    /// until the matcher is reset or given a new region.
    ///
    /// A search that gives up is reported as a failure. Use
    /// [`Matcher::try_find`] to tell the two apart.
    pub fn find(&mut self) -> bool {
        self.try_find().unwrap_or(false)
    }

    /// Like [`Matcher::find`], but returns an error if the search gave up
    /// because too many branches were alive at once.
    ///
    /// After an error, every further call fails until the matcher is reset
    /// or given a new region.
    pub fn try_find(&mut self) -> Result<bool, MatchError> {
        if let Some(ref err) = self.error {
            return Err(err.clone());
        }
        let result = match self.config.get_find_kind() {
            FindKind::NonOverlapping => self.find_non_overlapping(),
            FindKind::All => self.find_all(),
        };
        result.map_err(|err| {
            self.give_up(err.clone());
            err
        })
    }

    /// Reset this matcher and search for a match starting at `start` or
    /// later.
    ///
    /// This returns an error if `start` is past the end of the sequence or
    /// if the search gave up.
    pub fn find_at(&mut self, start: usize) -> Result<bool, MatchError> {
        if start > self.haystack.len() {
            return Err(MatchError::start_out_of_range(
                start,
                self.haystack.len(),
            ));
        }
        self.reset();
        self.next_start = Some(start);
        self.try_find()
    }

    /// Return an iterator over the remaining matches, as reported by
    /// successive calls to [`Matcher::find`].
    pub fn find_iter<'m>(&'m mut self) -> FindMatches<'m, 'h, T> {
        FindMatches { matcher: self }
    }

    /// Return the span of the given group in the current match.
    ///
    /// This returns `None` if there is no current match, if the group does
    /// not exist or if it did not participate in the match.
    pub fn group(&self, index: usize) -> Option<Span> {
        self.current.as_ref()?.get_group(index)
    }

    /// Return the elements matched by the given group.
    pub fn group_nodes(&self, index: usize) -> Option<&'h [T]> {
        let haystack = self.haystack;
        self.group(index).map(|span| &haystack[span])
    }

    /// Return the span of the group with the given name.
    pub fn named_group(&self, name: &str) -> Option<Span> {
        self.current.as_ref()?.get_group_by_name(name)
    }

    /// Return the elements matched by the group with the given name.
    pub fn named_group_nodes(&self, name: &str) -> Option<&'h [T]> {
        let haystack = self.haystack;
        self.named_group(name).map(|span| &haystack[span])
    }

    /// Return the start of the given group in the current match.
    ///
    /// Unlike [`Matcher::group`], this distinguishes why no start exists.
    pub fn start(&self, index: usize) -> Result<usize, MatchError> {
        self.group_span(index).map(|span| span.start)
    }

    /// Return the end of the given group in the current match.
    pub fn end(&self, index: usize) -> Result<usize, MatchError> {
        self.group_span(index).map(|span| span.end)
    }

    /// The number of capturing groups in the pattern, not counting the
    /// implicit group `0`.
    pub fn group_count(&self) -> usize {
        self.pattern.group_len() - 1
    }

    /// Return the value extracted from the element at `index` in the
    /// current match, if any.
    pub fn node_extraction(&self, index: usize) -> Option<&Extracted> {
        self.current.as_ref()?.extraction(index)
    }

    /// Return every value extracted inside the given group of the current
    /// match, in element order.
    pub fn group_extractions(
        &self,
        group: usize,
    ) -> impl Iterator<Item = (usize, &Extracted)> + '_ {
        self.current
            .as_ref()
            .and_then(|m| Some((m, m.get_group(group)?)))
            .into_iter()
            .flat_map(|(m, span)| m.extractions_in(span))
    }

    /// Return an owned copy of the current match.
    pub fn to_match_result(&self) -> Result<MatchResult, MatchError> {
        self.current().map(|m| m.clone())
    }

    fn current(&self) -> Result<&MatchResult, MatchError> {
        if let Some(ref err) = self.error {
            return Err(err.clone());
        }
        match self.current {
            Some(ref m) => Ok(m),
            None if self.status == Status::Fresh => {
                Err(MatchError::not_yet_run())
            }
            None => Err(MatchError::no_match()),
        }
    }

    fn group_span(&self, index: usize) -> Result<Span, MatchError> {
        let m = self.current()?;
        if index >= m.group_len() {
            return Err(MatchError::invalid_group(index, m.group_len()));
        }
        m.get_group(index).ok_or_else(|| MatchError::unmatched_group(index))
    }

    fn clear(&mut self) {
        self.status = Status::Fresh;
        self.next_start = Some(self.region.start);
        self.last_match_end = None;
        self.current = None;
        self.pending.clear();
        self.error = None;
    }

    fn give_up(&mut self, err: MatchError) -> bool {
        debug!("search gave up: {}", err);
        self.next_start = None;
        self.pending.clear();
        self.error = Some(err);
        self.settle(None)
    }

    fn settle(&mut self, found: Option<MatchResult>) -> bool {
        self.status =
            if found.is_some() { Status::Matched } else { Status::Failed };
        self.current = found;
        self.current.is_some()
    }

    fn find_non_overlapping(&mut self) -> Result<bool, MatchError> {
        let mut start = match self.next_start {
            None => return Ok(self.settle(None)),
            Some(start) => start,
        };
        self.status = Status::Scanning;
        while let Some(m) = self.leftmost_from(start)? {
            // An empty match right where the last match ended would report
            // the same position twice.
            if m.is_empty() && Some(m.start()) == self.last_match_end {
                start = m.start() + 1;
                continue;
            }
            self.last_match_end = Some(m.end());
            self.next_start =
                Some(if m.is_empty() { m.end() + 1 } else { m.end() });
            return Ok(self.settle(Some(m)));
        }
        self.next_start = None;
        Ok(self.settle(None))
    }

    fn find_all(&mut self) -> Result<bool, MatchError> {
        loop {
            if let Some(m) = self.pending.pop() {
                return Ok(self.settle(Some(m)));
            }
            let start = match self.next_start {
                Some(start) if start <= self.region.end => start,
                _ => {
                    self.next_start = None;
                    return Ok(self.settle(None));
                }
            };
            self.status = Status::Scanning;
            self.next_start = Some(start + 1);
            let search = vm::Search {
                nfa: self.pattern.nfa(),
                haystack: self.haystack,
                region: self.region,
                full: false,
                extract: self.config.get_extract(),
            };
            let found = search.all_at(&mut self.cache, start)?;
            let pattern = &self.pattern;
            self.pending =
                found.into_iter().rev().map(|c| finish(pattern, c)).collect();
        }
    }

    /// Find the best match at the leftmost start in `start..=region.end`.
    fn leftmost_from(
        &mut self,
        start: usize,
    ) -> Result<Option<MatchResult>, MatchError> {
        for at in start..=self.region.end {
            if let Some(m) = self.best_at(at, false)? {
                return Ok(Some(m));
            }
        }
        Ok(None)
    }

    fn best_at(
        &mut self,
        start: usize,
        full: bool,
    ) -> Result<Option<MatchResult>, MatchError> {
        let search = vm::Search {
            nfa: self.pattern.nfa(),
            haystack: self.haystack,
            region: self.region,
            full,
            extract: self.config.get_extract(),
        };
        let limit = self.config.get_branch_limit();
        let captured = search.best_at(&mut self.cache, limit, start)?;
        Ok(captured.map(|c| finish(&self.pattern, c)))
    }
}

/// Turn the captures of a completed branch into a match result.
fn finish<T>(
    pattern: &CompiledPattern<T>,
    captured: vm::Captured,
) -> MatchResult {
    MatchResult::new(
        pattern.group_info().clone(),
        captured.groups,
        captured.extractions,
        pattern.priority(),
    )
}

impl<'h, T> core::fmt::Debug for Matcher<'h, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Matcher")
            .field("config", &self.config)
            .field("region", &self.region)
            .field("status", &self.status)
            .field("next_start", &self.next_start)
            .field("current", &self.current)
            .finish()
    }
}

/// An iterator over the matches of a [`Matcher`].
///
/// This is created by [`Matcher::find_iter`]. It yields one
/// [`MatchResult`] per successful call to [`Matcher::find`] and stops at
/// the first failure.
///
/// The lifetime `'m` is the lifetime of the borrow of the matcher and `'h`
/// is the lifetime of the sequence being searched.
#[derive(Debug)]
pub struct FindMatches<'m, 'h, T> {
    matcher: &'m mut Matcher<'h, T>,
}

impl<'m, 'h, T> Iterator for FindMatches<'m, 'h, T> {
    type Item = MatchResult;

    fn next(&mut self) -> Option<MatchResult> {
        if !self.matcher.find() {
            return None;
        }
        self.matcher.current.clone()
    }
}
