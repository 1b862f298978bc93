use core::cmp::{self, Ordering};

use alloc::{collections::BTreeMap, sync::Arc, vec, vec::Vec};

use crate::{
    expr::{Extracted, Extraction, SpanPredicate},
    matcher::{
        branch::{BranchTable, Overlay, Progress},
        MatchError,
    },
    nfa::thompson::{State, NFA},
    util::{
        primitives::{BranchID, StateID},
        search::Span,
    },
};

/// A single parked execution path: the state it waits in and the branch
/// that owns its captures, counters and progress.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Thread {
    sid: StateID,
    bid: BranchID,
}

/// The groups and extracted values of a completed branch.
#[derive(Clone, Debug)]
pub(crate) struct Captured {
    pub(crate) groups: Vec<Option<Span>>,
    pub(crate) extractions: Vec<(usize, Extracted)>,
}

/// Mutable scratch space for a search. It is reused across searches by the
/// same matcher.
#[derive(Clone, Debug)]
pub(crate) struct Cache {
    stack: Vec<FollowEpsilon>,
    branches: BranchTable,
    snapshots: Vec<Snapshot>,
    seen: Seen,
}

/// A frame on the epsilon closure worklist.
#[derive(Clone, Debug)]
struct FollowEpsilon {
    sid: StateID,
    bid: BranchID,
    /// The states already visited by this lineage during the current
    /// closure. This is what makes loops that can match nothing terminate.
    visited: Vec<StateID>,
}

/// Deferred lower-priority threads and the position they were parked at.
#[derive(Clone, Debug)]
struct Snapshot {
    threads: Vec<Thread>,
    at: usize,
}

/// The overlays of the threads parked so far in a search, by position and
/// state.
///
/// Threads are parked in priority order, both within a step and across
/// resumed snapshots. A thread arriving in a state where a branch with the
/// same captures, counters and progress was already parked at the same
/// position can never do better than that branch, so it is dropped. This
/// keeps ambiguous patterns like `(a|a)*` from doubling the number of
/// threads at every element, and keeps a resumed snapshot from redoing work
/// that already failed.
#[derive(Clone, Debug, Default)]
struct Seen {
    map: BTreeMap<(usize, StateID), Vec<Arc<Overlay>>>,
}

impl Seen {
    fn clear(&mut self) {
        self.map.clear();
    }

    /// Forget every thread parked before `at`.
    fn forget_before(&mut self, at: usize) {
        let stale = match self.map.keys().next() {
            None => false,
            Some(&(first, _)) => first < at,
        };
        if stale {
            self.map = self.map.split_off(&(at, StateID::ZERO));
        }
    }
}

impl Cache {
    pub(crate) fn new() -> Cache {
        Cache::with_branches(BranchTable::new())
    }

    /// A cache whose searches give up once `capacity` branches exist.
    #[cfg(test)]
    pub(crate) fn with_branch_capacity(capacity: usize) -> Cache {
        Cache::with_branches(BranchTable::with_capacity(capacity))
    }

    fn with_branches(branches: BranchTable) -> Cache {
        Cache {
            stack: vec![],
            branches,
            snapshots: vec![],
            seen: Seen::default(),
        }
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.snapshots.clear();
        self.seen.clear();
    }

    /// Drop the branches no thread uses any more. Threads may be in `clist`
    /// or in a snapshot.
    fn compact(&mut self, clist: &mut [Thread]) {
        let Cache { ref mut branches, ref mut snapshots, .. } = *self;
        let mut live: Vec<&mut BranchID> = clist
            .iter_mut()
            .chain(snapshots.iter_mut().flat_map(|s| s.threads.iter_mut()))
            .map(|t| &mut t.bid)
            .collect();
        branches.compact(&mut live);
    }
}

/// The parameters of one search over a sequence.
#[derive(Debug)]
pub(crate) struct Search<'a, 'h, T> {
    pub(crate) nfa: &'a NFA<T>,
    pub(crate) haystack: &'h [T],
    pub(crate) region: Span,
    /// When set, a match only counts if it ends at the end of the region.
    pub(crate) full: bool,
    /// When set, node predicates are asked for extracted values.
    pub(crate) extract: bool,
}

impl<'a, 'h, T> Search<'a, 'h, T> {
    /// Find the highest priority match that starts at `start`.
    ///
    /// When `branch_limit` is set and more branches than the limit are
    /// alive at some position, only the higher priority part of them keeps
    /// running. The rest is saved and resumed if the running part fails.
    pub(crate) fn best_at(
        &self,
        cache: &mut Cache,
        branch_limit: Option<usize>,
        start: usize,
    ) -> Result<Option<Captured>, MatchError> {
        let clist = self.start_threads(cache, start)?;
        cache.snapshots.push(Snapshot { threads: clist, at: start });
        while let Some(Snapshot { threads, at }) = cache.snapshots.pop() {
            trace!(
                "resuming {} branches at {} ({} snapshots left)",
                threads.len(),
                at,
                cache.snapshots.len(),
            );
            if let Some(thread) = self.run(cache, branch_limit, threads, at)? {
                trace!(
                    "match found from {} after creating {} branches",
                    start,
                    cache.branches.len(),
                );
                let captured = self.capture(cache, thread);
                cache.snapshots.clear();
                return Ok(Some(captured));
            }
        }
        Ok(None)
    }

    /// Find every match that starts at `start`, in priority order.
    pub(crate) fn all_at(
        &self,
        cache: &mut Cache,
        start: usize,
    ) -> Result<Vec<Captured>, MatchError> {
        let matched = self.nfa.match_state();
        let mut clist = self.start_threads(cache, start)?;
        let mut nlist = vec![];
        let mut at = start;
        while at < self.region.end && clist.iter().any(|t| t.sid != matched) {
            nlist.clear();
            self.step(cache, &clist, at, &mut nlist);
            core::mem::swap(&mut clist, &mut nlist);
            at += 1;
            self.check_branches(cache, at)?;
            cache.seen.forget_before(at);
            if cache.branches.wants_compaction() {
                cache.compact(&mut clist);
            }
        }
        clist.retain(|t| t.sid == matched);
        let branches = &cache.branches;
        clist.sort_by(|a, b| branches.cmp(a.bid, b.bid));
        Ok(clist.iter().map(|&t| self.capture(cache, t)).collect())
    }

    fn start_threads(
        &self,
        cache: &mut Cache,
        start: usize,
    ) -> Result<Vec<Thread>, MatchError> {
        cache.reset();
        let root = cache.branches.root(self.nfa.group_len());
        cache.stack.push(FollowEpsilon {
            sid: self.nfa.start(),
            bid: root,
            visited: vec![],
        });
        let mut clist = vec![];
        self.epsilon_closure(cache, start, &mut clist);
        self.check_branches(cache, start)?;
        Ok(clist)
    }

    /// Give up if a fork was refused while reaching `at`, since the threads
    /// that were lost may have held the best match.
    fn check_branches(
        &self,
        cache: &Cache,
        at: usize,
    ) -> Result<(), MatchError> {
        if cache.branches.is_exhausted() {
            return Err(MatchError::gave_up(at, cache.branches.len()));
        }
        Ok(())
    }

    /// Scan forward from `at` until the best remaining thread is a match
    /// or every thread has died.
    fn run(
        &self,
        cache: &mut Cache,
        branch_limit: Option<usize>,
        mut clist: Vec<Thread>,
        mut at: usize,
    ) -> Result<Option<Thread>, MatchError> {
        let mut nlist = vec![];
        loop {
            let best = self.prune(cache, &mut clist);
            if clist.is_empty() {
                return Ok(None);
            }
            if at >= self.region.end || (best.is_some() && clist.len() == 1) {
                return Ok(best);
            }
            if let Some(limit) = branch_limit {
                if clist.len() > limit {
                    self.split(cache, limit, &mut clist, at);
                }
            }
            nlist.clear();
            self.step(cache, &clist, at, &mut nlist);
            core::mem::swap(&mut clist, &mut nlist);
            at += 1;
            self.check_branches(cache, at)?;
            // Snapshots are stacked by position, so the bottom one is the
            // oldest that may still be resumed.
            let oldest = cache.snapshots.first().map_or(at, |s| s.at);
            cache.seen.forget_before(oldest);
            if cache.branches.wants_compaction() {
                cache.compact(&mut clist);
            }
        }
    }

    /// Drop every thread with a lower priority than the best match among
    /// `clist`, and return that match.
    fn prune(&self, cache: &Cache, clist: &mut Vec<Thread>) -> Option<Thread> {
        let matched = self.nfa.match_state();
        let branches = &cache.branches;
        let best = clist
            .iter()
            .filter(|t| t.sid == matched)
            .copied()
            .min_by(|a, b| branches.cmp(a.bid, b.bid))?;
        clist.retain(|t| branches.cmp(t.bid, best.bid) != Ordering::Greater);
        Some(best)
    }

    /// Keep the highest priority threads of `clist` and save the rest as a
    /// snapshot to resume from `at` later.
    fn split(
        &self,
        cache: &mut Cache,
        limit: usize,
        clist: &mut Vec<Thread>,
        at: usize,
    ) {
        let branches = &cache.branches;
        clist.sort_by(|a, b| branches.cmp(a.bid, b.bid));
        let keep = cmp::max(1, cmp::min(limit, (clist.len() + 1) / 2));
        let deferred = clist.split_off(keep);
        trace!(
            "splitting branches at {}: keeping {}, deferring {}",
            at,
            clist.len(),
            deferred.len(),
        );
        cache.snapshots.push(Snapshot { threads: deferred, at });
    }

    fn capture(&self, cache: &Cache, thread: Thread) -> Captured {
        let overlay = cache.branches.overlay(thread.bid);
        Captured {
            groups: overlay.spans(),
            extractions: overlay.extractions(),
        }
    }

    /// Feed the element at `at` to every parked thread in `clist`. Threads
    /// that move past the element are followed through the epsilon closure
    /// at `at + 1` and parked in `nlist`.
    fn step(
        &self,
        cache: &mut Cache,
        clist: &[Thread],
        at: usize,
        nlist: &mut Vec<Thread>,
    ) {
        let elem = &self.haystack[at];
        for &thread in clist {
            let Thread { sid, bid } = thread;
            match *self.nfa.state(sid) {
                State::Node { ref pred, ref next } => {
                    let matched = if self.extract {
                        match pred.match_with_extraction(elem) {
                            Extraction::NoMatch => false,
                            Extraction::Match => true,
                            Extraction::MatchWith(value) => {
                                cache
                                    .branches
                                    .overlay_mut(bid)
                                    .record_extraction(at, sid, value);
                                true
                            }
                        }
                    } else {
                        pred.matches(elem)
                    };
                    if matched {
                        self.advance(cache, bid, next, at + 1, nlist);
                    }
                }
                State::MultiNode { ref pred, ref next } => {
                    if let Some(Progress::Interval { end }) =
                        cache.branches.overlay(bid).progress(sid)
                    {
                        if at + 1 < end {
                            self.park(cache, at + 1, thread, nlist);
                        } else {
                            let overlay = cache.branches.overlay_mut(bid);
                            overlay.clear_progress(sid);
                            self.advance(cache, bid, next, at + 1, nlist);
                        }
                        continue;
                    }
                    let spans = self.candidate_spans(pred, at);
                    let forked = spans.len() > 1;
                    for (i, span) in spans.into_iter().enumerate() {
                        let bid = if forked {
                            match cache.branches.fork(bid, i) {
                                None => break,
                                Some(child) => child,
                            }
                        } else {
                            bid
                        };
                        if span.end == at + 1 {
                            self.advance(cache, bid, next, at + 1, nlist);
                        } else {
                            let end = span.end;
                            cache
                                .branches
                                .overlay_mut(bid)
                                .set_progress(sid, Progress::Interval { end });
                            let thread = Thread { sid, bid };
                            self.park(cache, at + 1, thread, nlist);
                        }
                    }
                }
                State::BackRef { ref checker, group, ref next } => {
                    let overlay = cache.branches.overlay(bid);
                    let span = overlay.group(group).and_then(|g| g.span());
                    let span = match span {
                        None => continue,
                        Some(span) => span,
                    };
                    let consumed = match overlay.progress(sid) {
                        Some(Progress::Consumed(n)) => n,
                        _ => 0,
                    };
                    let other = &self.haystack[span.start + consumed];
                    if !checker.equal(elem, other) {
                        continue;
                    }
                    let consumed = consumed + 1;
                    let overlay = cache.branches.overlay_mut(bid);
                    if consumed < span.len() {
                        let progress = Progress::Consumed(consumed);
                        overlay.set_progress(sid, progress);
                        self.park(cache, at + 1, thread, nlist);
                    } else {
                        overlay.clear_progress(sid);
                        self.advance(cache, bid, next, at + 1, nlist);
                    }
                }
                // A completed match waits for the rest to catch up. Epsilon
                // states are never parked, but re-queueing them is harmless.
                _ => self.park(cache, at + 1, thread, nlist),
            }
        }
    }

    /// Ask a span predicate for its intervals at `at`, keeping only those
    /// that start at `at`, are non-empty and end inside the region.
    fn candidate_spans(
        &self,
        pred: &Arc<dyn SpanPredicate<T>>,
        at: usize,
    ) -> Vec<Span> {
        let seq = &self.haystack[..self.region.end];
        let mut spans = pred.candidate_spans(seq, at);
        spans.retain(|span| {
            if span.start != at || span.end <= at || span.end > seq.len() {
                debug!(
                    "ignoring candidate interval {:?} at {} in region {:?}",
                    span, at, self.region,
                );
                return false;
            }
            true
        });
        spans
    }

    fn advance(
        &self,
        cache: &mut Cache,
        bid: BranchID,
        next: &[StateID],
        at: usize,
        nlist: &mut Vec<Thread>,
    ) {
        self.follow(cache, bid, next, vec![]);
        self.epsilon_closure(cache, at, nlist);
    }

    /// Push a frame for every successor in `next`. More than one successor
    /// forks the branch, in order, so that earlier successors win.
    fn follow(
        &self,
        cache: &mut Cache,
        bid: BranchID,
        next: &[StateID],
        visited: Vec<StateID>,
    ) {
        match *next {
            [] => {}
            [sid] => cache.stack.push(FollowEpsilon { sid, bid, visited }),
            _ => {
                for (i, &sid) in next.iter().enumerate().rev() {
                    let bid = match cache.branches.fork(bid, i) {
                        None => return,
                        Some(child) => child,
                    };
                    let visited = visited.clone();
                    cache.stack.push(FollowEpsilon { sid, bid, visited });
                }
            }
        }
    }

    /// Park `thread` in `out`, waiting at `at`, unless an equivalent thread
    /// was already parked there.
    fn park(
        &self,
        cache: &mut Cache,
        at: usize,
        thread: Thread,
        out: &mut Vec<Thread>,
    ) {
        let Cache { ref branches, ref mut seen, .. } = *cache;
        let overlays =
            seen.map.entry((at, thread.sid)).or_insert_with(Vec::new);
        if overlays.iter().any(|o| branches.has_overlay(thread.bid, o)) {
            return;
        }
        overlays.push(branches.share_overlay(thread.bid));
        out.push(thread);
    }

    /// Drain the worklist, following epsilon transitions at position `at`
    /// and parking every thread that reaches a consuming state or the match
    /// state in `out`. Frames popped first come from higher priority
    /// successors.
    fn epsilon_closure(
        &self,
        cache: &mut Cache,
        at: usize,
        out: &mut Vec<Thread>,
    ) {
        while let Some(FollowEpsilon { sid, bid, mut visited }) =
            cache.stack.pop()
        {
            let state = self.nfa.state(sid);
            // Set when a bounded repetition is re-entered after its body
            // matched nothing. It may only be left from here on.
            let mut exit_only = false;
            if visited.contains(&sid) {
                match *state {
                    State::Repeat { min, max, .. } => {
                        let counter = cache.branches.overlay(bid).counter(sid);
                        // The previous visit could not exit yet, so the
                        // empty iteration counts towards the minimum.
                        if counter.map_or(false, |count| count <= min) {
                            visited.clear();
                            visited.push(sid);
                        } else if max.is_some() {
                            exit_only = true;
                        } else {
                            continue;
                        }
                    }
                    _ => continue,
                }
            } else {
                visited.push(sid);
            }
            match *state {
                State::Match => {
                    if !self.full || at == self.region.end {
                        self.park(cache, at, Thread { sid, bid }, out);
                    }
                }
                State::Node { .. } | State::MultiNode { .. } => {
                    if at < self.region.end {
                        self.park(cache, at, Thread { sid, bid }, out);
                    }
                }
                State::BackRef { group, ref next, .. } => {
                    let span = match cache.branches.overlay(bid).group(group) {
                        Some(g) => g.span(),
                        None => None,
                    };
                    match span {
                        None => {}
                        Some(span) if span.is_empty() => {
                            self.follow(cache, bid, next, visited);
                        }
                        Some(span) => {
                            if at + span.len() <= self.region.end {
                                let thread = Thread { sid, bid };
                                self.park(cache, at, thread, out);
                            }
                        }
                    }
                }
                State::GroupStart { group, ref next } => {
                    cache.branches.overlay_mut(bid).open_group(group, at);
                    self.follow(cache, bid, next, visited);
                }
                State::GroupEnd { group, ref next } => {
                    cache.branches.overlay_mut(bid).close_group(group, at);
                    self.follow(cache, bid, next, visited);
                }
                State::Fanout { ref next } => {
                    self.follow(cache, bid, next, visited);
                }
                State::SequenceStart { ref next } => {
                    if at == 0 {
                        self.follow(cache, bid, next, visited);
                    }
                }
                State::SequenceEnd { ref next } => {
                    if at == self.haystack.len() {
                        self.follow(cache, bid, next, visited);
                    }
                }
                State::Repeat { body, min, max, greedy, ref next } => {
                    let count =
                        cache.branches.overlay(bid).counter(sid).unwrap_or(0);
                    let can_exit = exit_only || count >= min;
                    let can_loop =
                        !exit_only && max.map_or(true, |max| count < max);
                    // Each edge carries the counter value its branch takes
                    // on. Leaving the loop clears the counter.
                    let mut edges: Vec<(StateID, Option<usize>)> = vec![];
                    if greedy && can_loop {
                        edges.push((body, Some(count + 1)));
                    }
                    if can_exit {
                        edges.extend(next.iter().map(|&sid| (sid, None)));
                    }
                    if !greedy && can_loop {
                        edges.push((body, Some(count + 1)));
                    }
                    let forked = edges.len() > 1;
                    for (i, &(to, count)) in edges.iter().enumerate().rev() {
                        let bid = if forked {
                            match cache.branches.fork(bid, i) {
                                None => break,
                                Some(child) => child,
                            }
                        } else {
                            bid
                        };
                        let overlay = cache.branches.overlay_mut(bid);
                        match count {
                            Some(count) => overlay.set_counter(sid, count),
                            None => overlay.clear_counter(sid),
                        }
                        cache.stack.push(FollowEpsilon {
                            sid: to,
                            bid,
                            visited: visited.clone(),
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        expr::Expr,
        nfa::thompson::{Compiler, Config},
    };

    fn compile(expr: &Expr<char>) -> NFA<char> {
        Compiler::new().build(expr).unwrap()
    }

    fn search<'a, 'h>(
        nfa: &'a NFA<char>,
        haystack: &'h [char],
    ) -> Search<'a, 'h, char> {
        Search {
            nfa,
            haystack,
            region: Span::new(0, haystack.len()),
            full: false,
            extract: false,
        }
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn lazy_counted_loop_stops_early() {
        let expr = Expr::sequence(vec![
            Expr::repeat(Expr::literal('a'), 1, None, false).unwrap(),
            Expr::group(Expr::star(Expr::literal('a'))),
        ]);
        let nfa = compile(&expr);
        let hay = chars("aaa");
        let got = search(&nfa, &hay)
            .best_at(&mut Cache::new(), None, 0)
            .unwrap()
            .unwrap();
        assert_eq!(Some(Span::new(0, 3)), got.groups[0]);
        assert_eq!(Some(Span::new(1, 3)), got.groups[1]);
    }

    #[test]
    fn empty_loops_terminate() {
        let inner = Expr::star(Expr::optional(Expr::literal('a')));
        let expr = Expr::repeat(inner, 3, None, false).unwrap();
        let nfa = compile(&expr);
        let hay = chars("bb");
        let got = search(&nfa, &hay)
            .best_at(&mut Cache::new(), Some(2), 0)
            .unwrap()
            .unwrap();
        assert_eq!(Some(Span::new(0, 0)), got.groups[0]);
    }

    #[test]
    fn every_match_at_a_start_is_enumerated() {
        let expr = Expr::plus(Expr::literal('a'));
        let nfa = compile(&expr);
        let hay = chars("aaa");
        let got: Vec<_> = search(&nfa, &hay)
            .all_at(&mut Cache::new(), 0)
            .unwrap()
            .into_iter()
            .map(|c| c.groups[0].unwrap())
            .collect();
        assert_eq!(
            vec![Span::new(0, 3), Span::new(0, 2), Span::new(0, 1)],
            got
        );
    }

    #[test]
    fn counted_repeats_agree_with_unrolled_ones() {
        // (?:b?|a){0,1} and (?:b?|a)+ prefer an empty iteration over 'a' in
        // one case but not the other.
        let body = || {
            let b = Expr::optional(Expr::literal('b'));
            Expr::or(vec![b, Expr::literal('a')])
        };
        let cases = vec![
            (Expr::repeat(body(), 0, Some(1), true).unwrap(), Span::new(0, 0)),
            (Expr::plus(body()), Span::new(0, 1)),
        ];
        let hay = chars("a");
        for (expr, expected) in cases {
            for limit in vec![0, 10] {
                let nfa = Compiler::new()
                    .configure(Config::new().unroll_limit(limit))
                    .build(&expr)
                    .unwrap();
                let got = search(&nfa, &hay)
                    .best_at(&mut Cache::new(), None, 0)
                    .unwrap()
                    .unwrap();
                assert_eq!(Some(expected), got.groups[0], "limit {}", limit);
            }
        }
    }

    #[test]
    fn split_branches_are_resumed_on_failure() {
        // Only the lowest priority alternative can match.
        let expr = Expr::sequence(vec![
            Expr::or(vec![
                Expr::literal('a'),
                Expr::literal('a'),
                Expr::sequence(vec![Expr::literal('a'), Expr::literal('b')]),
            ]),
            Expr::literal('c'),
        ]);
        let nfa = compile(&expr);
        let hay = chars("abc");
        for limit in vec![Some(1), Some(2), None] {
            let got = search(&nfa, &hay).best_at(&mut Cache::new(), limit, 0);
            assert_eq!(Some(Span::new(0, 3)), got.unwrap().unwrap().groups[0]);
        }
    }

    fn twin_star() -> Expr<char> {
        Expr::star(Expr::or(vec![Expr::literal('a'), Expr::literal('a')]))
    }

    #[test]
    fn ambiguous_loops_do_not_multiply_branches() {
        let expr = Expr::sequence(vec![twin_star(), Expr::literal('b')]);
        let mut hay = vec!['a'; 2000];
        hay.push('b');
        for &unroll in &[0, 10] {
            let nfa = Compiler::new()
                .configure(Config::new().unroll_limit(unroll))
                .build(&expr)
                .unwrap();
            let mut cache = Cache::new();
            let got = search(&nfa, &hay)
                .best_at(&mut cache, None, 0)
                .unwrap()
                .unwrap();
            assert_eq!(Some(Span::new(0, 2001)), got.groups[0]);
            assert!(cache.branches.len() < 512, "{}", cache.branches.len());

            let got = search(&nfa, &hay)
                .best_at(&mut cache, Some(2), 0)
                .unwrap()
                .unwrap();
            assert_eq!(Some(Span::new(0, 2001)), got.groups[0]);

            let got = search(&nfa, &hay[..2000])
                .best_at(&mut cache, Some(1), 0)
                .unwrap();
            assert!(got.is_none());
        }
    }

    #[test]
    fn equivalent_matches_are_enumerated_once() {
        let nfa = compile(&twin_star());
        let hay = chars("aaaa");
        let got: Vec<_> = search(&nfa, &hay)
            .all_at(&mut Cache::new(), 0)
            .unwrap()
            .into_iter()
            .map(|c| c.groups[0].unwrap())
            .collect();
        let expected: Vec<Span> =
            (0..=4).rev().map(|end| Span::new(0, end)).collect();
        assert_eq!(expected, got);
    }

    #[test]
    fn running_out_of_branches_gives_up() {
        let expr = Expr::sequence(vec![twin_star(), Expr::literal('b')]);
        let nfa = compile(&expr);
        let hay = chars("aaab");
        let mut cache = Cache::with_branch_capacity(4);
        let err = search(&nfa, &hay).best_at(&mut cache, None, 0).unwrap_err();
        assert!(err.is_exhausted());
        let err = search(&nfa, &hay).all_at(&mut cache, 0).unwrap_err();
        assert!(err.is_exhausted());
    }
}
