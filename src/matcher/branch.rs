/*!
The branch forest and the per-branch state overlays used during a search.

Every live execution path of a search is identified by a [`BranchID`].
Whenever a path splits (a state with several successors, a repetition that
may both loop and exit, or an ambiguous multi-element match) each
continuation receives a fresh child branch whose ordinal is its position
among its siblings. Comparing two branches by the ordinals along their
root-to-node paths gives a deterministic priority order: earlier
alternatives win.

Each branch also owns an [`Overlay`]: its capture groups, repetition
counters, in-flight multi-element progress and extracted values. A child
starts out sharing its parent's overlay and only receives its own copy the
first time it writes to it, so forking is O(1) and only diverging paths pay
for their writes.
*/

use core::cmp::{self, Ordering};

use alloc::{collections::BTreeMap, sync::Arc, vec, vec::Vec};

use crate::{
    expr::Extracted,
    util::{
        primitives::{BranchID, StateID},
        search::Span,
    },
};

/// The forest of branches created during a single match attempt.
#[derive(Clone, Debug)]
pub(crate) struct BranchTable {
    nodes: Vec<BranchNode>,
    /// The number of branches that may exist at once.
    capacity: usize,
    /// Set when a fork was refused because the table was full.
    exhausted: bool,
    /// Compact once this many branches exist.
    compact_at: usize,
}

#[derive(Clone, Debug)]
struct BranchNode {
    parent: Option<BranchID>,
    /// Position among the siblings created by the same fork.
    ordinal: u32,
    /// Distance from the root.
    depth: u32,
    overlay: Arc<Overlay>,
}

/// Compaction is never attempted with fewer branches than this.
const MIN_COMPACTION: usize = 256;

impl BranchTable {
    pub(crate) fn new() -> BranchTable {
        BranchTable::with_capacity(BranchID::LIMIT)
    }

    pub(crate) fn with_capacity(capacity: usize) -> BranchTable {
        BranchTable {
            nodes: vec![],
            capacity: cmp::max(1, cmp::min(capacity, BranchID::LIMIT)),
            exhausted: false,
            compact_at: MIN_COMPACTION,
        }
    }

    /// The number of branches currently in the table.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if a fork was refused since the last root was created.
    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Forget every branch and create a new root branch with an empty
    /// overlay sized for `group_len` capture groups.
    pub(crate) fn root(&mut self, group_len: usize) -> BranchID {
        self.nodes.clear();
        self.exhausted = false;
        self.compact_at = MIN_COMPACTION;
        let overlay = Arc::new(Overlay::new(group_len));
        self.nodes.push(BranchNode {
            parent: None,
            ordinal: 0,
            depth: 0,
            overlay,
        });
        BranchID::ZERO
    }

    /// Create a child of `parent` at the given sibling position. The child
    /// shares its parent's overlay until it writes to it.
    ///
    /// This returns `None` when the table is full.
    pub(crate) fn fork(
        &mut self,
        parent: BranchID,
        ordinal: usize,
    ) -> Option<BranchID> {
        if self.nodes.len() >= self.capacity {
            if !self.exhausted {
                warn!("refusing to fork: {} branches alive", self.capacity);
            }
            self.exhausted = true;
            return None;
        }
        let p = &self.nodes[parent];
        let node = BranchNode {
            parent: Some(parent),
            ordinal: ordinal as u32,
            depth: p.depth + 1,
            overlay: Arc::clone(&p.overlay),
        };
        let bid = BranchID::new_unchecked(self.nodes.len());
        self.nodes.push(node);
        Some(bid)
    }

    /// Return the overlay of the given branch.
    pub(crate) fn overlay(&self, bid: BranchID) -> &Overlay {
        &self.nodes[bid].overlay
    }

    /// Return a mutable overlay for the given branch, copying it first if
    /// it is still shared with another branch.
    pub(crate) fn overlay_mut(&mut self, bid: BranchID) -> &mut Overlay {
        Arc::make_mut(&mut self.nodes[bid].overlay)
    }

    /// Return a shared handle to the overlay of the given branch. The
    /// branch copies its overlay before writing to it again.
    pub(crate) fn share_overlay(&self, bid: BranchID) -> Arc<Overlay> {
        Arc::clone(&self.nodes[bid].overlay)
    }

    /// Returns true if the given branch carries the same groups, counters
    /// and progress as `overlay`, and took its extracted values from the
    /// same places. Two threads in the same state with such overlays behave
    /// identically from then on.
    pub(crate) fn has_overlay(
        &self,
        bid: BranchID,
        overlay: &Arc<Overlay>,
    ) -> bool {
        let own = &self.nodes[bid].overlay;
        Arc::ptr_eq(own, overlay) || own.same_as(overlay)
    }

    /// Compare two branches by priority. `Less` means `a` is preferred.
    ///
    /// This is the lexicographic order of the sibling ordinals on the path
    /// from the root to each branch. An ancestor orders before all of its
    /// descendants.
    pub(crate) fn cmp(&self, mut a: BranchID, mut b: BranchID) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        while self.nodes[a].depth > self.nodes[b].depth {
            let pa = self.parent(a);
            if pa == b {
                return Ordering::Greater;
            }
            a = pa;
        }
        while self.nodes[b].depth > self.nodes[a].depth {
            let pb = self.parent(b);
            if pb == a {
                return Ordering::Less;
            }
            b = pb;
        }
        loop {
            match (self.nodes[a].parent, self.nodes[b].parent) {
                (Some(pa), Some(pb)) if pa != pb => {
                    a = pa;
                    b = pb;
                }
                _ => {
                    return self.nodes[a]
                        .ordinal
                        .cmp(&self.nodes[b].ordinal)
                        .then(a.cmp(&b));
                }
            }
        }
    }

    /// Returns true once enough branches were created since the last
    /// compaction for another one to pay off.
    pub(crate) fn wants_compaction(&self) -> bool {
        self.nodes.len() >= self.compact_at
    }

    /// Drop every branch that none of `live` descends from and splice out
    /// the branches left with a single child. The identifiers in `live` are
    /// rewritten in place and keep their relative priority.
    pub(crate) fn compact(&mut self, live: &mut [&mut BranchID]) {
        let len = self.nodes.len();
        let mut is_live = vec![false; len];
        for bid in live.iter() {
            is_live[bid.as_usize()] = true;
        }
        // A child is always created after its parent, so scanning backwards
        // counts the children of a branch before reaching it.
        let mut needed = is_live.clone();
        let mut children = vec![0u32; len];
        for i in (0..len).rev() {
            if !needed[i] {
                continue;
            }
            if let Some(p) = self.nodes[i].parent {
                needed[p.as_usize()] = true;
                children[p.as_usize()] += 1;
            }
        }
        let kept = |i: usize| is_live[i] || children[i] >= 2;
        // For a needed branch, `top` is the first branch of the spliced run
        // ending at it and `anchor` is its closest kept ancestor. A kept
        // branch inherits the ordinal of its `top`, which is where it
        // diverges from its siblings.
        let mut top = vec![0; len];
        let mut anchor: Vec<Option<usize>> = vec![None; len];
        let mut order = vec![];
        for i in 0..len {
            if !needed[i] {
                continue;
            }
            match self.nodes[i].parent.map(|p| p.as_usize()) {
                Some(p) if !kept(p) => {
                    top[i] = top[p];
                    anchor[i] = anchor[p];
                }
                parent => {
                    top[i] = i;
                    anchor[i] = parent;
                }
            }
            if kept(i) {
                order.push(i);
            }
        }
        order.sort_by_key(|&i| top[i]);

        let mut remap: Vec<Option<BranchID>> = vec![None; len];
        let mut nodes: Vec<BranchNode> = Vec::with_capacity(order.len());
        for i in order {
            let parent = anchor[i].and_then(|a| remap[a]);
            let depth = match parent {
                None => 0,
                Some(p) => nodes[p].depth + 1,
            };
            remap[i] = Some(BranchID::new_unchecked(nodes.len()));
            nodes.push(BranchNode {
                parent,
                ordinal: self.nodes[top[i]].ordinal,
                depth,
                overlay: Arc::clone(&self.nodes[i].overlay),
            });
        }
        for bid in live.iter_mut() {
            if let Some(new) = remap[bid.as_usize()] {
                **bid = new;
            }
        }
        trace!("compacted {} branches into {}", len, nodes.len());
        self.nodes = nodes;
        self.compact_at = cmp::max(MIN_COMPACTION, 2 * self.nodes.len());
    }

    fn parent(&self, bid: BranchID) -> BranchID {
        // Only called for branches with a non-zero depth, which always have
        // a parent.
        self.nodes[bid].parent.unwrap_or(bid)
    }
}

/// The capture state of a group on one branch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct MatchedGroup {
    pub(crate) begin: usize,
    /// `None` while the group is still open.
    pub(crate) end: Option<usize>,
}

impl MatchedGroup {
    /// Returns the span of this group if it has been closed.
    pub(crate) fn span(&self) -> Option<Span> {
        self.end.map(|end| Span::new(self.begin, end))
    }
}

/// Progress of a consuming state that spans several elements.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Progress {
    /// A multi-element match committed to an interval ending here.
    Interval { end: usize },
    /// A backreference that has matched this many elements so far.
    Consumed(usize),
}

/// The mutable state of one branch.
#[derive(Clone, Debug, Default)]
pub(crate) struct Overlay {
    groups: Vec<Option<MatchedGroup>>,
    counters: BTreeMap<StateID, usize>,
    progress: BTreeMap<StateID, Progress>,
    /// Extracted values by element index, with the state that produced
    /// them.
    extractions: BTreeMap<usize, (StateID, Extracted)>,
}

impl Overlay {
    fn new(group_len: usize) -> Overlay {
        Overlay { groups: vec![None; group_len], ..Overlay::default() }
    }

    /// Returns true if both overlays hold equal groups, counters and
    /// progress. Extracted values are compared by where they came from,
    /// since values produced by the same node for the same element are
    /// assumed to be equal.
    fn same_as(&self, other: &Overlay) -> bool {
        self.groups == other.groups
            && self.counters == other.counters
            && self.progress == other.progress
            && self.extractions.len() == other.extractions.len()
            && self
                .extractions
                .iter()
                .zip(other.extractions.iter())
                .all(|((i, (a, _)), (j, (b, _)))| i == j && a == b)
    }

    pub(crate) fn group(&self, group: usize) -> Option<MatchedGroup> {
        self.groups.get(group).copied().flatten()
    }

    /// Return the span of every group. Groups that never closed are `None`.
    pub(crate) fn spans(&self) -> Vec<Option<Span>> {
        self.groups.iter().map(|g| g.and_then(|g| g.span())).collect()
    }

    /// Open `group` at `at`. A group that is already open keeps its first
    /// start, while a closed group is re-opened (so that a repeated group
    /// reports its last iteration).
    pub(crate) fn open_group(&mut self, group: usize, at: usize) {
        let slot = &mut self.groups[group];
        if let Some(MatchedGroup { begin, end: None }) = *slot {
            warn!(
                "cannot open group {} at {}: already open since {}",
                group, at, begin,
            );
            return;
        }
        *slot = Some(MatchedGroup { begin: at, end: None });
    }

    /// Close `group` at `at`. Closing a group that was never opened, or
    /// that is already closed at a different index, is ignored.
    pub(crate) fn close_group(&mut self, group: usize, at: usize) {
        let slot = &mut self.groups[group];
        match *slot {
            None => {
                warn!("cannot close group {} at {}: never opened", group, at);
            }
            Some(MatchedGroup { begin, end: None }) => {
                *slot = Some(MatchedGroup { begin, end: Some(at) });
            }
            Some(MatchedGroup { begin, end: Some(end) }) => {
                if end != at {
                    warn!(
                        "cannot close group {} at {}: closed as {}..{}",
                        group, at, begin, end,
                    );
                }
            }
        }
    }

    pub(crate) fn counter(&self, sid: StateID) -> Option<usize> {
        self.counters.get(&sid).copied()
    }

    pub(crate) fn set_counter(&mut self, sid: StateID, count: usize) {
        self.counters.insert(sid, count);
    }

    pub(crate) fn clear_counter(&mut self, sid: StateID) {
        self.counters.remove(&sid);
    }

    pub(crate) fn progress(&self, sid: StateID) -> Option<Progress> {
        self.progress.get(&sid).copied()
    }

    pub(crate) fn set_progress(&mut self, sid: StateID, progress: Progress) {
        self.progress.insert(sid, progress);
    }

    pub(crate) fn clear_progress(&mut self, sid: StateID) {
        self.progress.remove(&sid);
    }

    pub(crate) fn record_extraction(
        &mut self,
        index: usize,
        sid: StateID,
        value: Extracted,
    ) {
        self.extractions.insert(index, (sid, value));
    }

    /// Return every extracted value in element order.
    pub(crate) fn extractions(&self) -> Vec<(usize, Extracted)> {
        self.extractions
            .iter()
            .map(|(&i, (_, v))| (i, Arc::clone(v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::vec::Vec;

    /// Returns the path from the root to `bid`. Siblings that share an
    /// ordinal are told apart by their identifiers.
    fn path(table: &BranchTable, mut bid: BranchID) -> Vec<(u32, BranchID)> {
        let mut path = vec![];
        loop {
            let node = &table.nodes[bid];
            path.push((node.ordinal, bid));
            match node.parent {
                None => break,
                Some(p) => bid = p,
            }
        }
        path.reverse();
        path
    }

    #[test]
    fn earlier_siblings_win() {
        let mut t = BranchTable::new();
        let root = t.root(1);
        let a = t.fork(root, 0).unwrap();
        let b = t.fork(root, 1).unwrap();
        let a1 = t.fork(a, 1).unwrap();
        let b0 = t.fork(b, 0).unwrap();
        assert_eq!(Ordering::Less, t.cmp(a, b));
        assert_eq!(Ordering::Less, t.cmp(a1, b0));
        assert_eq!(Ordering::Greater, t.cmp(b0, a1));
        assert_eq!(Ordering::Less, t.cmp(root, a1));
        assert_eq!(Ordering::Greater, t.cmp(a1, a));
        assert_eq!(Ordering::Equal, t.cmp(b0, b0));
    }

    #[test]
    fn overlays_are_copied_on_write() {
        let mut t = BranchTable::new();
        let root = t.root(2);
        t.overlay_mut(root).open_group(1, 3);
        let a = t.fork(root, 0).unwrap();
        let b = t.fork(root, 1).unwrap();
        t.overlay_mut(a).close_group(1, 5);
        let span = t.overlay(a).group(1).unwrap().span();
        assert_eq!(Some(Span::new(3, 5)), span);
        assert_eq!(None, t.overlay(b).group(1).unwrap().span());
        assert_eq!(None, t.overlay(root).group(1).unwrap().span());
        assert!(Arc::ptr_eq(&t.nodes[root].overlay, &t.nodes[b].overlay));
    }

    #[test]
    fn open_group_keeps_first_start_while_open() {
        let mut o = Overlay::new(2);
        o.open_group(1, 2);
        o.open_group(1, 4);
        assert_eq!(Some(MatchedGroup { begin: 2, end: None }), o.group(1));
        o.close_group(1, 5);
        o.close_group(1, 6);
        assert_eq!(Some(Span::new(2, 5)), o.group(1).unwrap().span());
        o.open_group(1, 7);
        assert_eq!(Some(MatchedGroup { begin: 7, end: None }), o.group(1));
    }

    #[test]
    fn full_table_refuses_to_fork() {
        let mut t = BranchTable::with_capacity(3);
        let root = t.root(1);
        let a = t.fork(root, 0).unwrap();
        assert!(t.fork(a, 0).is_some());
        assert!(!t.is_exhausted());
        assert_eq!(None, t.fork(a, 1));
        assert!(t.is_exhausted());
        t.root(1);
        assert!(!t.is_exhausted());
        assert_eq!(1, t.len());
    }

    #[test]
    fn equal_overlays_are_recognized() {
        let mut t = BranchTable::new();
        let root = t.root(2);
        let a = t.fork(root, 0).unwrap();
        let b = t.fork(root, 1).unwrap();
        let shared = t.share_overlay(b);
        assert!(t.has_overlay(a, &shared));
        t.overlay_mut(a).open_group(1, 0);
        assert!(!t.has_overlay(a, &shared));
        t.overlay_mut(b).open_group(1, 0);
        assert!(t.has_overlay(a, &t.share_overlay(b)));
        // The handle taken earlier is not affected by the write.
        assert!(!t.has_overlay(b, &shared));
        t.overlay_mut(b).set_counter(StateID::new_unchecked(4), 1);
        assert!(!t.has_overlay(a, &t.share_overlay(b)));
    }

    #[test]
    fn compaction_splices_single_children() {
        let mut t = BranchTable::new();
        let root = t.root(1);
        let a = t.fork(root, 0).unwrap();
        let b = t.fork(root, 1).unwrap();
        let a0 = t.fork(a, 0).unwrap();
        let _a1 = t.fork(a, 1).unwrap();
        let a00 = t.fork(a0, 0).unwrap();
        let b0 = t.fork(b, 0).unwrap();
        t.overlay_mut(a00).open_group(0, 7);

        let (mut x, mut y) = (b0, a00);
        t.compact(&mut [&mut x, &mut y]);
        // The root and both live branches survive.
        assert_eq!(3, t.len());
        assert_eq!(Ordering::Less, t.cmp(y, x));
        let span = t.overlay(y).group(0).unwrap();
        assert_eq!(MatchedGroup { begin: 7, end: None }, span);
    }

    quickcheck::quickcheck! {
        fn prop_compaction_keeps_priority(
            forks: Vec<(usize, u8)>,
            live: Vec<usize>
        ) -> bool {
            let mut t = BranchTable::new();
            let root = t.root(1);
            let mut all = vec![root];
            for (parent, ordinal) in forks {
                let parent = all[parent % all.len()];
                all.push(t.fork(parent, ordinal as usize).unwrap());
            }
            let old: Vec<BranchID> =
                live.iter().map(|&i| all[i % all.len()]).collect();
            let mut expected = vec![];
            for &a in old.iter() {
                for &b in old.iter() {
                    expected.push(t.cmp(a, b));
                }
            }
            let mut new = old.clone();
            {
                let mut refs: Vec<&mut BranchID> = new.iter_mut().collect();
                t.compact(&mut refs);
            }
            let mut got = vec![];
            for &a in new.iter() {
                for &b in new.iter() {
                    got.push(t.cmp(a, b));
                }
            }
            expected == got && t.len() <= 2 * old.len()
        }

        fn prop_cmp_is_path_order(forks: Vec<(usize, u8)>) -> bool {
            let mut t = BranchTable::new();
            let root = t.root(1);
            let mut all = vec![root];
            for (parent, ordinal) in forks {
                let parent = all[parent % all.len()];
                all.push(t.fork(parent, ordinal as usize).unwrap());
            }
            for &a in all.iter() {
                for &b in all.iter() {
                    let expected = path(&t, a).cmp(&path(&t, b));
                    if t.cmp(a, b) != expected {
                        return false;
                    }
                }
            }
            true
        }
    }
}
