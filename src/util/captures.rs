/*!
Capturing group metadata and finalized match results.

[`GroupInfo`] maps capture indices to names and back. It is built once by
the compiler and shared (cheaply, via an `Arc`) by every matcher and match
result derived from a pattern.

[`MatchResult`] is a finalized, owned snapshot of one match: the span of
every group, the extracted values recorded for matched elements, and the
priority of the pattern that produced it.
*/

use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};

use crate::{
    expr::Extracted, nfa::thompson::BuildError, util::search::Span,
};

/// Capture group names and indices for a single compiled pattern.
///
/// Group `0` always exists, is always unnamed and corresponds to the span of
/// the entire match.
#[derive(Clone, Debug)]
pub struct GroupInfo(Arc<GroupInfoInner>);

#[derive(Debug)]
struct GroupInfoInner {
    index_to_name: Vec<Option<Arc<str>>>,
    name_to_index: BTreeMap<Arc<str>, usize>,
}

impl GroupInfo {
    /// Build group info from the names of every group, in index order.
    ///
    /// The implicit group `0` is added automatically, so the first name
    /// given corresponds to group `1`. This returns an error if any two
    /// groups share a name.
    pub fn new<I, N>(explicit: I) -> Result<GroupInfo, BuildError>
    where
        I: IntoIterator<Item = Option<N>>,
        N: AsRef<str>,
    {
        let mut inner = GroupInfoInner {
            index_to_name: alloc::vec![None],
            name_to_index: BTreeMap::new(),
        };
        for maybe_name in explicit {
            let index = inner.index_to_name.len();
            match maybe_name {
                None => inner.index_to_name.push(None),
                Some(name) => {
                    let name = Arc::<str>::from(name.as_ref());
                    if inner.name_to_index.contains_key(&*name) {
                        return Err(BuildError::duplicate_group_name(&name));
                    }
                    inner.name_to_index.insert(Arc::clone(&name), index);
                    inner.index_to_name.push(Some(name));
                }
            }
        }
        Ok(GroupInfo(Arc::new(inner)))
    }

    /// Return the capture index for the given name, if it exists.
    #[inline]
    pub fn to_index(&self, name: &str) -> Option<usize> {
        self.0.name_to_index.get(name).copied()
    }

    /// Return the name of the given group, if it has one.
    #[inline]
    pub fn to_name(&self, index: usize) -> Option<&str> {
        self.0.index_to_name.get(index)?.as_deref()
    }

    /// Return the total number of groups, including the implicit group `0`.
    #[inline]
    pub fn group_len(&self) -> usize {
        self.0.index_to_name.len()
    }

    /// Return an iterator over the name of every group in index order.
    pub fn names(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.0.index_to_name.iter().map(|n| n.as_deref())
    }
}

/// The finalized result of a successful match.
///
/// A match result is produced by [`Matcher::to_match_result`] and by the
/// [`FindMatches`] iterator. It owns all of its data and is independent of
/// the matcher that produced it.
///
/// [`Matcher::to_match_result`]: crate::matcher::Matcher::to_match_result
/// [`FindMatches`]: crate::matcher::FindMatches
#[derive(Clone)]
pub struct MatchResult {
    group_info: GroupInfo,
    groups: Vec<Option<Span>>,
    extractions: Vec<(usize, Extracted)>,
    priority: f64,
}

impl MatchResult {
    pub(crate) fn new(
        group_info: GroupInfo,
        groups: Vec<Option<Span>>,
        extractions: Vec<(usize, Extracted)>,
        priority: f64,
    ) -> MatchResult {
        debug_assert_eq!(group_info.group_len(), groups.len());
        debug_assert!(groups[0].is_some(), "group 0 is always set");
        MatchResult { group_info, groups, extractions, priority }
    }

    /// Returns the span of the entire match.
    #[inline]
    pub fn span(&self) -> Span {
        // OK because a match result is only ever built for a match, and a
        // match always sets group 0.
        self.groups[0].unwrap()
    }

    /// The start of the match, inclusive.
    #[inline]
    pub fn start(&self) -> usize {
        self.span().start
    }

    /// The end of the match, exclusive.
    #[inline]
    pub fn end(&self) -> usize {
        self.span().end
    }

    /// Returns true if the entire match is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.span().is_empty()
    }

    /// Returns the span of the given group, or `None` if the group index is
    /// invalid or the group did not participate in the match.
    #[inline]
    pub fn get_group(&self, index: usize) -> Option<Span> {
        self.groups.get(index).copied().flatten()
    }

    /// Returns the span of the group with the given name.
    #[inline]
    pub fn get_group_by_name(&self, name: &str) -> Option<Span> {
        self.get_group(self.group_info.to_index(name)?)
    }

    /// Returns the total number of groups, including group `0`.
    #[inline]
    pub fn group_len(&self) -> usize {
        self.groups.len()
    }

    /// Returns an iterator over the span of every group in index order.
    pub fn iter(&self) -> impl Iterator<Item = Option<Span>> + '_ {
        self.groups.iter().copied()
    }

    /// Returns the name-to-span bindings of every named group.
    pub fn named_groups(
        &self,
    ) -> impl Iterator<Item = (&str, Option<Span>)> + '_ {
        self.group_info.names().zip(self.groups.iter()).filter_map(
            |(name, span)| name.map(|name| (name, *span)),
        )
    }

    /// Returns the value extracted when the element at `index` was matched,
    /// if any.
    pub fn extraction(&self, index: usize) -> Option<&Extracted> {
        self.extractions
            .binary_search_by_key(&index, |&(i, _)| i)
            .ok()
            .map(|i| &self.extractions[i].1)
    }

    /// Returns every extracted value recorded inside `span`, in element
    /// order.
    pub fn extractions_in(
        &self,
        span: Span,
    ) -> impl Iterator<Item = (usize, &Extracted)> + '_ {
        self.extractions
            .iter()
            .filter(move |&&(i, _)| span.start <= i && i < span.end)
            .map(|&(i, ref v)| (i, v))
    }

    /// Returns the capture group metadata of the pattern.
    #[inline]
    pub fn group_info(&self) -> &GroupInfo {
        &self.group_info
    }

    /// Returns the priority of the pattern that produced this match.
    #[inline]
    pub fn priority(&self) -> f64 {
        self.priority
    }
}

impl core::fmt::Debug for MatchResult {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut dbg = f.debug_struct("MatchResult");
        dbg.field("groups", &self.groups);
        let indices: Vec<usize> =
            self.extractions.iter().map(|&(i, _)| i).collect();
        dbg.field("extractions", &indices);
        dbg.field("priority", &self.priority);
        dbg.finish()
    }
}
