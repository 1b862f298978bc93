/// An error that can occur when driving a [`Matcher`](crate::Matcher).
///
/// Errors come in two flavors. Range errors are returned when a region or
/// start position lies outside the sequence (see
/// [`MatchError::is_out_of_range`]). State errors are returned when match
/// data is requested from a matcher that has no current match (see
/// [`MatchError::is_illegal_state`]). A search may also give up when it runs
/// out of branch identifiers (see [`MatchError::is_exhausted`]). Anything
/// else concerns a group index that does not exist or a group that did not
/// participate in the match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchError {
    kind: MatchErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum MatchErrorKind {
    /// A region that is not contained in the sequence, or whose start is
    /// after its end.
    RegionOutOfRange { begin: usize, end: usize, len: usize },
    /// A search start past the end of the sequence.
    StartOutOfRange { start: usize, len: usize },
    /// Match data was requested before any search ran.
    NotYetRun,
    /// Match data was requested after a search that failed.
    NoMatch,
    /// A group index that the pattern does not define.
    InvalidGroup { index: usize, group_len: usize },
    /// A group that did not participate in the current match.
    UnmatchedGroup { index: usize },
    /// The search ran out of branch identifiers at `offset`.
    GaveUp { offset: usize, branches: usize },
}

impl MatchError {
    /// Returns true if this error was caused by a position or region that
    /// lies outside the sequence.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self.kind,
            MatchErrorKind::RegionOutOfRange { .. }
                | MatchErrorKind::StartOutOfRange { .. }
        )
    }

    /// Returns true if this error was caused by asking for match data when
    /// there is no current match.
    pub fn is_illegal_state(&self) -> bool {
        matches!(
            self.kind,
            MatchErrorKind::NotYetRun | MatchErrorKind::NoMatch
        )
    }

    /// Returns true if a search gave up because too many branches were
    /// alive at once. No match is available after such a search, even if
    /// the sequence contains one.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, MatchErrorKind::GaveUp { .. })
    }

    pub(crate) fn region_out_of_range(
        begin: usize,
        end: usize,
        len: usize,
    ) -> MatchError {
        let kind = MatchErrorKind::RegionOutOfRange { begin, end, len };
        MatchError { kind }
    }

    pub(crate) fn start_out_of_range(start: usize, len: usize) -> MatchError {
        MatchError { kind: MatchErrorKind::StartOutOfRange { start, len } }
    }

    pub(crate) fn not_yet_run() -> MatchError {
        MatchError { kind: MatchErrorKind::NotYetRun }
    }

    pub(crate) fn no_match() -> MatchError {
        MatchError { kind: MatchErrorKind::NoMatch }
    }

    pub(crate) fn invalid_group(index: usize, group_len: usize) -> MatchError {
        MatchError { kind: MatchErrorKind::InvalidGroup { index, group_len } }
    }

    pub(crate) fn unmatched_group(index: usize) -> MatchError {
        MatchError { kind: MatchErrorKind::UnmatchedGroup { index } }
    }

    pub(crate) fn gave_up(offset: usize, branches: usize) -> MatchError {
        MatchError { kind: MatchErrorKind::GaveUp { offset, branches } }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MatchError {}

impl core::fmt::Display for MatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            MatchErrorKind::RegionOutOfRange { begin, end, len } => write!(
                f,
                "region {}..{} is out of range for a sequence of length {}",
                begin, end, len,
            ),
            MatchErrorKind::StartOutOfRange { start, len } => write!(
                f,
                "start {} is out of range for a sequence of length {}",
                start, len,
            ),
            MatchErrorKind::NotYetRun => {
                write!(f, "no match available: no search has been run yet")
            }
            MatchErrorKind::NoMatch => {
                write!(f, "no match available: the last search failed")
            }
            MatchErrorKind::InvalidGroup { index, group_len } => write!(
                f,
                "invalid group index {}, pattern has {} groups \
                 (including group 0)",
                index, group_len,
            ),
            MatchErrorKind::UnmatchedGroup { index } => {
                write!(f, "group {} did not participate in the match", index)
            }
            MatchErrorKind::GaveUp { offset, branches } => write!(
                f,
                "gave up searching at {} with {} branches alive",
                offset, branches,
            ),
        }
    }
}
