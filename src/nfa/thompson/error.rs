use alloc::sync::Arc;

use crate::util::primitives::StateID;

/// An error that can occur while constructing a pattern expression or
/// compiling one into a Thompson NFA.
///
/// This error does not provide many introspection capabilities. There are
/// generally only two things you can do with it:
///
/// * Obtain a human readable message via its `std::fmt::Display` impl.
/// * Ask whether it was caused by an invalid argument via
/// [`BuildError::is_invalid_argument`].
///
/// Errors of the first kind are raised by the [`Expr`](crate::Expr)
/// constructors when given malformed repetition bounds or a backreference to
/// the implicit group `0`. The remaining errors are raised by the compiler,
/// e.g., when a backreference refers to a group that doesn't exist or when
/// the compiled NFA would exceed a configured size limit.
#[derive(Clone, Debug)]
pub struct BuildError {
    kind: BuildErrorKind,
}

/// The kind of error that occurred while building a pattern.
#[derive(Clone, Debug)]
enum BuildErrorKind {
    /// A repetition whose maximum is smaller than its minimum.
    InvalidRepeat {
        /// The minimum number of repetitions given.
        min: usize,
        /// The maximum number of repetitions given.
        max: usize,
    },
    /// A backreference to the implicit whole-match group.
    InvalidBackRef {
        /// The group index given.
        group: usize,
    },
    /// A backreference to a group that the pattern does not define.
    UnknownBackRef {
        /// The group index given.
        group: usize,
        /// The number of groups in the pattern, including group `0`.
        group_len: usize,
    },
    /// Two capturing groups were given the same name.
    DuplicateGroupName {
        /// The duplicated name.
        name: Arc<str>,
    },
    /// An error that occurs if too many states are produced while building
    /// an NFA.
    TooManyStates {
        /// The minimum number of states that are desired, which exceeds the
        /// limit.
        given: usize,
        /// The limit on the number of states.
        limit: usize,
    },
}

impl BuildError {
    /// Returns true if this error was caused by an argument that can never
    /// be valid, as opposed to a limit being exceeded.
    pub fn is_invalid_argument(&self) -> bool {
        !matches!(self.kind, BuildErrorKind::TooManyStates { .. })
    }

    pub(crate) fn invalid_repeat(min: usize, max: usize) -> BuildError {
        BuildError { kind: BuildErrorKind::InvalidRepeat { min, max } }
    }

    pub(crate) fn invalid_backref(group: usize) -> BuildError {
        BuildError { kind: BuildErrorKind::InvalidBackRef { group } }
    }

    pub(crate) fn unknown_backref(
        group: usize,
        group_len: usize,
    ) -> BuildError {
        let kind = BuildErrorKind::UnknownBackRef { group, group_len };
        BuildError { kind }
    }

    pub(crate) fn duplicate_group_name(name: &str) -> BuildError {
        let name = Arc::from(name);
        BuildError { kind: BuildErrorKind::DuplicateGroupName { name } }
    }

    pub(crate) fn too_many_states(given: usize, limit: usize) -> BuildError {
        BuildError { kind: BuildErrorKind::TooManyStates { given, limit } }
    }

    pub(crate) fn state_id_overflow(given: usize) -> BuildError {
        BuildError::too_many_states(given, StateID::LIMIT)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BuildError {}

impl core::fmt::Display for BuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            BuildErrorKind::InvalidRepeat { min, max } => write!(
                f,
                "invalid repetition: maximum {} is less than minimum {}",
                max, min,
            ),
            BuildErrorKind::InvalidBackRef { group } => write!(
                f,
                "invalid backreference to group {}, \
                 group 0 is the whole match",
                group,
            ),
            BuildErrorKind::UnknownBackRef { group, group_len } => write!(
                f,
                "backreference to group {}, but the pattern only \
                 has {} groups (including group 0)",
                group, group_len,
            ),
            BuildErrorKind::DuplicateGroupName { ref name } => {
                write!(f, "duplicate capture group name '{}'", name)
            }
            BuildErrorKind::TooManyStates { given, limit } => write!(
                f,
                "attemped to compile {} NFA states, \
                 which exceeds the limit of {}",
                given, limit,
            ),
        }
    }
}
