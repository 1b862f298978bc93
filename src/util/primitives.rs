/*!
Small integer identifier types used throughout the crate.

The NFA arena is addressed by [`StateID`] and the branch forest of a running
matcher is addressed by [`BranchID`]. Both are represented as a `u32` and are
guaranteed to fit in an `i32`, which keeps the per-branch bookkeeping of a
search compact.
*/

use alloc::vec::Vec;

/// This error occurs when an identifier could not be constructed because
/// the given value exceeds the identifier's maximum.
///
/// When the `std` feature is enabled, this implements the `Error` trait.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexError {
    kind: &'static str,
    attempted: usize,
}

impl IndexError {
    /// Returns the value that could not be converted to an identifier.
    pub fn attempted(&self) -> usize {
        self.attempted
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IndexError {}

impl core::fmt::Display for IndexError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "failed to create {} from {}, which exceeds {}",
            self.kind,
            self.attempted,
            core::i32::MAX - 1,
        )
    }
}

macro_rules! define_index_type {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(
            Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord,
        )]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// The maximum value.
            pub const MAX: $name = $name(core::i32::MAX as u32 - 1);

            /// The total number of values that can be represented.
            pub const LIMIT: usize = $name::MAX.as_usize() + 1;

            /// The zero value.
            pub const ZERO: $name = $name(0);

            /// Create a new identifier, or return an error if `value`
            /// exceeds the maximum.
            #[inline]
            pub fn new(value: usize) -> Result<$name, IndexError> {
                if value > $name::MAX.as_usize() {
                    return Err(IndexError {
                        kind: stringify!($name),
                        attempted: value,
                    });
                }
                Ok($name::new_unchecked(value))
            }

            /// Create a new identifier without checking `value` against the
            /// maximum.
            ///
            /// Using this routine with an invalid value will result in
            /// unspecified behavior, but *not* undefined behavior.
            #[inline]
            pub const fn new_unchecked(value: usize) -> $name {
                $name(value as u32)
            }

            /// Return the internal value as a `usize`. This is guaranteed to
            /// never overflow `usize`.
            #[inline]
            pub const fn as_usize(&self) -> usize {
                self.0 as usize
            }
        }

        impl<T> core::ops::Index<$name> for Vec<T> {
            type Output = T;

            #[inline]
            fn index(&self, index: $name) -> &T {
                &self[index.as_usize()]
            }
        }

        impl<T> core::ops::IndexMut<$name> for Vec<T> {
            #[inline]
            fn index_mut(&mut self, index: $name) -> &mut T {
                &mut self[index.as_usize()]
            }
        }
    };
}

define_index_type!(
    /// The identifier of a state in a Thompson NFA.
    StateID
);

define_index_type!(
    /// The identifier of a branch in the branch forest of a search.
    BranchID
);
