//! Plain integer identifiers.
//!
//! Unlike a versioned handle, an identifier here is nothing but a dense
//! `u32` index. Ids are recycled once their owner is gone, so holding one
//! past the lifetime of what it names is a caller error.

/// The raw integer type behind every identifier. Keeping it 32-bits keeps
/// membership sets and signatures small.
pub type IdentifierIndex = u32;

/// Declares a new-type identifier wrapping an `IdentifierIndex`.
#[macro_export]
macro_rules! impl_identifier {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(
            Debug,
            Default,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        pub struct $name($crate::utils::identifier::IdentifierIndex);

        impl $name {
            /// Constructs an identifier from its raw index.
            #[inline]
            pub const fn new(index: $crate::utils::identifier::IdentifierIndex) -> Self {
                $name(index)
            }

            /// Returns the raw index.
            #[inline]
            pub fn index(self) -> $crate::utils::identifier::IdentifierIndex {
                self.0
            }

            /// Returns the raw index widened for slot addressing.
            #[inline]
            pub fn slot(self) -> usize {
                self.0 as usize
            }
        }

        impl From<$crate::utils::identifier::IdentifierIndex> for $name {
            fn from(index: $crate::utils::identifier::IdentifierIndex) -> Self {
                $name(index)
            }
        }

        impl From<$name> for $crate::utils::identifier::IdentifierIndex {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    impl_identifier!(
        /// Identifier used only by these tests.
        TestId
    );

    #[test]
    fn basic() {
        let id = TestId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.slot(), 7usize);
        assert_eq!(TestId::from(7), id);
        assert_eq!(u32::from(id), 7);
        assert_eq!(format!("{}", id), "TestId(7)");
        assert_eq!(TestId::default(), TestId::new(0));
    }

    #[test]
    fn container() {
        let mut set = HashSet::new();
        assert!(set.insert(TestId::new(1)));
        assert!(!set.insert(TestId::new(1)));
        assert!(set.insert(TestId::new(2)));
        assert!(set.contains(&TestId::new(2)));
    }
}
