//! Index types for skeleton and surface elements.
//!
//! Joints, triangles and material regions are identified by type-safe index
//! wrappers so a triangle index can never be handed to a joint lookup.

use std::fmt::{self, Debug};

/// Sentinel raw value for an invalid/null index.
const INVALID: u32 = u32::MAX;

/// A type-safe joint index.
///
/// Joint ids stay stable for the lifetime of a skeleton, even after other
/// joints are removed.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct JointId(u32);

/// A type-safe triangle index into a [`MeshSurface`](crate::surface::MeshSurface).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TriangleId(u32);

/// A material region (coarse semantic face grouping, one per material slot).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct RegionId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < INVALID as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Create an invalid/null index.
            #[inline]
            pub fn invalid() -> Self {
                Self(INVALID)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this is a valid (non-null) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.index())
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(JointId, "J");
impl_index_type!(TriangleId, "T");
impl_index_type!(RegionId, "R");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_id() {
        let j = JointId::new(42);
        assert_eq!(j.index(), 42);
        assert!(j.is_valid());

        let invalid = JointId::invalid();
        assert!(!invalid.is_valid());
        assert_eq!(JointId::default(), invalid);
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", JointId::new(3)), "J(3)");
        assert_eq!(format!("{:?}", RegionId::new(0)), "R(0)");
        assert_eq!(format!("{:?}", TriangleId::invalid()), "T(INVALID)");
    }
}
