//! Skeleton data structures.
//!
//! A [`Skeleton`] is an ordered tree of named [`Joint`]s with world-space
//! head/tail positions, roll and connection flags. Both the source character
//! rig and the destination meta-rig template use this type; everything the
//! retarget engine needs is passed explicitly, there is no notion of a
//! "current" skeleton.
//!
//! ```
//! use metarig::skeleton::Skeleton;
//! use nalgebra::Point3;
//!
//! let mut skeleton = Skeleton::new();
//! let root = skeleton
//!     .add_joint("spine", None, Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 1.2))
//!     .unwrap();
//! assert_eq!(skeleton.find("spine"), Some(root));
//! ```

mod index;
mod joint;
mod naming;
#[allow(clippy::module_inception)]
mod skeleton;

pub use index::{JointId, RegionId, TriangleId};
pub use joint::{is_finite_point, Joint};
pub(crate) use naming::sided;
pub use naming::{is_right, mirror_name, side_of, Side};
pub use skeleton::{ChainIter, JointRecord, Skeleton};
