//! Joint record.

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};

use super::index::JointId;

/// A named bone in a [`Skeleton`](super::Skeleton).
///
/// Positions are world-space. The owning skeleton keeps `parent`/`children`
/// consistent; a joint only holds ids, never references to other joints.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// Unique name within the skeleton.
    pub name: String,

    /// Parent joint, `None` for roots.
    pub parent: Option<JointId>,

    /// Children in creation order.
    pub children: Vec<JointId>,

    /// Start point of the bone.
    pub head: Point3<f64>,

    /// End point of the bone.
    pub tail: Point3<f64>,

    /// Twist about the head-to-tail axis, in radians.
    pub roll: f64,

    /// Whether the head is glued to the parent's tail.
    pub connected: bool,

    /// Opaque per-joint metadata for the external rig generator.
    pub params: BTreeMap<String, String>,
}

impl Joint {
    pub(crate) fn new(name: String, parent: Option<JointId>, head: Point3<f64>, tail: Point3<f64>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            head,
            tail,
            roll: 0.0,
            connected: false,
            params: BTreeMap::new(),
        }
    }

    /// Head-to-tail vector.
    #[inline]
    pub fn vector(&self) -> Vector3<f64> {
        self.tail - self.head
    }

    /// Bone length.
    #[inline]
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Midpoint between head and tail.
    #[inline]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.head, &self.tail)
    }

    /// Look up a rig parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Whether every coordinate of a point is finite.
#[inline]
pub fn is_finite_point(p: &Point3<f64>) -> bool {
    p.coords.iter().all(|c| c.is_finite())
}
