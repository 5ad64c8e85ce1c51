//! Skeleton tree storage.
//!
//! Joints live in an arena indexed by [`JointId`]. Removing a joint leaves a
//! tombstone so the ids of every other joint stay valid.

use std::collections::{BTreeMap, HashMap};

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::index::JointId;
use super::joint::{is_finite_point, Joint};
use crate::error::{Result, RigError};

/// An ordered tree of named joints.
///
/// All mutation goes through the skeleton so that two invariants hold at all
/// times: positions are finite, and a connected joint's head coincides with
/// its parent's tail.
///
/// # Example
///
/// ```
/// use metarig::skeleton::Skeleton;
/// use nalgebra::Point3;
///
/// let mut skeleton = Skeleton::new();
/// let hip = skeleton
///     .add_joint("hip", None, Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 1.1))
///     .unwrap();
/// let waist = skeleton
///     .add_joint("waist", Some(hip), Point3::new(0.0, 0.0, 1.1), Point3::new(0.0, 0.0, 1.3))
///     .unwrap();
/// skeleton.set_connected(waist, true).unwrap();
///
/// // Moving the connected child's head drags the parent's tail along.
/// skeleton.set_head(waist, Point3::new(0.0, 0.0, 1.15)).unwrap();
/// assert_eq!(skeleton.joint(hip).tail, Point3::new(0.0, 0.0, 1.15));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<JointRecord>", into = "Vec<JointRecord>")]
pub struct Skeleton {
    joints: Vec<Option<Joint>>,
    names: HashMap<String, JointId>,
}

/// Flat serialized form of a joint.
///
/// Parents are referenced by name and must appear before their children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointRecord {
    /// Joint name.
    pub name: String,
    /// Parent joint name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// World-space head.
    pub head: Point3<f64>,
    /// World-space tail.
    pub tail: Point3<f64>,
    /// Roll in radians.
    #[serde(default)]
    pub roll: f64,
    /// Head glued to the parent's tail.
    #[serde(default)]
    pub connected: bool,
    /// Rig parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl Skeleton {
    /// Create an empty skeleton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty skeleton with room for `n` joints.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            joints: Vec::with_capacity(n),
            names: HashMap::with_capacity(n),
        }
    }

    /// Build a skeleton from flat records.
    pub fn from_records(records: &[JointRecord]) -> Result<Self> {
        let mut skeleton = Self::with_capacity(records.len());
        for record in records {
            let parent = match &record.parent {
                Some(parent) => Some(skeleton.find(parent).ok_or_else(|| RigError::UnknownParent {
                    joint: record.name.clone(),
                    parent: parent.clone(),
                })?),
                None => None,
            };
            let id = skeleton.add_joint(record.name.clone(), parent, record.head, record.tail)?;
            skeleton.set_roll(id, record.roll)?;
            if record.connected && parent.is_some() {
                // Snaps the head onto the parent's tail.
                skeleton.set_connected(id, true)?;
            }
            skeleton.joint_mut(id).params = record.params.clone();
        }
        Ok(skeleton)
    }

    /// Flatten into records, parents first.
    pub fn to_records(&self) -> Vec<JointRecord> {
        self.joints()
            .map(|(_, joint)| JointRecord {
                name: joint.name.clone(),
                parent: joint.parent.map(|p| self.joint(p).name.clone()),
                head: joint.head,
                tail: joint.tail,
                roll: joint.roll,
                connected: joint.connected,
                params: joint.params.clone(),
            })
            .collect()
    }

    /// Number of live joints.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the skeleton has no joints.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Add a joint under `parent`.
    pub fn add_joint(
        &mut self,
        name: impl Into<String>,
        parent: Option<JointId>,
        head: Point3<f64>,
        tail: Point3<f64>,
    ) -> Result<JointId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(RigError::DuplicateJoint { name });
        }
        check_finite(&name, "head", &head)?;
        check_finite(&name, "tail", &tail)?;
        if let Some(parent) = parent {
            if self.get(parent).is_none() {
                return Err(RigError::UnknownParent {
                    joint: name,
                    parent: format!("{:?}", parent),
                });
            }
        }

        let id = JointId::new(self.joints.len());
        self.joints.push(Some(Joint::new(name.clone(), parent, head, tail)));
        self.names.insert(name, id);
        if let Some(parent) = parent {
            self.joint_mut(parent).children.push(id);
        }
        Ok(id)
    }

    /// Find a joint by name.
    #[inline]
    pub fn find(&self, name: &str) -> Option<JointId> {
        self.names.get(name).copied()
    }

    /// Get a joint, or `None` if the id is stale.
    #[inline]
    pub fn get(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a joint.
    ///
    /// # Panics
    /// Panics if the joint was removed or the id belongs to another skeleton.
    #[inline]
    pub fn joint(&self, id: JointId) -> &Joint {
        self.get(id).expect("stale joint id")
    }

    #[inline]
    fn joint_mut(&mut self, id: JointId) -> &mut Joint {
        self.joints[id.index()].as_mut().expect("stale joint id")
    }

    /// Look up a joint by name.
    pub fn by_name(&self, name: &str) -> Option<&Joint> {
        self.find(name).map(|id| self.joint(id))
    }

    /// Iterate over live joint ids in creation order.
    pub fn joint_ids(&self) -> impl Iterator<Item = JointId> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(|(_, j)| j.is_some())
            .map(|(i, _)| JointId::new(i))
    }

    /// Iterate over live joints in creation order.
    pub fn joints(&self) -> impl Iterator<Item = (JointId, &Joint)> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter_map(|(i, j)| j.as_ref().map(|j| (JointId::new(i), j)))
    }

    /// Joints without a parent.
    pub fn roots(&self) -> impl Iterator<Item = JointId> + '_ {
        self.joints().filter(|(_, j)| j.parent.is_none()).map(|(id, _)| id)
    }

    /// First child of a joint.
    pub fn first_child(&self, id: JointId) -> Option<JointId> {
        self.joint(id).children.first().copied()
    }

    /// First child of a joint if it is connected.
    pub fn connected_child(&self, id: JointId) -> Option<JointId> {
        self.first_child(id).filter(|&c| self.joint(c).connected)
    }

    /// Move the head of a joint.
    ///
    /// A connected joint drags its parent's tail along, and with it the heads
    /// of its connected siblings.
    pub fn set_head(&mut self, id: JointId, head: Point3<f64>) -> Result<()> {
        check_finite(&self.joint(id).name, "head", &head)?;
        let joint = self.joint_mut(id);
        joint.head = head;
        match (joint.connected, joint.parent) {
            (true, Some(parent)) => self.set_tail(parent, head),
            _ => Ok(()),
        }
    }

    /// Move the tail of a joint.
    ///
    /// Connected children have their heads moved along.
    pub fn set_tail(&mut self, id: JointId, tail: Point3<f64>) -> Result<()> {
        check_finite(&self.joint(id).name, "tail", &tail)?;
        self.joint_mut(id).tail = tail;
        let children = self.joint(id).children.clone();
        for child in children {
            let child = self.joint_mut(child);
            if child.connected {
                child.head = tail;
            }
        }
        Ok(())
    }

    /// Set the roll (radians) of a joint.
    pub fn set_roll(&mut self, id: JointId, roll: f64) -> Result<()> {
        if !roll.is_finite() {
            return Err(RigError::NonFinite {
                joint: self.joint(id).name.clone(),
                attribute: "roll",
            });
        }
        self.joint_mut(id).roll = roll;
        Ok(())
    }

    /// Connect or disconnect a joint from its parent.
    ///
    /// Connecting snaps the head onto the parent's tail. Roots cannot be connected.
    pub fn set_connected(&mut self, id: JointId, connected: bool) -> Result<()> {
        let parent = self.joint(id).parent;
        match (connected, parent) {
            (true, Some(parent)) => {
                let tail = self.joint(parent).tail;
                let joint = self.joint_mut(id);
                joint.head = tail;
                joint.connected = true;
                Ok(())
            }
            (true, None) => Err(RigError::invalid_param(
                "connected",
                &self.joint(id).name,
                "root joints cannot be connected",
            )),
            (false, _) => {
                self.joint_mut(id).connected = false;
                Ok(())
            }
        }
    }

    /// Set a rig parameter on a joint.
    pub fn set_param(&mut self, id: JointId, key: impl Into<String>, value: impl Into<String>) {
        self.joint_mut(id).params.insert(key.into(), value.into());
    }

    /// Remove a joint, handing its children to its parent.
    ///
    /// Children take the removed joint's place in the parent's child list and
    /// become disconnected.
    pub fn remove_joint(&mut self, id: JointId) -> Result<Joint> {
        let joint = self.joints.get_mut(id.index()).and_then(Option::take).ok_or_else(|| {
            RigError::UnknownJoint {
                name: format!("{:?}", id),
            }
        })?;
        self.names.remove(&joint.name);

        for &child in &joint.children {
            let child = self.joint_mut(child);
            child.parent = joint.parent;
            child.connected = false;
        }
        if let Some(parent) = joint.parent {
            let siblings = &mut self.joint_mut(parent).children;
            if let Some(pos) = siblings.iter().position(|&c| c == id) {
                siblings.remove(pos);
                for (offset, &child) in joint.children.iter().enumerate() {
                    siblings.insert(pos + offset, child);
                }
            }
        }
        Ok(joint)
    }

    /// Walk `start`, then `children[0]` repeatedly.
    ///
    /// With `connected_only`, the walk stops at the first child that is not
    /// connected to its parent.
    pub fn chain(&self, start: JointId, connected_only: bool) -> ChainIter<'_> {
        ChainIter {
            skeleton: self,
            next: Some(start),
            connected_only,
        }
    }
}

fn check_finite(name: &str, attribute: &'static str, p: &Point3<f64>) -> Result<()> {
    if is_finite_point(p) {
        Ok(())
    } else {
        Err(RigError::NonFinite {
            joint: name.to_string(),
            attribute,
        })
    }
}

/// Iterator over a first-child chain.
pub struct ChainIter<'a> {
    skeleton: &'a Skeleton,
    next: Option<JointId>,
    connected_only: bool,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = JointId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if self.connected_only {
            self.skeleton.connected_child(current)
        } else {
            self.skeleton.first_child(current)
        };
        Some(current)
    }
}

impl TryFrom<Vec<JointRecord>> for Skeleton {
    type Error = RigError;

    fn try_from(records: Vec<JointRecord>) -> Result<Self> {
        Skeleton::from_records(&records)
    }
}

impl From<Skeleton> for Vec<JointRecord> {
    fn from(skeleton: Skeleton) -> Self {
        skeleton.to_records()
    }
}
