//! Declarative mapping tables.
//!
//! The tables describe how a source skeleton convention maps onto a meta-rig
//! template. They are plain data, loaded once (built in, or from JSON) and
//! read-only during a retarget pass. Name markers such as the `-` "other end"
//! prefix are parsed into typed values at load time.

use std::fmt;

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};
use crate::skeleton::Joint;

/// One end of a bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointEnd {
    /// The head.
    Head,
    /// The tail.
    Tail,
}

impl JointEnd {
    /// The other end.
    pub fn opposite(self) -> JointEnd {
        match self {
            JointEnd::Head => JointEnd::Tail,
            JointEnd::Tail => JointEnd::Head,
        }
    }

    /// Attribute name, for messages.
    pub fn as_str(self) -> &'static str {
        match self {
            JointEnd::Head => "head",
            JointEnd::Tail => "tail",
        }
    }

    /// Read this end of a joint.
    pub fn of(self, joint: &Joint) -> Point3<f64> {
        match self {
            JointEnd::Head => joint.head,
            JointEnd::Tail => joint.tail,
        }
    }
}

/// Reference to a source joint point.
///
/// Written `name` or `-name` in tables. A head reference reads the joint's
/// head and a tail reference its tail; the `-` marker swaps the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceRef {
    /// Source joint name.
    pub joint: String,
    /// Read the opposite end.
    pub reversed: bool,
}

impl SourceRef {
    /// Parse a table reference. Empty strings mean "no reference".
    pub fn parse(s: &str) -> Option<SourceRef> {
        let s = s.trim();
        let (joint, reversed) = match s.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if joint.is_empty() {
            None
        } else {
            Some(SourceRef {
                joint: joint.to_string(),
                reversed,
            })
        }
    }

    /// Which end of the source joint to read when `requested` is wanted.
    pub fn end_for(&self, requested: JointEnd) -> JointEnd {
        if self.reversed {
            requested.opposite()
        } else {
            requested
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reversed {
            write!(f, "-{}", self.joint)
        } else {
            f.write_str(&self.joint)
        }
    }
}

impl TryFrom<String> for SourceRef {
    type Error = RigError;

    fn try_from(s: String) -> Result<Self> {
        SourceRef::parse(&s).ok_or_else(|| RigError::invalid_table(s, "empty source reference"))
    }
}

impl From<SourceRef> for String {
    fn from(r: SourceRef) -> Self {
        r.to_string()
    }
}

/// Bone correspondence: where a destination joint's head and tail come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceEntry {
    /// Destination joint.
    pub joint: String,
    /// Source of the head, `None` leaves it unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<SourceRef>,
    /// Source of the tail, `None` leaves it unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<SourceRef>,
    /// Fractions along the source head→tail segment for the new head and tail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lerp: Option<[f64; 2]>,
}

impl CorrespondenceEntry {
    /// Build an entry from table strings (`""` = unchanged, `-` = other end).
    pub fn new(joint: &str, head: &str, tail: &str) -> Self {
        Self {
            joint: joint.to_string(),
            head: SourceRef::parse(head),
            tail: SourceRef::parse(tail),
            lerp: None,
        }
    }

    /// Subdivide the source segment.
    pub fn with_lerp(mut self, start: f64, end: f64) -> Self {
        self.lerp = Some([start, end]);
        self
    }
}

/// Which attribute a relative mapping restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyTo {
    /// Only the head.
    Head,
    /// Only the tail.
    Tail,
    /// Head and tail.
    Both,
}

impl ApplyTo {
    /// Whether the head is written.
    pub fn head(self) -> bool {
        matches!(self, ApplyTo::Head | ApplyTo::Both)
    }

    /// Whether the tail is written.
    pub fn tail(self) -> bool {
        matches!(self, ApplyTo::Tail | ApplyTo::Both)
    }
}

/// Position a joint relative to the box around other joints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeEntry {
    /// Destination joint.
    pub joint: String,
    /// Attributes to restore.
    pub apply_to: ApplyTo,
    /// Destination joints whose heads and tails span the frame.
    pub references: Vec<String>,
}

/// Copy roll from a source joint with a fixed offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollEntry {
    /// Destination joint.
    pub joint: String,
    /// Offset added to the source roll, in degrees.
    pub offset_degrees: f64,
    /// Source joint whose roll is copied.
    pub source_joint: String,
}

/// Opaque rig-generator parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamEntry {
    /// Destination joint.
    pub joint: String,
    /// Parameter name.
    pub key: String,
    /// Parameter value.
    pub value: String,
}

/// UV targets of a landmark entry, by mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    /// Chain of connected joints: the first point is the first head, each
    /// following point a tail shared with the next joint's head.
    Connected(Vec<Point2<f64>>),
    /// One `(head, tail)` pair per joint along a first-child chain.
    Disconnected(Vec<(Point2<f64>, Point2<f64>)>),
    /// Head of a single joint.
    Head(Point2<f64>),
    /// Tail of a single joint.
    Tail(Point2<f64>),
}

impl Landmark {
    /// Mirror across the vertical UV centre line: `u' = 1 - u`.
    pub fn mirrored(&self) -> Landmark {
        match self {
            Landmark::Connected(points) => Landmark::Connected(points.iter().map(mirror_uv).collect()),
            Landmark::Disconnected(pairs) => {
                Landmark::Disconnected(pairs.iter().map(|(h, t)| (mirror_uv(h), mirror_uv(t))).collect())
            }
            Landmark::Head(p) => Landmark::Head(mirror_uv(p)),
            Landmark::Tail(p) => Landmark::Tail(mirror_uv(p)),
        }
    }

    /// Number of UV targets.
    pub fn len(&self) -> usize {
        match self {
            Landmark::Connected(points) => points.len(),
            Landmark::Disconnected(pairs) => pairs.len(),
            Landmark::Head(_) | Landmark::Tail(_) => 1,
        }
    }

    /// Whether there are no targets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mirror a UV coordinate across `u = 0.5`.
#[inline]
pub fn mirror_uv(uv: &Point2<f64>) -> Point2<f64> {
    Point2::new(1.0 - uv.x, uv.y)
}

/// Place a destination joint from UV landmarks on the face surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkEntry {
    /// Destination joint (first joint of the chain).
    pub joint: String,
    /// Targets and mode.
    pub landmark: Landmark,
}

/// Destination/source joint pair used by the anatomical heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointPair {
    /// Destination joint.
    pub joint: String,
    /// Source joint.
    pub source_joint: String,
}

impl JointPair {
    fn new(joint: &str, source_joint: &str) -> Self {
        Self {
            joint: joint.to_string(),
            source_joint: source_joint.to_string(),
        }
    }
}

/// Joints the anatomical heuristics operate on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnatomyJoints {
    /// Destination head bone, whose tail marks the top of the skull.
    pub head: String,
    /// Eyes.
    pub eyes: Vec<JointPair>,
    /// Upper then lower teeth.
    pub teeth: Vec<JointPair>,
    /// Jaw.
    pub jaw: JointPair,
    /// Source joint marking the front of the lower teeth (chin heuristic).
    pub chin_reference: String,
}

impl Default for AnatomyJoints {
    fn default() -> Self {
        Self {
            head: "spine.006".to_string(),
            eyes: vec![JointPair::new("eye.L", "l_eye"), JointPair::new("eye.R", "r_eye")],
            teeth: vec![
                JointPair::new("teeth.T", "upper_teeth"),
                JointPair::new("teeth.B", "lower_teeth"),
            ],
            jaw: JointPair::new("jaw", "jaw_root"),
            chin_reference: "lower_teeth".to_string(),
        }
    }
}

/// The full set of tables for one source convention and template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingTables {
    /// Template joints removed before mapping.
    pub prune: Vec<String>,
    /// Bone correspondence, applied in order.
    pub correspondence: Vec<CorrespondenceEntry>,
    /// Relative-position entries.
    pub relative: Vec<RelativeEntry>,
    /// Roll corrections.
    pub roll: Vec<RollEntry>,
    /// Rig-generator parameters.
    pub params: Vec<ParamEntry>,
    /// Facial UV landmarks.
    pub landmarks: Vec<LandmarkEntry>,
    /// Joints used by the anatomical heuristics.
    pub anatomy: AnatomyJoints,
}

impl MappingTables {
    /// Check entries for structural mistakes.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.correspondence {
            if let Some([start, end]) = entry.lerp {
                if entry.head.is_none() || entry.tail.is_none() {
                    return Err(RigError::invalid_table(&entry.joint, "lerp needs both head and tail sources"));
                }
                if !(start.is_finite() && end.is_finite()) {
                    return Err(RigError::invalid_table(&entry.joint, "lerp fractions must be finite"));
                }
            }
            if entry.head.is_none() && entry.tail.is_none() {
                return Err(RigError::invalid_table(&entry.joint, "no head or tail source"));
            }
        }
        for entry in &self.relative {
            if entry.references.is_empty() {
                return Err(RigError::invalid_table(&entry.joint, "no reference joints"));
            }
        }
        for entry in &self.roll {
            if !entry.offset_degrees.is_finite() {
                return Err(RigError::invalid_table(&entry.joint, "roll offset must be finite"));
            }
        }
        for entry in &self.landmarks {
            if entry.landmark.is_empty() {
                return Err(RigError::invalid_table(&entry.joint, "no landmark targets"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_ref_parse() {
        assert_eq!(SourceRef::parse(""), None);
        assert_eq!(SourceRef::parse("-"), None);
        let r = SourceRef::parse("-neck_twist_01").unwrap();
        assert_eq!(r.joint, "neck_twist_01");
        assert!(r.reversed);
        assert_eq!(r.to_string(), "-neck_twist_01");
        assert_eq!(r.end_for(JointEnd::Tail), JointEnd::Head);
        assert_eq!(r.end_for(JointEnd::Head), JointEnd::Tail);

        let r = SourceRef::parse("head").unwrap();
        assert!(!r.reversed);
        assert_eq!(r.end_for(JointEnd::Tail), JointEnd::Tail);
    }

    #[test]
    fn test_landmark_mirror() {
        let lm = Landmark::Disconnected(vec![(Point2::new(0.2, 0.7), Point2::new(0.3, 0.6))]);
        match lm.mirrored() {
            Landmark::Disconnected(pairs) => {
                assert_eq!(pairs[0].0, Point2::new(0.8, 0.7));
                assert_eq!(pairs[0].1, Point2::new(0.7, 0.6));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(Landmark::Head(Point2::new(0.25, 0.5)).mirrored(), Landmark::Head(Point2::new(0.75, 0.5)));
    }

    #[test]
    fn test_validate() {
        let mut tables = MappingTables::default();
        tables
            .correspondence
            .push(CorrespondenceEntry::new("palm.01.L", "l_hand", "").with_lerp(0.0, 0.5));
        assert!(matches!(tables.validate(), Err(RigError::InvalidTable { .. })));

        tables.correspondence[0] = CorrespondenceEntry::new("palm.01.L", "l_hand", "-l_index1").with_lerp(0.25, 1.0);
        assert!(tables.validate().is_ok());

        tables.landmarks.push(LandmarkEntry {
            joint: "nose".into(),
            landmark: Landmark::Connected(Vec::new()),
        });
        assert!(tables.validate().is_err());
    }

    #[test]
    fn test_json_form() {
        let json = r#"{
            "correspondence": [
                {"joint": "spine.003", "tail": "-neck_twist_01"},
                {"joint": "palm.01.L", "head": "l_hand", "tail": "-l_index1", "lerp": [0.25, 1.0]}
            ],
            "landmarks": [
                {"joint": "nose", "landmark": {"connected": [[0.5, 0.6], [0.5, 0.5]]}},
                {"joint": "forehead.R", "landmark": {"disconnected": [[[0.4, 0.9], [0.4, 0.8]]]}},
                {"joint": "ear.R", "landmark": {"head": [0.1, 0.5]}}
            ]
        }"#;
        let tables: MappingTables = serde_json::from_str(json).unwrap();
        assert!(tables.validate().is_ok());
        assert_eq!(tables.correspondence[0].head, None);
        assert_eq!(tables.correspondence[0].tail, SourceRef::parse("-neck_twist_01"));
        assert_eq!(tables.landmarks[1].landmark.len(), 1);
        assert_eq!(tables.anatomy, AnatomyJoints::default());

        let again: MappingTables = serde_json::from_str(&serde_json::to_string(&tables).unwrap()).unwrap();
        assert_eq!(again, tables);
    }
}
