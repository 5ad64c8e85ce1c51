//! Anatomical heuristics.
//!
//! Joints that neither the source skeleton nor the landmarks place well get
//! rule-of-thumb positions derived from already-placed neighbours:
//!
//! - eyes: source eye head, tail along the source eye direction, lengthened
//! - head top: head bone tail raised by a multiple of the head-to-eye height
//! - jaw (basic face mode only): tail pushed past the chin reference
//! - teeth: source teeth head, tail back toward the jaw by a fraction of its length

use nalgebra::{Point3, Vector3};

use super::options::HeuristicOptions;
use super::report::{RetargetReport, RetargetWarning};
use super::tables::AnatomyJoints;
use crate::error::Result;
use crate::skeleton::{is_finite_point, Joint, JointId, Skeleton};

/// Shortest vector treated as a direction.
const MIN_LENGTH: f64 = 1e-9;

pub(crate) struct Heuristics<'a> {
    pub(crate) source: &'a Skeleton,
    pub(crate) anatomy: &'a AnatomyJoints,
    pub(crate) options: &'a HeuristicOptions,
}

impl Heuristics<'_> {
    fn resolve<'s>(
        &'s self,
        dest: &Skeleton,
        joint: &str,
        source_joint: &str,
        report: &mut RetargetReport,
    ) -> Option<(JointId, &'s Joint)> {
        let Some(id) = dest.find(joint) else {
            report.push(RetargetWarning::MissingJoint {
                joint: joint.to_string(),
            });
            return None;
        };
        let Some(src) = self.source.by_name(source_joint) else {
            report.push(RetargetWarning::MissingSourceJoint {
                joint: joint.to_string(),
                source_joint: source_joint.to_string(),
            });
            return None;
        };
        Some((id, src))
    }

    fn write(
        dest: &mut Skeleton,
        id: JointId,
        head: Point3<f64>,
        tail: Point3<f64>,
        report: &mut RetargetReport,
    ) -> Result<bool> {
        for (attribute, p) in [("head", head), ("tail", tail)] {
            if !is_finite_point(&p) {
                report.push(RetargetWarning::NonFinite {
                    joint: dest.joint(id).name.clone(),
                    attribute,
                });
                return Ok(false);
            }
        }
        dest.set_head(id, head)?;
        dest.set_tail(id, tail)?;
        Ok(true)
    }

    fn skip(joint: &str, reason: &str, report: &mut RetargetReport) {
        report.push(RetargetWarning::HeuristicSkipped {
            joint: joint.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Eyes start at the source eye and extend along it.
    pub(crate) fn eyes(&self, dest: &mut Skeleton, report: &mut RetargetReport) -> Result<usize> {
        let mut placed = 0;
        for pair in &self.anatomy.eyes {
            let Some((id, src)) = self.resolve(dest, &pair.joint, &pair.source_joint, report) else {
                continue;
            };
            if src.length() < MIN_LENGTH {
                Self::skip(&pair.joint, "zero-length source eye", report);
                continue;
            }
            let tail = src.head + src.vector() * self.options.eye_length_scale;
            if Self::write(dest, id, src.head, tail, report)? {
                placed += 1;
            }
        }
        Ok(placed)
    }

    /// Mean head position of the placed destination eyes.
    fn eye_center(&self, dest: &Skeleton) -> Option<Point3<f64>> {
        let heads: Vec<Point3<f64>> = self
            .anatomy
            .eyes
            .iter()
            .filter_map(|pair| dest.by_name(&pair.joint))
            .map(|j| j.head)
            .collect();
        if heads.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = heads.iter().map(|p| p.coords).sum();
        Some(Point3::from(sum / heads.len() as f64))
    }

    /// Head bone tail at the top of the skull.
    pub(crate) fn head_top(&self, dest: &mut Skeleton, report: &mut RetargetReport) -> Result<bool> {
        let name = &self.anatomy.head;
        let Some(id) = dest.find(name) else {
            report.push(RetargetWarning::MissingJoint { joint: name.clone() });
            return Ok(false);
        };
        let Some(eyes) = self.eye_center(dest) else {
            Self::skip(name, "no eye joints", report);
            return Ok(false);
        };
        let head = dest.joint(id).head;
        let rise = eyes.z - head.z;
        if !(rise > MIN_LENGTH) {
            Self::skip(name, "eyes are not above the head bone", report);
            return Ok(false);
        }
        let tail = head + Vector3::z() * rise * self.options.head_top_scale;
        Self::write(dest, id, head, tail, report)
    }

    /// Jaw from the source jaw toward, and past, the chin reference.
    pub(crate) fn jaw(&self, dest: &mut Skeleton, report: &mut RetargetReport) -> Result<bool> {
        let pair = &self.anatomy.jaw;
        let Some((id, jaw)) = self.resolve(dest, &pair.joint, &pair.source_joint, report) else {
            return Ok(false);
        };
        let Some(chin) = self.source.by_name(&self.anatomy.chin_reference) else {
            report.push(RetargetWarning::MissingSourceJoint {
                joint: pair.joint.clone(),
                source_joint: self.anatomy.chin_reference.clone(),
            });
            return Ok(false);
        };
        let reach = chin.head - jaw.head;
        if reach.norm() < MIN_LENGTH {
            Self::skip(&pair.joint, "chin reference coincides with jaw", report);
            return Ok(false);
        }
        let tail = jaw.head + reach * self.options.chin_scale;
        Self::write(dest, id, jaw.head, tail, report)
    }

    /// Horizontal direction the face points to: head bone toward the eyes.
    fn face_direction(&self, dest: &Skeleton) -> Vector3<f64> {
        let forward = dest
            .by_name(&self.anatomy.head)
            .zip(self.eye_center(dest))
            .map(|(head, eyes)| {
                let d = eyes - head.head;
                Vector3::new(d.x, d.y, 0.0)
            })
            .filter(|d| d.norm() > MIN_LENGTH);
        match forward {
            Some(d) => d.normalize(),
            None => -Vector3::y(),
        }
    }

    /// Teeth start at the source teeth and point back toward the jaw.
    pub(crate) fn teeth(&self, dest: &mut Skeleton, report: &mut RetargetReport) -> Result<usize> {
        let Some(jaw) = dest.by_name(&self.anatomy.jaw.joint) else {
            for pair in &self.anatomy.teeth {
                Self::skip(&pair.joint, "no jaw joint", report);
            }
            return Ok(0);
        };
        let length = jaw.length() * self.options.teeth_fraction;
        if length < MIN_LENGTH {
            for pair in &self.anatomy.teeth {
                Self::skip(&pair.joint, "zero-length jaw", report);
            }
            return Ok(0);
        }
        let back = -self.face_direction(dest);

        let mut placed = 0;
        for pair in &self.anatomy.teeth {
            let Some((id, src)) = self.resolve(dest, &pair.joint, &pair.source_joint, report) else {
                continue;
            };
            let tail = src.head + back * length;
            if Self::write(dest, id, src.head, tail, report)? {
                placed += 1;
            }
        }
        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn approx(a: &Point3<f64>, b: &Point3<f64>) -> bool {
        (a - b).norm() < 1e-12
    }

    /// Character facing -Y.
    fn source() -> Skeleton {
        let mut s = Skeleton::new();
        let head = s.add_joint("head", None, p(0.0, 0.0, 1.6), p(0.0, 0.0, 1.8)).unwrap();
        s.add_joint("l_eye", Some(head), p(0.03, -0.08, 1.68), p(0.03, -0.09, 1.68)).unwrap();
        s.add_joint("r_eye", Some(head), p(-0.03, -0.08, 1.68), p(-0.03, -0.09, 1.68)).unwrap();
        let jaw = s.add_joint("jaw_root", Some(head), p(0.0, -0.01, 1.63), p(0.0, -0.07, 1.6)).unwrap();
        s.add_joint("upper_teeth", Some(head), p(0.0, -0.07, 1.625), p(0.0, -0.06, 1.625)).unwrap();
        s.add_joint("lower_teeth", Some(jaw), p(0.0, -0.07, 1.61), p(0.0, -0.06, 1.61)).unwrap();
        s
    }

    fn dest() -> Skeleton {
        let mut s = Skeleton::new();
        let head = s.add_joint("spine.006", None, p(0.0, 0.0, 1.6), p(0.0, 0.0, 1.7)).unwrap();
        for name in ["eye.L", "eye.R", "jaw", "teeth.T", "teeth.B"] {
            s.add_joint(name, Some(head), p(0.0, -0.05, 1.65), p(0.0, -0.06, 1.65)).unwrap();
        }
        s
    }

    #[test]
    fn test_eyes_then_head_top() {
        let source = source();
        let mut dest = dest();
        let anatomy = AnatomyJoints::default();
        let options = HeuristicOptions::default();
        let h = Heuristics {
            source: &source,
            anatomy: &anatomy,
            options: &options,
        };
        let mut report = RetargetReport::new();

        assert_eq!(h.eyes(&mut dest, &mut report).unwrap(), 2);
        let eye = dest.by_name("eye.L").unwrap();
        assert_eq!(eye.head, p(0.03, -0.08, 1.68));
        assert!(approx(&eye.tail, &p(0.03, -0.1, 1.68)));

        assert!(h.head_top(&mut dest, &mut report).unwrap());
        let head = dest.by_name("spine.006").unwrap();
        assert!(approx(&head.tail, &p(0.0, 0.0, 1.6 + 0.08 * 2.2)));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_jaw_toward_chin() {
        let source = source();
        let mut dest = dest();
        let anatomy = AnatomyJoints::default();
        let options = HeuristicOptions::default();
        let h = Heuristics {
            source: &source,
            anatomy: &anatomy,
            options: &options,
        };
        let mut report = RetargetReport::new();

        assert!(h.jaw(&mut dest, &mut report).unwrap());
        let jaw = dest.by_name("jaw").unwrap();
        assert_eq!(jaw.head, p(0.0, -0.01, 1.63));
        // reach = (0, -0.06, -0.02), scaled by 1.25
        assert!(approx(&jaw.tail, &p(0.0, -0.085, 1.605)));
    }

    #[test]
    fn test_teeth_point_back() {
        let source = source();
        let mut dest = dest();
        let anatomy = AnatomyJoints::default();
        let options = HeuristicOptions::default();
        let h = Heuristics {
            source: &source,
            anatomy: &anatomy,
            options: &options,
        };
        let mut report = RetargetReport::new();

        h.eyes(&mut dest, &mut report).unwrap();
        h.jaw(&mut dest, &mut report).unwrap();
        let jaw_length = dest.by_name("jaw").unwrap().length();
        assert_eq!(h.teeth(&mut dest, &mut report).unwrap(), 2);

        let teeth = dest.by_name("teeth.T").unwrap();
        assert_eq!(teeth.head, p(0.0, -0.07, 1.625));
        // Face points to -Y, so the teeth point to +Y.
        let expected = p(0.0, -0.07 + jaw_length * 0.5, 1.625);
        assert!(approx(&teeth.tail, &expected));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_head_top_skipped_when_eyes_below() {
        let source = source();
        let mut dest = dest();
        let id = dest.find("spine.006").unwrap();
        dest.set_head(id, p(0.0, 0.0, 1.9)).unwrap();
        let anatomy = AnatomyJoints::default();
        let options = HeuristicOptions::default();
        let h = Heuristics {
            source: &source,
            anatomy: &anatomy,
            options: &options,
        };
        let mut report = RetargetReport::new();
        h.eyes(&mut dest, &mut report).unwrap();

        let before = dest.by_name("spine.006").unwrap().clone();
        assert!(!h.head_top(&mut dest, &mut report).unwrap());
        assert_eq!(dest.by_name("spine.006").unwrap(), &before);
        assert!(matches!(report.warnings[0], RetargetWarning::HeuristicSkipped { .. }));
    }
}
