//! Bone correspondence pass.
//!
//! Every name is resolved to a [`JointId`] before anything moves. Entries then
//! run in table order, since later entries may depend on positions written
//! (directly or through connections) by earlier ones.

use nalgebra::Point3;

use super::report::{RetargetReport, RetargetWarning};
use super::tables::{CorrespondenceEntry, JointEnd, SourceRef};
use crate::error::Result;
use crate::skeleton::{is_finite_point, JointId, Skeleton};

/// A source joint end, looked up once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SourcePoint {
    joint: JointId,
    end: JointEnd,
}

impl SourcePoint {
    fn read(self, source: &Skeleton) -> Point3<f64> {
        self.end.of(source.joint(self.joint))
    }
}

/// An entry with every name resolved against the two skeletons.
#[derive(Debug, Clone, Copy)]
struct Resolved<'e> {
    entry: &'e CorrespondenceEntry,
    joint: JointId,
    head: Option<SourcePoint>,
    tail: Option<SourcePoint>,
}

fn resolve_ref(
    source: &Skeleton,
    entry: &CorrespondenceEntry,
    r: &SourceRef,
    requested: JointEnd,
    report: &mut RetargetReport,
) -> Option<SourcePoint> {
    let Some(joint) = source.find(&r.joint) else {
        report.push(RetargetWarning::MissingSourceJoint {
            joint: entry.joint.clone(),
            source_joint: r.joint.clone(),
        });
        return None;
    };
    Some(SourcePoint {
        joint,
        end: r.end_for(requested),
    })
}

/// Resolve every entry up front; unresolvable entries are reported and dropped.
fn resolve_all<'e>(
    dest: &Skeleton,
    source: &Skeleton,
    entries: &'e [CorrespondenceEntry],
    report: &mut RetargetReport,
) -> Vec<Resolved<'e>> {
    let mut resolved = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(joint) = dest.find(&entry.joint) else {
            report.push(RetargetWarning::MissingJoint {
                joint: entry.joint.clone(),
            });
            continue;
        };
        let head = match &entry.head {
            Some(r) => match resolve_ref(source, entry, r, JointEnd::Head, report) {
                Some(point) => Some(point),
                None => continue,
            },
            None => None,
        };
        let tail = match &entry.tail {
            Some(r) => match resolve_ref(source, entry, r, JointEnd::Tail, report) {
                Some(point) => Some(point),
                None => continue,
            },
            None => None,
        };
        resolved.push(Resolved {
            entry,
            joint,
            head,
            tail,
        });
    }
    resolved
}

/// Final head/tail to write for a resolved entry.
fn placement(r: &Resolved<'_>, source: &Skeleton) -> (Option<Point3<f64>>, Option<Point3<f64>>) {
    let head = r.head.map(|p| p.read(source));
    let tail = r.tail.map(|p| p.read(source));
    match (head, tail, r.entry.lerp) {
        (Some(h), Some(t), Some([start, end])) => {
            let d = t - h;
            (Some(h + d * start), Some(h + d * end))
        }
        (head, tail, _) => (head, tail),
    }
}

/// Apply correspondence entries to `dest`. Returns the number of entries applied.
///
/// An entry whose destination or source joint is missing is skipped with a
/// warning and the destination keeps its template position.
pub(crate) fn apply_correspondence(
    dest: &mut Skeleton,
    source: &Skeleton,
    entries: &[CorrespondenceEntry],
    report: &mut RetargetReport,
) -> Result<usize> {
    let resolved = resolve_all(dest, source, entries, report);

    let mut applied = 0;
    for r in &resolved {
        let (head, tail) = placement(r, source);

        if let Some((attribute, _)) = [("head", head), ("tail", tail)]
            .into_iter()
            .find(|(_, p)| p.map_or(false, |p| !is_finite_point(&p)))
        {
            report.push(RetargetWarning::NonFinite {
                joint: r.entry.joint.clone(),
                attribute,
            });
            continue;
        }

        if let Some(head) = head {
            dest.set_head(r.joint, head)?;
        }
        if let Some(tail) = tail {
            dest.set_tail(r.joint, tail)?;
        }
        log::debug!("mapped {} ({:?} -> {:?})", r.entry.joint, r.entry.head, r.entry.tail);
        applied += 1;
    }
    Ok(applied)
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

    fn source() -> Skeleton {
        let mut s = Skeleton::new();
        let spine = s.add_joint("spine_02", None, p(0.0, 0.0, 1.0), p(0.0, 0.0, 1.4)).unwrap();
        s.add_joint("neck", Some(spine), p(0.0, 0.1, 1.5), p(0.0, 0.1, 1.7)).unwrap();
        s.add_joint("hand", None, p(1.0, 0.0, 1.0), p(1.2, 0.4, 1.0)).unwrap();
        s
    }

    fn dest() -> Skeleton {
        let mut s = Skeleton::new();
        let a = s.add_joint("spine.002", None, p(0.0, 0.0, 0.0), p(0.0, 0.0, 0.1)).unwrap();
        let b = s.add_joint("spine.003", Some(a), p(0.0, 0.0, 0.1), p(0.0, 0.0, 0.2)).unwrap();
        s.set_connected(b, true).unwrap();
        s.add_joint("palm", None, p(5.0, 5.0, 5.0), p(5.0, 5.0, 6.0)).unwrap();
        s
    }

    #[test]
    fn test_lerp_places_on_segment() {
        let source = source();
        let mut dest = dest();
        let entries = [CorrespondenceEntry::new("palm", "hand", "hand").with_lerp(0.25, 0.75)];
        let mut report = RetargetReport::new();
        assert_eq!(apply_correspondence(&mut dest, &source, &entries, &mut report).unwrap(), 1);

        let palm = dest.by_name("palm").unwrap();
        assert!(approx(&palm.head, &p(1.05, 0.1, 1.0)));
        assert!(approx(&palm.tail, &p(1.15, 0.3, 1.0)));

        // Both ends lie on the source segment.
        let hand = source.by_name("hand").unwrap();
        for q in [palm.head, palm.tail] {
            let along = (q - hand.head).cross(&hand.vector()).norm();
            assert!(along < 1e-12);
        }
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_reversed_tail_and_connection() {
        let source = source();
        let mut dest = dest();
        let entries = [
            CorrespondenceEntry::new("spine.002", "spine_02", "spine_02").with_lerp(0.0, 0.5),
            CorrespondenceEntry::new("spine.003", "", "-neck"),
        ];
        let mut report = RetargetReport::new();
        apply_correspondence(&mut dest, &source, &entries, &mut report).unwrap();

        let s2 = dest.by_name("spine.002").unwrap();
        let s3 = dest.by_name("spine.003").unwrap();
        assert_eq!(s2.head, p(0.0, 0.0, 1.0));
        assert!(approx(&s2.tail, &p(0.0, 0.0, 1.2)));
        // Connected head follows the parent's new tail; tail is the neck's head.
        assert_eq!(s3.head, s2.tail);
        assert_eq!(s3.tail, source.by_name("neck").unwrap().head);
    }

    #[test]
    fn test_missing_source_skips_entry() {
        let source = source();
        let mut dest = dest();
        let before = dest.by_name("palm").unwrap().clone();
        let entries = [
            CorrespondenceEntry::new("palm", "hand", "-finger"),
            CorrespondenceEntry::new("ear", "hand", "hand"),
        ];
        let mut report = RetargetReport::new();
        assert_eq!(apply_correspondence(&mut dest, &source, &entries, &mut report).unwrap(), 0);

        assert_eq!(dest.by_name("palm").unwrap(), &before);
        assert_eq!(
            report.warnings,
            vec![
                RetargetWarning::MissingSourceJoint {
                    joint: "palm".into(),
                    source_joint: "finger".into(),
                },
                RetargetWarning::MissingJoint { joint: "ear".into() },
            ]
        );
    }

    #[test]
    fn test_unresolved_entry_leaves_others_applied() {
        let source = source();
        let mut dest = dest();
        let entries = [
            CorrespondenceEntry::new("palm", "hand", "hand"),
            CorrespondenceEntry::new("spine.003", "neck", "-finger"),
        ];
        let mut report = RetargetReport::new();
        assert_eq!(apply_correspondence(&mut dest, &source, &entries, &mut report).unwrap(), 1);

        // The failing second entry is reported, the first still applies.
        assert_eq!(
            report.warnings,
            vec![RetargetWarning::MissingSourceJoint {
                joint: "spine.003".into(),
                source_joint: "finger".into(),
            }]
        );
        assert_eq!(dest.by_name("palm").unwrap().tail, p(1.2, 0.4, 1.0));
        assert_eq!(dest.by_name("spine.003").unwrap().head, p(0.0, 0.0, 0.1));
    }

    #[test]
    fn test_single_reference_writes_one_end() {
        let source = source();
        let mut dest = dest();
        let entries = [CorrespondenceEntry::new("palm", "hand", "")];
        let mut report = RetargetReport::new();
        apply_correspondence(&mut dest, &source, &entries, &mut report).unwrap();

        let palm = dest.by_name("palm").unwrap();
        assert_eq!(palm.head, p(1.0, 0.0, 1.0));
        assert_eq!(palm.tail, p(5.0, 5.0, 6.0));
    }
}
