//! Relative-position snapshot and restore.
//!
//! Joints with no source counterpart (heels, breasts, the face root) keep
//! their place relative to the box spanned by a few reference joints. The
//! snapshot is taken on the template layout, before correspondence; the
//! restore runs after it, on the moved references.

use nalgebra::Point3;

use super::bbox::BoundingBox;
use super::report::{RetargetReport, RetargetWarning};
use super::tables::{ApplyTo, JointEnd, RelativeEntry};
use crate::error::Result;
use crate::skeleton::{is_finite_point, JointId, Skeleton};

/// One joint end stored against a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StoredPoint {
    relative: Point3<f64>,
    original: Point3<f64>,
}

#[derive(Debug, Clone)]
struct Frame {
    joint: JointId,
    name: String,
    apply_to: ApplyTo,
    references: Vec<JointId>,
    bbox: BoundingBox,
    head: StoredPoint,
    tail: StoredPoint,
}

/// Frames captured from the template layout.
#[derive(Debug, Clone, Default)]
pub(crate) struct RelativeSnapshot {
    frames: Vec<Frame>,
    padding: f64,
}

fn reference_box(skeleton: &Skeleton, references: &[JointId], padding: f64) -> BoundingBox {
    let points: Vec<Point3<f64>> = references
        .iter()
        .flat_map(|&id| {
            let j = skeleton.joint(id);
            [j.head, j.tail]
        })
        .collect();
    let mut bbox = BoundingBox::from_points(&points);
    bbox.pad(padding);
    bbox
}

fn flat_axes(bbox: &BoundingBox) -> Vec<usize> {
    (0..3).filter(|&axis| bbox.is_degenerate_axis(axis)).collect()
}

impl RelativeSnapshot {
    /// Store every entry's head and tail relative to its padded reference box.
    pub(crate) fn capture(
        skeleton: &Skeleton,
        entries: &[RelativeEntry],
        padding: f64,
        report: &mut RetargetReport,
    ) -> Self {
        let mut frames = Vec::with_capacity(entries.len());
        'entries: for entry in entries {
            let Some(joint) = skeleton.find(&entry.joint) else {
                report.push(RetargetWarning::MissingJoint {
                    joint: entry.joint.clone(),
                });
                continue;
            };

            let mut references = Vec::with_capacity(entry.references.len());
            for name in &entry.references {
                match skeleton.find(name) {
                    Some(id) => references.push(id),
                    None => {
                        report.push(RetargetWarning::MissingReference {
                            joint: entry.joint.clone(),
                            reference: name.clone(),
                        });
                        continue 'entries;
                    }
                }
            }

            let bbox = reference_box(skeleton, &references, padding);
            let axes = flat_axes(&bbox);
            if !axes.is_empty() {
                report.push(RetargetWarning::DegenerateFrame {
                    joint: entry.joint.clone(),
                    axes,
                });
            }

            let j = skeleton.joint(joint);
            let store = |p: Point3<f64>| StoredPoint {
                relative: bbox.to_relative(&p),
                original: p,
            };
            frames.push(Frame {
                joint,
                name: entry.joint.clone(),
                apply_to: entry.apply_to,
                references,
                bbox,
                head: store(j.head),
                tail: store(j.tail),
            });
        }
        Self { frames, padding }
    }

    /// Number of captured frames.
    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    /// Write the stored ends back relative to the current reference boxes.
    ///
    /// With unchanged references the stored positions come back exactly.
    pub(crate) fn restore(&self, skeleton: &mut Skeleton, report: &mut RetargetReport) -> Result<()> {
        for frame in &self.frames {
            let bbox = reference_box(skeleton, &frame.references, self.padding);

            let newly_flat: Vec<usize> = flat_axes(&bbox)
                .into_iter()
                .filter(|&axis| !frame.bbox.is_degenerate_axis(axis))
                .collect();
            if !newly_flat.is_empty() {
                report.push(RetargetWarning::DegenerateFrame {
                    joint: frame.name.clone(),
                    axes: newly_flat,
                });
            }

            let rebuild = |stored: &StoredPoint| -> Point3<f64> {
                if bbox == frame.bbox {
                    return stored.original;
                }
                let mut p = bbox.from_relative(&stored.relative);
                for axis in 0..3 {
                    if bbox.is_degenerate_axis(axis) || frame.bbox.is_degenerate_axis(axis) {
                        p[axis] = stored.original[axis];
                    }
                }
                p
            };

            let ends = [
                (JointEnd::Head, frame.apply_to.head(), &frame.head),
                (JointEnd::Tail, frame.apply_to.tail(), &frame.tail),
            ];
            for (end, apply, stored) in ends {
                if !apply {
                    continue;
                }
                let point = rebuild(stored);
                if !is_finite_point(&point) {
                    report.push(RetargetWarning::NonFinite {
                        joint: frame.name.clone(),
                        attribute: end.as_str(),
                    });
                    continue;
                }
                match end {
                    JointEnd::Head => skeleton.set_head(frame.joint, point)?,
                    JointEnd::Tail => skeleton.set_tail(frame.joint, point)?,
                }
            }
            log::debug!("restored {} relative to {} joints", frame.name, frame.references.len());
        }
        Ok(())
    }
}
