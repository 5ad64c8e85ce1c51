//! Roll correction.
//!
//! Source rolls are read before any destination joint moves and written back
//! after every position pass, with the table offset added.

use super::report::{RetargetReport, RetargetWarning};
use super::tables::RollEntry;
use crate::error::Result;
use crate::skeleton::{JointId, Skeleton};

#[derive(Debug, Clone, Copy, PartialEq)]
struct StoredRoll {
    joint: JointId,
    roll: f64,
    offset: f64,
}

/// Rolls captured from the source skeleton.
#[derive(Debug, Clone, Default)]
pub(crate) struct RollSnapshot {
    rolls: Vec<StoredRoll>,
}

impl RollSnapshot {
    /// Read each entry's source roll and resolve its destination joint.
    pub(crate) fn capture(
        dest: &Skeleton,
        source: &Skeleton,
        entries: &[RollEntry],
        report: &mut RetargetReport,
    ) -> Self {
        let mut rolls = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(joint) = dest.find(&entry.joint) else {
                report.push(RetargetWarning::MissingJoint {
                    joint: entry.joint.clone(),
                });
                continue;
            };
            let Some(src) = source.by_name(&entry.source_joint) else {
                report.push(RetargetWarning::MissingSourceJoint {
                    joint: entry.joint.clone(),
                    source_joint: entry.source_joint.clone(),
                });
                continue;
            };
            rolls.push(StoredRoll {
                joint,
                roll: src.roll,
                offset: entry.offset_degrees.to_radians(),
            });
        }
        Self { rolls }
    }

    /// Number of stored rolls.
    pub(crate) fn len(&self) -> usize {
        self.rolls.len()
    }

    /// Write `stored + offset` to every destination joint.
    pub(crate) fn restore(&self, dest: &mut Skeleton, report: &mut RetargetReport) -> Result<()> {
        for stored in &self.rolls {
            let roll = stored.roll + stored.offset;
            if !roll.is_finite() {
                report.push(RetargetWarning::NonFinite {
                    joint: dest.joint(stored.joint).name.clone(),
                    attribute: "roll",
                });
                continue;
            }
            dest.set_roll(stored.joint, roll)?;
        }
        Ok(())
    }
}
