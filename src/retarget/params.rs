//! Rig-generator parameters.

use super::report::{RetargetReport, RetargetWarning};
use super::tables::ParamEntry;
use crate::skeleton::Skeleton;

/// Attach every parameter entry to its destination joint. Returns the count written.
pub(crate) fn apply_params(dest: &mut Skeleton, entries: &[ParamEntry], report: &mut RetargetReport) -> usize {
    let mut written = 0;
    for entry in entries {
        match dest.find(&entry.joint) {
            Some(id) => {
                dest.set_param(id, entry.key.as_str(), entry.value.as_str());
                written += 1;
            }
            None => report.push(RetargetWarning::MissingJoint {
                joint: entry.joint.clone(),
            }),
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_params_attached() {
        let mut dest = Skeleton::new();
        dest.add_joint("upper_arm.L", None, Point3::origin(), Point3::new(0.3, 0.0, 0.0))
            .unwrap();
        let entries = [
            ParamEntry {
                joint: "upper_arm.L".into(),
                key: "rigify_type".into(),
                value: "limbs.arm".into(),
            },
            ParamEntry {
                joint: "upper_arm.R".into(),
                key: "rigify_type".into(),
                value: "limbs.arm".into(),
            },
        ];
        let mut report = RetargetReport::new();
        assert_eq!(apply_params(&mut dest, &entries, &mut report), 1);
        assert_eq!(dest.by_name("upper_arm.L").unwrap().param("rigify_type"), Some("limbs.arm"));
        assert_eq!(report.imprecise_joints(), vec!["upper_arm.R"]);
    }
}
