//! Built-in tables: CC3-style character skeleton onto the human meta-rig.
//!
//! Source joints follow the exporter's base naming (`hip`, `waist`,
//! `spine_01`, `l_upperarm`, ...). Destination joints follow the meta-rig
//! (`spine.003`, `upper_arm.L`, ...). Sided entries are declared once for the
//! left side and mirrored for the right.
//!
//! Face UV landmarks assume the standard head texture layout: the face is
//! centred on `u = 0.5`, the character's right side is at `u < 0.5`, `v` grows
//! upwards.

use nalgebra::Point2;

use super::tables::{
    ApplyTo, CorrespondenceEntry, Landmark, LandmarkEntry, MappingTables, ParamEntry, RelativeEntry, RollEntry,
};
use crate::skeleton::{sided, Side};

/// Template joints with no counterpart in the source convention.
const PRUNE: [&str; 1] = ["pelvis.R"];

/// (destination, head source, tail source). `-` reads the other end.
const CENTER: [(&str, &str, &str); 11] = [
    ("spine", "waist", "waist"),
    ("spine.001", "spine_01", "spine_01"),
    ("spine.003", "", "-neck_twist_01"),
    ("spine.004", "neck_twist_01", "neck_twist_01"),
    ("spine.005", "neck_twist_02", "-head"),
    ("spine.006", "head", "head"),
    ("pelvis.L", "pelvis", "pelvis"),
    ("jaw", "jaw_root", "jaw_root"),
    ("tongue", "-tongue_03", "-tongue_03"),
    ("tongue.001", "-tongue_02", "-tongue_02"),
    ("tongue.002", "-tongue_01", "-tongue_01"),
];

/// (destination, head source, tail source, lerp start, lerp end).
const CENTER_LERP: [(&str, &str, &str, f64, f64); 1] = [("spine.002", "spine_02", "spine_02", 0.0, 0.5)];

const SIDED: [(&str, &str, &str); 24] = [
    ("shoulder.L", "l_clavicle", "l_clavicle"),
    ("upper_arm.L", "l_upperarm", "l_upperarm"),
    ("forearm.L", "l_forearm", "l_forearm"),
    ("hand.L", "l_hand", "l_hand"),
    ("thumb.01.L", "l_thumb1", "l_thumb1"),
    ("thumb.02.L", "l_thumb2", "l_thumb2"),
    ("thumb.03.L", "l_thumb3", "l_thumb3"),
    ("f_index.01.L", "l_index1", "l_index1"),
    ("f_index.02.L", "l_index2", "l_index2"),
    ("f_index.03.L", "l_index3", "l_index3"),
    ("f_middle.01.L", "l_mid1", "l_mid1"),
    ("f_middle.02.L", "l_mid2", "l_mid2"),
    ("f_middle.03.L", "l_mid3", "l_mid3"),
    ("f_ring.01.L", "l_ring1", "l_ring1"),
    ("f_ring.02.L", "l_ring2", "l_ring2"),
    ("f_ring.03.L", "l_ring3", "l_ring3"),
    ("f_pinky.01.L", "l_pinky1", "l_pinky1"),
    ("f_pinky.02.L", "l_pinky2", "l_pinky2"),
    ("f_pinky.03.L", "l_pinky3", "l_pinky3"),
    ("thigh.L", "l_thigh", "l_thigh"),
    ("shin.L", "l_calf", "l_calf"),
    ("foot.L", "l_foot", "-l_toe_base"),
    ("toe.L", "l_toe_base", "l_toe_base"),
    ("eye.L", "l_eye", "l_eye"),
];

/// Palm bones split the hand bone toward each finger root.
const SIDED_LERP: [(&str, &str, &str, f64, f64); 4] = [
    ("palm.01.L", "l_hand", "-l_index1", 0.25, 1.0),
    ("palm.02.L", "l_hand", "-l_mid1", 0.25, 1.0),
    ("palm.03.L", "l_hand", "-l_ring1", 0.25, 1.0),
    ("palm.04.L", "l_hand", "-l_pinky1", 0.25, 1.0),
];

/// (destination, apply to, reference joints).
const RELATIVE: [(&str, ApplyTo, &[&str]); 3] = [
    ("heel.02.L", ApplyTo::Both, &["foot.L", "toe.L"]),
    ("breast.L", ApplyTo::Both, &["spine.002", "spine.003", "upper_arm.L"]),
    ("face", ApplyTo::Both, &["spine.005", "spine.006"]),
];

/// (destination, offset degrees for the left side, source joint).
const ROLL: [(&str, f64, &str); 11] = [
    ("shoulder.L", 0.0, "l_clavicle"),
    ("upper_arm.L", 0.0, "l_upperarm"),
    ("forearm.L", 0.0, "l_forearm"),
    ("hand.L", 0.0, "l_hand"),
    ("thumb.01.L", 90.0, "l_thumb1"),
    ("thumb.02.L", 90.0, "l_thumb2"),
    ("thumb.03.L", 90.0, "l_thumb3"),
    ("thigh.L", 0.0, "l_thigh"),
    ("shin.L", 0.0, "l_calf"),
    ("foot.L", 0.0, "l_foot"),
    ("toe.L", 0.0, "l_toe_base"),
];

const PARAMS: [(&str, &str, &str); 14] = [
    ("spine", "rigify_type", "spines.basic_spine"),
    ("spine.004", "rigify_type", "spines.super_head"),
    ("face", "rigify_type", "faces.super_face"),
    ("pelvis.L", "rigify_type", "basic.super_copy"),
    ("shoulder.L", "rigify_type", "basic.super_copy"),
    ("breast.L", "rigify_type", "basic.super_copy"),
    ("upper_arm.L", "rigify_type", "limbs.arm"),
    ("thigh.L", "rigify_type", "limbs.leg"),
    ("palm.01.L", "rigify_type", "limbs.super_palm"),
    ("thumb.01.L", "rigify_type", "limbs.super_finger"),
    ("f_index.01.L", "rigify_type", "limbs.super_finger"),
    ("f_middle.01.L", "rigify_type", "limbs.super_finger"),
    ("f_ring.01.L", "rigify_type", "limbs.super_finger"),
    ("f_pinky.01.L", "rigify_type", "limbs.super_finger"),
];

fn uv(points: &[(f64, f64)]) -> Vec<Point2<f64>> {
    points.iter().map(|&(u, v)| Point2::new(u, v)).collect()
}

fn connected(joint: &str, points: &[(f64, f64)]) -> LandmarkEntry {
    LandmarkEntry {
        joint: joint.to_string(),
        landmark: Landmark::Connected(uv(points)),
    }
}

/// Facial landmarks. Right-side entries are mirrored onto the left at run time.
fn landmarks() -> Vec<LandmarkEntry> {
    vec![
        connected(
            "nose",
            &[(0.5, 0.62), (0.5, 0.55), (0.5, 0.47), (0.5, 0.43), (0.5, 0.40), (0.5, 0.385)],
        ),
        connected("chin", &[(0.5, 0.26), (0.5, 0.20), (0.5, 0.15)]),
        LandmarkEntry {
            joint: "jaw".to_string(),
            landmark: Landmark::Tail(Point2::new(0.5, 0.15)),
        },
        connected("lip.T.R", &[(0.5, 0.345), (0.455, 0.34), (0.41, 0.33)]),
        connected("lip.B.R", &[(0.5, 0.31), (0.455, 0.315), (0.41, 0.33)]),
        connected(
            "brow.T.R",
            &[(0.43, 0.70), (0.38, 0.72), (0.33, 0.725), (0.28, 0.715), (0.24, 0.69)],
        ),
        connected(
            "lid.T.R",
            &[(0.43, 0.62), (0.41, 0.635), (0.385, 0.64), (0.36, 0.635), (0.34, 0.62)],
        ),
        connected(
            "lid.B.R",
            &[(0.34, 0.62), (0.36, 0.605), (0.385, 0.60), (0.41, 0.605), (0.43, 0.62)],
        ),
        connected("cheek.T.R", &[(0.30, 0.60), (0.34, 0.48), (0.43, 0.46)]),
        LandmarkEntry {
            joint: "forehead.R".to_string(),
            landmark: Landmark::Disconnected(vec![
                (Point2::new(0.47, 0.88), Point2::new(0.46, 0.74)),
                (Point2::new(0.40, 0.88), Point2::new(0.39, 0.75)),
                (Point2::new(0.33, 0.86), Point2::new(0.31, 0.74)),
            ]),
        },
        LandmarkEntry {
            joint: "ear.R".to_string(),
            landmark: Landmark::Head(Point2::new(0.12, 0.55)),
        },
    ]
}

fn both_sides() -> [Side; 2] {
    [Side::Left, Side::Right]
}

/// Tables mapping the CC3-style skeleton onto the human meta-rig.
///
/// ```
/// use metarig::retarget::cc3_metarig_tables;
///
/// let tables = cc3_metarig_tables();
/// assert!(tables.validate().is_ok());
/// assert!(tables.correspondence.iter().any(|e| e.joint == "palm.01.R"));
/// ```
pub fn cc3_metarig_tables() -> MappingTables {
    let mut tables = MappingTables {
        prune: PRUNE.iter().map(|s| s.to_string()).collect(),
        landmarks: landmarks(),
        ..Default::default()
    };

    for (joint, head, tail) in CENTER {
        tables.correspondence.push(CorrespondenceEntry::new(joint, head, tail));
    }
    for (joint, head, tail, start, end) in CENTER_LERP {
        tables
            .correspondence
            .push(CorrespondenceEntry::new(joint, head, tail).with_lerp(start, end));
    }
    // spine.003 has no head source; it follows spine.002 through its connection.
    tables.correspondence.sort_by_key(|e| spine_order(&e.joint));

    for side in both_sides() {
        for (joint, head, tail) in SIDED {
            tables.correspondence.push(CorrespondenceEntry::new(
                &sided(joint, side),
                &sided(head, side),
                &sided(tail, side),
            ));
        }
        for (joint, head, tail, start, end) in SIDED_LERP {
            tables.correspondence.push(
                CorrespondenceEntry::new(&sided(joint, side), &sided(head, side), &sided(tail, side))
                    .with_lerp(start, end),
            );
        }
    }

    for (joint, apply_to, references) in RELATIVE {
        let sides: &[Side] = if joint.ends_with(".L") { &[Side::Left, Side::Right] } else { &[Side::Left] };
        for &side in sides {
            tables.relative.push(RelativeEntry {
                joint: sided(joint, side),
                apply_to,
                references: references.iter().map(|r| sided(r, side)).collect(),
            });
        }
    }

    for side in both_sides() {
        let sign = if side == Side::Left { 1.0 } else { -1.0 };
        for (joint, offset, source) in ROLL {
            tables.roll.push(RollEntry {
                joint: sided(joint, side),
                offset_degrees: sign * offset,
                source_joint: sided(source, side),
            });
        }
    }

    for (joint, key, value) in PARAMS {
        let sides: &[Side] = if joint.ends_with(".L") && joint != "pelvis.L" {
            &[Side::Left, Side::Right]
        } else {
            &[Side::Left]
        };
        for &side in sides {
            tables.params.push(ParamEntry {
                joint: sided(joint, side),
                key: key.to_string(),
                value: value.to_string(),
            });
        }
    }

    tables
}

/// Keep the spine chain in head-to-top order, everything else after it.
fn spine_order(joint: &str) -> (u8, u8) {
    match joint {
        "spine" => (0, 0),
        _ => match joint.strip_prefix("spine.") {
            Some(index) => (0, index.parse().unwrap_or(u8::MAX)),
            None => (1, 0),
        },
    }
}
