//! Facial UV landmarks.
//!
//! Each entry places one joint, or a chain of joints, on the face surface.
//! Entries for right-side joints are applied a second time to the left-side
//! twin with mirrored UVs, so tables only declare one side.

use nalgebra::Point2;

use super::report::{RetargetReport, RetargetWarning};
use super::tables::{JointEnd, Landmark, LandmarkEntry};
use crate::error::Result;
use crate::skeleton::{is_right, mirror_name, JointId, Skeleton};
use crate::surface::SurfaceProjector;

/// Place landmark joints on the surface. Returns the number of attributes written.
pub(crate) fn apply_landmarks(
    dest: &mut Skeleton,
    projector: &SurfaceProjector<'_>,
    entries: &[LandmarkEntry],
    report: &mut RetargetReport,
) -> Result<usize> {
    let mut written = 0;
    for entry in entries {
        let mut targets = vec![(entry.joint.clone(), entry.landmark.clone())];
        if is_right(&entry.joint) {
            if let Some(left) = mirror_name(&entry.joint) {
                targets.push((left, entry.landmark.mirrored()));
            }
        }

        for (name, landmark) in targets {
            let Some(start) = dest.find(&name) else {
                report.push(RetargetWarning::MissingJoint { joint: name });
                continue;
            };
            let mut pass = LandmarkPass {
                dest: &mut *dest,
                projector,
                report: &mut *report,
                written: 0,
            };
            pass.apply(start, &name, &landmark)?;
            written += pass.written;
        }
    }
    Ok(written)
}

struct LandmarkPass<'a, 'p> {
    dest: &'a mut Skeleton,
    projector: &'a SurfaceProjector<'p>,
    report: &'a mut RetargetReport,
    written: usize,
}

impl LandmarkPass<'_, '_> {
    fn apply(&mut self, start: JointId, name: &str, landmark: &Landmark) -> Result<()> {
        match landmark {
            Landmark::Connected(points) => {
                let chain: Vec<JointId> = self.dest.chain(start, true).collect();
                let capacity = chain.len() + 1;
                if points.len() > capacity {
                    self.report.push(RetargetWarning::ChainTruncated {
                        joint: name.to_string(),
                        mapped: capacity,
                        targets: points.len(),
                    });
                }
                for (i, uv) in points.iter().take(capacity).enumerate() {
                    if i == 0 {
                        self.place(chain[0], JointEnd::Head, uv)?;
                    } else {
                        // The next joint is connected, so its head follows.
                        self.place(chain[i - 1], JointEnd::Tail, uv)?;
                    }
                }
            }
            Landmark::Disconnected(pairs) => {
                let chain: Vec<JointId> = self.dest.chain(start, false).collect();
                if pairs.len() > chain.len() {
                    self.report.push(RetargetWarning::ChainTruncated {
                        joint: name.to_string(),
                        mapped: chain.len(),
                        targets: pairs.len(),
                    });
                }
                for (&joint, (head, tail)) in chain.iter().zip(pairs) {
                    self.place(joint, JointEnd::Head, head)?;
                    self.place(joint, JointEnd::Tail, tail)?;
                }
            }
            Landmark::Head(uv) => self.place(start, JointEnd::Head, uv)?,
            Landmark::Tail(uv) => self.place(start, JointEnd::Tail, uv)?,
        }
        Ok(())
    }

    fn place(&mut self, joint: JointId, end: JointEnd, uv: &Point2<f64>) -> Result<()> {
        match self.projector.project(uv) {
            Some(point) => {
                match end {
                    JointEnd::Head => self.dest.set_head(joint, point)?,
                    JointEnd::Tail => self.dest.set_tail(joint, point)?,
                }
                self.written += 1;
            }
            None => self.report.push(RetargetWarning::ProjectionMiss {
                joint: self.dest.joint(joint).name.clone(),
                attribute: end.as_str(),
                u: uv.x,
                v: uv.y,
            }),
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::skeleton::RegionId;
    use crate::surface::{MeshSurface, Polygon, ProjectOptions};
    use nalgebra::Point3;

    /// Curved sheet over x in [-1, 1], z in [0, 2], mirror symmetric in x.
    ///
    /// UV is `u = (x + 1) / 2`, `v = z / 2`. Quads left of the centre line
    /// are split along one diagonal and their mirror images along the other,
    /// so the triangulation itself is symmetric.
    pub(crate) fn symmetric_sheet() -> MeshSurface {
        let nx = 4;
        let nz = 2;
        let mut positions = Vec::new();
        for j in 0..=nz {
            for i in 0..=nx {
                let x = -1.0 + 2.0 * i as f64 / nx as f64;
                let z = 2.0 * j as f64 / nz as f64;
                positions.push(Point3::new(x, 0.3 * x * x - 0.1 * z, z));
            }
        }
        let index = |i: usize, j: usize| j * (nx + 1) + i;
        let uv_of = |v: usize| {
            let p = positions[v];
            Point2::new((p.x + 1.0) / 2.0, p.z / 2.0)
        };

        let mut polygons = Vec::new();
        for j in 0..nz {
            for i in 0..nx {
                let v00 = index(i, j);
                let v10 = index(i + 1, j);
                let v11 = index(i + 1, j + 1);
                let v01 = index(i, j + 1);
                let triangles = if i < nx / 2 {
                    [[v00, v10, v11], [v00, v11, v01]]
                } else {
                    [[v10, v11, v01], [v10, v01, v00]]
                };
                for t in triangles {
                    polygons.push(Polygon {
                        vertices: t.to_vec(),
                        uvs: t.iter().map(|&v| uv_of(v)).collect(),
                        material: 0,
                    });
                }
            }
        }
        MeshSurface::triangulate(positions, &polygons).unwrap()
    }

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    /// Face joints: a three-joint connected lip chain per side, a cheek per side,
    /// and a two-joint disconnected forehead chain.
    fn face() -> Skeleton {
        let mut s = Skeleton::new();
        let root = s.add_joint("face", None, p(0.0, 0.0, 0.0), p(0.0, 0.0, 0.1)).unwrap();
        for side in ["R", "L"] {
            let a = s
                .add_joint(format!("lip.T.{}", side), Some(root), p(0.0, 0.0, 0.5), p(0.1, 0.0, 0.5))
                .unwrap();
            let b = s
                .add_joint(format!("lip.T.{}.001", side), Some(a), p(0.1, 0.0, 0.5), p(0.2, 0.0, 0.5))
                .unwrap();
            s.set_connected(b, true).unwrap();
            s.add_joint(format!("cheek.{}", side), Some(root), p(0.0, 0.0, 1.0), p(0.0, 0.0, 1.1))
                .unwrap();
        }
        let f = s.add_joint("forehead", Some(root), p(0.0, 0.0, 1.8), p(0.0, 0.0, 1.9)).unwrap();
        s.add_joint("forehead.001", Some(f), p(0.1, 0.0, 1.8), p(0.1, 0.0, 1.9)).unwrap();
        s
    }

    fn entry(joint: &str, landmark: Landmark) -> LandmarkEntry {
        LandmarkEntry {
            joint: joint.into(),
            landmark,
        }
    }

    fn mirrored(a: &Point3<f64>, b: &Point3<f64>) -> bool {
        (a.x + b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12 && (a.z - b.z).abs() < 1e-12
    }

    #[test]
    fn test_right_entry_mirrors_onto_left() {
        let surface = symmetric_sheet();
        let projector = SurfaceProjector::new(&surface, RegionId::new(0), ProjectOptions::default());
        let mut dest = face();
        let entries = [entry("cheek.R", Landmark::Head(Point2::new(0.3, 0.4)))];
        let mut report = RetargetReport::new();
        assert_eq!(apply_landmarks(&mut dest, &projector, &entries, &mut report).unwrap(), 2);

        let right = dest.by_name("cheek.R").unwrap().head;
        let left = dest.by_name("cheek.L").unwrap().head;
        assert!((right.x - (-0.4)).abs() < 1e-12);
        assert!((right.z - 0.8).abs() < 1e-12);
        assert!(mirrored(&right, &left), "{:?} vs {:?}", right, left);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_connected_chain() {
        let surface = symmetric_sheet();
        let projector = SurfaceProjector::new(&surface, RegionId::new(0), ProjectOptions::default());
        let mut dest = face();
        let points = vec![Point2::new(0.5, 0.3), Point2::new(0.4, 0.3), Point2::new(0.3, 0.35)];
        let entries = [entry("lip.T.R", Landmark::Connected(points))];
        let mut report = RetargetReport::new();
        // 3 targets on each side.
        assert_eq!(apply_landmarks(&mut dest, &projector, &entries, &mut report).unwrap(), 6);

        let a = dest.by_name("lip.T.R").unwrap();
        let b = dest.by_name("lip.T.R.001").unwrap();
        assert!((a.head - p(0.0, -0.06, 0.6)).norm() < 1e-12);
        assert_eq!(a.tail, b.head);
        assert!((b.tail.z - 0.7).abs() < 1e-12);

        let b_left = dest.by_name("lip.T.L.001").unwrap();
        assert!(mirrored(&b.tail, &b_left.tail));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_connected_chain_truncated() {
        let surface = symmetric_sheet();
        let projector = SurfaceProjector::new(&surface, RegionId::new(0), ProjectOptions::default());
        let mut dest = face();
        let points = vec![Point2::new(0.5, 0.3); 5];
        let entries = [entry("lip.T.L", Landmark::Connected(points))];
        let mut report = RetargetReport::new();
        assert_eq!(apply_landmarks(&mut dest, &projector, &entries, &mut report).unwrap(), 3);
        assert_eq!(
            report.warnings,
            vec![RetargetWarning::ChainTruncated {
                joint: "lip.T.L".into(),
                mapped: 3,
                targets: 5,
            }]
        );
    }

    #[test]
    fn test_disconnected_pairs() {
        let surface = symmetric_sheet();
        let projector = SurfaceProjector::new(&surface, RegionId::new(0), ProjectOptions::default());
        let mut dest = face();
        let pairs = vec![
            (Point2::new(0.5, 0.9), Point2::new(0.5, 0.8)),
            (Point2::new(0.25, 0.9), Point2::new(0.25, 0.8)),
        ];
        let entries = [entry("forehead", Landmark::Disconnected(pairs))];
        let mut report = RetargetReport::new();
        assert_eq!(apply_landmarks(&mut dest, &projector, &entries, &mut report).unwrap(), 4);

        let second = dest.by_name("forehead.001").unwrap();
        assert!((second.head - p(-0.5, 0.075 - 0.18, 1.8)).norm() < 1e-12);
        assert!((second.tail.z - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_tail_landmark_moves_tail_only() {
        let surface = symmetric_sheet();
        let projector = SurfaceProjector::new(&surface, RegionId::new(0), ProjectOptions::default());
        let mut dest = face();
        let head_before = dest.by_name("cheek.L").unwrap().head;
        let entries = [entry("cheek.L", Landmark::Tail(Point2::new(0.75, 0.5)))];
        let mut report = RetargetReport::new();
        assert_eq!(apply_landmarks(&mut dest, &projector, &entries, &mut report).unwrap(), 1);

        let cheek = dest.by_name("cheek.L").unwrap();
        assert!((cheek.tail - p(0.5, 0.075 - 0.1, 1.0)).norm() < 1e-12);
        assert_eq!(cheek.head, head_before);
        // A left-side entry is not mirrored.
        assert_eq!(dest.by_name("cheek.R").unwrap().tail, p(0.0, 0.0, 1.1));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_projection_miss_keeps_position() {
        let surface = symmetric_sheet();
        // Region 3 has no triangles.
        let projector = SurfaceProjector::new(&surface, RegionId::new(3), ProjectOptions::default());
        let mut dest = face();
        let before = dest.by_name("cheek.L").unwrap().clone();
        let entries = [entry("cheek.L", Landmark::Tail(Point2::new(0.7, 0.4)))];
        let mut report = RetargetReport::new();
        assert_eq!(apply_landmarks(&mut dest, &projector, &entries, &mut report).unwrap(), 0);
        assert_eq!(dest.by_name("cheek.L").unwrap(), &before);
        assert!(matches!(
            report.warnings[0],
            RetargetWarning::ProjectionMiss { attribute: "tail", .. }
        ));
    }
}
