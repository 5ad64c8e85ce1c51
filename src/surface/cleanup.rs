//! Doubles and degenerate-face cleanup.
//!
//! Used as a retry when a projection against the raw triangulation produces an
//! unusable point: coincident vertices are merged and triangles that collapse,
//! have zero area or carry non-finite data are dropped.

use std::collections::HashMap;

use nalgebra::Point3;

use super::mesh::{MeshSurface, Triangle};
use crate::skeleton::is_finite_point;

/// Minimum doubled triangle area (3D or UV) kept by [`MeshSurface::cleaned`].
const MIN_DOUBLE_AREA: f64 = 1e-14;

impl MeshSurface {
    /// Return a copy with doubles merged and degenerate triangles removed.
    ///
    /// Vertices closer than `merge_distance` are welded onto the first vertex
    /// found in their neighbourhood.
    pub fn cleaned(&self, merge_distance: f64) -> MeshSurface {
        let remap = weld_vertices(&self.positions, merge_distance);

        let triangles: Vec<Triangle> = self
            .triangles
            .iter()
            .filter_map(|t| {
                let vertices = t.vertices.map(|v| remap[v]);
                let welded = Triangle { vertices, ..*t };
                (!is_degenerate(self, &welded)).then_some(welded)
            })
            .collect();

        log::debug!(
            "surface cleanup: {} -> {} triangles",
            self.triangles.len(),
            triangles.len()
        );

        MeshSurface {
            positions: self.positions.clone(),
            triangles,
            has_uvs: self.has_uvs,
            region_names: self.region_names.clone(),
            world: self.world,
        }
    }
}

fn is_degenerate(surface: &MeshSurface, t: &Triangle) -> bool {
    let [a, b, c] = t.vertices;
    if a == b || b == c || a == c {
        return true;
    }
    let [pa, pb, pc] = surface.corner_positions(t);
    if !(is_finite_point(&pa) && is_finite_point(&pb) && is_finite_point(&pc)) {
        return true;
    }
    if (pb - pa).cross(&(pc - pa)).norm() < MIN_DOUBLE_AREA {
        return true;
    }
    if surface.has_uvs {
        let [ua, ub, uc] = t.uvs;
        if !(ua.coords.iter().chain(ub.coords.iter()).chain(uc.coords.iter())).all(|c| c.is_finite()) {
            return true;
        }
        let e0 = ub - ua;
        let e1 = uc - ua;
        if (e0.x * e1.y - e1.x * e0.y).abs() < MIN_DOUBLE_AREA {
            return true;
        }
    }
    false
}

/// Map every vertex to the first vertex within `distance` of it.
///
/// Uses a uniform grid with cell size `distance`, so only the 27 neighbouring
/// cells are searched per vertex.
fn weld_vertices(positions: &[Point3<f64>], distance: f64) -> Vec<usize> {
    let mut remap: Vec<usize> = (0..positions.len()).collect();
    if distance <= 0.0 {
        return remap;
    }

    let cell = |p: &Point3<f64>| -> Option<(i64, i64, i64)> {
        if !is_finite_point(p) {
            return None;
        }
        Some((
            (p.x / distance).floor() as i64,
            (p.y / distance).floor() as i64,
            (p.z / distance).floor() as i64,
        ))
    };

    let limit = distance * distance;
    let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (i, p) in positions.iter().enumerate() {
        let Some((cx, cy, cz)) = cell(p) else {
            continue;
        };

        let mut target = None;
        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &j in bucket {
                            if (positions[j] - p).norm_squared() <= limit {
                                target = Some(j);
                                break 'search;
                            }
                        }
                    }
                }
            }
        }

        match target {
            Some(j) => remap[i] = j,
            None => grid.entry((cx, cy, cz)).or_default().push(i),
        }
    }
    remap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Polygon;
    use nalgebra::Point2;

    fn tri(vertices: [usize; 3], uvs: [(f64, f64); 3]) -> Polygon {
        Polygon {
            vertices: vertices.to_vec(),
            uvs: uvs.iter().map(|&(u, v)| Point2::new(u, v)).collect(),
            material: 0,
        }
    }

    #[test]
    fn test_weld_merges_close_vertices() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0 + 1e-7, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let remap = weld_vertices(&positions, 1e-5);
        assert_eq!(remap, vec![0, 1, 1, 3]);
    }

    #[test]
    fn test_cleanup_drops_degenerates() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0 + 1e-7, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let polygons = vec![
            // good
            tri([0, 1, 2], [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]),
            // collapses once 1 and 3 are welded
            tri([1, 3, 2], [(1.0, 0.0), (1.0, 0.0), (0.0, 1.0)]),
            // collinear in 3D
            tri([0, 1, 4], [(0.0, 0.0), (0.5, 0.5), (0.0, 1.0)]),
            // zero UV area
            tri([0, 2, 4], [(0.2, 0.2), (0.2, 0.2), (0.2, 0.2)]),
        ];
        let surface = MeshSurface::triangulate(positions, &polygons).unwrap();
        let cleaned = surface.cleaned(1e-5);
        assert_eq!(surface.num_triangles(), 4);
        assert_eq!(cleaned.num_triangles(), 1);
        assert_eq!(cleaned.triangles()[0].vertices, [0, 1, 2]);
    }

    #[test]
    fn test_cleanup_drops_non_finite() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(f64::NAN, 1.0, 0.0),
        ];
        let polygons = vec![tri([0, 1, 2], [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])];
        let surface = MeshSurface::triangulate(positions, &polygons).unwrap();
        assert_eq!(surface.cleaned(1e-6).num_triangles(), 0);
    }
}
