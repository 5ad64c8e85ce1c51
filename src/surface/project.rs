//! UV to surface projection.
//!
//! Given a UV coordinate and one material region of a [`MeshSurface`], find
//! the world-space point on the surface that carries that UV.
//!
//! # Algorithm
//!
//! 1. Scan the region's triangles in storage order. The first triangle whose
//!    UV corners contain the query gives barycentric weights, which are applied
//!    to the 3D corners (barycentric transform) and mapped to world space.
//! 2. If no triangle contains the query (edge of a UV island, numerical
//!    boundary), fall back to the triangle corner with the closest UV.
//!
//! # Nearest-corner modes
//!
//! [`NearestMode::Strict`] returns the globally closest corner, ties going to
//! the first one scanned. [`NearestMode::FirstWithin`] stops at the first corner
//! within [`ProjectOptions::threshold`] of the query, which is faster and
//! reproduces legacy exporter output, but may miss a closer corner scanned
//! later. If no corner is within the threshold both modes agree.

use std::cell::OnceCell;

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use super::mesh::{MeshSurface, Triangle};
use crate::skeleton::{is_finite_point, RegionId, TriangleId};

/// How the nearest-corner fallback picks its corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearestMode {
    /// Globally closest corner.
    Strict,
    /// First corner within the threshold, else globally closest.
    FirstWithin,
}

/// Options for UV projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectOptions {
    /// Tolerance on barycentric weights for the containment test.
    pub epsilon: f64,

    /// Nearest-corner fallback mode.
    pub nearest: NearestMode,

    /// UV distance for [`NearestMode::FirstWithin`].
    pub threshold: f64,

    /// Weld distance for the cleanup retry.
    pub merge_distance: f64,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            epsilon: 1e-9,
            nearest: NearestMode::Strict,
            threshold: 0.001,
            merge_distance: 1e-5,
        }
    }
}

impl ProjectOptions {
    /// Use the first-within-threshold fallback.
    pub fn first_within(mut self, threshold: f64) -> Self {
        self.nearest = NearestMode::FirstWithin;
        self.threshold = threshold.max(0.0);
        self
    }

    /// Use the strict nearest fallback.
    pub fn strict(mut self) -> Self {
        self.nearest = NearestMode::Strict;
        self
    }
}

/// How a projection was resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitKind {
    /// The UV lies inside the triangle with these barycentric weights.
    Inside {
        /// Weights of the three corners, summing to one.
        weights: [f64; 3],
    },
    /// Nearest-corner fallback.
    Corner {
        /// Corner index within the triangle.
        corner: usize,
    },
}

/// A resolved projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Triangle that produced the point.
    pub triangle: TriangleId,
    /// Containment or fallback.
    pub kind: HitKind,
    /// World-space point.
    pub point: Point3<f64>,
}

/// Barycentric weights of `p` in the 2D triangle `(a, b, c)`.
///
/// Returns `None` for a triangle with (near) zero area.
pub fn barycentric(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Option<[f64; 3]> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d = v0.x * v1.y - v1.x * v0.y;
    if !d.is_finite() || d.abs() < 1e-14 {
        return None;
    }
    let wb = (v2.x * v1.y - v1.x * v2.y) / d;
    let wc = (v0.x * v2.y - v2.x * v0.y) / d;
    Some([1.0 - wb - wc, wb, wc])
}

fn interpolate(corners: &[Point3<f64>; 3], w: &[f64; 3]) -> Point3<f64> {
    Point3::from(corners[0].coords * w[0] + corners[1].coords * w[1] + corners[2].coords * w[2])
}

/// Find the first triangle of `region` containing `uv`.
pub fn locate_uv(
    mesh: &MeshSurface,
    region: RegionId,
    uv: &Point2<f64>,
    options: &ProjectOptions,
) -> Option<SurfaceHit> {
    if !mesh.has_uvs() {
        return None;
    }
    mesh.region_triangles(region).find_map(|(id, t)| {
        let weights = barycentric(uv, &t.uvs[0], &t.uvs[1], &t.uvs[2])?;
        if weights.iter().all(|&w| w >= -options.epsilon) {
            let local = interpolate(&mesh.corner_positions(t), &weights);
            Some(SurfaceHit {
                triangle: id,
                kind: HitKind::Inside { weights },
                point: mesh.to_world(&local),
            })
        } else {
            None
        }
    })
}

/// Find the triangle corner of `region` whose UV is nearest to `uv`.
pub fn nearest_vertex_from_uv(
    mesh: &MeshSurface,
    region: RegionId,
    uv: &Point2<f64>,
    options: &ProjectOptions,
) -> Option<SurfaceHit> {
    if !mesh.has_uvs() {
        return None;
    }
    let threshold_sq = options.threshold * options.threshold;
    let mut best: Option<(f64, TriangleId, &Triangle, usize)> = None;

    for (id, t) in mesh.region_triangles(region) {
        for corner in 0..3 {
            let d2 = (t.uvs[corner] - uv).norm_squared();
            if options.nearest == NearestMode::FirstWithin && d2 <= threshold_sq {
                return Some(corner_hit(mesh, id, t, corner));
            }
            if best.map_or(true, |(bd, ..)| d2 < bd) {
                best = Some((d2, id, t, corner));
            }
        }
    }

    best.map(|(_, id, t, corner)| corner_hit(mesh, id, t, corner))
}

fn corner_hit(mesh: &MeshSurface, id: TriangleId, t: &Triangle, corner: usize) -> SurfaceHit {
    SurfaceHit {
        triangle: id,
        kind: HitKind::Corner { corner },
        point: mesh.to_world(&mesh.positions()[t.vertices[corner]]),
    }
}

/// Project a UV coordinate onto the surface of one material region.
///
/// Returns `None` when the region has no triangles or the mesh has no UV
/// layer; callers keep whatever position they had.
///
/// # Example
///
/// ```
/// use metarig::skeleton::RegionId;
/// use metarig::surface::{project_uv_to_surface, MeshSurface, Polygon, ProjectOptions};
/// use nalgebra::{Point2, Point3};
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
///     Point3::new(0.0, 0.0, 2.0),
/// ];
/// let polygon = Polygon {
///     vertices: vec![0, 1, 2],
///     uvs: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)],
///     material: 0,
/// };
/// let surface = MeshSurface::triangulate(positions, &[polygon]).unwrap();
///
/// let p = project_uv_to_surface(&surface, RegionId::new(0), &Point2::new(0.25, 0.25), &ProjectOptions::default());
/// assert_eq!(p, Some(Point3::new(0.5, 0.0, 0.5)));
/// ```
pub fn project_uv_to_surface(
    mesh: &MeshSurface,
    region: RegionId,
    uv: &Point2<f64>,
    options: &ProjectOptions,
) -> Option<Point3<f64>> {
    locate_uv(mesh, region, uv, options)
        .or_else(|| nearest_vertex_from_uv(mesh, region, uv, options))
        .map(|hit| hit.point)
}

/// Projector bound to one region of a surface.
///
/// Holds the raw triangulation and lazily builds a cleaned copy the first
/// time a projection yields a non-finite point.
#[derive(Debug)]
pub struct SurfaceProjector<'a> {
    mesh: &'a MeshSurface,
    region: RegionId,
    options: ProjectOptions,
    cleaned: OnceCell<MeshSurface>,
}

impl<'a> SurfaceProjector<'a> {
    /// Bind a projector to `region` of `mesh`.
    pub fn new(mesh: &'a MeshSurface, region: RegionId, options: ProjectOptions) -> Self {
        Self {
            mesh,
            region,
            options,
            cleaned: OnceCell::new(),
        }
    }

    /// The surface being projected onto.
    pub fn mesh(&self) -> &MeshSurface {
        self.mesh
    }

    /// The bound region.
    pub fn region(&self) -> RegionId {
        self.region
    }

    /// Number of triangles in the bound region.
    pub fn num_region_triangles(&self) -> usize {
        self.mesh.region_triangles(self.region).count()
    }

    /// Project a UV coordinate, retrying on the cleaned surface if needed.
    pub fn project(&self, uv: &Point2<f64>) -> Option<Point3<f64>> {
        let point = project_uv_to_surface(self.mesh, self.region, uv, &self.options)?;
        if is_finite_point(&point) {
            return Some(point);
        }

        log::debug!("projection of {:?} not finite, retrying on cleaned surface", uv);
        let cleaned = self
            .cleaned
            .get_or_init(|| self.mesh.cleaned(self.options.merge_distance));
        project_uv_to_surface(cleaned, self.region, uv, &self.options).filter(is_finite_point)
    }
}
