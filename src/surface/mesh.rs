//! Triangulated mesh surfaces.
//!
//! A [`MeshSurface`] is a disposable, triangulated working copy of a skinned
//! mesh: vertex positions, triangles tagged with a material region, per-corner
//! UV coordinates and the object's world transform.

use nalgebra::{Matrix4, Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};
use crate::skeleton::{RegionId, TriangleId};

/// A triangle of a [`MeshSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Vertex indices into the surface positions.
    pub vertices: [usize; 3],
    /// UV coordinate of each corner.
    pub uvs: [Point2<f64>; 3],
    /// Material region owning this face.
    pub region: RegionId,
}

/// An input polygon, as exported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertex indices, in winding order.
    pub vertices: Vec<usize>,
    /// One UV per vertex, or empty when the mesh has no UV layer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uvs: Vec<Point2<f64>>,
    /// Material slot index.
    #[serde(default)]
    pub material: usize,
}

/// Serialized form of a mesh surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceRecord {
    /// Local-space vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Polygons (any vertex count >= 3).
    pub polygons: Vec<Polygon>,
    /// Material slot names, indexed by `Polygon::material`.
    #[serde(default)]
    pub materials: Vec<String>,
    /// Object-to-world transform (column-major), identity when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<Matrix4<f64>>,
}

/// Triangulated mesh with material regions and per-corner UVs.
///
/// # Example
///
/// ```
/// use metarig::surface::{MeshSurface, Polygon};
/// use nalgebra::{Point2, Point3};
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 1.0),
///     Point3::new(0.0, 0.0, 1.0),
/// ];
/// let quad = Polygon {
///     vertices: vec![0, 1, 2, 3],
///     uvs: vec![
///         Point2::new(0.0, 0.0),
///         Point2::new(1.0, 0.0),
///         Point2::new(1.0, 1.0),
///         Point2::new(0.0, 1.0),
///     ],
///     material: 0,
/// };
/// let surface = MeshSurface::triangulate(positions, &[quad]).unwrap();
/// assert_eq!(surface.num_triangles(), 2);
/// assert!(surface.has_uvs());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SurfaceRecord", into = "SurfaceRecord")]
pub struct MeshSurface {
    pub(crate) positions: Vec<Point3<f64>>,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) has_uvs: bool,
    pub(crate) region_names: Vec<String>,
    pub(crate) world: Matrix4<f64>,
}

impl MeshSurface {
    /// Fan-triangulate polygons into a new surface.
    ///
    /// Polygons with fewer than three vertices are dropped. Either every
    /// polygon carries UVs or none does.
    pub fn triangulate(positions: Vec<Point3<f64>>, polygons: &[Polygon]) -> Result<Self> {
        let has_uvs = polygons.iter().any(|p| !p.uvs.is_empty());
        let mut triangles = Vec::with_capacity(polygons.len() * 2);

        for (pi, polygon) in polygons.iter().enumerate() {
            for &vi in &polygon.vertices {
                if vi >= positions.len() {
                    return Err(RigError::InvalidVertexIndex {
                        polygon: pi,
                        vertex: vi,
                    });
                }
            }
            if has_uvs && polygon.uvs.len() != polygon.vertices.len() {
                return Err(RigError::UvCountMismatch {
                    polygon: pi,
                    uvs: polygon.uvs.len(),
                    vertices: polygon.vertices.len(),
                });
            }
            if polygon.vertices.len() < 3 {
                log::debug!("skipping polygon {} with {} vertices", pi, polygon.vertices.len());
                continue;
            }

            let uv = |k: usize| {
                if has_uvs {
                    polygon.uvs[k]
                } else {
                    Point2::origin()
                }
            };
            let region = RegionId::new(polygon.material);
            for k in 1..polygon.vertices.len() - 1 {
                triangles.push(Triangle {
                    vertices: [polygon.vertices[0], polygon.vertices[k], polygon.vertices[k + 1]],
                    uvs: [uv(0), uv(k), uv(k + 1)],
                    region,
                });
            }
        }

        Ok(Self {
            positions,
            triangles,
            has_uvs,
            region_names: Vec::new(),
            world: Matrix4::identity(),
        })
    }

    /// Set the object-to-world transform.
    pub fn with_world(mut self, world: Matrix4<f64>) -> Self {
        self.world = world;
        self
    }

    /// Name the material regions (index = material slot).
    pub fn with_region_names(mut self, names: Vec<String>) -> Self {
        self.region_names = names;
        self
    }

    /// Local-space vertex positions.
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// All triangles.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Get a triangle.
    #[inline]
    pub fn triangle(&self, t: TriangleId) -> &Triangle {
        &self.triangles[t.index()]
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the surface has a UV layer.
    pub fn has_uvs(&self) -> bool {
        self.has_uvs
    }

    /// Object-to-world transform.
    pub fn world(&self) -> &Matrix4<f64> {
        &self.world
    }

    /// Find a region by material name.
    pub fn region_by_name(&self, name: &str) -> Option<RegionId> {
        self.region_names.iter().position(|n| n == name).map(RegionId::new)
    }

    /// Material name of a region.
    pub fn region_name(&self, region: RegionId) -> Option<&str> {
        self.region_names.get(region.index()).map(String::as_str)
    }

    /// Iterate over the triangles of one region in storage order.
    pub fn region_triangles(&self, region: RegionId) -> impl Iterator<Item = (TriangleId, &Triangle)> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.region == region)
            .map(|(i, t)| (TriangleId::new(i), t))
    }

    /// Local-space corner positions of a triangle.
    pub fn corner_positions(&self, t: &Triangle) -> [Point3<f64>; 3] {
        [
            self.positions[t.vertices[0]],
            self.positions[t.vertices[1]],
            self.positions[t.vertices[2]],
        ]
    }

    /// Map a local-space point to world space.
    #[inline]
    pub fn to_world(&self, p: &Point3<f64>) -> Point3<f64> {
        self.world.transform_point(p)
    }

    /// Flatten into the serialized form. Triangles become three-vertex polygons.
    pub fn to_record(&self) -> SurfaceRecord {
        let polygons = self
            .triangles
            .iter()
            .map(|t| Polygon {
                vertices: t.vertices.to_vec(),
                uvs: if self.has_uvs { t.uvs.to_vec() } else { Vec::new() },
                material: t.region.index(),
            })
            .collect();
        SurfaceRecord {
            positions: self.positions.clone(),
            polygons,
            materials: self.region_names.clone(),
            world: Some(self.world),
        }
    }
}

impl TryFrom<SurfaceRecord> for MeshSurface {
    type Error = RigError;

    fn try_from(record: SurfaceRecord) -> Result<Self> {
        let surface = MeshSurface::triangulate(record.positions, &record.polygons)?
            .with_region_names(record.materials);
        Ok(match record.world {
            Some(world) => surface.with_world(world),
            None => surface,
        })
    }
}

impl From<MeshSurface> for SurfaceRecord {
    fn from(surface: MeshSurface) -> Self {
        surface.to_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn pentagon() -> (Vec<Point3<f64>>, Polygon) {
        let positions: Vec<_> = (0..5)
            .map(|i| {
                let a = i as f64 * std::f64::consts::TAU / 5.0;
                Point3::new(a.cos(), a.sin(), 0.0)
            })
            .collect();
        let uvs = positions.iter().map(|p| Point2::new(p.x * 0.5 + 0.5, p.y * 0.5 + 0.5)).collect();
        let polygon = Polygon {
            vertices: vec![0, 1, 2, 3, 4],
            uvs,
            material: 2,
        };
        (positions, polygon)
    }

    #[test]
    fn test_fan_triangulation() {
        let (positions, polygon) = pentagon();
        let surface = MeshSurface::triangulate(positions, &[polygon]).unwrap();
        assert_eq!(surface.num_triangles(), 3);
        for (i, t) in surface.triangles().iter().enumerate() {
            assert_eq!(t.vertices, [0, i + 1, i + 2]);
            assert_eq!(t.region, RegionId::new(2));
        }
        assert_eq!(surface.region_triangles(RegionId::new(2)).count(), 3);
        assert_eq!(surface.region_triangles(RegionId::new(0)).count(), 0);
    }

    #[test]
    fn test_invalid_vertex_index() {
        let (positions, mut polygon) = pentagon();
        polygon.vertices[3] = 99;
        assert!(matches!(
            MeshSurface::triangulate(positions, &[polygon]),
            Err(RigError::InvalidVertexIndex { polygon: 0, vertex: 99 })
        ));
    }

    #[test]
    fn test_uv_mismatch() {
        let (positions, mut polygon) = pentagon();
        polygon.uvs.pop();
        assert!(matches!(
            MeshSurface::triangulate(positions, &[polygon]),
            Err(RigError::UvCountMismatch { .. })
        ));
    }

    #[test]
    fn test_no_uv_layer() {
        let (positions, mut polygon) = pentagon();
        polygon.uvs.clear();
        let surface = MeshSurface::triangulate(positions, &[polygon]).unwrap();
        assert!(!surface.has_uvs());
    }

    #[test]
    fn test_regions_and_world() {
        let (positions, polygon) = pentagon();
        let surface = MeshSurface::triangulate(positions, &[polygon])
            .unwrap()
            .with_region_names(vec!["Body".into(), "Eyes".into(), "Skin_Head".into()])
            .with_world(Matrix4::new_translation(&Vector3::new(0.0, 0.0, 1.5)));
        assert_eq!(surface.region_by_name("Skin_Head"), Some(RegionId::new(2)));
        assert_eq!(surface.region_name(RegionId::new(1)), Some("Eyes"));
        assert!(surface.region_by_name("Nails").is_none());
        assert_eq!(surface.to_world(&Point3::new(1.0, 0.0, 0.0)), Point3::new(1.0, 0.0, 1.5));
    }

    #[test]
    fn test_json_round_trip() {
        let (positions, polygon) = pentagon();
        let surface = MeshSurface::triangulate(positions, &[polygon])
            .unwrap()
            .with_region_names(vec!["Skin_Head".into()]);
        let json = serde_json::to_string(&surface).unwrap();
        let back: MeshSurface = serde_json::from_str(&json).unwrap();
        assert_eq!(back.triangles(), surface.triangles());
        assert_eq!(back.positions(), surface.positions());
        assert_eq!(back.region_by_name("Skin_Head"), Some(RegionId::new(0)));
    }
}
