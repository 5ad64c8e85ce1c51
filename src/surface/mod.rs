//! Mesh surfaces and UV projection.
//!
//! Facial landmarks are declared as UV coordinates so they stay valid across
//! face meshes of different density. This module turns such a coordinate into
//! a 3D point on a triangulated copy of the mesh.
//!
//! - [`MeshSurface`]: triangulated working copy with regions and corner UVs
//! - [`project_uv_to_surface`]: barycentric projection with nearest-corner fallback
//! - [`SurfaceProjector`]: projector bound to one region, with cleanup retry

mod cleanup;
mod mesh;
mod project;

pub use mesh::{MeshSurface, Polygon, SurfaceRecord, Triangle};
pub use project::{
    barycentric, locate_uv, nearest_vertex_from_uv, project_uv_to_surface, HitKind, NearestMode,
    ProjectOptions, SurfaceHit, SurfaceProjector,
};
