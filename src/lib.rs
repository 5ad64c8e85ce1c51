//! # Metarig
//!
//! Skeleton retargeting and surface-landmark projection onto meta-rig
//! templates.
//!
//! Metarig takes a character skeleton exported with a known bone-naming
//! convention and rebuilds it on a structurally different template skeleton
//! (a "meta-rig"), ready for automatic skinning and rig generation by the
//! host application.
//!
//! ## Features
//!
//! - **Arena skeletons**: named joints with stable ids, connected-joint semantics
//! - **Declarative tables**: bone correspondence with lerp subdivision and
//!   reversed references, relative frames, roll offsets, rig parameters
//! - **Surface projection**: UV landmarks placed on the face mesh by barycentric
//!   interpolation, with nearest-corner fallback and a cleanup retry
//! - **Mirroring**: right-side tables applied to the left side automatically
//! - **Built-in CC3 tables** and JSON I/O for everything else
//!
//! ## Quick Start
//!
//! ```no_run
//! use metarig::prelude::*;
//!
//! let source = metarig::io::load_skeleton("character.json").unwrap();
//! let template = metarig::io::load_skeleton("metarig.json").unwrap();
//! let face = metarig::io::load_surface("head.json").unwrap();
//! let region = face.region_by_name("Std_Skin_Head").unwrap();
//!
//! let retargeter = Retargeter::with_defaults();
//! let result = retargeter
//!     .retarget(&source, &template, Some(FaceSurface::new(&face, region)))
//!     .unwrap();
//!
//! println!("{}", result.report.summary());
//! metarig::io::save_skeleton(&result.skeleton, "rig.json").unwrap();
//! ```
//!
//! ## Custom Tables
//!
//! ```
//! use metarig::prelude::*;
//! use nalgebra::Point3;
//!
//! let mut source = Skeleton::new();
//! let neck = source
//!     .add_joint("neck", None, Point3::new(0.0, 0.0, 1.5), Point3::new(0.0, 0.0, 1.6))
//!     .unwrap();
//! source.set_roll(neck, 0.1).unwrap();
//!
//! let mut template = Skeleton::new();
//! template
//!     .add_joint("spine.004", None, Point3::new(0.0, 0.0, 1.3), Point3::new(0.0, 0.0, 1.35))
//!     .unwrap();
//!
//! let tables = MappingTables {
//!     correspondence: vec![CorrespondenceEntry::new("spine.004", "neck", "neck").with_lerp(0.0, 0.5)],
//!     ..Default::default()
//! };
//! let result = Retargeter::new(tables, RetargetOptions::default())
//!     .unwrap()
//!     .retarget(&source, &template, None)
//!     .unwrap();
//!
//! let joint = result.skeleton.by_name("spine.004").unwrap();
//! assert_eq!(joint.head, Point3::new(0.0, 0.0, 1.5));
//! // No eye or jaw joints in this template: the heuristics report them.
//! assert!(!result.report.is_precise());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod io;
pub mod retarget;
pub mod skeleton;
pub mod surface;

pub use nalgebra;

/// Prelude module for convenient imports.
///
/// ```
/// use metarig::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Result, RigError};
    pub use crate::retarget::{
        CorrespondenceEntry, FaceMode, FaceSurface, MappingTables, Retarget, RetargetOptions, RetargetReport,
        RetargetWarning, Retargeter,
    };
    pub use crate::skeleton::{Joint, JointId, RegionId, Skeleton};
    pub use crate::surface::{MeshSurface, Polygon, ProjectOptions, SurfaceProjector};
}
