//! Skeleton retargeting onto meta-rig templates.
//!
//! A [`Retargeter`] owns a set of [`MappingTables`] and [`RetargetOptions`]
//! and maps a source skeleton onto a private copy of a template in a fixed
//! stage order:
//!
//! 1. prune template joints the source convention has no use for
//! 2. snapshot relative frames and source rolls
//! 3. bone correspondence
//! 4. restore relative joints
//! 5. restore rolls
//! 6. rig-generator parameters
//! 7. facial UV landmarks (full face mode)
//! 8. anatomical heuristics
//!
//! Problems with single entries never abort the pass; they are collected in
//! a [`RetargetReport`].

mod bbox;
mod builtin;
mod correspondence;
mod engine;
mod heuristics;
mod landmark;
mod options;
mod params;
mod progress;
mod relative;
mod report;
mod roll;
mod tables;

pub use bbox::BoundingBox;
pub use builtin::cc3_metarig_tables;
pub use engine::{FaceSurface, Retarget, RetargetStage, Retargeter};
pub use options::{FaceMode, HeuristicOptions, RetargetOptions};
pub use progress::Progress;
pub use report::{RetargetReport, RetargetWarning};
pub use tables::{
    mirror_uv, AnatomyJoints, ApplyTo, CorrespondenceEntry, JointEnd, JointPair, Landmark, LandmarkEntry,
    MappingTables, ParamEntry, RelativeEntry, RollEntry, SourceRef,
};
