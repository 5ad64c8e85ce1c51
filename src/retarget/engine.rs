//! The retarget pass.

use std::fmt;

use super::correspondence::apply_correspondence;
use super::heuristics::Heuristics;
use super::landmark::apply_landmarks;
use super::options::{FaceMode, RetargetOptions};
use super::params::apply_params;
use super::progress::Progress;
use super::relative::RelativeSnapshot;
use super::report::{RetargetReport, RetargetWarning};
use super::roll::RollSnapshot;
use super::tables::MappingTables;
use crate::error::{Result, RigError};
use crate::skeleton::{RegionId, Skeleton};
use crate::surface::{MeshSurface, SurfaceProjector};

/// Stages of a retarget pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetargetStage {
    /// Remove template joints the source convention has no use for.
    Prune,
    /// Capture relative frames and source rolls on the template layout.
    Snapshot,
    /// Move joints onto their source counterparts.
    Correspondence,
    /// Rebuild relative joints from the moved references.
    RestoreRelative,
    /// Write stored source rolls plus offsets.
    RestoreRoll,
    /// Attach rig-generator parameters.
    RigParameters,
    /// Project facial UV landmarks onto the face surface.
    Landmarks,
    /// Eye, skull, jaw and teeth rules.
    Heuristics,
}

impl RetargetStage {
    /// All stages, in order.
    pub const ALL: [RetargetStage; 8] = [
        RetargetStage::Prune,
        RetargetStage::Snapshot,
        RetargetStage::Correspondence,
        RetargetStage::RestoreRelative,
        RetargetStage::RestoreRoll,
        RetargetStage::RigParameters,
        RetargetStage::Landmarks,
        RetargetStage::Heuristics,
    ];

    /// Position in [`RetargetStage::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short stage name.
    pub fn name(self) -> &'static str {
        match self {
            RetargetStage::Prune => "prune",
            RetargetStage::Snapshot => "snapshot",
            RetargetStage::Correspondence => "correspondence",
            RetargetStage::RestoreRelative => "restore relative",
            RetargetStage::RestoreRoll => "restore roll",
            RetargetStage::RigParameters => "rig parameters",
            RetargetStage::Landmarks => "landmarks",
            RetargetStage::Heuristics => "heuristics",
        }
    }
}

impl fmt::Display for RetargetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The face mesh and the material region landmarks are projected onto.
#[derive(Debug, Clone, Copy)]
pub struct FaceSurface<'a> {
    /// Triangulated face mesh.
    pub mesh: &'a MeshSurface,
    /// Skin region of the head.
    pub region: RegionId,
}

impl<'a> FaceSurface<'a> {
    /// Bind a mesh region.
    pub fn new(mesh: &'a MeshSurface, region: RegionId) -> Self {
        Self { mesh, region }
    }
}

/// Result of a successful pass.
#[derive(Debug, Clone)]
pub struct Retarget {
    /// The positioned skeleton.
    pub skeleton: Skeleton,
    /// Recoverable problems met on the way.
    pub report: RetargetReport,
}

/// Maps source skeletons onto a meta-rig template.
///
/// # Example
///
/// ```
/// use metarig::retarget::{CorrespondenceEntry, MappingTables, RetargetOptions, Retargeter};
/// use metarig::skeleton::Skeleton;
/// use nalgebra::Point3;
///
/// let mut source = Skeleton::new();
/// source.add_joint("waist", None, Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 1.2)).unwrap();
///
/// let mut template = Skeleton::new();
/// template.add_joint("spine", None, Point3::new(0.0, 0.0, 0.9), Point3::new(0.0, 0.0, 1.0)).unwrap();
///
/// let tables = MappingTables {
///     correspondence: vec![CorrespondenceEntry::new("spine", "waist", "waist")],
///     ..Default::default()
/// };
/// let retargeter = Retargeter::new(tables, RetargetOptions::default()).unwrap();
/// let result = retargeter.retarget(&source, &template, None).unwrap();
///
/// assert_eq!(result.skeleton.by_name("spine").unwrap().tail, Point3::new(0.0, 0.0, 1.2));
/// // The template is untouched.
/// assert_eq!(template.by_name("spine").unwrap().tail, Point3::new(0.0, 0.0, 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct Retargeter {
    tables: MappingTables,
    options: RetargetOptions,
}

impl Retargeter {
    /// Validate tables and options and build a retargeter.
    pub fn new(tables: MappingTables, options: RetargetOptions) -> Result<Self> {
        tables.validate()?;
        options.validate()?;
        Ok(Self { tables, options })
    }

    /// Built-in CC3 tables with default options.
    pub fn with_defaults() -> Self {
        Self {
            tables: super::builtin::cc3_metarig_tables(),
            options: RetargetOptions::default(),
        }
    }

    /// The mapping tables.
    pub fn tables(&self) -> &MappingTables {
        &self.tables
    }

    /// The options.
    pub fn options(&self) -> &RetargetOptions {
        &self.options
    }

    /// Retarget `source` onto a copy of `template`.
    ///
    /// `face` is required for landmarks in [`FaceMode::Full`]; without it the
    /// landmark stage is skipped with a warning.
    pub fn retarget(&self, source: &Skeleton, template: &Skeleton, face: Option<FaceSurface<'_>>) -> Result<Retarget> {
        self.retarget_with_progress(source, template, face, &Progress::none())
    }

    /// [`retarget`](Self::retarget) with a progress callback, invoked before
    /// each stage and once at the end.
    pub fn retarget_with_progress(
        &self,
        source: &Skeleton,
        template: &Skeleton,
        face: Option<FaceSurface<'_>>,
        progress: &Progress,
    ) -> Result<Retarget> {
        if template.is_empty() {
            return Err(RigError::MissingTemplate);
        }
        if source.is_empty() {
            return Err(RigError::MissingSource);
        }

        let mut dest = template.clone();
        let mut report = RetargetReport::new();
        let stage = |report: &mut RetargetReport, s: RetargetStage| {
            log::debug!("stage {}/{}: {}", s.index() + 1, RetargetStage::ALL.len(), s);
            progress.stage(s);
            report.stages.push(s.name());
        };

        stage(&mut report, RetargetStage::Prune);
        for name in &self.tables.prune {
            match dest.find(name) {
                Some(id) => {
                    dest.remove_joint(id)?;
                }
                None => log::debug!("prune: {} not in template", name),
            }
        }

        stage(&mut report, RetargetStage::Snapshot);
        let relative =
            RelativeSnapshot::capture(&dest, &self.tables.relative, self.options.relative_padding, &mut report);
        let rolls = RollSnapshot::capture(&dest, source, &self.tables.roll, &mut report);
        log::debug!("captured {} relative frames, {} rolls", relative.len(), rolls.len());

        stage(&mut report, RetargetStage::Correspondence);
        let mapped = apply_correspondence(&mut dest, source, &self.tables.correspondence, &mut report)?;
        log::debug!("mapped {}/{} correspondence entries", mapped, self.tables.correspondence.len());

        stage(&mut report, RetargetStage::RestoreRelative);
        relative.restore(&mut dest, &mut report)?;

        stage(&mut report, RetargetStage::RestoreRoll);
        rolls.restore(&mut dest, &mut report)?;

        stage(&mut report, RetargetStage::RigParameters);
        apply_params(&mut dest, &self.tables.params, &mut report);

        stage(&mut report, RetargetStage::Landmarks);
        match (self.options.face_mode, face) {
            (FaceMode::Full, Some(face)) => {
                let projector = SurfaceProjector::new(face.mesh, face.region, self.options.projection.clone());
                let written = apply_landmarks(&mut dest, &projector, &self.tables.landmarks, &mut report)?;
                log::debug!("placed {} landmark attributes", written);
            }
            (FaceMode::Full, None) => {
                if !self.tables.landmarks.is_empty() {
                    report.push(RetargetWarning::MissingFaceSurface);
                }
            }
            (FaceMode::Basic, _) => log::debug!("basic face mode, landmarks skipped"),
        }

        stage(&mut report, RetargetStage::Heuristics);
        let heuristics = Heuristics {
            source,
            anatomy: &self.tables.anatomy,
            options: &self.options.heuristics,
        };
        heuristics.eyes(&mut dest, &mut report)?;
        heuristics.head_top(&mut dest, &mut report)?;
        if self.options.face_mode == FaceMode::Basic {
            heuristics.jaw(&mut dest, &mut report)?;
        }
        heuristics.teeth(&mut dest, &mut report)?;

        progress.finish();
        log::info!("retarget finished: {}", report.summary());
        Ok(Retarget { skeleton: dest, report })
    }
}
