//! Retarget configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};
use crate::surface::ProjectOptions;

/// How facial joints are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceMode {
    /// Project UV landmarks onto the face surface.
    #[default]
    Full,
    /// Skip landmarks; place the jaw from the source skeleton only.
    Basic,
}

/// Constants of the anatomical heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicOptions {
    /// Destination eye length as a multiple of the source eye bone.
    pub eye_length_scale: f64,

    /// Head bone length as a multiple of the head-to-eye height.
    pub head_top_scale: f64,

    /// Teeth length as a fraction of the jaw length.
    pub teeth_fraction: f64,

    /// Jaw tail distance toward the chin reference, as a multiple of the
    /// jaw-to-reference distance (basic face mode).
    pub chin_scale: f64,
}

impl Default for HeuristicOptions {
    fn default() -> Self {
        Self {
            eye_length_scale: 2.0,
            head_top_scale: 2.2,
            teeth_fraction: 0.5,
            chin_scale: 1.25,
        }
    }
}

/// Options for a retarget pass.
///
/// # Example
///
/// ```
/// use metarig::retarget::{FaceMode, RetargetOptions};
///
/// let options = RetargetOptions::default()
///     .with_face_mode(FaceMode::Basic)
///     .with_relative_padding(0.05);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetOptions {
    /// Facial placement mode.
    pub face_mode: FaceMode,

    /// Padding added on every side of a relative-position frame.
    pub relative_padding: f64,

    /// UV projection settings.
    pub projection: ProjectOptions,

    /// Anatomical heuristic constants.
    pub heuristics: HeuristicOptions,
}

impl Default for RetargetOptions {
    fn default() -> Self {
        Self {
            face_mode: FaceMode::Full,
            relative_padding: 0.1,
            projection: ProjectOptions::default(),
            heuristics: HeuristicOptions::default(),
        }
    }
}

impl RetargetOptions {
    /// Set the face mode.
    pub fn with_face_mode(mut self, face_mode: FaceMode) -> Self {
        self.face_mode = face_mode;
        self
    }

    /// Set the relative frame padding.
    pub fn with_relative_padding(mut self, padding: f64) -> Self {
        self.relative_padding = padding;
        self
    }

    /// Set the projection options.
    pub fn with_projection(mut self, projection: ProjectOptions) -> Self {
        self.projection = projection;
        self
    }

    /// Set the heuristic constants.
    pub fn with_heuristics(mut self, heuristics: HeuristicOptions) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Check that every numeric option is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.relative_padding.is_finite() && self.relative_padding >= 0.0) {
            return Err(RigError::invalid_param(
                "relative_padding",
                self.relative_padding,
                "must be finite and non-negative",
            ));
        }
        let p = &self.projection;
        for (name, value) in [
            ("projection.epsilon", p.epsilon),
            ("projection.threshold", p.threshold),
            ("projection.merge_distance", p.merge_distance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RigError::invalid_param(name, value, "must be finite and non-negative"));
            }
        }
        let h = &self.heuristics;
        for (name, value) in [
            ("heuristics.eye_length_scale", h.eye_length_scale),
            ("heuristics.head_top_scale", h.head_top_scale),
            ("heuristics.teeth_fraction", h.teeth_fraction),
            ("heuristics.chin_scale", h.chin_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RigError::invalid_param(name, value, "must be finite and positive"));
            }
        }
        Ok(())
    }
}
