//! Recoverable conditions met during a retarget pass.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// A per-entry problem. The affected attribute keeps its previous value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetargetWarning {
    /// A table names a source joint the source skeleton lacks.
    #[error("{joint}: source joint {source_joint} not found")]
    MissingSourceJoint {
        /// Destination joint.
        joint: String,
        /// Missing source joint.
        source_joint: String,
    },

    /// A table names a destination joint the template lacks.
    #[error("{joint}: not present in template")]
    MissingJoint {
        /// Destination joint.
        joint: String,
    },

    /// A relative entry references a joint the template lacks.
    #[error("{joint}: reference joint {reference} not found")]
    MissingReference {
        /// Destination joint.
        joint: String,
        /// Missing reference joint.
        reference: String,
    },

    /// A UV landmark could not be projected.
    #[error("{joint}: no surface point for {attribute} at uv ({u}, {v})")]
    ProjectionMiss {
        /// Destination joint.
        joint: String,
        /// `head` or `tail`.
        attribute: &'static str,
        /// Target u.
        u: f64,
        /// Target v.
        v: f64,
    },

    /// A connected chain ran out before its landmark targets did.
    #[error("{joint}: chain placed {mapped} of {targets} landmark targets")]
    ChainTruncated {
        /// First joint of the chain.
        joint: String,
        /// Targets written.
        mapped: usize,
        /// Targets declared.
        targets: usize,
    },

    /// A relative frame has a zero-width axis; that axis was passed through.
    #[error("{joint}: reference box is flat on axes {axes:?}")]
    DegenerateFrame {
        /// Destination joint.
        joint: String,
        /// Flat axes (0 = x, 1 = y, 2 = z).
        axes: Vec<usize>,
    },

    /// A computed value was NaN or infinite and was not written.
    #[error("{joint}: computed {attribute} is not finite")]
    NonFinite {
        /// Destination joint.
        joint: String,
        /// `head`, `tail` or `roll`.
        attribute: &'static str,
    },

    /// Full face mode was requested without a face surface.
    #[error("face landmarks skipped: no face surface supplied")]
    MissingFaceSurface,

    /// An anatomical heuristic could not run.
    #[error("{joint}: heuristic skipped ({reason})")]
    HeuristicSkipped {
        /// Destination joint.
        joint: String,
        /// Why.
        reason: String,
    },
}

impl RetargetWarning {
    /// Destination joint the warning is about, if any.
    pub fn joint(&self) -> Option<&str> {
        match self {
            RetargetWarning::MissingSourceJoint { joint, .. }
            | RetargetWarning::MissingJoint { joint }
            | RetargetWarning::MissingReference { joint, .. }
            | RetargetWarning::ProjectionMiss { joint, .. }
            | RetargetWarning::ChainTruncated { joint, .. }
            | RetargetWarning::DegenerateFrame { joint, .. }
            | RetargetWarning::NonFinite { joint, .. }
            | RetargetWarning::HeuristicSkipped { joint, .. } => Some(joint),
            RetargetWarning::MissingFaceSurface => None,
        }
    }

    /// Whether the joint ended up somewhere other than intended.
    ///
    /// A flat reference frame still places the joint consistently, so it is
    /// informational only.
    pub fn is_imprecise(&self) -> bool {
        !matches!(self, RetargetWarning::DegenerateFrame { .. })
    }
}

/// Warnings collected over one retarget pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetargetReport {
    /// Warnings in the order they were raised.
    pub warnings: Vec<RetargetWarning>,
    /// Names of the stages that ran.
    pub stages: Vec<&'static str>,
}

impl RetargetReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it.
    pub fn push(&mut self, warning: RetargetWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Whether every joint was mapped as declared.
    pub fn is_precise(&self) -> bool {
        !self.warnings.iter().any(RetargetWarning::is_imprecise)
    }

    /// Distinct joints that could not be mapped precisely, sorted.
    pub fn imprecise_joints(&self) -> Vec<&str> {
        let joints: BTreeSet<&str> = self
            .warnings
            .iter()
            .filter(|w| w.is_imprecise())
            .filter_map(RetargetWarning::joint)
            .collect();
        joints.into_iter().collect()
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        let n = self.imprecise_joints().len();
        if n == 0 && self.is_precise() {
            "all joints mapped".to_string()
        } else {
            format!("{} joints could not be mapped precisely ({} warnings)", n, self.warnings.len())
        }
    }
}

impl fmt::Display for RetargetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for warning in &self.warnings {
            writeln!(f, "  {}", warning)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_distinct_joints() {
        let mut report = RetargetReport::new();
        assert!(report.is_precise());
        assert_eq!(report.summary(), "all joints mapped");

        report.push(RetargetWarning::ProjectionMiss {
            joint: "nose".into(),
            attribute: "head",
            u: 0.5,
            v: 0.6,
        });
        report.push(RetargetWarning::ProjectionMiss {
            joint: "nose".into(),
            attribute: "tail",
            u: 0.5,
            v: 0.5,
        });
        report.push(RetargetWarning::MissingJoint { joint: "ear.L".into() });
        report.push(RetargetWarning::DegenerateFrame {
            joint: "heel.02.L".into(),
            axes: vec![2],
        });

        assert!(!report.is_precise());
        assert_eq!(report.imprecise_joints(), vec!["ear.L", "nose"]);
        assert_eq!(report.summary(), "2 joints could not be mapped precisely (4 warnings)");
    }

    #[test]
    fn test_flat_frame_only_is_precise() {
        let mut report = RetargetReport::new();
        report.push(RetargetWarning::DegenerateFrame {
            joint: "face".into(),
            axes: vec![0, 1],
        });
        assert!(report.is_precise());
        assert!(report.imprecise_joints().is_empty());
    }

    #[test]
    fn test_warning_display() {
        let w = RetargetWarning::MissingSourceJoint {
            joint: "spine.003".into(),
            source_joint: "neck_twist_01".into(),
        };
        assert_eq!(w.to_string(), "spine.003: source joint neck_twist_01 not found");
        assert_eq!(w.joint(), Some("spine.003"));
        assert_eq!(RetargetWarning::MissingFaceSurface.joint(), None);
    }
}
