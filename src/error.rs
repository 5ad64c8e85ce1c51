//! Error types for metarig.
//!
//! This module defines the fatal error type used throughout the library.
//! Recoverable per-entry conditions met during a retarget pass are not errors;
//! see [`RetargetWarning`](crate::retarget::RetargetWarning).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`RigError`].
pub type Result<T> = std::result::Result<T, RigError>;

/// Errors that can occur while building skeletons, surfaces or running a retarget.
#[derive(Error, Debug)]
pub enum RigError {
    /// The destination template has no joints.
    #[error("destination template is missing or has no joints")]
    MissingTemplate,

    /// The source skeleton has no joints.
    #[error("source skeleton is missing or has no joints")]
    MissingSource,

    /// A joint name was added twice to the same skeleton.
    #[error("duplicate joint name: {name}")]
    DuplicateJoint {
        /// The repeated name.
        name: String,
    },

    /// A joint references a parent that does not exist.
    #[error("joint {joint} references unknown parent {parent}")]
    UnknownParent {
        /// The child joint.
        joint: String,
        /// The missing parent name.
        parent: String,
    },

    /// A named joint is not present in the skeleton.
    #[error("no joint named {name}")]
    UnknownJoint {
        /// The requested name.
        name: String,
    },

    /// A joint position would become NaN or infinite.
    #[error("non-finite {attribute} for joint {joint}")]
    NonFinite {
        /// The joint name.
        joint: String,
        /// Which attribute was rejected (`head`, `tail` or `roll`).
        attribute: &'static str,
    },

    /// A polygon references an invalid vertex index.
    #[error("polygon {polygon} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The polygon index.
        polygon: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A polygon's UV list does not match its vertex list.
    #[error("polygon {polygon} has {uvs} UVs for {vertices} vertices")]
    UvCountMismatch {
        /// The polygon index.
        polygon: usize,
        /// Number of UVs supplied.
        uvs: usize,
        /// Number of vertices in the polygon.
        vertices: usize,
    },

    /// A mapping table entry could not be parsed.
    #[error("invalid table entry for {joint}: {reason}")]
    InvalidTable {
        /// The destination joint of the entry.
        joint: String,
        /// What is wrong with it.
        reason: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error loading data from a file.
    #[error("failed to load {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl RigError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        RigError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create an invalid table entry error.
    pub fn invalid_table(joint: impl Into<String>, reason: impl Into<String>) -> Self {
        RigError::InvalidTable {
            joint: joint.into(),
            reason: reason.into(),
        }
    }
}
