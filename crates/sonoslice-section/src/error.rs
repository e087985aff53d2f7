//! Error types for section computation.

use sonoslice_math::MathError;
use thiserror::Error;

/// Errors that can occur while computing sections.
///
/// `InvalidPose` and `EmptyMesh` are per-frame data problems: the update
/// service reports them through [`IntersectionResult::error`](crate::IntersectionResult)
/// instead of returning them. The remaining variants come back as `Err` from
/// constructors and validators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SectionError {
    /// Probe position or direction is non-finite or has no direction.
    #[error("invalid probe pose")]
    InvalidPose,

    /// Mesh has no triangles.
    #[error("empty mesh")]
    EmptyMesh,

    /// Mesh buffers are malformed.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Invalid update settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A geometric primitive could not be built.
    #[error(transparent)]
    Geometry(#[from] MathError),
}

/// Result type for section operations.
pub type Result<T> = std::result::Result<T, SectionError>;
