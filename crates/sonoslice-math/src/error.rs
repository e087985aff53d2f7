//! Error types for geometric primitives.

use thiserror::Error;

/// Errors raised while constructing geometric primitives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// The input cannot define the requested primitive
    /// (zero-length normal, collinear points, non-finite values).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type for primitive construction.
pub type Result<T> = std::result::Result<T, MathError>;
