//! Error types for visualization configuration.

use thiserror::Error;

/// Errors from visualization helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisualError {
    /// Not a `#rrggbb` string.
    #[error("invalid color {0:?}: expected #rrggbb")]
    InvalidColor(String),
}

/// Result type for visualization helpers.
pub type Result<T> = std::result::Result<T, VisualError>;
