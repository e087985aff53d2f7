#![warn(missing_docs)]

//! Geometric primitives for the sonoslice section engine.
//!
//! Provides the value types the cutting-plane pipeline is built from:
//! [`Vector3`], [`Plane`] (with [`Line3`] for plane-plane intersection),
//! the [`Matrix4`] transform used to bring probe poses into mesh space,
//! and tolerance constants.

pub mod error;
pub mod matrix;
pub mod plane;
pub mod vector;

pub use error::{MathError, Result};
pub use matrix::Matrix4;
pub use plane::{Line3, Plane};
pub use vector::Vector3;

/// nalgebra point type, for interop with nalgebra-based callers.
pub type Point3 = nalgebra::Point3<f64>;

/// nalgebra vector type, for interop with nalgebra-based callers.
pub type Vec3 = nalgebra::Vector3<f64>;

/// Default tolerance for on-plane and equality tests.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Tolerance used for geometric comparisons.
///
/// Anatomical meshes are usually authored in millimetres while tracked probe
/// poses may arrive in metres, so the tolerance is carried explicitly rather
/// than hard-coded at each comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
}

impl Tolerance {
    /// The default tolerance (`1e-10`).
    pub const DEFAULT: Self = Self {
        linear: DEFAULT_TOLERANCE,
    };

    /// Tolerance with the given linear band.
    pub const fn new(linear: f64) -> Self {
        Self { linear }
    }

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Vector3, b: &Vector3) -> bool {
        a.equals(b, self.linear)
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
