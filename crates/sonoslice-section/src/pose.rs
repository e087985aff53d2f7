//! Probe pose: the position and view direction that define the cutting plane.

use serde::{Deserialize, Serialize};
use sonoslice_math::{Matrix4, Plane, Vector3};

use crate::error::{Result, SectionError};

/// Position and imaging-plane normal of the ultrasound probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbePose {
    /// A point on the imaging plane.
    pub position: Vector3,
    /// Imaging-plane normal. Need not be unit length.
    pub direction: Vector3,
}

impl ProbePose {
    /// Create a pose.
    pub fn new(position: Vector3, direction: Vector3) -> Self {
        Self {
            position,
            direction,
        }
    }

    /// True if every component of position and direction is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.direction.is_finite()
    }

    /// Check that the pose can define a cutting plane.
    pub fn validate(&self) -> Result<()> {
        if !self.is_finite() || self.direction.length() == 0.0 {
            return Err(SectionError::InvalidPose);
        }
        Ok(())
    }

    /// The cutting plane through `position` with normal `direction`.
    pub fn plane(&self) -> Result<Plane> {
        self.validate()?;
        Ok(Plane::from_point_and_normal(self.position, self.direction)?)
    }

    /// Map the pose through `transform`, e.g. from tracker space into mesh space.
    ///
    /// The position moves as a point and the direction as a vector. The
    /// direction is re-normalized so non-uniform scales do not leak into it.
    pub fn transformed(&self, transform: &Matrix4) -> Self {
        Self {
            position: transform.transform_vector(&self.position),
            direction: transform.transform_direction(&self.direction).normalize(),
        }
    }
}
