#![warn(missing_docs)]

//! Real-time cutting-plane sections for ultrasound probe visualization.
//!
//! This crate intersects the probe's imaging plane with a triangulated
//! anatomical surface and returns the contour as independent line segments.
//! Results are cached per quantized pose so that a probe held still, or
//! jittering by less than the cache precision, costs a hash lookup.
//!
//! # Example
//!
//! ```ignore
//! use sonoslice_section::{RealTimeUpdateService, TriangleMesh};
//! use sonoslice_math::Vector3;
//!
//! let mesh: TriangleMesh = // ... from the loader
//! let mut service = RealTimeUpdateService::default();
//! let result = service.update_section(
//!     Vector3::new(0.0, 0.0, 12.5),
//!     Vector3::z_axis(),
//!     &mesh,
//! );
//!
//! println!("segments: {}", result.lines.len());
//! println!("took {:.2} ms (cached: {})", result.calculation_time_ms, result.from_cache);
//! ```

pub mod cache;
pub mod error;
pub mod intersect;
pub mod mesh;
pub mod pose;
pub mod shared;
pub mod update;

pub use cache::{EvictionPolicy, PoseKey, SectionCache};
pub use error::{Result, SectionError};
pub use intersect::{
    classify_triangle, intersect_triangle, intersects_plane, Segment, TriangleIntersection,
    TriangleSide,
};
pub use mesh::{Aabb, Triangle, TriangleMesh};
pub use pose::ProbePose;
pub use shared::SharedUpdateService;
pub use update::{PerformanceStats, RealTimeUpdateService};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sonoslice_math::DEFAULT_TOLERANCE;

/// Largest supported cache precision, in decimal digits.
pub const MAX_CACHE_PRECISION: u32 = 12;

/// Parameters for [`RealTimeUpdateService`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    /// On-plane tolerance for vertex classification.
    pub tolerance: f64,
    /// Decimal digits kept when quantizing poses into cache keys.
    pub cache_precision: u32,
    /// Maximum number of cached poses. Zero disables caching.
    pub cache_size_limit: usize,
    /// What happens when the cache is full.
    pub eviction: EvictionPolicy,
    /// Test triangles that were cut on the previous frame first.
    pub temporal_coherence: bool,
    /// Skip all triangle work when the plane misses the mesh bounding box.
    pub bounds_culling: bool,
    /// Cache misses slower than this (ms) are logged as warnings.
    pub latency_budget_ms: f64,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            cache_precision: 4,
            cache_size_limit: 128,
            eviction: EvictionPolicy::Lru,
            temporal_coherence: true,
            bounds_culling: true,
            latency_budget_ms: 100.0,
        }
    }
}

impl UpdateSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(SectionError::InvalidSettings(
                "tolerance must be positive and finite".into(),
            ));
        }
        if self.cache_precision > MAX_CACHE_PRECISION {
            return Err(SectionError::InvalidSettings(format!(
                "cache_precision must be at most {MAX_CACHE_PRECISION}"
            )));
        }
        if !self.latency_budget_ms.is_finite() || self.latency_budget_ms <= 0.0 {
            return Err(SectionError::InvalidSettings(
                "latency_budget_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Section contour for one probe pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionResult {
    /// One segment per cut triangle, in mesh order. Shared with the cache.
    pub lines: Arc<[Segment]>,
    /// True if at least one segment was found.
    pub is_valid: bool,
    /// Wall-clock computation time in milliseconds (0 for cache hits).
    pub calculation_time_ms: f64,
    /// True if served from the pose cache.
    pub from_cache: bool,
    /// Why the pose or mesh was rejected, if it was.
    pub error: Option<String>,
}

impl IntersectionResult {
    /// A result computed from scratch.
    pub fn computed(lines: Vec<Segment>, calculation_time_ms: f64) -> Self {
        Self {
            is_valid: !lines.is_empty(),
            lines: lines.into(),
            calculation_time_ms,
            from_cache: false,
            error: None,
        }
    }

    /// An invalid result carrying an error message.
    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            lines: Vec::new().into(),
            is_valid: false,
            calculation_time_ms: 0.0,
            from_cache: false,
            error: Some(error.into()),
        }
    }

    /// An invalid result for a rejected pose or mesh.
    pub fn from_error(err: &SectionError) -> Self {
        Self::invalid(err.to_string())
    }

    /// This result as served from the cache. The segments are shared, not
    /// copied.
    pub fn cached(&self) -> Self {
        Self {
            lines: Arc::clone(&self.lines),
            is_valid: self.is_valid,
            calculation_time_ms: 0.0,
            from_cache: true,
            error: self.error.clone(),
        }
    }
}
