#![warn(missing_docs)]

//! Cutting-plane section engine for ultrasound probe visualization.
//!
//! Provides [`SectionEngine`], which turns a tracked probe pose and a
//! triangulated anatomy mesh into the section contour together with the
//! line style to draw it with. The member crates are re-exported for callers
//! that need the individual pieces.
//!
//! # Example
//!
//! ```
//! use sonoslice::{phantom, SectionEngine, Vector3};
//!
//! let mesh = phantom::uv_sphere(Vector3::zero(), 10.0, 32, 64).unwrap();
//! let mut engine = SectionEngine::default();
//!
//! let frame = engine.update(Vector3::new(0.0, 0.0, 2.5), Vector3::z_axis(), &mesh);
//! assert!(frame.result.is_valid);
//! assert!(frame.visualization.visible);
//!
//! // Same pose again: served from the cache.
//! let again = engine.update(Vector3::new(0.0, 0.0, 2.5), Vector3::z_axis(), &mesh);
//! assert!(again.result.from_cache);
//! ```

pub mod phantom;

pub use sonoslice_math;
pub use sonoslice_section;
pub use sonoslice_visual;

pub use sonoslice_math::{Line3, MathError, Matrix4, Plane, Tolerance, Vector3, DEFAULT_TOLERANCE};
pub use sonoslice_section::{
    intersect_triangle, intersects_plane, EvictionPolicy, IntersectionResult, PerformanceStats,
    ProbePose, RealTimeUpdateService, SectionError, Segment, SharedUpdateService, Triangle,
    TriangleIntersection, TriangleMesh, UpdateSettings,
};
pub use sonoslice_visual::{
    line_vertex_buffer, Rgb, SectionVisualizationService, VisualError, VisualizationConfig,
    VisualizationOptions,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from engine construction and configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Update settings were rejected.
    #[error(transparent)]
    Section(#[from] SectionError),

    /// Visualization options were rejected.
    #[error(transparent)]
    Visual(#[from] VisualError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Full engine configuration.
///
/// Every field has a default, so a partial document such as
/// `{"update": {"cache_size_limit": 32}}` is accepted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Section computation and caching.
    pub update: UpdateSettings,
    /// Default contour style.
    pub visualization: VisualizationOptions,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate settings.
    ///
    /// Colours must be `#rrggbb`. The visualization service would silently
    /// fall back to its defaults for anything else, which hides typos in a
    /// config file.
    pub fn validate(&self) -> Result<()> {
        self.update.validate()?;
        let options = &self.visualization;
        for color in [&options.color, &options.highlight_color].into_iter().flatten() {
            Rgb::from_hex(color)?;
        }
        Ok(())
    }
}

/// One probe update: the contour and how to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionFrame {
    /// Section segments and timing.
    pub result: IntersectionResult,
    /// Line style for `result.lines`.
    pub visualization: VisualizationConfig,
}

impl SectionFrame {
    /// Line-list vertex buffer of the drawable segments.
    pub fn vertex_buffer(&self) -> Vec<f32> {
        line_vertex_buffer(&self.result.lines[..])
    }
}

/// Section computation and visualization behind a single call per probe pose.
#[derive(Debug, Clone, Default)]
pub struct SectionEngine {
    updates: RealTimeUpdateService,
    visuals: SectionVisualizationService,
    options: VisualizationOptions,
}

impl SectionEngine {
    /// Create an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            updates: RealTimeUpdateService::new(config.update)?,
            visuals: SectionVisualizationService,
            options: config.visualization,
        })
    }

    /// Create an engine from a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(EngineConfig::from_json(json)?)
    }

    /// Section the mesh with the probe plane at `position` facing `direction`.
    pub fn update(
        &mut self,
        position: Vector3,
        direction: Vector3,
        mesh: &TriangleMesh,
    ) -> SectionFrame {
        let result = self.updates.update_section(position, direction, mesh);
        self.frame(result)
    }

    /// Section the mesh with the plane of `pose`.
    pub fn update_for_pose(&mut self, pose: &ProbePose, mesh: &TriangleMesh) -> SectionFrame {
        let result = self.updates.update_section_for_pose(pose, mesh);
        self.frame(result)
    }

    /// Section the mesh with `pose` given in tracker space, mapped into mesh
    /// space by `tracker_to_mesh`.
    pub fn update_in_frame(
        &mut self,
        pose: &ProbePose,
        tracker_to_mesh: &Matrix4,
        mesh: &TriangleMesh,
    ) -> SectionFrame {
        let result = self
            .updates
            .update_section_in_frame(pose, tracker_to_mesh, mesh);
        self.frame(result)
    }

    fn frame(&self, result: IntersectionResult) -> SectionFrame {
        let visualization = self
            .visuals
            .get_visualization_config(&result.lines[..], &self.options);
        SectionFrame {
            result,
            visualization,
        }
    }

    /// Current contour style.
    pub fn visualization_options(&self) -> &VisualizationOptions {
        &self.options
    }

    /// Replace the contour style. Cached sections stay valid.
    pub fn set_visualization_options(&mut self, options: VisualizationOptions) {
        log::debug!("visualization options changed: {options:?}");
        self.options = options;
    }

    /// Toggle contour highlighting.
    pub fn set_highlight(&mut self, highlight: bool) {
        self.options.highlight = highlight;
    }

    /// The underlying update service.
    pub fn service(&self) -> &RealTimeUpdateService {
        &self.updates
    }

    /// Mutable access to the underlying update service.
    pub fn service_mut(&mut self) -> &mut RealTimeUpdateService {
        &mut self.updates
    }

    /// See [`RealTimeUpdateService::performance_stats`].
    pub fn performance_stats(&self) -> PerformanceStats {
        self.updates.performance_stats()
    }

    /// See [`RealTimeUpdateService::clear_cache`].
    pub fn clear_cache(&mut self) {
        self.updates.clear_cache();
    }
}
