#![warn(missing_docs)]

//! Display configuration for section contours.
//!
//! Turns a set of section segments plus caller overrides into the plain
//! [`VisualizationConfig`] a renderer needs to style the contour lines.
//! Everything here is stateless and linear in the number of segments.
//!
//! # Example
//!
//! ```ignore
//! use sonoslice_visual::{SectionVisualizationService, VisualizationOptions};
//!
//! let options = VisualizationOptions {
//!     opacity: Some(0.8),
//!     highlight: true,
//!     ..Default::default()
//! };
//! let config = SectionVisualizationService.get_visualization_config(&result.lines, &options);
//! renderer.set_line_style(config.line_width, config.rgba());
//! ```

pub mod color;
pub mod error;

pub use color::{is_hex_color, Rgb};
pub use error::{Result, VisualError};

use serde::{Deserialize, Serialize};
use sonoslice_math::Vector3;

/// Contour colour when none is given.
pub const DEFAULT_COLOR: &str = "#00ff00";

/// Contour colour when highlighted without a valid highlight colour.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#ffff00";

/// Line width when none is given.
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Minimum line width of a highlighted contour.
pub const HIGHLIGHT_MIN_LINE_WIDTH: f64 = 3.0;

/// Caller overrides for the contour style. Unset fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationOptions {
    /// Line colour, `#rrggbb`. Anything else is ignored.
    pub color: Option<String>,
    /// Line width; negative values clamp to 0, non-finite values are ignored.
    pub line_width: Option<f64>,
    /// Opacity; clamped to `[0, 1]`.
    pub opacity: Option<f64>,
    /// Draw the contour emphasized.
    pub highlight: bool,
    /// Colour used when `highlight` is set, `#rrggbb`.
    pub highlight_color: Option<String>,
}

/// Line material settings for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationConfig {
    /// Whether there is anything to draw.
    pub visible: bool,
    /// Line width, `>= 0`.
    pub line_width: f64,
    /// Line colour, `#rrggbb`.
    pub color: String,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Whether the contour is highlighted.
    pub highlight: bool,
}

impl VisualizationConfig {
    /// The configuration for a contour with nothing to draw.
    pub fn hidden() -> Self {
        Self {
            visible: false,
            line_width: 0.0,
            ..Self::default()
        }
    }

    /// Colour and opacity as linear `[r, g, b, a]` in `[0, 1]`.
    ///
    /// Falls back to the default colour if `color` was edited into an
    /// invalid string after construction.
    pub fn rgba(&self) -> [f32; 4] {
        let rgb = Rgb::from_hex(&self.color)
            .or_else(|_| Rgb::from_hex(DEFAULT_COLOR))
            .map(|c| c.to_unit())
            .unwrap_or([0.0, 1.0, 0.0]);
        [rgb[0], rgb[1], rgb[2], self.opacity as f32]
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            visible: true,
            line_width: DEFAULT_LINE_WIDTH,
            color: DEFAULT_COLOR.to_owned(),
            opacity: 1.0,
            highlight: false,
        }
    }
}

/// True if `points` is a drawable segment: exactly two finite points.
pub fn is_valid_line(points: &[Vector3]) -> bool {
    points.len() == 2 && points.iter().all(Vector3::is_finite)
}

/// Number of drawable segments in `lines`.
pub fn valid_line_count<L: AsRef<[Vector3]>>(lines: &[L]) -> usize {
    lines.iter().filter(|l| is_valid_line((*l).as_ref())).count()
}

/// Flat `x, y, z` vertex buffer with two vertices per drawable segment,
/// ready for a line-list draw call. Malformed entries are skipped.
pub fn line_vertex_buffer<L: AsRef<[Vector3]>>(lines: &[L]) -> Vec<f32> {
    let mut buffer = Vec::with_capacity(lines.len() * 6);
    for line in lines.iter().map(|l| l.as_ref()).filter(|l| is_valid_line(l)) {
        for p in line {
            buffer.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        }
    }
    buffer
}

/// Derives contour display settings from section segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionVisualizationService;

impl SectionVisualizationService {
    /// Build the display configuration for `lines`.
    ///
    /// Returns [`VisualizationConfig::hidden`] when no entry of `lines` is a
    /// drawable segment. Otherwise applies `options` on top of the defaults:
    /// colours only if they are `#rrggbb`, the width clamped to `>= 0`, the
    /// opacity clamped to `[0, 1]`. Highlighting raises the width to at least
    /// [`HIGHLIGHT_MIN_LINE_WIDTH`] and switches to the highlight colour.
    pub fn get_visualization_config<L: AsRef<[Vector3]>>(
        &self,
        lines: &[L],
        options: &VisualizationOptions,
    ) -> VisualizationConfig {
        if lines.is_empty() {
            return VisualizationConfig::hidden();
        }
        let valid = valid_line_count(lines);
        if valid == 0 {
            log::debug!("no drawable segments among {} lines", lines.len());
            return VisualizationConfig::hidden();
        }
        if valid < lines.len() {
            log::debug!("skipped {} malformed segments", lines.len() - valid);
        }

        let mut config = VisualizationConfig::default();

        if let Some(color) = options.color.as_deref() {
            if is_hex_color(color) {
                config.color = color.to_owned();
            } else {
                log::warn!("ignoring invalid contour color {color:?}");
            }
        }
        if let Some(width) = options.line_width.filter(|w| w.is_finite()) {
            config.line_width = width.max(0.0);
        }
        if let Some(opacity) = options.opacity.filter(|o| !o.is_nan()) {
            config.opacity = opacity.clamp(0.0, 1.0);
        }

        if options.highlight {
            config.highlight = true;
            config.line_width = config.line_width.max(HIGHLIGHT_MIN_LINE_WIDTH);
            config.color = match options.highlight_color.as_deref() {
                Some(c) if is_hex_color(c) => c.to_owned(),
                _ => DEFAULT_HIGHLIGHT_COLOR.to_owned(),
            };
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sonoslice_section::Segment;

    fn segments(n: usize) -> Vec<Segment> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                Segment::new(Vector3::new(x, 0.0, 0.0), Vector3::new(x + 1.0, 0.0, 0.0))
            })
            .collect()
    }

    fn config(lines: &[Segment], options: VisualizationOptions) -> VisualizationConfig {
        SectionVisualizationService.get_visualization_config(lines, &options)
    }

    #[test]
    fn test_empty_lines_hidden() {
        let c = config(&[], VisualizationOptions::default());
        assert!(!c.visible);
        assert_eq!(c.line_width, 0.0);
        assert_eq!(c.color, DEFAULT_COLOR);
    }

    #[test]
    fn test_defaults() {
        let c = config(&segments(3), VisualizationOptions::default());
        assert_eq!(c, VisualizationConfig::default());
        assert!(c.visible);
        assert_eq!(c.line_width, 2.0);
        assert_eq!(c.color, "#00ff00");
        assert_eq!(c.opacity, 1.0);
        assert!(!c.highlight);
    }

    #[test]
    fn test_malformed_lines_filtered() {
        let lines: Vec<Vec<Vector3>> = vec![
            vec![Vector3::zero()],
            vec![Vector3::zero(), Vector3::x_axis(), Vector3::y_axis()],
            vec![Vector3::new(f64::NAN, 0.0, 0.0), Vector3::x_axis()],
        ];
        let svc = SectionVisualizationService;
        let c = svc.get_visualization_config(&lines, &VisualizationOptions::default());
        assert!(!c.visible);
        assert_eq!(c.line_width, 0.0);

        let mut mixed = lines;
        mixed.push(vec![Vector3::zero(), Vector3::z_axis()]);
        assert_eq!(valid_line_count(&mixed), 1);
        let c = svc.get_visualization_config(&mixed, &VisualizationOptions::default());
        assert!(c.visible);
    }

    #[test]
    fn test_opacity_clamped() {
        let c = config(
            &segments(1),
            VisualizationOptions {
                opacity: Some(1.5),
                ..Default::default()
            },
        );
        assert_eq!(c.opacity, 1.0);
        let c = config(
            &segments(1),
            VisualizationOptions {
                opacity: Some(-0.5),
                ..Default::default()
            },
        );
        assert_eq!(c.opacity, 0.0);
        let c = config(
            &segments(1),
            VisualizationOptions {
                opacity: Some(f64::NAN),
                ..Default::default()
            },
        );
        assert_eq!(c.opacity, 1.0);
    }

    #[test]
    fn test_line_width_clamped() {
        let c = config(
            &segments(1),
            VisualizationOptions {
                line_width: Some(-4.0),
                ..Default::default()
            },
        );
        assert_eq!(c.line_width, 0.0);
        let c = config(
            &segments(1),
            VisualizationOptions {
                line_width: Some(5.5),
                ..Default::default()
            },
        );
        assert_eq!(c.line_width, 5.5);
    }

    #[test]
    fn test_color_validation() {
        let c = config(
            &segments(1),
            VisualizationOptions {
                color: Some("#ff00aa".into()),
                ..Default::default()
            },
        );
        assert_eq!(c.color, "#ff00aa");
        let c = config(
            &segments(1),
            VisualizationOptions {
                color: Some("magenta".into()),
                ..Default::default()
            },
        );
        assert_eq!(c.color, DEFAULT_COLOR);
    }

    #[test]
    fn test_highlight() {
        let c = config(
            &segments(2),
            VisualizationOptions {
                highlight: true,
                line_width: Some(1.0),
                color: Some("#123456".into()),
                ..Default::default()
            },
        );
        assert!(c.highlight);
        assert_eq!(c.line_width, 3.0);
        assert_eq!(c.color, DEFAULT_HIGHLIGHT_COLOR);

        let c = config(
            &segments(2),
            VisualizationOptions {
                highlight: true,
                line_width: Some(6.0),
                highlight_color: Some("#ff0000".into()),
                ..Default::default()
            },
        );
        assert_eq!(c.line_width, 6.0);
        assert_eq!(c.color, "#ff0000");

        let c = config(
            &segments(2),
            VisualizationOptions {
                highlight: true,
                highlight_color: Some("#ff00".into()),
                ..Default::default()
            },
        );
        assert_eq!(c.color, DEFAULT_HIGHLIGHT_COLOR);
    }

    #[test]
    fn test_options_from_json() {
        let options: VisualizationOptions =
            serde_json::from_str(r##"{"color": "#0000ff", "opacity": 0.25}"##).unwrap();
        let c = config(&segments(1), options);
        assert_eq!(c.color, "#0000ff");
        assert_relative_eq!(c.opacity, 0.25);
        assert_eq!(c.line_width, DEFAULT_LINE_WIDTH);
    }

    #[test]
    fn test_rgba() {
        let mut c = VisualizationConfig {
            color: "#ff0000".into(),
            opacity: 0.5,
            ..Default::default()
        };
        assert_eq!(c.rgba(), [1.0, 0.0, 0.0, 0.5]);
        c.color = "bogus".into();
        assert_eq!(c.rgba(), [0.0, 1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_line_vertex_buffer() {
        let mut lines: Vec<Vec<Vector3>> = segments(2)
            .iter()
            .map(|s| s.as_ref().to_vec())
            .collect();
        lines.push(vec![Vector3::zero()]);
        let buffer = line_vertex_buffer(&lines);
        assert_eq!(buffer.len(), 12);
        assert_eq!(&buffer[..6], &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_large_input_is_linear() {
        let lines = segments(10_000);
        let start = std::time::Instant::now();
        let c = config(&lines, VisualizationOptions::default());
        assert!(c.visible);
        assert!(start.elapsed().as_millis() < 50);
    }
}
