//! Oriented planes in Hessian normal form.

use serde::{Deserialize, Serialize};

use crate::error::{MathError, Result};
use crate::vector::Vector3;
use crate::DEFAULT_TOLERANCE;

/// A plane `normal · p + constant = 0` with a unit-length normal.
///
/// `constant` is the signed distance of the plane from the origin, measured
/// against the normal. Planes are immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Plane {
    normal: Vector3,
    constant: f64,
}

/// An infinite line, as produced by [`Plane::intersect_plane`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    /// A point on the line.
    pub point: Vector3,
    /// Unit direction.
    pub direction: Vector3,
}

impl Line3 {
    /// Point at parameter `t` along the line.
    pub fn at(&self, t: f64) -> Vector3 {
        self.point + self.direction * t
    }
}

impl Plane {
    /// Build a plane from a normal and constant. The normal is normalized.
    pub fn new(normal: Vector3, constant: f64) -> Result<Self> {
        if !normal.is_finite() || !constant.is_finite() {
            return Err(MathError::InvalidGeometry(
                "plane normal and constant must be finite".into(),
            ));
        }
        if normal.length() == 0.0 {
            return Err(MathError::InvalidGeometry(
                "plane normal has zero length".into(),
            ));
        }
        Ok(Self {
            normal: normal.normalize(),
            constant,
        })
    }

    /// Plane through `point` with the given normal.
    pub fn from_point_and_normal(point: Vector3, normal: Vector3) -> Result<Self> {
        let n = normal.normalize();
        Self::new(n, -n.dot(&point))
    }

    /// Plane through three points, oriented by `(p2 - p1) × (p3 - p1)`.
    ///
    /// Collinear or coincident points fail with [`MathError::InvalidGeometry`].
    pub fn from_points(p1: Vector3, p2: Vector3, p3: Vector3) -> Result<Self> {
        let normal = (p2 - p1).cross(&(p3 - p1));
        if normal.length() < DEFAULT_TOLERANCE {
            return Err(MathError::InvalidGeometry(
                "plane points are collinear".into(),
            ));
        }
        Self::from_point_and_normal(p1, normal)
    }

    /// Unit normal.
    pub fn normal(&self) -> Vector3 {
        self.normal
    }

    /// Signed distance of the plane from the origin.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Signed distance from `p` to the plane; positive on the normal side.
    pub fn distance_to_point(&self, p: &Vector3) -> f64 {
        self.normal.dot(p) + self.constant
    }

    /// Orthogonal projection of `p` onto the plane.
    pub fn project_point(&self, p: &Vector3) -> Vector3 {
        *p - self.normal * self.distance_to_point(p)
    }

    /// True if `p` lies on the plane within [`DEFAULT_TOLERANCE`].
    pub fn contains_point(&self, p: &Vector3) -> bool {
        self.contains_point_with_tolerance(p, DEFAULT_TOLERANCE)
    }

    /// True if `|distance_to_point(p)| < tolerance`.
    pub fn contains_point_with_tolerance(&self, p: &Vector3, tolerance: f64) -> bool {
        self.distance_to_point(p).abs() < tolerance
    }

    /// The same plane with the opposite orientation.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            constant: -self.constant,
        }
    }

    /// Line where this plane meets `other`.
    ///
    /// Returns `None` for parallel or coincident planes. The point on the line
    /// is found by solving both plane equations together with a third plane
    /// through the origin orthogonal to the line, using Cramer's rule.
    pub fn intersect_plane(&self, other: &Plane) -> Option<Line3> {
        let n1 = self.normal;
        let n2 = other.normal;
        let n3 = n1.cross(&n2);
        if n3.length() < DEFAULT_TOLERANCE {
            return None;
        }

        let det = det3(&n1, &n2, &n3);
        if det.abs() < DEFAULT_TOLERANCE {
            return None;
        }

        // Rows n1, n2, n3; right-hand side (-c1, -c2, 0).
        let b = Vector3::new(-self.constant, -other.constant, 0.0);
        let col = |i: usize| {
            let pick = |row: &Vector3, rhs: f64| {
                let mut r = row.to_array();
                r[i] = rhs;
                Vector3::from(r)
            };
            det3(&pick(&n1, b.x), &pick(&n2, b.y), &pick(&n3, b.z)) / det
        };

        Some(Line3 {
            point: Vector3::new(col(0), col(1), col(2)),
            direction: n3.normalize(),
        })
    }
}

/// Determinant of the 3×3 matrix with rows `a`, `b`, `c`.
fn det3(a: &Vector3, b: &Vector3, c: &Vector3) -> f64 {
    a.dot(&b.cross(c))
}

impl<'de> Deserialize<'de> for Plane {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            normal: Vector3,
            constant: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Plane::new(raw.normal, raw.constant).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_normal_is_rejected() {
        let err = Plane::new(Vector3::zero(), 0.0).unwrap_err();
        assert!(matches!(err, MathError::InvalidGeometry(_)));
    }

    #[test]
    fn test_normal_is_normalized() {
        let plane = Plane::new(Vector3::new(0.0, 0.0, 5.0), -2.0).unwrap();
        assert_relative_eq!(plane.normal().length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.constant(), -2.0);
    }

    #[test]
    fn test_from_point_and_normal() {
        let plane =
            Plane::from_point_and_normal(Vector3::new(0.0, 0.0, 2.0), Vector3::z_axis()).unwrap();
        assert_relative_eq!(plane.constant(), -2.0);
        assert!(plane.contains_point(&Vector3::new(7.0, -3.0, 2.0)));
        assert_relative_eq!(plane.distance_to_point(&Vector3::zero()), -2.0);
    }

    #[test]
    fn test_from_points() {
        let plane = Plane::from_points(
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert!(plane.normal().approx_eq(&Vector3::z_axis()));
        assert_relative_eq!(plane.constant(), -1.0);
    }

    #[test]
    fn test_from_collinear_points_fails() {
        let res = Plane::from_points(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(2.0, 2.0, 2.0),
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_distance_sign_changes_across_plane() {
        let normals = [
            Vector3::x_axis(),
            Vector3::new(1.0, 1.0, 0.0).normalize(),
            Vector3::new(-0.3, 0.5, 0.8).normalize(),
        ];
        for n in normals {
            for d in [-3.0, 0.0, 1.5] {
                let plane = Plane::new(n, d).unwrap();
                let on = plane.project_point(&Vector3::new(0.2, -0.7, 1.1));
                let above = on + n * 0.5;
                let below = on - n * 0.5;
                assert!(plane.distance_to_point(&above) > 0.0);
                assert!(plane.distance_to_point(&below) < 0.0);
                assert_relative_eq!(plane.distance_to_point(&above), 0.5, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_project_point_lands_on_plane() {
        let plane = Plane::new(Vector3::new(1.0, 2.0, 2.0), 3.0).unwrap();
        let p = plane.project_point(&Vector3::new(4.0, -1.0, 7.0));
        assert!(plane.contains_point_with_tolerance(&p, 1e-9));
    }

    #[test]
    fn test_flipped() {
        let plane = Plane::new(Vector3::z_axis(), -1.0).unwrap();
        let p = Vector3::new(0.0, 0.0, 3.0);
        assert_relative_eq!(
            plane.flipped().distance_to_point(&p),
            -plane.distance_to_point(&p)
        );
    }

    #[test]
    fn test_intersect_plane() {
        // z = 1 and x = 2 meet along the line (2, t, 1).
        let a = Plane::from_point_and_normal(Vector3::new(0.0, 0.0, 1.0), Vector3::z_axis())
            .unwrap();
        let b = Plane::from_point_and_normal(Vector3::new(2.0, 0.0, 0.0), Vector3::x_axis())
            .unwrap();
        let line = a.intersect_plane(&b).unwrap();
        assert!(line.direction.normalize().approx_eq(&line.direction));
        assert_relative_eq!(line.direction.y.abs(), 1.0, epsilon = 1e-12);
        for t in [-5.0, 0.0, 3.0] {
            let p = line.at(t);
            assert!(a.contains_point_with_tolerance(&p, 1e-9));
            assert!(b.contains_point_with_tolerance(&p, 1e-9));
        }
    }

    #[test]
    fn test_parallel_planes_do_not_intersect() {
        let a = Plane::new(Vector3::z_axis(), 0.0).unwrap();
        let b = Plane::new(Vector3::z_axis(), -4.0).unwrap();
        assert!(a.intersect_plane(&b).is_none());
        assert!(a.intersect_plane(&a.flipped()).is_none());
    }

    #[test]
    fn test_deserialize_validates_normal() {
        let ok: Plane =
            serde_json::from_str(r#"{"normal":{"x":0,"y":0,"z":2},"constant":1}"#).unwrap();
        assert!(ok.normal().approx_eq(&Vector3::z_axis()));
        let bad = serde_json::from_str::<Plane>(r#"{"normal":{"x":0,"y":0,"z":0},"constant":1}"#);
        assert!(bad.is_err());
    }
}
