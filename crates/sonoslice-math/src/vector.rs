//! Three-component vector used for mesh vertices, probe poses and section points.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::DEFAULT_TOLERANCE;

/// A 3D vector or point.
///
/// We use a plain struct instead of `nalgebra::Vector3` so results can be
/// serialized without enabling nalgebra's serde feature. Conversions to and
/// from nalgebra types are provided for callers that already work in nalgebra.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vector3 {
    /// The zero vector.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub const fn zero() -> Self {
        Self::ZERO
    }

    /// Unit X axis.
    pub const fn x_axis() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Unit Y axis.
    pub const fn y_axis() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Unit Z axis.
    pub const fn z_axis() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Squared Euclidean length.
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Unit vector in the same direction.
    ///
    /// The zero vector normalizes to itself.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return Self::ZERO;
        }
        self.multiply_scalar(1.0 / len)
    }

    /// Dot product.
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Component-wise sum. Same as the `+` operator, by reference.
    #[allow(clippy::should_implement_trait)]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Component-wise difference `self - other`.
    pub fn subtract(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Scale every component by `s`.
    pub fn multiply_scalar(&self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Component-wise comparison within `tolerance`.
    pub fn equals(&self, other: &Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance
            && (self.y - other.y).abs() < tolerance
            && (self.z - other.z).abs() < tolerance
    }

    /// [`equals`](Self::equals) with [`DEFAULT_TOLERANCE`].
    pub fn approx_eq(&self, other: &Self) -> bool {
        self.equals(other, DEFAULT_TOLERANCE)
    }

    /// Distance between two points.
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.subtract(other).length()
    }

    /// Linear interpolation: `self + t * (other - self)`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        self.add(&other.subtract(self).multiply_scalar(t))
    }

    /// True if no component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Components as an array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::add(&self, &rhs)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        self.subtract(&rhs)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f64) -> Vector3 {
        self.multiply_scalar(rhs)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        self.multiply_scalar(-1.0)
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Vector3> for [f64; 3] {
    fn from(v: Vector3) -> Self {
        v.to_array()
    }
}

impl From<crate::Vec3> for Vector3 {
    fn from(v: crate::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for crate::Vec3 {
    fn from(v: Vector3) -> Self {
        crate::Vec3::new(v.x, v.y, v.z)
    }
}

impl From<crate::Point3> for Vector3 {
    fn from(p: crate::Point3) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

impl From<Vector3> for crate::Point3 {
    fn from(v: Vector3) -> Self {
        crate::Point3::new(v.x, v.y, v.z)
    }
}
