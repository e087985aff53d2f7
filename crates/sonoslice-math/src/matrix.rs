//! 4x4 homogeneous transforms for moving probe poses between coordinate frames.

use nalgebra::{Matrix3, Vector4};

use crate::vector::Vector3;

/// Determinant magnitude below which a matrix is treated as singular.
const SINGULAR_EPSILON: f64 = 1e-10;

/// A 4x4 transform, indexed `(row, column)`.
///
/// Points are column vectors, so `a.multiply(&b)` applies `b` first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    /// The underlying 4x4 matrix.
    pub matrix: nalgebra::Matrix4<f64>,
}

impl Matrix4 {
    /// Identity matrix.
    pub fn identity() -> Self {
        Self {
            matrix: nalgebra::Matrix4::identity(),
        }
    }

    /// Build from row-major elements.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut m = nalgebra::Matrix4::zeros();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                m[(r, c)] = *value;
            }
        }
        Self { matrix: m }
    }

    /// Row-major elements.
    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.matrix[(r, c)];
            }
        }
        rows
    }

    /// Translation by `(x, y, z)`.
    pub fn make_translation(x: f64, y: f64, z: f64) -> Self {
        let mut m = nalgebra::Matrix4::identity();
        m[(0, 3)] = x;
        m[(1, 3)] = y;
        m[(2, 3)] = z;
        Self { matrix: m }
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn make_rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = nalgebra::Matrix4::identity();
        m[(1, 1)] = c;
        m[(1, 2)] = -s;
        m[(2, 1)] = s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn make_rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = nalgebra::Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 2)] = s;
        m[(2, 0)] = -s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn make_rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = nalgebra::Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(x, y, z)`.
    pub fn make_scale(x: f64, y: f64, z: f64) -> Self {
        let mut m = nalgebra::Matrix4::identity();
        m[(0, 0)] = x;
        m[(1, 1)] = y;
        m[(2, 2)] = z;
        Self { matrix: m }
    }

    /// Right-handed view matrix looking from `eye` toward `target`.
    ///
    /// Degenerate input (eye == target, or `up` parallel to the view axis)
    /// falls back to an alternative up vector rather than producing NaNs.
    pub fn make_look_at(eye: Vector3, target: Vector3, up: Vector3) -> Self {
        let mut z = (eye - target).normalize();
        if z.length() == 0.0 {
            z = Vector3::z_axis();
        }
        let mut x = up.cross(&z).normalize();
        if x.length() == 0.0 {
            let alt = if z.x.abs() < 0.9 {
                Vector3::x_axis()
            } else {
                Vector3::y_axis()
            };
            x = alt.cross(&z).normalize();
        }
        let y = z.cross(&x);

        Self::from_rows([
            [x.x, x.y, x.z, -x.dot(&eye)],
            [y.x, y.y, y.z, -y.dot(&eye)],
            [z.x, z.y, z.z, -z.dot(&eye)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Right-handed perspective projection mapping depth to `[-1, 1]`.
    ///
    /// `fov_y` is the vertical field of view in radians.
    pub fn make_perspective(fov_y: f64, aspect: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (fov_y / 2.0).tan();
        let range = near - far;
        Self::from_rows([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (far + near) / range, 2.0 * far * near / range],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// Matrix product `self * other` (apply `other` first).
    pub fn multiply(&self, other: &Matrix4) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform `v` as a homogeneous point (w = 1).
    ///
    /// The perspective divide is applied only when the resulting w is
    /// neither 1 nor 0.
    pub fn transform_vector(&self, v: &Vector3) -> Vector3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 1.0);
        if r.w != 1.0 && r.w != 0.0 {
            Vector3::new(r.x / r.w, r.y / r.w, r.z / r.w)
        } else {
            Vector3::new(r.x, r.y, r.z)
        }
    }

    /// Transform `v` as a direction (w = 0), ignoring translation.
    pub fn transform_direction(&self, v: &Vector3) -> Vector3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vector3::new(r.x, r.y, r.z)
    }

    /// Determinant by cofactor expansion along the first row.
    pub fn determinant(&self) -> f64 {
        (0..4)
            .map(|c| self.matrix[(0, c)] * self.cofactor(0, c))
            .sum()
    }

    /// Inverse via the adjugate, or `None` if the matrix is singular.
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let mut m = nalgebra::Matrix4::zeros();
        for r in 0..4 {
            for c in 0..4 {
                // adj(A)[r][c] = cofactor(c, r)
                m[(r, c)] = self.cofactor(c, r) * inv_det;
            }
        }
        Some(Self { matrix: m })
    }

    /// Transposed matrix.
    pub fn transpose(&self) -> Self {
        Self {
            matrix: self.matrix.transpose(),
        }
    }

    fn cofactor(&self, row: usize, col: usize) -> f64 {
        let mut minor = Matrix3::zeros();
        let mut mr = 0;
        for r in (0..4).filter(|&r| r != row) {
            let mut mc = 0;
            for c in (0..4).filter(|&c| c != col) {
                minor[(mr, mc)] = self.matrix[(r, c)];
                mc += 1;
            }
            mr += 1;
        }
        let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
        sign * minor.determinant()
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 {
        self.multiply(&rhs)
    }
}
