//! Triangle mesh input model.
//!
//! The loading collaborator hands over either a list of triangles or the flat
//! vertex/index buffers a tessellator produces. Both end up as a
//! [`TriangleMesh`], which also carries the bounding box used to skip whole
//! frames where the cutting plane misses the anatomy.

use serde::{Deserialize, Serialize};
use sonoslice_math::{Plane, Vector3};

use crate::error::{Result, SectionError};

/// A mesh triangle with ordered vertices `v0, v1, v2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// The three vertices.
    pub vertices: [Vector3; 3],
}

impl Triangle {
    /// Create a triangle from three vertices.
    pub fn new(v0: Vector3, v1: Vector3, v2: Vector3) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Twice the triangle area; zero for collinear vertices.
    pub fn double_area(&self) -> f64 {
        let [v0, v1, v2] = self.vertices;
        (v1 - v0).cross(&(v2 - v0)).length()
    }

    /// True if the three vertices are collinear within `tolerance`.
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.double_area() < tolerance
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vector3,
    /// Maximum corner.
    pub max: Vector3,
}

impl Aabb {
    /// Create an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Vector3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Vector3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Expand this box to include a point.
    pub fn include_point(&mut self, p: &Vector3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// True if no point has been included.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Center point.
    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * 0.5
    }

    /// Half the extent along each axis.
    pub fn half_extents(&self) -> Vector3 {
        (self.max - self.min) * 0.5
    }

    /// True if the plane passes through the box, or within `tolerance` of it.
    ///
    /// Compares the signed distance of the center against the projected
    /// radius of the box onto the plane normal.
    pub fn intersects_plane(&self, plane: &Plane, tolerance: f64) -> bool {
        if self.is_empty() {
            return false;
        }
        let n = plane.normal();
        let h = self.half_extents();
        let radius = h.x * n.x.abs() + h.y * n.y.abs() + h.z * n.z.abs();
        plane.distance_to_point(&self.center()).abs() <= radius + tolerance
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// A triangulated surface, owned by the caller and never mutated by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    triangles: Vec<Triangle>,
    bounds: Aabb,
}

impl TriangleMesh {
    /// Build a mesh from a triangle list.
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let mut bounds = Aabb::empty();
        for tri in &triangles {
            for v in &tri.vertices {
                bounds.include_point(v);
            }
        }
        Self { triangles, bounds }
    }

    /// Build a mesh from flat buffers: three `f32` per vertex, three `u32`
    /// indices per triangle.
    pub fn from_indexed(vertices: &[f32], indices: &[u32]) -> Result<Self> {
        if vertices.len() % 3 != 0 {
            return Err(SectionError::InvalidMesh(format!(
                "vertex buffer length {} is not a multiple of 3",
                vertices.len()
            )));
        }
        if indices.len() % 3 != 0 {
            return Err(SectionError::InvalidMesh(format!(
                "index buffer length {} is not a multiple of 3",
                indices.len()
            )));
        }

        let vertex_count = vertices.len() / 3;
        let vertex = |i: u32| -> Result<Vector3> {
            let i = i as usize;
            if i >= vertex_count {
                return Err(SectionError::InvalidMesh(format!(
                    "index {i} out of range for {vertex_count} vertices"
                )));
            }
            Ok(Vector3::new(
                vertices[i * 3] as f64,
                vertices[i * 3 + 1] as f64,
                vertices[i * 3 + 2] as f64,
            ))
        };

        let triangles = indices
            .chunks_exact(3)
            .map(|tri| Ok(Triangle::new(vertex(tri[0])?, vertex(tri[1])?, vertex(tri[2])?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(triangles))
    }

    /// The triangles, in input order.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// True if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box of all vertices.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}

impl From<Vec<Triangle>> for TriangleMesh {
    fn from(triangles: Vec<Triangle>) -> Self {
        Self::new(triangles)
    }
}
