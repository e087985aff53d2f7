//! Synthetic anatomy meshes for calibration, tests and benchmarks.
//!
//! Both meshes are built as indexed `f32` buffers, the layout a mesh loader
//! hands over, and go through [`TriangleMesh::from_indexed`].

use std::f64::consts::PI;

use sonoslice_math::Vector3;
use sonoslice_section::{Result, SectionError, TriangleMesh};

fn push(vertices: &mut Vec<f32>, p: Vector3) {
    vertices.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
}

/// A latitude/longitude sphere with `2 * n_lon * (n_lat - 1)` triangles.
///
/// The poles are single vertices fanned to the nearest latitude band.
pub fn uv_sphere(center: Vector3, radius: f64, n_lat: u32, n_lon: u32) -> Result<TriangleMesh> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(SectionError::InvalidMesh(format!(
            "sphere radius must be positive, got {radius}"
        )));
    }
    if n_lat < 2 || n_lon < 3 {
        return Err(SectionError::InvalidMesh(format!(
            "sphere needs at least 2 latitude and 3 longitude segments, got {n_lat}x{n_lon}"
        )));
    }

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    push(&mut vertices, center + Vector3::new(0.0, 0.0, -radius));
    for j in 1..n_lat {
        let v = -PI / 2.0 + PI * (j as f64 / n_lat as f64);
        for i in 0..=n_lon {
            let u = 2.0 * PI * (i as f64 / n_lon as f64);
            let dir = Vector3::new(v.cos() * u.cos(), v.cos() * u.sin(), v.sin());
            push(&mut vertices, center + dir * radius);
        }
    }
    push(&mut vertices, center + Vector3::new(0.0, 0.0, radius));

    let south = 0u32;
    let north = (vertices.len() / 3) as u32 - 1;
    let stride = n_lon + 1;

    for i in 0..n_lon {
        indices.extend_from_slice(&[south, 1 + i + 1, 1 + i]);
    }
    for j in 0..(n_lat - 2) {
        let band = 1 + j * stride;
        let next = band + stride;
        for i in 0..n_lon {
            let (bl, br) = (band + i, band + i + 1);
            let (tl, tr) = (next + i, next + i + 1);
            indices.extend_from_slice(&[bl, br, tl]);
            indices.extend_from_slice(&[br, tr, tl]);
        }
    }
    let last = 1 + (n_lat - 2) * stride;
    for i in 0..n_lon {
        indices.extend_from_slice(&[north, last + i, last + i + 1]);
    }

    TriangleMesh::from_indexed(&vertices, &indices)
}

/// An axis-aligned box with 12 triangles.
pub fn cuboid(center: Vector3, half_extents: Vector3) -> Result<TriangleMesh> {
    let h = half_extents;
    if !h.is_finite() || h.x <= 0.0 || h.y <= 0.0 || h.z <= 0.0 {
        return Err(SectionError::InvalidMesh(format!(
            "box half extents must be positive, got {h:?}"
        )));
    }

    let mut vertices = Vec::with_capacity(24);
    for k in 0..8 {
        let sx = if k & 1 == 0 { -h.x } else { h.x };
        let sy = if k & 2 == 0 { -h.y } else { h.y };
        let sz = if k & 4 == 0 { -h.z } else { h.z };
        push(&mut vertices, center + Vector3::new(sx, sy, sz));
    }

    #[rustfmt::skip]
    let indices = [
        0, 2, 1, 1, 2, 3, // -z
        4, 5, 6, 5, 7, 6, // +z
        0, 1, 4, 1, 5, 4, // -y
        2, 6, 3, 3, 6, 7, // +y
        0, 4, 2, 2, 4, 6, // -x
        1, 3, 5, 3, 7, 5, // +x
    ];
    TriangleMesh::from_indexed(&vertices, &indices)
}
