//! Plane-triangle intersection with an explicit degenerate-case policy.
//!
//! Vertices are classified by signed distance to the plane. A vertex is
//! on-plane when `|d| < tol`; an edge crosses the plane when both endpoints
//! are off-plane and `d_i * d_j < 0`. Strict comparisons use no extra epsilon,
//! so a distance of exactly `tol` counts as off-plane.

use serde::{Deserialize, Serialize};
use sonoslice_math::{Plane, Vector3, DEFAULT_TOLERANCE};

use crate::mesh::Triangle;

/// A 2-point line segment where the cutting plane crosses one triangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment(pub [Vector3; 2]);

impl Segment {
    /// Create a segment.
    pub fn new(start: Vector3, end: Vector3) -> Self {
        Self([start, end])
    }

    /// First endpoint.
    pub fn start(&self) -> Vector3 {
        self.0[0]
    }

    /// Second endpoint.
    pub fn end(&self) -> Vector3 {
        self.0[1]
    }

    /// Segment length.
    pub fn length(&self) -> f64 {
        self.0[0].distance_to(&self.0[1])
    }
}

impl AsRef<[Vector3]> for Segment {
    fn as_ref(&self) -> &[Vector3] {
        &self.0
    }
}

impl From<(Vector3, Vector3)> for Segment {
    fn from((a, b): (Vector3, Vector3)) -> Self {
        Self::new(a, b)
    }
}

/// Outcome of intersecting one triangle with a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangleIntersection {
    /// The triangle lies strictly on one side of the plane.
    None,
    /// Only a single vertex touches the plane.
    Point(Vector3),
    /// The plane cuts the triangle along a segment (or contains one edge).
    Segment(Segment),
    /// All three vertices lie in the plane.
    Coplanar([Vector3; 3]),
}

impl TriangleIntersection {
    /// The 0-3 intersection points.
    pub fn points(&self) -> Vec<Vector3> {
        match self {
            TriangleIntersection::None => Vec::new(),
            TriangleIntersection::Point(p) => vec![*p],
            TriangleIntersection::Segment(s) => s.0.to_vec(),
            TriangleIntersection::Coplanar(v) => v.to_vec(),
        }
    }

    /// The segment, if this outcome is a proper 2-point cut.
    pub fn segment(&self) -> Option<Segment> {
        match self {
            TriangleIntersection::Segment(s) => Some(*s),
            _ => None,
        }
    }

    /// True if the triangle does not touch the plane.
    pub fn is_none(&self) -> bool {
        matches!(self, TriangleIntersection::None)
    }
}

/// Where a triangle sits relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriangleSide {
    /// All vertices on the normal side.
    Above,
    /// All vertices on the opposite side.
    Below,
    /// Touches or crosses the plane.
    Straddling,
    /// All vertices on the plane.
    OnPlane,
}

/// `tol` if it is positive, otherwise [`DEFAULT_TOLERANCE`]. A zero band
/// would classify a vertex at exactly `d = 0` as neither on-plane nor on a
/// crossing edge.
fn band(tol: f64) -> f64 {
    if tol > 0.0 {
        tol
    } else {
        DEFAULT_TOLERANCE
    }
}

/// Signed distances of the three vertices.
fn vertex_distances(plane: &Plane, tri: &Triangle) -> [f64; 3] {
    let [v0, v1, v2] = &tri.vertices;
    [
        plane.distance_to_point(v0),
        plane.distance_to_point(v1),
        plane.distance_to_point(v2),
    ]
}

/// Classify a triangle against a plane.
pub fn classify_triangle(plane: &Plane, tri: &Triangle, tol: f64) -> TriangleSide {
    let tol = band(tol);
    let d = vertex_distances(plane, tri);
    if d.iter().all(|di| di.abs() < tol) {
        TriangleSide::OnPlane
    } else if d.iter().all(|&di| di >= tol) {
        TriangleSide::Above
    } else if d.iter().all(|&di| di <= -tol) {
        TriangleSide::Below
    } else {
        TriangleSide::Straddling
    }
}

/// Fast rejection test: false only when all three vertices are on the same
/// side of the plane, outside the tolerance band.
pub fn intersects_plane(plane: &Plane, tri: &Triangle, tol: f64) -> bool {
    let tol = band(tol);
    let [d0, d1, d2] = vertex_distances(plane, tri);
    let all_above = d0 >= tol && d1 >= tol && d2 >= tol;
    let all_below = d0 <= -tol && d1 <= -tol && d2 <= -tol;
    !(all_above || all_below)
}

/// Intersect a triangle with a plane.
///
/// Returns, by number of on-plane vertices:
/// - 3: [`TriangleIntersection::Coplanar`] with the input vertices;
/// - 2: the edge joining the two on-plane vertices;
/// - 1: the on-plane vertex and the crossing on the opposite edge, or the
///   vertex alone when the opposite edge does not cross;
/// - 0: the two edge crossings, or [`TriangleIntersection::None`].
///
/// A vertex is on the plane when `|d| < tol`. Zero, negative or NaN
/// tolerances are replaced by [`DEFAULT_TOLERANCE`].
pub fn intersect_triangle(plane: &Plane, tri: &Triangle, tol: f64) -> TriangleIntersection {
    let tol = band(tol);
    let v = &tri.vertices;
    let d = vertex_distances(plane, tri);
    let on = [d[0].abs() < tol, d[1].abs() < tol, d[2].abs() < tol];

    let on_count = on.iter().filter(|&&o| o).count();
    match on_count {
        3 => return TriangleIntersection::Coplanar(*v),
        2 => {
            let mut pts = (0..3).filter(|&i| on[i]).map(|i| v[i]);
            if let (Some(a), Some(b)) = (pts.next(), pts.next()) {
                return TriangleIntersection::Segment(Segment::new(a, b));
            }
        }
        _ => {}
    }

    // Crossing points on edges whose endpoints are both off-plane.
    let mut crossings: [Option<Vector3>; 3] = [None; 3];
    for (slot, (i, j)) in [(0, 1), (1, 2), (2, 0)].into_iter().enumerate() {
        if on[i] || on[j] || d[i] * d[j] >= 0.0 {
            continue;
        }
        let t = d[i] / (d[i] - d[j]);
        crossings[slot] = Some(v[i] + (v[j] - v[i]) * t);
    }
    let mut found = crossings.iter().flatten().copied();

    if on_count == 1 {
        let vertex = (0..3).find(|&i| on[i]).map(|i| v[i]);
        return match (vertex, found.next()) {
            (Some(p), Some(c)) => TriangleIntersection::Segment(Segment::new(p, c)),
            (Some(p), None) => TriangleIntersection::Point(p),
            (None, _) => TriangleIntersection::None,
        };
    }

    match (found.next(), found.next()) {
        (Some(a), Some(b)) => TriangleIntersection::Segment(Segment::new(a, b)),
        _ => TriangleIntersection::None,
    }
}
