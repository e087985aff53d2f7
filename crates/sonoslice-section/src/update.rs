//! Per-frame section updates with pose caching.
//!
//! [`RealTimeUpdateService::update_section`] is called from the render loop
//! every time the probe moves. Bad poses and empty meshes come back as
//! invalid results instead of errors so the caller can simply try again on
//! the next frame.

use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sonoslice_math::{Matrix4, Plane, Vector3};

use crate::cache::{PoseKey, SectionCache};
use crate::error::{Result, SectionError};
use crate::intersect::{intersect_triangle, intersects_plane, Segment};
use crate::mesh::{Triangle, TriangleMesh};
use crate::pose::ProbePose;
use crate::{IntersectionResult, UpdateSettings};

/// Meshes at least this large are traversed on the rayon pool.
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 8192;

/// Counters reported by [`RealTimeUpdateService::performance_stats`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Calls to `update_section`, including rejected ones.
    pub total_queries: u64,
    /// Queries answered from the cache.
    pub hits: u64,
    /// Queries that ran the intersection.
    pub misses: u64,
    /// Queries rejected for a bad pose or empty mesh.
    pub invalid_queries: u64,
    /// Misses that exceeded the latency budget.
    pub slow_queries: u64,
    /// Entries currently cached.
    pub cache_entries: usize,
    /// Current cache size bound.
    pub cache_limit: usize,
    /// Entries evicted since the service was created.
    pub evictions: u64,
    /// `hits / (hits + misses)`, or 0 before the first valid query.
    pub hit_rate: f64,
    /// Mean computation time of misses (ms).
    pub average_calculation_ms: f64,
    /// Computation time of the most recent miss (ms).
    pub last_calculation_ms: f64,
}

#[derive(Debug, Clone, Default)]
struct Counters {
    total_queries: u64,
    hits: u64,
    misses: u64,
    invalid_queries: u64,
    slow_queries: u64,
    total_calculation_ms: f64,
    last_calculation_ms: f64,
}

/// Computes and caches the section contour for a moving probe.
///
/// The cache is owned by the instance and requires `&mut self`. Wrap the
/// service in a [`SharedUpdateService`](crate::SharedUpdateService) to call it
/// from several threads.
#[derive(Debug, Clone)]
pub struct RealTimeUpdateService {
    settings: UpdateSettings,
    cache: SectionCache,
    counters: Counters,
    // Triangles cut on the previous miss, and the mesh size they refer to.
    hot: Vec<usize>,
    hot_mesh_len: usize,
    visited: Vec<bool>,
    // Set while consecutive queries are rejected; only the first one warns.
    rejecting: bool,
}

impl Default for RealTimeUpdateService {
    fn default() -> Self {
        Self::from_valid_settings(UpdateSettings::default())
    }
}

impl RealTimeUpdateService {
    /// Create a service with the given settings.
    pub fn new(settings: UpdateSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::from_valid_settings(settings))
    }

    fn from_valid_settings(settings: UpdateSettings) -> Self {
        Self {
            cache: SectionCache::new(settings.cache_size_limit, settings.eviction),
            settings,
            counters: Counters::default(),
            hot: Vec::new(),
            hot_mesh_len: 0,
            visited: Vec::new(),
            rejecting: false,
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &UpdateSettings {
        &self.settings
    }

    /// Replace the settings.
    ///
    /// Cached results are dropped when the tolerance or cache precision
    /// changes, since they would no longer match a fresh computation.
    pub fn set_settings(&mut self, settings: UpdateSettings) -> Result<()> {
        settings.validate()?;
        if settings.tolerance != self.settings.tolerance
            || settings.cache_precision != self.settings.cache_precision
        {
            log::debug!("section tolerance or precision changed, clearing cache");
            self.cache.clear();
        }
        self.cache.set_policy(settings.eviction);
        self.cache.set_limit(settings.cache_size_limit);
        self.settings = settings;
        Ok(())
    }

    /// Compute the section for a probe at `position` looking along `direction`.
    pub fn update_section(
        &mut self,
        position: Vector3,
        direction: Vector3,
        mesh: &TriangleMesh,
    ) -> IntersectionResult {
        self.update_section_for_pose(&ProbePose::new(position, direction), mesh)
    }

    /// Compute the section for a pose given in another frame.
    ///
    /// `to_mesh` maps the pose's frame (e.g. tracker space) into mesh space.
    pub fn update_section_in_frame(
        &mut self,
        pose: &ProbePose,
        to_mesh: &Matrix4,
        mesh: &TriangleMesh,
    ) -> IntersectionResult {
        self.update_section_for_pose(&pose.transformed(to_mesh), mesh)
    }

    /// Compute the section for `pose`.
    pub fn update_section_for_pose(
        &mut self,
        pose: &ProbePose,
        mesh: &TriangleMesh,
    ) -> IntersectionResult {
        self.counters.total_queries += 1;

        let plane = match pose.plane() {
            Ok(plane) => plane,
            Err(err) => return self.reject(err),
        };
        if mesh.is_empty() {
            return self.reject(SectionError::EmptyMesh);
        }
        if self.rejecting {
            log::debug!("section updates accepted again");
            self.rejecting = false;
        }

        let key = PoseKey::new(pose, mesh.num_triangles(), self.settings.cache_precision);
        if let Some(hit) = self.cache.get(&key) {
            self.counters.hits += 1;
            log::trace!("section cache hit ({} segments)", hit.lines.len());
            return hit.cached();
        }
        self.counters.misses += 1;

        let start = Instant::now();
        let lines = self.compute_section(&plane, mesh);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.counters.total_calculation_ms += elapsed_ms;
        self.counters.last_calculation_ms = elapsed_ms;
        log::debug!(
            "section miss: {} triangles -> {} segments in {:.3} ms",
            mesh.num_triangles(),
            lines.len(),
            elapsed_ms
        );
        if elapsed_ms > self.settings.latency_budget_ms {
            self.counters.slow_queries += 1;
            log::warn!(
                "section took {:.1} ms for {} triangles (budget {:.1} ms)",
                elapsed_ms,
                mesh.num_triangles(),
                self.settings.latency_budget_ms
            );
        }

        let result = IntersectionResult::computed(lines, elapsed_ms);
        if result.is_valid {
            self.cache.insert(key, result.clone());
        }
        result
    }

    /// Drop all cached sections.
    pub fn clear_cache(&mut self) {
        log::debug!("clearing section cache ({} entries)", self.cache.len());
        self.cache.clear();
    }

    /// Bound the cache size. Lowering it below the current size clears the cache.
    pub fn set_cache_size_limit(&mut self, limit: usize) {
        self.settings.cache_size_limit = limit;
        self.cache.set_limit(limit);
    }

    /// Hit rate, counts and timing.
    pub fn performance_stats(&self) -> PerformanceStats {
        let c = &self.counters;
        let answered = c.hits + c.misses;
        PerformanceStats {
            total_queries: c.total_queries,
            hits: c.hits,
            misses: c.misses,
            invalid_queries: c.invalid_queries,
            slow_queries: c.slow_queries,
            cache_entries: self.cache.len(),
            cache_limit: self.cache.limit(),
            evictions: self.cache.evictions(),
            hit_rate: if answered == 0 {
                0.0
            } else {
                c.hits as f64 / answered as f64
            },
            average_calculation_ms: if c.misses == 0 {
                0.0
            } else {
                c.total_calculation_ms / c.misses as f64
            },
            last_calculation_ms: c.last_calculation_ms,
        }
    }

    /// Zero the query counters. Cached entries are kept.
    pub fn reset_stats(&mut self) {
        self.counters = Counters::default();
    }

    fn reject(&mut self, err: SectionError) -> IntersectionResult {
        self.counters.invalid_queries += 1;
        if self.rejecting {
            log::debug!("section update rejected: {err}");
        } else {
            log::warn!("section update rejected: {err}");
            self.rejecting = true;
        }
        IntersectionResult::from_error(&err)
    }

    /// Intersect every triangle with `plane`, keeping proper 2-point cuts in
    /// mesh order.
    fn compute_section(&mut self, plane: &Plane, mesh: &TriangleMesh) -> Vec<Segment> {
        let tol = self.settings.tolerance;
        let triangles = mesh.triangles();

        if self.settings.bounds_culling && !mesh.bounds().intersects_plane(plane, tol) {
            log::trace!("cutting plane misses mesh bounds, skipping triangles");
            self.hot.clear();
            return Vec::new();
        }

        let cuts = self.collect_cuts(plane, triangles, tol);

        if self.settings.temporal_coherence {
            self.hot.clear();
            self.hot.extend(cuts.iter().map(|(i, _)| *i));
            self.hot_mesh_len = triangles.len();
        }

        cuts.into_iter().map(|(_, seg)| seg).collect()
    }

    fn collect_cuts(
        &mut self,
        plane: &Plane,
        triangles: &[Triangle],
        tol: f64,
    ) -> Vec<(usize, Segment)> {
        #[cfg(feature = "parallel")]
        {
            if triangles.len() >= PARALLEL_THRESHOLD {
                return triangles
                    .par_iter()
                    .enumerate()
                    .filter_map(|(i, tri)| cut(plane, tri, tol).map(|seg| (i, seg)))
                    .collect();
            }
        }

        let coherent = self.settings.temporal_coherence
            && !self.hot.is_empty()
            && self.hot_mesh_len == triangles.len();
        if !coherent {
            return triangles
                .iter()
                .enumerate()
                .filter_map(|(i, tri)| cut(plane, tri, tol).map(|seg| (i, seg)))
                .collect();
        }

        // Last frame's cut triangles first, then the rest. Sorting by index
        // keeps the output identical to a plain traversal.
        self.visited.clear();
        self.visited.resize(triangles.len(), false);
        let mut cuts = Vec::with_capacity(self.hot.len());
        for &i in &self.hot {
            self.visited[i] = true;
            if let Some(seg) = cut(plane, &triangles[i], tol) {
                cuts.push((i, seg));
            }
        }
        for (i, tri) in triangles.iter().enumerate() {
            if self.visited[i] {
                continue;
            }
            if let Some(seg) = cut(plane, tri, tol) {
                cuts.push((i, seg));
            }
        }
        cuts.sort_unstable_by_key(|(i, _)| *i);
        cuts
    }
}

fn cut(plane: &Plane, tri: &Triangle, tol: f64) -> Option<Segment> {
    if !intersects_plane(plane, tri, tol) {
        return None;
    }
    intersect_triangle(plane, tri, tol).segment()
}
