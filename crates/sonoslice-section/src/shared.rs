//! Thread-safe handle to a [`RealTimeUpdateService`].

use std::sync::{Arc, Mutex, MutexGuard};

use sonoslice_math::Vector3;

use crate::error::Result;
use crate::mesh::TriangleMesh;
use crate::pose::ProbePose;
use crate::update::{PerformanceStats, RealTimeUpdateService};
use crate::{IntersectionResult, UpdateSettings};

/// A cloneable, `Send + Sync` handle sharing one service and its cache.
///
/// Calls are serialized through a mutex. The service holds only plain data,
/// so a lock poisoned by a panicking caller is recovered rather than
/// propagated.
#[derive(Debug, Clone, Default)]
pub struct SharedUpdateService {
    inner: Arc<Mutex<RealTimeUpdateService>>,
}

impl SharedUpdateService {
    /// Create a shared service with the given settings.
    pub fn new(settings: UpdateSettings) -> Result<Self> {
        Ok(Self::from(RealTimeUpdateService::new(settings)?))
    }

    fn lock(&self) -> MutexGuard<'_, RealTimeUpdateService> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// See [`RealTimeUpdateService::update_section`].
    pub fn update_section(
        &self,
        position: Vector3,
        direction: Vector3,
        mesh: &TriangleMesh,
    ) -> IntersectionResult {
        self.lock().update_section(position, direction, mesh)
    }

    /// See [`RealTimeUpdateService::update_section_for_pose`].
    pub fn update_section_for_pose(
        &self,
        pose: &ProbePose,
        mesh: &TriangleMesh,
    ) -> IntersectionResult {
        self.lock().update_section_for_pose(pose, mesh)
    }

    /// See [`RealTimeUpdateService::clear_cache`].
    pub fn clear_cache(&self) {
        self.lock().clear_cache();
    }

    /// See [`RealTimeUpdateService::set_cache_size_limit`].
    pub fn set_cache_size_limit(&self, limit: usize) {
        self.lock().set_cache_size_limit(limit);
    }

    /// See [`RealTimeUpdateService::performance_stats`].
    pub fn performance_stats(&self) -> PerformanceStats {
        self.lock().performance_stats()
    }
}

impl From<RealTimeUpdateService> for SharedUpdateService {
    fn from(service: RealTimeUpdateService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }
}
