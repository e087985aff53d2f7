//! Pose-keyed result cache.
//!
//! Keys quantize the probe pose to a fixed number of decimals so that
//! visually identical poses that differ only by floating-point jitter share
//! one entry. The mesh is identified coarsely by its triangle count.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::pose::ProbePose;
use crate::IntersectionResult;

/// What to do when inserting into a full cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Drop everything and start over.
    ClearAll,
    /// Drop the least recently used entry.
    #[default]
    Lru,
}

/// Quantized cache key for one pose on one mesh.
///
/// The direction is normalized before quantizing, so two directions share a
/// key only when they describe nearly the same plane orientation. Rounded
/// coordinates are kept as `f64` bit patterns: every finite value stays
/// distinct, however far from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoseKey {
    position: [u64; 3],
    direction: [u64; 3],
    triangle_count: usize,
}

impl PoseKey {
    /// Quantize `pose` to `precision` decimal digits.
    pub fn new(pose: &ProbePose, triangle_count: usize, precision: u32) -> Self {
        let scale = 10f64.powi(precision as i32);
        // Adding 0.0 folds -0.0 into 0.0.
        let q = |v: f64| ((v * scale).round() + 0.0).to_bits();
        let p = pose.position;
        let d = pose.direction.normalize();
        Self {
            position: [q(p.x), q(p.y), q(p.z)],
            direction: [q(d.x), q(d.y), q(d.z)],
            triangle_count,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    result: IntersectionResult,
    last_used: u64,
}

/// Bounded map from [`PoseKey`] to the last valid result for that pose.
#[derive(Debug, Clone)]
pub struct SectionCache {
    entries: HashMap<PoseKey, Entry>,
    // Recency index for LRU eviction: tick -> key.
    recency: BTreeMap<u64, PoseKey>,
    tick: u64,
    limit: usize,
    policy: EvictionPolicy,
    evictions: u64,
}

impl SectionCache {
    /// Create an empty cache holding at most `limit` entries.
    pub fn new(limit: usize, policy: EvictionPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            tick: 0,
            limit,
            policy,
            evictions: 0,
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Active eviction policy.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Number of entries evicted so far (full clears count every entry dropped).
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Look up a result, marking it as recently used.
    pub fn get(&mut self, key: &PoseKey) -> Option<&IntersectionResult> {
        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.last_used);
        self.recency.insert(tick, *key);
        entry.last_used = tick;
        Some(&entry.result)
    }

    /// Store a result, evicting according to the policy when full.
    pub fn insert(&mut self, key: PoseKey, result: IntersectionResult) {
        if self.limit == 0 {
            return;
        }
        if let Some(old) = self.entries.remove(&key) {
            self.recency.remove(&old.last_used);
        }
        if self.entries.len() >= self.limit {
            match self.policy {
                EvictionPolicy::ClearAll => {
                    log::debug!(
                        "section cache full ({} entries), clearing",
                        self.entries.len()
                    );
                    self.evictions += self.entries.len() as u64;
                    self.entries.clear();
                    self.recency.clear();
                }
                EvictionPolicy::Lru => self.evict_lru(),
            }
        }
        self.tick += 1;
        self.recency.insert(self.tick, key);
        self.entries.insert(
            key,
            Entry {
                result,
                last_used: self.tick,
            },
        );
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    /// Change the size bound. Shrinking below the current size clears the cache.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        if self.entries.len() > limit {
            log::debug!(
                "section cache limit lowered to {limit}, dropping {} entries",
                self.entries.len()
            );
            self.evictions += self.entries.len() as u64;
            self.clear();
        }
    }

    /// Change the eviction policy. Existing entries are kept.
    pub fn set_policy(&mut self, policy: EvictionPolicy) {
        self.policy = policy;
    }

    fn evict_lru(&mut self) {
        let oldest = self.recency.keys().next().copied();
        if let Some(tick) = oldest {
            if let Some(key) = self.recency.remove(&tick) {
                self.entries.remove(&key);
                self.evictions += 1;
                log::trace!("evicted least recently used section {key:?}");
            }
        }
    }
}
