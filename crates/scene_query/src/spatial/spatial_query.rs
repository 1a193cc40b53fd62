//! Abstract spatial index interface for broad-phase candidate lookup
//!
//! The cast engine only needs a superset of the volumes that can touch a
//! query region. This abstraction allows swapping partitioning schemes
//! (octree, grid, BVH) without changing the store or the cast engine.

use crate::entity::Entity;
use crate::foundation::math::Vec3;
use crate::spatial::{Octree, OctreeConfig, AABB};
use std::collections::HashMap;

/// Broad-phase index over entity bounds
///
/// Implementations may return false positives but never false negatives:
/// every entity whose bounds touch the region must be reported.
pub trait SpatialIndex: Send + Sync {
    /// Insert an entity with its world-space bounds
    fn insert(&mut self, entity: Entity, bounds: AABB);

    /// Remove an entity from the spatial structure
    fn remove(&mut self, entity: Entity);

    /// Replace an entity's bounds
    fn update(&mut self, entity: Entity, bounds: AABB);

    /// Entities whose bounds may touch `region`
    fn query_aabb(&self, region: &AABB) -> Vec<Entity>;

    /// Entities whose bounds, grown by `inflate`, may touch the segment
    /// `origin + dir * [0, max_t]`
    fn query_segment(&self, origin: Vec3, dir: Vec3, max_t: f32, inflate: f32) -> Vec<Entity> {
        self.query_aabb(&AABB::from_segment(origin, dir, max_t, inflate))
    }

    /// Clear all entities from the spatial structure
    fn clear(&mut self);

    /// Get the number of entities in the structure
    fn entity_count(&self) -> usize;
}

/// Octree-based implementation of [`SpatialIndex`]
pub struct OctreeSpatialIndex {
    octree: Octree,
    /// Bounds of each indexed entity, used to skip removal searches for unknown ids
    bounds_cache: HashMap<Entity, AABB>,
}

impl OctreeSpatialIndex {
    /// Create a new octree-based spatial index
    pub fn new(octree: Octree) -> Self {
        Self {
            octree,
            bounds_cache: HashMap::new(),
        }
    }

    /// Create an index covering `world_bounds`
    pub fn with_bounds(world_bounds: AABB, config: OctreeConfig) -> Self {
        Self::new(Octree::new(world_bounds, config))
    }

    /// Get a reference to the underlying octree
    pub fn octree(&self) -> &Octree {
        &self.octree
    }
}

impl SpatialIndex for OctreeSpatialIndex {
    fn insert(&mut self, entity: Entity, bounds: AABB) {
        if self.bounds_cache.insert(entity, bounds).is_some() {
            self.octree.remove(entity);
        }
        self.octree.insert(entity, bounds);
    }

    fn remove(&mut self, entity: Entity) {
        if self.bounds_cache.remove(&entity).is_some() {
            self.octree.remove(entity);
        }
    }

    fn update(&mut self, entity: Entity, bounds: AABB) {
        // Octree requires remove + re-insert for updates
        self.octree.remove(entity);
        self.octree.insert(entity, bounds);
        self.bounds_cache.insert(entity, bounds);
    }

    fn query_aabb(&self, region: &AABB) -> Vec<Entity> {
        self.octree.query_aabb(region)
    }

    fn query_segment(&self, origin: Vec3, dir: Vec3, max_t: f32, inflate: f32) -> Vec<Entity> {
        self.octree.query_segment(origin, dir, max_t, inflate)
    }

    fn clear(&mut self) {
        self.octree.clear();
        self.bounds_cache.clear();
    }

    fn entity_count(&self) -> usize {
        self.bounds_cache.len()
    }
}
