//! Volume store
//!
//! Owns the current bounding volume of every dynamic entity and keeps the
//! broad-phase index in step with it. Each volume keeps the sequence number
//! it was first inserted with; every lookup returns volumes in that order so
//! narrow-phase ties resolve the same way for a given store state.

use crate::core::SpatialConfig;
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::foundation::math::{ensure_finite, Quat, Vec3};
use crate::physics::collision::Volume;
use crate::spatial::{OctreeSpatialIndex, SpatialIndex, AABB};
use std::collections::{HashMap, HashSet};

/// Volume plus its insertion order
#[derive(Debug, Clone)]
struct StoredVolume {
    volume: Volume,
    sequence: u64,
}

/// Counts reported by [`VolumeStore::sync`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Volumes seen for the first time
    pub inserted: usize,
    /// Existing volumes that were refreshed
    pub updated: usize,
    /// Volumes whose entity disappeared from the snapshot
    pub removed: usize,
}

/// Store of entity volumes backed by a broad-phase index
pub struct VolumeStore {
    /// Spatial partitioning structure for broad-phase
    index: Box<dyn SpatialIndex>,

    /// Volume data for each entity
    volumes: HashMap<Entity, StoredVolume>,

    /// Sequence number handed to the next inserted volume
    next_sequence: u64,
}

impl VolumeStore {
    /// Create a store with the given spatial index implementation
    pub fn new(index: Box<dyn SpatialIndex>) -> Self {
        Self {
            index,
            volumes: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Create a store indexed by an octree over the configured world bounds
    pub fn from_config(config: &SpatialConfig) -> Self {
        Self::new(Box::new(OctreeSpatialIndex::with_bounds(
            config.world_bounds(),
            config.octree.clone(),
        )))
    }

    /// Add a volume; fails if the entity already has one
    pub fn insert(&mut self, volume: Volume) -> QueryResult<()> {
        volume.shape.validate()?;
        ensure_finite(&volume.center, "volume center")?;
        if self.volumes.contains_key(&volume.entity) {
            return Err(QueryError::InvalidArgument(format!(
                "entity {} already has a volume",
                volume.entity
            )));
        }

        let entity = volume.entity;
        self.index.insert(entity, volume.aabb());
        self.volumes.insert(
            entity,
            StoredVolume {
                volume,
                sequence: self.next_sequence,
            },
        );
        self.next_sequence += 1;
        log::trace!("VolumeStore: inserted {}", entity);
        Ok(())
    }

    /// Move a volume
    pub fn update(&mut self, entity: Entity, center: Vec3, orientation: Quat) -> QueryResult<()> {
        ensure_finite(&center, "volume center")?;
        let stored = self
            .volumes
            .get_mut(&entity)
            .ok_or(QueryError::NotFound(entity))?;

        stored.volume.center = center;
        stored.volume.orientation = orientation;
        self.index.update(entity, stored.volume.aabb());
        Ok(())
    }

    /// Replace a volume's shape, transform and tags, keeping its insertion order
    pub fn replace(&mut self, volume: Volume) -> QueryResult<()> {
        volume.shape.validate()?;
        ensure_finite(&volume.center, "volume center")?;
        let stored = self
            .volumes
            .get_mut(&volume.entity)
            .ok_or(QueryError::NotFound(volume.entity))?;

        self.index.update(volume.entity, volume.aabb());
        stored.volume = volume;
        Ok(())
    }

    /// Replace a volume's tag set
    pub fn set_tags<I, S>(&mut self, entity: Entity, tags: I) -> QueryResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stored = self
            .volumes
            .get_mut(&entity)
            .ok_or(QueryError::NotFound(entity))?;
        stored.volume.tags = tags.into_iter().map(Into::into).collect();
        Ok(())
    }

    /// Remove a volume (called when the owning entity is destroyed)
    pub fn remove(&mut self, entity: Entity) -> QueryResult<Volume> {
        let stored = self
            .volumes
            .remove(&entity)
            .ok_or(QueryError::NotFound(entity))?;
        self.index.remove(entity);
        log::trace!("VolumeStore: removed {}", entity);
        Ok(stored.volume)
    }

    /// Get a volume by entity
    pub fn get(&self, entity: Entity) -> Option<&Volume> {
        self.volumes.get(&entity).map(|stored| &stored.volume)
    }

    /// Check whether an entity has a volume
    pub fn contains(&self, entity: Entity) -> bool {
        self.volumes.contains_key(&entity)
    }

    /// Volumes whose bounds may touch `region`, in insertion order
    pub fn query(&self, region: &AABB) -> Vec<&Volume> {
        let candidates = self.index.query_aabb(region);
        self.ordered(candidates)
    }

    /// Volumes whose bounds, grown by `inflate`, may touch the segment
    /// `origin + dir * [0, max_t]`, in insertion order
    pub fn query_segment(&self, origin: Vec3, dir: Vec3, max_t: f32, inflate: f32) -> Vec<&Volume> {
        let candidates = self.index.query_segment(origin, dir, max_t, inflate);
        self.ordered(candidates)
    }

    /// All volumes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Volume> {
        let mut stored: Vec<&StoredVolume> = self.volumes.values().collect();
        stored.sort_by_key(|s| s.sequence);
        stored.into_iter().map(|s| &s.volume)
    }

    /// Number of stored volumes
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Remove every volume
    pub fn clear(&mut self) {
        self.volumes.clear();
        self.index.clear();
    }

    /// Bring the store in line with a frame snapshot.
    ///
    /// Volumes for new entities are inserted, known ones are replaced in
    /// place and entities missing from the snapshot are removed. The whole
    /// snapshot is validated before anything changes.
    pub fn sync<I>(&mut self, volumes: I) -> QueryResult<SyncStats>
    where
        I: IntoIterator<Item = Volume>,
    {
        let volumes: Vec<Volume> = volumes.into_iter().collect();
        let mut seen = HashSet::with_capacity(volumes.len());
        for volume in &volumes {
            volume.shape.validate()?;
            ensure_finite(&volume.center, "volume center")?;
            if !seen.insert(volume.entity) {
                return Err(QueryError::InvalidArgument(format!(
                    "entity {} appears twice in snapshot",
                    volume.entity
                )));
            }
        }

        let mut stats = SyncStats::default();

        let stale: Vec<Entity> = self
            .volumes
            .keys()
            .filter(|entity| !seen.contains(entity))
            .copied()
            .collect();
        for entity in stale {
            self.remove(entity)?;
            stats.removed += 1;
        }

        for volume in volumes {
            match self.volumes.get(&volume.entity) {
                Some(stored) if stored.volume == volume => {}
                Some(_) => {
                    self.replace(volume)?;
                    stats.updated += 1;
                }
                None => {
                    self.insert(volume)?;
                    stats.inserted += 1;
                }
            }
        }

        log::debug!(
            "VolumeStore sync: {} inserted, {} updated, {} removed, {} total",
            stats.inserted,
            stats.updated,
            stats.removed,
            self.volumes.len()
        );
        Ok(stats)
    }

    fn ordered(&self, candidates: Vec<Entity>) -> Vec<&Volume> {
        let mut stored: Vec<&StoredVolume> = candidates
            .iter()
            .filter_map(|entity| self.volumes.get(entity))
            .collect();
        stored.sort_by_key(|s| s.sequence);
        stored.into_iter().map(|s| &s.volume).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::VolumeShape;

    fn sphere(id: u32, center: Vec3) -> Volume {
        Volume::new(Entity::new(id), VolumeShape::sphere(1.0), center).unwrap()
    }

    fn store() -> VolumeStore {
        VolumeStore::from_config(&SpatialConfig::default())
    }

    fn ids(volumes: &[&Volume]) -> Vec<u32> {
        volumes.iter().map(|v| v.entity.id()).collect()
    }

    #[test]
    fn test_insert_update_remove() {
        let mut store = store();
        store.insert(sphere(1, Vec3::zeros())).unwrap();
        assert_eq!(store.len(), 1);

        store
            .update(Entity::new(1), Vec3::new(10.0, 0.0, 0.0), Quat::identity())
            .unwrap();
        let region = AABB::from_center_extents(Vec3::new(10.0, 0.0, 0.0), Vec3::repeat(0.5));
        assert_eq!(ids(&store.query(&region)), vec![1]);
        let old_region = AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5));
        assert!(store.query(&old_region).is_empty());

        let removed = store.remove(Entity::new(1)).unwrap();
        assert_eq!(removed.center, Vec3::new(10.0, 0.0, 0.0));
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_entity_not_found() {
        let mut store = store();
        assert_eq!(
            store.update(Entity::new(5), Vec3::zeros(), Quat::identity()),
            Err(QueryError::NotFound(Entity::new(5)))
        );
        assert_eq!(store.remove(Entity::new(5)).unwrap_err(), QueryError::NotFound(Entity::new(5)));
        assert!(store.set_tags(Entity::new(5), ["a"]).is_err());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut store = store();
        store.insert(sphere(1, Vec3::zeros())).unwrap();
        assert!(matches!(
            store.insert(sphere(1, Vec3::zeros())),
            Err(QueryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_non_finite_update_leaves_volume_untouched() {
        let mut store = store();
        store.insert(sphere(1, Vec3::zeros())).unwrap();
        assert!(store
            .update(Entity::new(1), Vec3::new(f32::NAN, 0.0, 0.0), Quat::identity())
            .is_err());
        assert_eq!(store.get(Entity::new(1)).unwrap().center, Vec3::zeros());
    }

    #[test]
    fn test_query_returns_insertion_order() {
        let mut store = store();
        for id in [7, 3, 9, 1] {
            store.insert(sphere(id, Vec3::new(id as f32 * 0.1, 0.0, 0.0))).unwrap();
        }
        // Moving a volume keeps its original position in the order
        store.update(Entity::new(7), Vec3::new(0.5, 0.0, 0.0), Quat::identity()).unwrap();

        let region = AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(3.0));
        assert_eq!(ids(&store.query(&region)), vec![7, 3, 9, 1]);
        assert_eq!(store.iter().map(|v| v.entity.id()).collect::<Vec<_>>(), vec![7, 3, 9, 1]);
    }

    #[test]
    fn test_sync_applies_snapshot() {
        let mut store = store();
        store.insert(sphere(1, Vec3::zeros())).unwrap();
        store.insert(sphere(2, Vec3::zeros())).unwrap();

        let stats = store
            .sync(vec![sphere(2, Vec3::new(4.0, 0.0, 0.0)), sphere(3, Vec3::zeros())])
            .unwrap();

        assert_eq!(stats, SyncStats { inserted: 1, updated: 1, removed: 1 });
        assert!(!store.contains(Entity::new(1)));
        assert_eq!(store.get(Entity::new(2)).unwrap().center, Vec3::new(4.0, 0.0, 0.0));

        let unchanged = store
            .sync(vec![sphere(2, Vec3::new(4.0, 0.0, 0.0)), sphere(3, Vec3::zeros())])
            .unwrap();
        assert_eq!(unchanged, SyncStats::default());
    }

    #[test]
    fn test_sync_rejects_duplicates_without_changes() {
        let mut store = store();
        store.insert(sphere(1, Vec3::zeros())).unwrap();
        assert!(store.sync(vec![sphere(2, Vec3::zeros()), sphere(2, Vec3::zeros())]).is_err());
        assert!(store.contains(Entity::new(1)));
        assert_eq!(store.len(), 1);
    }
}
