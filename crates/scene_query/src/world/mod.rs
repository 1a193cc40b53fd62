//! Query world
//!
//! [`SpatialWorld`] bundles the volume store, terrain, and cast engine for
//! one scene. [`SharedWorld`] puts it behind a lock so the frame's update
//! phase can write while query threads read between updates.

mod shared;
mod snapshot;

pub use shared::SharedWorld;
pub use snapshot::{ColumnDesc, EntityState, SceneSnapshot, TerrainDesc};

use crate::config::ConfigError;
use crate::core::SpatialConfig;
use crate::entity::Entity;
use crate::error::QueryResult;
use crate::physics::{SyncStats, VolumeStore};
use crate::query::{CastEngine, CastQuery, CastResult, QueryContext};
use crate::terrain::VoxelTerrain;

/// Everything a cast is evaluated against
pub struct SpatialWorld {
    config: SpatialConfig,
    store: VolumeStore,
    terrain: VoxelTerrain,
    engine: CastEngine,
    frame: u64,
}

impl SpatialWorld {
    /// Create an empty world from a validated configuration
    pub fn new(config: SpatialConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = VolumeStore::from_config(&config);
        let terrain = VoxelTerrain::from_config(&config.terrain)?;
        let engine = CastEngine::from_config(&config);
        log::debug!(
            "SpatialWorld created: bounds {:?}..{:?}, terrain {:?}",
            config.world_min,
            config.world_max,
            config.terrain.dims
        );
        Ok(Self {
            config,
            store,
            terrain,
            engine,
            frame: 0,
        })
    }

    /// Configuration the world was built from
    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Entity volumes
    pub fn store(&self) -> &VolumeStore {
        &self.store
    }

    /// Entity volumes, for the update phase
    pub fn store_mut(&mut self) -> &mut VolumeStore {
        &mut self.store
    }

    /// Terrain grid
    pub fn terrain(&self) -> &VoxelTerrain {
        &self.terrain
    }

    /// Terrain grid, for the update phase
    pub fn terrain_mut(&mut self) -> &mut VoxelTerrain {
        &mut self.terrain
    }

    /// Cast engine configured for this world
    pub fn engine(&self) -> &CastEngine {
        &self.engine
    }

    /// Number of completed update phases
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub(crate) fn advance_frame(&mut self) {
        self.frame += 1;
    }

    /// Query handle acting on behalf of `caller`
    pub fn context(&self, caller: Option<Entity>) -> QueryContext<'_> {
        QueryContext::new(self, caller)
    }

    /// Run a cast against the store and terrain
    pub fn cast(&self, query: &CastQuery) -> QueryResult<CastResult> {
        self.engine.cast(query, &self.store, &self.terrain)
    }

    /// Load a frame snapshot.
    ///
    /// The snapshot is fully converted and validated first; on error the
    /// world is left as it was.
    pub fn apply_snapshot(&mut self, snapshot: &SceneSnapshot) -> QueryResult<SyncStats> {
        let volumes = snapshot.volumes()?;
        let terrain = snapshot.terrain.as_ref().map(TerrainDesc::build).transpose()?;

        let stats = self.store.sync(volumes)?;
        if let Some(terrain) = terrain {
            self.terrain = terrain;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::VolumeShape;
    use crate::terrain::TerrainConfig;

    fn state(id: u32, position: [f32; 3]) -> EntityState {
        EntityState {
            id: Entity::new(id),
            shape: VolumeShape::sphere(1.0),
            position,
            rotation: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SpatialConfig::default().with_max_cast_distance(-1.0);
        assert!(SpatialWorld::new(config).is_err());
    }

    #[test]
    fn test_apply_snapshot() {
        let mut world = SpatialWorld::new(SpatialConfig::default()).unwrap();
        let snapshot = SceneSnapshot {
            entities: vec![state(1, [0.0, 0.0, 5.0]), state(2, [3.0, 0.0, 0.0])],
            terrain: Some(TerrainDesc {
                layout: TerrainConfig::new(Vec3::new(-8.0, -4.0, -8.0), 1.0, [16, 8, 16])
                    .with_ground_height(2),
                ..TerrainDesc::default()
            }),
        };

        let stats = world.apply_snapshot(&snapshot).unwrap();
        assert_eq!(stats.inserted, 2);
        assert_eq!(world.store().len(), 2);
        assert_eq!(world.terrain().dims(), [16, 8, 16]);

        let hit = world
            .cast(&CastQuery::ray(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), 10.0))
            .unwrap();
        assert_eq!(hit.entities(), vec![Entity::new(1)]);
    }

    #[test]
    fn test_bad_snapshot_leaves_world_untouched() {
        let mut world = SpatialWorld::new(SpatialConfig::default()).unwrap();
        world
            .apply_snapshot(&SceneSnapshot {
                entities: vec![state(1, [0.0, 0.0, 0.0])],
                terrain: None,
            })
            .unwrap();

        let mut broken = state(2, [0.0, 0.0, 0.0]);
        broken.rotation = Some([0.0, 0.0, 0.0, 3.0]);
        let result = world.apply_snapshot(&SceneSnapshot {
            entities: vec![broken],
            terrain: Some(TerrainDesc {
                layout: TerrainConfig::new(Vec3::zeros(), 1.0, [4, 4, 4]),
                ..TerrainDesc::default()
            }),
        });

        assert!(result.is_err());
        assert!(world.store().contains(Entity::new(1)));
        assert!(!world.store().contains(Entity::new(2)));
        assert!(world.terrain().is_empty());
    }
}
