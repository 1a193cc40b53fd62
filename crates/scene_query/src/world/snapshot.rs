//! Scene snapshots fed in by the host each frame
//!
//! Values arrive loosely typed (script tables, scene files), so positions
//! and rotations are plain arrays here and pass through the checked
//! constructors on the way into the store.

use crate::config::Config;
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::foundation::math::{checked_quat, checked_vec3, Quat};
use crate::physics::{Volume, VolumeShape};
use crate::terrain::{CellCoord, TerrainConfig, VoxelTerrain};
use serde::{Deserialize, Serialize};

/// State of one entity at the start of a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Entity identifier
    pub id: Entity,
    /// Bounding volume shape
    pub shape: VolumeShape,
    /// World-space center
    pub position: [f32; 3],
    /// Rotation as `[x, y, z, w]`; identity when absent
    #[serde(default)]
    pub rotation: Option<[f32; 4]>,
    /// Filter tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl EntityState {
    /// Convert to a store volume, validating every component
    pub fn to_volume(&self) -> QueryResult<Volume> {
        let [x, y, z] = self.position;
        let center = checked_vec3(x, y, z)?;
        let orientation = match self.rotation {
            Some([x, y, z, w]) => checked_quat(x, y, z, w)?,
            None => Quat::identity(),
        };
        Ok(Volume::new(self.id, self.shape, center)?
            .with_orientation(orientation)
            .with_tags(self.tags.iter().cloned()))
    }
}

/// Height override for one terrain column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDesc {
    /// Column index along x
    pub x: i32,
    /// Column index along z
    pub z: i32,
    /// Height in cells
    pub height: u32,
}

/// Terrain grid with its edits
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainDesc {
    /// Grid layout and base height
    pub layout: TerrainConfig,
    /// Columns that differ from the base height
    pub columns: Vec<ColumnDesc>,
    /// Cells emptied regardless of height
    pub carved: Vec<CellCoord>,
    /// Placed construction blocks
    pub blocks: Vec<CellCoord>,
}

impl TerrainDesc {
    /// Build the grid and apply columns, then carved cells, then blocks
    pub fn build(&self) -> QueryResult<VoxelTerrain> {
        let mut terrain = VoxelTerrain::from_config(&self.layout)
            .map_err(|e| QueryError::InvalidArgument(e.to_string()))?;
        for column in &self.columns {
            terrain.set_column_height(column.x, column.z, column.height)?;
        }
        for &coord in &self.carved {
            terrain.carve(coord)?;
        }
        for &coord in &self.blocks {
            terrain.place_block(coord)?;
        }
        Ok(terrain)
    }
}

/// Everything the query engine needs from one frame of the host scene
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSnapshot {
    /// Entities with bounding volumes
    pub entities: Vec<EntityState>,
    /// Terrain, when it changed or on the first frame
    pub terrain: Option<TerrainDesc>,
}

impl Config for SceneSnapshot {}

impl SceneSnapshot {
    /// Convert every entity, failing on the first malformed one
    pub fn volumes(&self) -> QueryResult<Vec<Volume>> {
        self.entities.iter().map(EntityState::to_volume).collect()
    }
}
