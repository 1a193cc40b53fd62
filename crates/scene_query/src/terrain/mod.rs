//! Static terrain queried by casts
//!
//! Terrain is a grid of cells. Most of it comes from a per-column
//! heightfield; placed construction blocks and carved cells are stored as
//! overrides on top. Casts only read it; edits happen in the update phase.

mod voxel;

pub use voxel::VoxelTerrain;

use crate::config::ConfigError;
use crate::foundation::math::Vec3;
use crate::physics::OrientedBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest number of columns (`dims[0] * dims[2]`) a grid may have
pub const MAX_TERRAIN_COLUMNS: u64 = 1 << 24;

/// Grid layout loaded with the rest of the [`SpatialConfig`](crate::core::SpatialConfig)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// World position of the minimum corner of cell (0, 0, 0)
    pub origin: [f32; 3],
    /// Edge length of one cubic cell
    pub cell_size: f32,
    /// Number of cells along x, y and z
    pub dims: [u32; 3],
    /// Initial height of every column, in cells
    pub ground_height: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0, 0.0],
            cell_size: 1.0,
            dims: [0, 0, 0],
            ground_height: 0,
        }
    }
}

impl TerrainConfig {
    /// Grid of `dims` cells of `cell_size` starting at `origin`
    pub fn new(origin: Vec3, cell_size: f32, dims: [u32; 3]) -> Self {
        Self {
            origin: [origin.x, origin.y, origin.z],
            cell_size,
            dims,
            ground_height: 0,
        }
    }

    /// Set the initial column height
    pub fn with_ground_height(mut self, height: u32) -> Self {
        self.ground_height = height;
        self
    }

    /// Check that the layout describes a usable grid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.origin.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "terrain.origin must be finite, got {:?}",
                self.origin
            )));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "terrain.cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if let Some(axis) = self.dims.iter().position(|&d| d > i32::MAX as u32) {
            return Err(ConfigError::Invalid(format!(
                "terrain.dims[{axis}] = {} exceeds {}",
                self.dims[axis],
                i32::MAX
            )));
        }
        let columns = u64::from(self.dims[0]) * u64::from(self.dims[2]);
        if columns > MAX_TERRAIN_COLUMNS {
            return Err(ConfigError::Invalid(format!(
                "terrain has {columns} columns, at most {MAX_TERRAIN_COLUMNS} are allowed"
            )));
        }
        if self.ground_height > self.dims[1] {
            return Err(ConfigError::Invalid(format!(
                "terrain.ground_height {} exceeds grid height {}",
                self.ground_height, self.dims[1]
            )));
        }
        Ok(())
    }
}

/// Integer cell coordinate in the terrain grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    /// Column index along x
    pub x: i32,
    /// Layer index along y
    pub y: i32,
    /// Column index along z
    pub z: i32,
}

impl CellCoord {
    /// Create a coordinate
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl From<[i32; 3]> for CellCoord {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Occupancy of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainCell {
    /// Nothing to hit
    Empty,
    /// Below the column height
    Ground,
    /// Placed construction block
    Block,
}

impl TerrainCell {
    /// Whether casts stop at this cell
    pub fn is_solid(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// First occupied cell along a ray or sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainHit {
    /// World-space entry point into the cell
    pub point: Vec3,
    /// Distance from the ray origin to `point`
    pub distance: f32,
    /// Coordinate of the cell that was hit
    pub cell: CellCoord,
    /// What occupies the cell
    pub kind: TerrainCell,
}

/// Read-only terrain access used by the cast engine
pub trait TerrainSampler: Send + Sync {
    /// First occupied cell along `origin + dir * [0, max_distance]`.
    ///
    /// `dir` is normalized. A ray starting inside an occupied cell reports
    /// distance 0.
    fn intersect(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<TerrainHit>;

    /// First occupied cell met by a sphere of `radius` swept along the ray.
    ///
    /// The reported point is the sphere center at contact. A zero radius is
    /// the same as [`intersect`](Self::intersect).
    fn intersect_sphere(
        &self,
        origin: Vec3,
        dir: Vec3,
        radius: f32,
        max_distance: f32,
    ) -> Option<TerrainHit>;

    /// Whether any occupied cell overlaps the box (touching counts)
    fn overlaps_box(&self, obb: &OrientedBox) -> bool;
}
