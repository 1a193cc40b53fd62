//! Heightfield voxel terrain
//!
//! Ray casts walk the grid with a 3D DDA: clip the ray to the grid bounds,
//! find the entry cell, then repeatedly step across whichever cell boundary
//! the ray reaches next. Cells are half-open, so a ray running exactly along
//! the top face of the ground belongs to the empty layer above it.

use super::{CellCoord, TerrainCell, TerrainConfig, TerrainHit, TerrainSampler};
use crate::config::ConfigError;
use crate::error::{QueryError, QueryResult};
use crate::foundation::math::Vec3;
use crate::physics::collision::narrow_phase::swept_sphere_shape_intersect;
use crate::physics::{OrientedBox, WorldShape};
use crate::spatial::AABB;
use std::collections::HashMap;

/// Terrain grid of `dims` cubic cells
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelTerrain {
    origin: Vec3,
    cell_size: f32,
    dims: [u32; 3],
    /// Column heights in cells, indexed `x + z * nx`
    heights: Vec<u32>,
    /// Cells that differ from the heightfield
    overrides: HashMap<CellCoord, TerrainCell>,
}

impl Default for VoxelTerrain {
    fn default() -> Self {
        Self {
            origin: Vec3::zeros(),
            cell_size: 1.0,
            dims: [0, 0, 0],
            heights: Vec::new(),
            overrides: HashMap::new(),
        }
    }
}

impl VoxelTerrain {
    /// Build the grid described by `config`
    pub fn from_config(config: &TerrainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let columns = config.dims[0] as usize * config.dims[2] as usize;
        Ok(Self {
            origin: Vec3::from(config.origin),
            cell_size: config.cell_size,
            dims: config.dims,
            heights: vec![config.ground_height; columns],
            overrides: HashMap::new(),
        })
    }

    /// World position of the minimum grid corner
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Edge length of one cell
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of cells along each axis
    pub fn dims(&self) -> [u32; 3] {
        self.dims
    }

    /// True if the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    /// World-space bounds of the whole grid
    pub fn bounds(&self) -> AABB {
        let size = Vec3::new(self.dims[0] as f32, self.dims[1] as f32, self.dims[2] as f32);
        AABB::new(self.origin, self.origin + size * self.cell_size)
    }

    /// World-space bounds of one cell
    pub fn cell_bounds(&self, coord: CellCoord) -> AABB {
        let min = self.origin
            + Vec3::new(coord.x as f32, coord.y as f32, coord.z as f32) * self.cell_size;
        AABB::new(min, min + Vec3::repeat(self.cell_size))
    }

    /// Whether `coord` lies inside the grid
    pub fn contains(&self, coord: CellCoord) -> bool {
        let in_range = |value: i32, len: u32| value >= 0 && (value as u32) < len;
        in_range(coord.x, self.dims[0]) && in_range(coord.y, self.dims[1]) && in_range(coord.z, self.dims[2])
    }

    /// Occupancy of a cell
    pub fn cell(&self, coord: CellCoord) -> QueryResult<TerrainCell> {
        self.ensure_in_grid(coord)?;
        Ok(self.cell_at(coord))
    }

    /// Height of the column at `(x, z)` in cells
    pub fn column_height(&self, x: i32, z: i32) -> QueryResult<u32> {
        self.ensure_in_grid(CellCoord::new(x, 0, z))?;
        Ok(self.heights[self.column_index(x, z)])
    }

    /// Change the height of one column. Placed blocks and carved cells stay.
    pub fn set_column_height(&mut self, x: i32, z: i32, height: u32) -> QueryResult<()> {
        self.ensure_in_grid(CellCoord::new(x, 0, z))?;
        if height > self.dims[1] {
            return Err(QueryError::InvalidArgument(format!(
                "column height {height} exceeds grid height {}",
                self.dims[1]
            )));
        }
        let index = self.column_index(x, z);
        self.heights[index] = height;
        Ok(())
    }

    /// Put a construction block into a cell
    pub fn place_block(&mut self, coord: CellCoord) -> QueryResult<()> {
        self.ensure_in_grid(coord)?;
        self.set_override(coord, TerrainCell::Block);
        Ok(())
    }

    /// Take a construction block out of a cell, leaving it empty
    pub fn remove_block(&mut self, coord: CellCoord) -> QueryResult<()> {
        self.ensure_in_grid(coord)?;
        if self.cell_at(coord) != TerrainCell::Block {
            return Err(QueryError::InvalidArgument(format!(
                "no block at terrain cell {coord}"
            )));
        }
        self.set_override(coord, TerrainCell::Empty);
        Ok(())
    }

    /// Empty a cell whatever it holds
    pub fn carve(&mut self, coord: CellCoord) -> QueryResult<()> {
        self.ensure_in_grid(coord)?;
        self.set_override(coord, TerrainCell::Empty);
        Ok(())
    }

    /// Number of placed blocks
    pub fn block_count(&self) -> usize {
        self.overrides
            .values()
            .filter(|&&cell| cell == TerrainCell::Block)
            .count()
    }

    fn ensure_in_grid(&self, coord: CellCoord) -> QueryResult<()> {
        if self.contains(coord) {
            Ok(())
        } else {
            Err(QueryError::InvalidArgument(format!(
                "terrain cell {coord} is outside the {:?} grid",
                self.dims
            )))
        }
    }

    fn column_index(&self, x: i32, z: i32) -> usize {
        x as usize + z as usize * self.dims[0] as usize
    }

    fn base_cell(&self, coord: CellCoord) -> TerrainCell {
        if (coord.y as u32) < self.heights[self.column_index(coord.x, coord.z)] {
            TerrainCell::Ground
        } else {
            TerrainCell::Empty
        }
    }

    /// Occupancy of an in-grid cell
    fn cell_at(&self, coord: CellCoord) -> TerrainCell {
        self.overrides
            .get(&coord)
            .copied()
            .unwrap_or_else(|| self.base_cell(coord))
    }

    fn set_override(&mut self, coord: CellCoord, cell: TerrainCell) {
        if self.base_cell(coord) == cell {
            self.overrides.remove(&coord);
        } else {
            self.overrides.insert(coord, cell);
        }
    }

    /// Inclusive range of in-grid cells that overlap or touch `region`
    fn cell_range(&self, region: &AABB) -> Option<([i32; 3], [i32; 3])> {
        let mut lo = [0_i32; 3];
        let mut hi = [0_i32; 3];
        for axis in 0..3 {
            let min = (region.min[axis] - self.origin[axis]) / self.cell_size;
            let max = (region.max[axis] - self.origin[axis]) / self.cell_size;
            lo[axis] = (min.ceil() as i32).saturating_sub(1).max(0);
            hi[axis] = (max.floor() as i32).min(self.dims[axis] as i32 - 1);
            if lo[axis] > hi[axis] {
                return None;
            }
        }
        Some((lo, hi))
    }

    fn solid_cells_in(&self, region: &AABB) -> impl Iterator<Item = CellCoord> + '_ {
        self.cell_range(region)
            .into_iter()
            .flat_map(|(lo, hi)| {
                (lo[0]..=hi[0]).flat_map(move |x| {
                    (lo[2]..=hi[2])
                        .flat_map(move |z| (lo[1]..=hi[1]).map(move |y| CellCoord::new(x, y, z)))
                })
            })
            .filter(|&coord| self.cell_at(coord).is_solid())
    }
}

impl TerrainSampler for VoxelTerrain {
    fn intersect(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<TerrainHit> {
        if self.is_empty() || max_distance <= 0.0 {
            return None;
        }
        let (t_enter, t_exit) = self.bounds().clip_segment(origin, dir, max_distance)?;

        let entry = (origin + dir * t_enter - self.origin) / self.cell_size;
        let mut cell = [0_i32; 3];
        let mut step = [0_i32; 3];
        let mut t_next = [f32::INFINITY; 3];
        let mut t_delta = [f32::INFINITY; 3];

        for axis in 0..3 {
            let len = self.dims[axis] as i32;
            let raw = entry[axis].floor() as i32;
            let d = dir[axis];

            // On the far face of the grid and leaving (or running along it)
            if (d >= 0.0 && raw >= len) || (d < 0.0 && entry[axis] <= 0.0) {
                return None;
            }
            cell[axis] = raw.clamp(0, len - 1);

            if d > 0.0 {
                step[axis] = 1;
                let boundary = self.origin[axis] + (cell[axis] + 1) as f32 * self.cell_size;
                t_next[axis] = (boundary - origin[axis]) / d;
                t_delta[axis] = self.cell_size / d;
            } else if d < 0.0 {
                step[axis] = -1;
                let boundary = self.origin[axis] + cell[axis] as f32 * self.cell_size;
                t_next[axis] = (boundary - origin[axis]) / d;
                t_delta[axis] = -self.cell_size / d;
            }
        }

        let max_steps = self.dims.iter().map(|&d| d as usize).sum::<usize>() + 1;
        let mut t = t_enter;
        for _ in 0..max_steps {
            let coord = CellCoord::new(cell[0], cell[1], cell[2]);
            let kind = self.cell_at(coord);
            if kind.is_solid() {
                return Some(TerrainHit {
                    point: origin + dir * t,
                    distance: t,
                    cell: coord,
                    kind,
                });
            }

            let t_min = t_next[0].min(t_next[1]).min(t_next[2]);
            if t_min > t_exit {
                return None;
            }
            t = t_min;

            // Crossing an edge or corner exactly steps every axis at once so
            // cells the ray only touches are skipped
            for axis in 0..3 {
                if t_next[axis] == t_min {
                    cell[axis] += step[axis];
                    if cell[axis] < 0 || cell[axis] >= self.dims[axis] as i32 {
                        return None;
                    }
                    t_next[axis] += t_delta[axis];
                }
            }
        }

        None
    }

    fn intersect_sphere(
        &self,
        origin: Vec3,
        dir: Vec3,
        radius: f32,
        max_distance: f32,
    ) -> Option<TerrainHit> {
        if radius <= 0.0 {
            return self.intersect(origin, dir, max_distance);
        }
        if self.is_empty() || max_distance <= 0.0 {
            return None;
        }

        // Each solid cell swept by the sphere is a rounded box around the center ray
        let region = AABB::from_segment(origin, dir, max_distance, radius);
        let mut best: Option<TerrainHit> = None;
        for coord in self.solid_cells_in(&region) {
            let cell = WorldShape::Box(OrientedBox::from_aabb(&self.cell_bounds(coord)));
            let Some(distance) = swept_sphere_shape_intersect(origin, dir, radius, &cell) else {
                continue;
            };
            if distance > max_distance || best.is_some_and(|hit| hit.distance <= distance) {
                continue;
            }
            best = Some(TerrainHit {
                point: origin + dir * distance,
                distance,
                cell: coord,
                kind: self.cell_at(coord),
            });
        }
        best
    }

    fn overlaps_box(&self, obb: &OrientedBox) -> bool {
        if self.is_empty() {
            return false;
        }
        self.solid_cells_in(&obb.aabb())
            .any(|coord| OrientedBox::from_aabb(&self.cell_bounds(coord)).intersects(obb))
    }
}
