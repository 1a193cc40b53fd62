//! # Scene Query
//!
//! An in-process spatial query engine for game scenes: ray, sphere-sweep and
//! box-overlap casts against moving, rotated entity volumes plus a static
//! voxel terrain.
//!
//! ## Features
//!
//! - **Broad Phase**: Loose octree behind the [`SpatialIndex`](spatial::SpatialIndex) trait
//! - **Narrow Phase**: Exact tests for spheres, oriented boxes and capsules
//! - **Terrain**: Heightfield grid with placed blocks, marched with a 3D DDA
//! - **Cast Modes**: Boolean, closest, and all hits sorted or unsorted
//! - **Frame Sync**: Read-locked snapshots for concurrent queries between updates
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_query::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut world = SpatialWorld::new(SpatialConfig::default())?;
//!     world.store_mut().insert(Volume::new(
//!         Entity::new(1),
//!         VolumeShape::sphere(1.0),
//!         Vec3::new(0.0, 0.0, 5.0),
//!     )?)?;
//!
//!     let ctx = world.context(None);
//!     let hits = ctx.raycast(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), 10.0, true)?;
//!     assert_eq!(hits, vec![Entity::new(1)]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::fn_params_excessive_bools
)]

// Core modules
pub mod core;
pub mod config;
pub mod foundation;

pub mod entity;
pub mod error;
pub mod physics;
pub mod query;
pub mod spatial;
pub mod terrain;
pub mod world;

pub use entity::Entity;
pub use error::{QueryError, QueryResult};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::SpatialConfig,
        entity::Entity,
        error::{QueryError, QueryResult},
        foundation::math::{checked_quat, checked_vec3, Quat, Vec3},
        physics::{Volume, VolumeShape, VolumeStore},
        query::{CastFlags, CastHit, CastMode, CastQuery, CastResult, QueryContext},
        spatial::AABB,
        terrain::{CellCoord, TerrainCell, TerrainConfig, TerrainSampler, VoxelTerrain},
        world::{SceneSnapshot, SharedWorld, SpatialWorld},
    };
}
