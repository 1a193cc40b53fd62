//! Spatial partitioning data structures
//!
//! Provides the broad-phase index used to shrink candidate sets before
//! exact intersection tests.

mod aabb;
mod octree;
pub mod spatial_query;

pub use aabb::AABB;
pub use octree::{Octree, OctreeConfig, OctreeEntry, OctreeNode};
pub use spatial_query::{OctreeSpatialIndex, SpatialIndex};
