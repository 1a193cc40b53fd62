//! Physics module for volume storage and intersection tests
//!
//! Holds the per-entity bounding volumes, the broad-phase backed store that
//! owns them, and the exact narrow-phase routines used by casts.

pub mod collision;
pub mod volume_store;

pub use collision::{
    BoundingSphere,
    Capsule,
    OrientedBox,
    Ray,
    Volume,
    VolumeShape,
    WorldShape,
};
pub use volume_store::{SyncStats, VolumeStore};
