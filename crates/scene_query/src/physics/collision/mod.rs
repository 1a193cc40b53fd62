//! Collision geometry and exact intersection tests
//!
//! # Module Organization
//!
//! - [`primitives`] - World-space primitives (rays, spheres, oriented boxes, capsules)
//! - [`shape`] - Model-space volume shapes and the [`Volume`] record
//! - [`narrow_phase`] - Ray, sweep and overlap tests between queries and shapes

pub mod primitives;
pub mod shape;
pub mod narrow_phase;

pub use primitives::{BoundingSphere, Capsule, OrientedBox, Ray};
pub use shape::{Volume, VolumeShape, WorldShape};
