//! Volume shapes attached to entities
//!
//! Shapes are stored in model space (dimensions only) and combined with the
//! volume's center and orientation on demand to produce a [`WorldShape`]
//! for testing.

use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::foundation::math::{ensure_finite, Quat, Vec3};
use crate::spatial::AABB;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::primitives::{BoundingSphere, Capsule, OrientedBox};

/// Shape kind and dimensions of a volume (model space)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeShape {
    /// Sphere around the center
    Sphere {
        /// Sphere radius
        radius: f32,
    },
    /// Box rotated by the volume orientation
    Cuboid {
        /// Half size along each local axis
        half_extents: Vec3,
    },
    /// Capsule whose core segment runs along local +Y
    Capsule {
        /// Radius around the core segment
        radius: f32,
        /// Half length of the core segment
        half_height: f32,
    },
}

impl VolumeShape {
    /// Sphere shape
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Box shape from half extents
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Cuboid { half_extents }
    }

    /// Capsule shape along local Y
    pub fn capsule(radius: f32, half_height: f32) -> Self {
        Self::Capsule { radius, half_height }
    }

    /// Reject negative or non-finite dimensions
    pub fn validate(&self) -> QueryResult<()> {
        let dims_ok = match self {
            Self::Sphere { radius } => radius.is_finite() && *radius >= 0.0,
            Self::Cuboid { half_extents } => half_extents.iter().all(|h| h.is_finite() && *h >= 0.0),
            Self::Capsule { radius, half_height } => {
                radius.is_finite() && *radius >= 0.0 && half_height.is_finite() && *half_height >= 0.0
            }
        };
        if dims_ok {
            Ok(())
        } else {
            Err(QueryError::InvalidArgument(format!(
                "shape dimensions must be finite and non-negative: {self:?}"
            )))
        }
    }

    /// Place the shape in the world
    pub fn to_world_space(&self, center: Vec3, orientation: Quat) -> WorldShape {
        match *self {
            Self::Sphere { radius } => WorldShape::Sphere(BoundingSphere::new(center, radius)),
            Self::Cuboid { half_extents } => {
                WorldShape::Box(OrientedBox::new(center, half_extents, orientation))
            }
            Self::Capsule { radius, half_height } => {
                let axis = orientation * Vec3::new(0.0, half_height, 0.0);
                WorldShape::Capsule(Capsule::new(center - axis, center + axis, radius))
            }
        }
    }
}

/// World-space shape (temporary, for testing only)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldShape {
    /// World-space sphere
    Sphere(BoundingSphere),
    /// World-space oriented box
    Box(OrientedBox),
    /// World-space capsule
    Capsule(Capsule),
}

impl WorldShape {
    /// World-space bounds
    pub fn aabb(&self) -> AABB {
        match self {
            Self::Sphere(sphere) => sphere.aabb(),
            Self::Box(obb) => obb.aabb(),
            Self::Capsule(capsule) => capsule.aabb(),
        }
    }
}

/// Bounding volume of one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Owning entity
    pub entity: Entity,
    /// Shape kind and dimensions
    pub shape: VolumeShape,
    /// World-space center
    pub center: Vec3,
    /// World-space rotation
    pub orientation: Quat,
    /// Tags used by overlap filters
    pub tags: BTreeSet<String>,
}

impl Volume {
    /// Create an untagged, unrotated volume
    pub fn new(entity: Entity, shape: VolumeShape, center: Vec3) -> QueryResult<Self> {
        shape.validate()?;
        ensure_finite(&center, "volume center")?;
        Ok(Self {
            entity,
            shape,
            center,
            orientation: Quat::identity(),
            tags: BTreeSet::new(),
        })
    }

    /// Set the rotation
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Add tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Check whether the volume carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// World-space shape for narrow-phase tests
    pub fn world_shape(&self) -> WorldShape {
        self.shape.to_world_space(self.center, self.orientation)
    }

    /// World-space bounds for the broad phase
    pub fn aabb(&self) -> AABB {
        self.world_shape().aabb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_negative_dimensions_rejected() {
        assert!(Volume::new(Entity::new(1), VolumeShape::sphere(-1.0), Vec3::zeros()).is_err());
        assert!(Volume::new(
            Entity::new(1),
            VolumeShape::cuboid(Vec3::new(1.0, -0.5, 1.0)),
            Vec3::zeros()
        )
        .is_err());
        assert!(Volume::new(Entity::new(1), VolumeShape::capsule(1.0, f32::NAN), Vec3::zeros()).is_err());
    }

    #[test]
    fn test_capsule_world_axis_follows_orientation() {
        let volume = Volume::new(Entity::new(2), VolumeShape::capsule(0.5, 2.0), Vec3::new(1.0, 0.0, 0.0))
            .unwrap()
            .with_orientation(Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_2));

        let WorldShape::Capsule(capsule) = volume.world_shape() else {
            panic!("expected capsule");
        };
        assert_relative_eq!(capsule.a, Vec3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(capsule.b, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);

        let aabb = volume.aabb();
        assert_relative_eq!(aabb.min, Vec3::new(-1.5, -0.5, -0.5), epsilon = 1e-5);
    }

    #[test]
    fn test_tags() {
        let volume = Volume::new(Entity::new(3), VolumeShape::sphere(1.0), Vec3::zeros())
            .unwrap()
            .with_tags(["metal", "door"]);
        assert!(volume.has_tag("metal"));
        assert!(!volume.has_tag("wood"));
    }
}
