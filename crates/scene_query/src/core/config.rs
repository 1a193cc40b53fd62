//! # Spatial Configuration
//!
//! Tunables for the query engine, loadable from TOML or RON through the
//! [`Config`] trait. Every field has a default so partial files work.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec3;
use crate::spatial::{OctreeConfig, AABB};
use crate::terrain::TerrainConfig;

/// Configuration for a [`SpatialWorld`](crate::world::SpatialWorld)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Minimum corner of the region indexed by the octree
    pub world_min: [f32; 3],
    /// Maximum corner of the region indexed by the octree
    pub world_max: [f32; 3],
    /// Upper bound applied to every cast distance
    pub max_cast_distance: f32,
    /// Octree subdivision tuning
    pub octree: OctreeConfig,
    /// Terrain grid layout
    pub terrain: TerrainConfig,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            world_min: [-512.0, -512.0, -512.0],
            world_max: [512.0, 512.0, 512.0],
            max_cast_distance: 4096.0,
            octree: OctreeConfig::default(),
            terrain: TerrainConfig::default(),
        }
    }
}

impl Config for SpatialConfig {}

impl SpatialConfig {
    /// World bounds as an AABB
    pub fn world_bounds(&self) -> AABB {
        AABB::new(Vec3::from(self.world_min), Vec3::from(self.world_max))
    }

    /// Set the indexed world region
    pub fn with_world_bounds(mut self, min: Vec3, max: Vec3) -> Self {
        self.world_min = [min.x, min.y, min.z];
        self.world_max = [max.x, max.y, max.z];
        self
    }

    /// Set the terrain layout
    pub fn with_terrain(mut self, terrain: TerrainConfig) -> Self {
        self.terrain = terrain;
        self
    }

    /// Set the cast distance limit
    pub fn with_max_cast_distance(mut self, distance: f32) -> Self {
        self.max_cast_distance = distance;
        self
    }

    /// Check that the values describe a usable world
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = self.world_bounds();
        if !(0..3).all(|axis| bounds.min[axis] < bounds.max[axis]) {
            return Err(ConfigError::Invalid(format!(
                "world_min {:?} must be below world_max {:?}",
                self.world_min, self.world_max
            )));
        }
        if !(self.max_cast_distance.is_finite() && self.max_cast_distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_cast_distance must be positive, got {}",
                self.max_cast_distance
            )));
        }
        if self.octree.max_entities_per_node == 0 {
            return Err(ConfigError::Invalid(
                "octree.max_entities_per_node must be at least 1".to_string(),
            ));
        }
        self.terrain.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SpatialConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SpatialConfig::from_toml_str(
            r#"
            max_cast_distance = 250.0

            [octree]
            max_depth = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.max_cast_distance, 250.0);
        assert_eq!(config.octree.max_depth, 4);
        assert_eq!(config.octree.max_entities_per_node, OctreeConfig::default().max_entities_per_node);
        assert_eq!(config.world_min, SpatialConfig::default().world_min);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SpatialConfig::default().with_max_cast_distance(99.0);
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = SpatialConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_ron_config() {
        let config = SpatialConfig::from_ron_str("(max_cast_distance: 12.5)").unwrap();
        assert_eq!(config.max_cast_distance, 12.5);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = SpatialConfig::default()
            .with_world_bounds(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 10.0, 10.0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
