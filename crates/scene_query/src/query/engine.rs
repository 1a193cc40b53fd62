//! Cast engine
//!
//! Runs a validated cast through the broad phase, the exact per-volume test
//! and the terrain sampler, then shapes the hits by mode. Discovery order is
//! volumes in store insertion order followed by the terrain hit, which makes
//! actors win distance ties in [`CastMode::Closest`].

use crate::core::SpatialConfig;
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::foundation::math::{ensure_finite, Quat, Vec3};
use crate::physics::collision::narrow_phase::{
    box_overlaps_shape, sphere_overlaps_shape, swept_sphere_volume_intersect,
};
use crate::physics::{BoundingSphere, OrientedBox, VolumeStore};
use crate::spatial::AABB;
use crate::terrain::TerrainSampler;

use super::cast::{CastFlags, CastHit, CastMode, CastQuery, CastResult};

/// Executes casts and overlap tests against a store and terrain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastEngine {
    max_cast_distance: f32,
}

impl CastEngine {
    /// Engine clamping every cast to `max_cast_distance`
    pub fn new(max_cast_distance: f32) -> Self {
        Self { max_cast_distance }
    }

    /// Engine using the configured distance limit
    pub fn from_config(config: &SpatialConfig) -> Self {
        Self::new(config.max_cast_distance)
    }

    /// Longest distance any cast is allowed to test
    pub fn max_cast_distance(&self) -> f32 {
        self.max_cast_distance
    }

    /// Run a cast
    pub fn cast(
        &self,
        query: &CastQuery,
        store: &VolumeStore,
        terrain: &dyn TerrainSampler,
    ) -> QueryResult<CastResult> {
        let cast = query.prepare(self.max_cast_distance)?;
        let short_circuit = query.mode == CastMode::Boolean;
        let mut hits = Vec::new();

        if query.flags.contains(CastFlags::INCLUDE_ACTORS) {
            let candidates =
                store.query_segment(cast.origin, cast.direction, cast.max_distance, cast.radius);
            log::trace!(
                "Cast from {:?}: {} broad-phase candidates",
                cast.origin,
                candidates.len()
            );

            for volume in candidates {
                if query.skips(volume.entity) {
                    continue;
                }
                let Some(distance) =
                    swept_sphere_volume_intersect(cast.origin, cast.direction, cast.radius, volume)
                else {
                    continue;
                };
                if distance > cast.max_distance {
                    continue;
                }
                if short_circuit {
                    return Ok(CastResult::Boolean(true));
                }
                hits.push(cast.hit(Some(volume.entity), distance));
            }
        }

        if query.flags.contains(CastFlags::INCLUDE_TERRAIN) {
            if let Some(terrain_hit) =
                terrain.intersect_sphere(cast.origin, cast.direction, cast.radius, cast.max_distance)
            {
                hits.push(cast.hit(None, terrain_hit.distance));
            }
        }

        Ok(Self::aggregate(query.mode, hits))
    }

    fn aggregate(mode: CastMode, mut hits: Vec<CastHit>) -> CastResult {
        match mode {
            CastMode::Boolean => CastResult::Boolean(!hits.is_empty()),
            CastMode::Closest => {
                // Strictly-less keeps the earliest hit on ties
                let closest = hits.into_iter().fold(None, |best: Option<CastHit>, hit| match best {
                    Some(current) if current.distance <= hit.distance => Some(current),
                    _ => Some(hit),
                });
                CastResult::Closest(closest)
            }
            CastMode::AllUnsorted => CastResult::Hits(hits),
            CastMode::AllSorted => {
                hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
                CastResult::Hits(hits)
            }
        }
    }

    /// Entities whose volumes touch the sphere, in store insertion order.
    ///
    /// With a `tag`, only volumes carrying that tag are reported.
    pub fn overlap_sphere(
        &self,
        store: &VolumeStore,
        center: Vec3,
        radius: f32,
        tag: Option<&str>,
    ) -> QueryResult<Vec<Entity>> {
        ensure_finite(&center, "sphere center")?;
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(QueryError::InvalidArgument(format!(
                "sphere radius must be finite and non-negative, got {radius}"
            )));
        }

        let probe = BoundingSphere::new(center, radius);
        let region = AABB::from_center_extents(center, Vec3::repeat(radius));
        let candidates = store.query(&region);
        log::trace!("Sphere overlap: {} broad-phase candidates", candidates.len());

        Ok(candidates
            .into_iter()
            .filter(|volume| tag.map_or(true, |tag| volume.has_tag(tag)))
            .filter(|volume| sphere_overlaps_shape(&probe, &volume.world_shape()))
            .map(|volume| volume.entity)
            .collect())
    }

    /// Whether an oriented box of full extents `size` touches any volume or
    /// occupied terrain cell
    pub fn check_box(
        &self,
        store: &VolumeStore,
        terrain: &dyn TerrainSampler,
        center: Vec3,
        size: Vec3,
        rotation: Quat,
    ) -> QueryResult<bool> {
        ensure_finite(&center, "box center")?;
        ensure_finite(&size, "box size")?;
        if size.iter().any(|&s| s < 0.0) {
            return Err(QueryError::InvalidArgument(format!(
                "box size must be non-negative, got {size:?}"
            )));
        }

        let probe = OrientedBox::new(center, size * 0.5, rotation);
        let hit_volume = store
            .query(&probe.aabb())
            .into_iter()
            .any(|volume| box_overlaps_shape(&probe, &volume.world_shape()));

        Ok(hit_volume || terrain.overlaps_box(&probe))
    }
}
