//! Query handle exposed to gameplay and script bindings

use crate::entity::Entity;
use crate::error::QueryResult;
use crate::foundation::math::{Quat, Vec3};
use crate::world::SpatialWorld;

use super::cast::{CastFlags, CastMode, CastQuery, CastResult};

/// Queries issued by one caller against one world.
///
/// Passed explicitly wherever queries are made; the caller entity is
/// treated as the source of every cast.
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    world: &'a SpatialWorld,
    caller: Option<Entity>,
}

impl<'a> QueryContext<'a> {
    /// Handle for `caller` (or no entity) on `world`
    pub fn new(world: &'a SpatialWorld, caller: Option<Entity>) -> Self {
        Self { world, caller }
    }

    /// The world being queried
    pub fn world(&self) -> &'a SpatialWorld {
        self.world
    }

    /// Entity issuing the queries
    pub fn caller(&self) -> Option<Entity> {
        self.caller
    }

    /// Entities hit by a ray, never the caller.
    ///
    /// Sorted by distance when `sort_by_distance` is set, otherwise in
    /// discovery order.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        sort_by_distance: bool,
    ) -> QueryResult<Vec<Entity>> {
        let mode = if sort_by_distance {
            CastMode::AllSorted
        } else {
            CastMode::AllUnsorted
        };
        let query = CastQuery::ray(origin, direction, max_distance)
            .with_mode(mode)
            .with_flags(CastFlags::INCLUDE_ACTORS);
        Ok(self.cast(query)?.entities())
    }

    /// Point where a ray first meets the terrain
    pub fn raycast_terrain(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> QueryResult<Option<Vec3>> {
        let query = CastQuery::ray(origin, direction, max_distance)
            .with_mode(CastMode::Closest)
            .with_flags(CastFlags::INCLUDE_TERRAIN);
        Ok(self.cast(query)?.closest().map(|hit| hit.point))
    }

    /// Ray or sphere cast with every option exposed
    pub fn cast_advanced(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        radius: f32,
        mode: CastMode,
        include_actors: bool,
        include_self: bool,
        include_terrain: bool,
    ) -> QueryResult<CastResult> {
        let mut flags = CastFlags::empty();
        flags.set(CastFlags::INCLUDE_ACTORS, include_actors);
        flags.set(CastFlags::INCLUDE_SELF, include_self);
        flags.set(CastFlags::INCLUDE_TERRAIN, include_terrain);

        let query = CastQuery::sphere(origin, direction, max_distance, radius)
            .with_mode(mode)
            .with_flags(flags);
        self.cast(query)
    }

    /// Run a prepared query with the caller as its source
    pub fn cast(&self, mut query: CastQuery) -> QueryResult<CastResult> {
        if query.source.is_none() {
            query.source = self.caller;
        }
        self.world.cast(&query)
    }

    /// Entities whose volumes touch a sphere, optionally only those tagged `tag`
    pub fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        tag: Option<&str>,
    ) -> QueryResult<Vec<Entity>> {
        self.world
            .engine()
            .overlap_sphere(self.world.store(), center, radius, tag)
    }

    /// Whether a box of full extents `size` touches any volume or terrain
    pub fn check_box(&self, center: Vec3, size: Vec3, rotation: Quat) -> QueryResult<bool> {
        self.world
            .engine()
            .check_box(self.world.store(), self.world.terrain(), center, size, rotation)
    }
}
