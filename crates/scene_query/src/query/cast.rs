//! Cast request and result types

use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::foundation::math::{ensure_finite, normalize_direction, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the hits of a cast are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastMode {
    /// Whether anything was hit
    Boolean,
    /// Nearest hit only
    Closest,
    /// Every hit in discovery order
    AllUnsorted,
    /// Every hit by ascending distance
    AllSorted,
}

impl CastMode {
    /// Integer code used by script bindings
    pub const fn code(self) -> i32 {
        match self {
            Self::Boolean => 0,
            Self::Closest => 1,
            Self::AllUnsorted => 2,
            Self::AllSorted => 3,
        }
    }

    /// Canonical name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Closest => "closest",
            Self::AllUnsorted => "all_unsorted",
            Self::AllSorted => "all_sorted",
        }
    }
}

impl fmt::Display for CastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CastMode {
    type Err = QueryError;

    /// Accepts the canonical names in any case, with `-` or `_` separators
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "boolean" => Ok(Self::Boolean),
            "closest" => Ok(Self::Closest),
            "all_unsorted" => Ok(Self::AllUnsorted),
            "all_sorted" => Ok(Self::AllSorted),
            _ => Err(QueryError::InvalidMode(s.to_string())),
        }
    }
}

impl TryFrom<i32> for CastMode {
    type Error = QueryError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Boolean),
            1 => Ok(Self::Closest),
            2 => Ok(Self::AllUnsorted),
            3 => Ok(Self::AllSorted),
            other => Err(QueryError::InvalidMode(other.to_string())),
        }
    }
}

/// What a cast is tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastFlags(u8);

bitflags::bitflags! {
    impl CastFlags: u8 {
        /// Test entity volumes
        const INCLUDE_ACTORS = 1 << 0;
        /// Keep the query source among the candidates
        const INCLUDE_SELF = 1 << 1;
        /// Test the terrain grid
        const INCLUDE_TERRAIN = 1 << 2;
    }
}

impl Default for CastFlags {
    fn default() -> Self {
        Self::INCLUDE_ACTORS
    }
}

/// A ray or sphere sweep request
#[derive(Debug, Clone, PartialEq)]
pub struct CastQuery {
    /// Start of the cast
    pub origin: Vec3,
    /// Cast direction, any non-zero length
    pub direction: Vec3,
    /// Farthest distance tested
    pub max_distance: f32,
    /// Radius of the swept sphere, 0 for a ray
    pub radius: f32,
    /// How hits are reported
    pub mode: CastMode,
    /// What is tested
    pub flags: CastFlags,
    /// Entity issuing the cast; skipped unless [`CastFlags::INCLUDE_SELF`] is set
    pub source: Option<Entity>,
    /// Entity that is always skipped
    pub exclude: Option<Entity>,
}

impl CastQuery {
    /// Ray reporting the closest actor hit
    pub fn ray(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction,
            max_distance,
            radius: 0.0,
            mode: CastMode::Closest,
            flags: CastFlags::default(),
            source: None,
            exclude: None,
        }
    }

    /// Sphere sweep reporting the closest actor hit
    pub fn sphere(origin: Vec3, direction: Vec3, max_distance: f32, radius: f32) -> Self {
        Self {
            radius,
            ..Self::ray(origin, direction, max_distance)
        }
    }

    /// Set the reporting mode
    pub fn with_mode(mut self, mode: CastMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the flags
    pub fn with_flags(mut self, flags: CastFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the issuing entity
    pub fn from_source(mut self, source: Entity) -> Self {
        self.source = Some(source);
        self
    }

    /// Always skip `entity`
    pub fn excluding(mut self, entity: Entity) -> Self {
        self.exclude = Some(entity);
        self
    }

    /// Whether `entity` is dropped from the candidates
    pub fn skips(&self, entity: Entity) -> bool {
        self.exclude == Some(entity)
            || (self.source == Some(entity) && !self.flags.contains(CastFlags::INCLUDE_SELF))
    }

    /// Check the geometry and produce normalized parameters
    pub(crate) fn prepare(&self, distance_limit: f32) -> QueryResult<PreparedCast> {
        ensure_finite(&self.origin, "cast origin")?;
        let direction = normalize_direction(&self.direction)?;
        if self.max_distance.is_nan() || self.max_distance <= 0.0 {
            return Err(QueryError::InvalidArgument(format!(
                "max distance must be positive, got {}",
                self.max_distance
            )));
        }
        if !(self.radius.is_finite() && self.radius >= 0.0) {
            return Err(QueryError::InvalidArgument(format!(
                "cast radius must be finite and non-negative, got {}",
                self.radius
            )));
        }

        let mut max_distance = self.max_distance;
        if max_distance > distance_limit {
            log::debug!(
                "Cast distance {} clamped to limit {}",
                max_distance,
                distance_limit
            );
            max_distance = distance_limit;
        }

        Ok(PreparedCast {
            origin: self.origin,
            direction,
            max_distance,
            radius: self.radius,
        })
    }
}

/// Validated cast parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PreparedCast {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
    pub radius: f32,
}

impl PreparedCast {
    pub fn hit(&self, entity: Option<Entity>, distance: f32) -> CastHit {
        CastHit {
            entity,
            distance,
            point: self.origin + self.direction * distance,
        }
    }
}

/// One intersection found by a cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    /// Entity hit, `None` for terrain
    pub entity: Option<Entity>,
    /// Distance along the cast direction from the origin
    pub distance: f32,
    /// Position of the cast center at `distance`
    pub point: Vec3,
}

impl CastHit {
    /// Whether this hit is the terrain
    pub fn is_terrain(&self) -> bool {
        self.entity.is_none()
    }
}

/// Output of a cast, shaped by its [`CastMode`]
#[derive(Debug, Clone, PartialEq)]
pub enum CastResult {
    /// Result of [`CastMode::Boolean`]
    Boolean(bool),
    /// Result of [`CastMode::Closest`]
    Closest(Option<CastHit>),
    /// Result of [`CastMode::AllUnsorted`] and [`CastMode::AllSorted`]
    Hits(Vec<CastHit>),
}

impl CastResult {
    /// Whether anything was hit
    pub fn is_hit(&self) -> bool {
        match self {
            Self::Boolean(hit) => *hit,
            Self::Closest(hit) => hit.is_some(),
            Self::Hits(hits) => !hits.is_empty(),
        }
    }

    /// Reported hits; empty for boolean results
    pub fn hits(&self) -> &[CastHit] {
        match self {
            Self::Boolean(_) | Self::Closest(None) => &[],
            Self::Closest(Some(hit)) => std::slice::from_ref(hit),
            Self::Hits(hits) => hits,
        }
    }

    /// Nearest reported hit
    pub fn closest(&self) -> Option<&CastHit> {
        self.hits().iter().min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Entities of the reported hits in result order, terrain skipped
    pub fn entities(&self) -> Vec<Entity> {
        self.hits().iter().filter_map(|hit| hit.entity).collect()
    }
}
