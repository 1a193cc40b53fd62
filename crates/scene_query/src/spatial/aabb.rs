//! Axis-aligned bounding boxes

use crate::foundation::math::Vec3;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Bounds of the segment `origin + dir * [0, length]`, grown by `inflate` on every side
    pub fn from_segment(origin: Vec3, dir: Vec3, length: f32, inflate: f32) -> Self {
        let end = origin + dir * length;
        let pad = Vec3::repeat(inflate);
        Self {
            min: origin.inf(&end) - pad,
            max: origin.sup(&end) + pad,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Grow the box by `amount` on every side
    pub fn expanded(&self, amount: f32) -> Self {
        let pad = Vec3::repeat(amount);
        Self::new(self.min - pad, self.max + pad)
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Squared distance from a point to the box (0 inside)
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        let closest = point.sup(&self.min).inf(&self.max);
        (closest - point).norm_squared()
    }

    /// Clip the segment `origin + dir * [0, max_t]` against this box using the slab method.
    ///
    /// Returns the `(entry, exit)` parameters of the clipped segment. Axes where
    /// the direction is zero are handled explicitly so no NaN enters the
    /// min/max chain.
    pub fn clip_segment(&self, origin: Vec3, dir: Vec3, max_t: f32) -> Option<(f32, f32)> {
        let mut t_enter = 0.0_f32;
        let mut t_exit = max_t;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            if d == 0.0 {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (self.min[axis] - o) * inv;
            let mut t1 = (self.max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        Some((t_enter, t_exit))
    }

    /// Test ray intersection with this AABB
    /// Returns the distance to the entry point (0 if the origin is inside)
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        self.clip_segment(ray_origin, ray_dir, f32::INFINITY)
            .map(|(entry, _)| entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> AABB {
        AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_clip_segment_hits_front_face() {
        let (entry, exit) = unit_box()
            .clip_segment(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), 10.0)
            .unwrap();
        assert_eq!(entry, 4.0);
        assert_eq!(exit, 6.0);
    }

    #[test]
    fn test_clip_segment_too_short() {
        assert!(unit_box()
            .clip_segment(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), 3.0)
            .is_none());
    }

    #[test]
    fn test_parallel_ray_outside_slab_misses() {
        assert!(unit_box()
            .intersect_ray(Vec3::new(0.0, 2.0, -5.0), Vec3::new(0.0, 0.0, 1.0))
            .is_none());
    }

    #[test]
    fn test_origin_inside_reports_zero() {
        assert_eq!(unit_box().intersect_ray(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0)), Some(0.0));
    }

    #[test]
    fn test_from_segment_inflated() {
        let aabb = AABB::from_segment(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), 4.0, 0.5);
        assert_eq!(aabb.min, Vec3::new(-0.5, -0.5, -4.5));
        assert_eq!(aabb.max, Vec3::new(0.5, 0.5, 0.5));
    }
}
