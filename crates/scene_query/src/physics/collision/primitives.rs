//! Primitive collision shapes and intersection algorithms
//!
//! Provides world-space primitives (rays, spheres, oriented boxes, capsules)
//! with exact ray and overlap tests. Ray tests return the distance along a
//! normalized direction; grazing contact is reported as a miss.

use crate::foundation::math::{Quat, Vec3};
use crate::spatial::AABB;

/// Squared-discriminant tolerance, relative to radius², under which a ray is considered tangent
pub const TANGENT_EPSILON: f32 = 1.0e-6;

/// Minimum entry/exit separation for a slab hit to count
pub const GRAZE_EPSILON: f32 = 1.0e-6;

/// A ray for ray casting
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }
}

/// A bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere intersects with another (touching counts)
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).norm_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// World-space bounds
    pub fn aabb(&self) -> AABB {
        AABB::from_center_extents(self.center, Vec3::repeat(self.radius))
    }

    /// Distance along the ray to the first surface point.
    ///
    /// Returns 0 when the origin is inside; tangent rays and zero-radius
    /// spheres miss.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        if self.radius <= 0.0 {
            return None;
        }

        // Solve |origin + t*direction - center|^2 = radius^2 with |direction| = 1
        let oc = ray.origin - self.center;
        let b = oc.dot(&ray.direction);
        let radius_sq = self.radius * self.radius;
        let c = oc.norm_squared() - radius_sq;

        if c < 0.0 {
            return Some(0.0);
        }
        if b > 0.0 {
            return None; // Outside and pointing away
        }

        let discriminant = b * b - c;
        if discriminant <= TANGENT_EPSILON * radius_sq {
            return None;
        }

        Some((-b - discriminant.sqrt()).max(0.0))
    }
}

/// An oriented box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Center in world space
    pub center: Vec3,
    /// Half size along each local axis
    pub half_extents: Vec3,
    /// Rotation from local to world space
    pub orientation: Quat,
}

impl OrientedBox {
    /// Creates a new oriented box
    pub fn new(center: Vec3, half_extents: Vec3, orientation: Quat) -> Self {
        Self {
            center,
            half_extents,
            orientation,
        }
    }

    /// Box with identity rotation covering an AABB
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self::new(aabb.center(), aabb.extents(), Quat::identity())
    }

    /// Local axes in world space (columns of the rotation)
    pub fn axes(&self) -> [Vec3; 3] {
        [
            self.orientation * Vec3::x(),
            self.orientation * Vec3::y(),
            self.orientation * Vec3::z(),
        ]
    }

    /// Transform a world point into box-local coordinates
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.orientation.inverse_transform_vector(&(point - self.center))
    }

    /// World-space bounds
    pub fn aabb(&self) -> AABB {
        let rotation = self.orientation.to_rotation_matrix();
        let extents = rotation.matrix().abs() * self.half_extents;
        AABB::from_center_extents(self.center, extents)
    }

    /// Closest point on or in the box to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let local = self.to_local(point);
        let clamped = local.sup(&(-self.half_extents)).inf(&self.half_extents);
        self.center + self.orientation * clamped
    }

    /// Squared distance from `point` to the box (0 inside)
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        (self.closest_point(point) - point).norm_squared()
    }

    /// Slab test in box-local space.
    ///
    /// Returns 0 when the origin is strictly inside, a miss for grazing
    /// contact along an edge, face or zero-thickness axis.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let origin = self.to_local(ray.origin);
        let dir = self.orientation.inverse_transform_vector(&ray.direction);
        local_slab(origin, dir, self.half_extents)
    }

    /// Separating axis test against another oriented box (touching counts)
    pub fn intersects(&self, other: &OrientedBox) -> bool {
        const EPSILON: f32 = 1.0e-6;

        let a = self.axes();
        let b = other.axes();
        let ea = self.half_extents;
        let eb = other.half_extents;

        // Rotation expressing `other` in `self`'s frame
        let mut r = [[0.0_f32; 3]; 3];
        let mut abs_r = [[0.0_f32; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                r[i][j] = a[i].dot(&b[j]);
                abs_r[i][j] = r[i][j].abs() + EPSILON;
            }
        }

        let d = other.center - self.center;
        let t = [d.dot(&a[0]), d.dot(&a[1]), d.dot(&a[2])];

        // Face axes of self
        for i in 0..3 {
            let rb = eb[0] * abs_r[i][0] + eb[1] * abs_r[i][1] + eb[2] * abs_r[i][2];
            if t[i].abs() > ea[i] + rb {
                return false;
            }
        }

        // Face axes of other
        for j in 0..3 {
            let ra = ea[0] * abs_r[0][j] + ea[1] * abs_r[1][j] + ea[2] * abs_r[2][j];
            let tj = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
            if tj.abs() > ra + eb[j] {
                return false;
            }
        }

        // Edge-edge cross products
        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3 {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let ra = ea[i1] * abs_r[i2][j] + ea[i2] * abs_r[i1][j];
                let rb = eb[j1] * abs_r[i][j2] + eb[j2] * abs_r[i][j1];
                let tl = t[i2] * r[i1][j] - t[i1] * r[i2][j];
                if tl.abs() > ra + rb {
                    return false;
                }
            }
        }

        true
    }

    /// The 12 edges in box-local coordinates
    pub fn local_edges(half_extents: Vec3) -> [(Vec3, Vec3); 12] {
        let mut edges = [(Vec3::zeros(), Vec3::zeros()); 12];
        let mut n = 0;
        for axis in 0..3 {
            let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
                let mut start = Vec3::zeros();
                start[u] = su * half_extents[u];
                start[v] = sv * half_extents[v];
                let mut end = start;
                start[axis] = -half_extents[axis];
                end[axis] = half_extents[axis];
                edges[n] = (start, end);
                n += 1;
            }
        }
        edges
    }
}

/// Slab test against a box centered at the origin of its own frame
pub(crate) fn local_slab(origin: Vec3, dir: Vec3, half_extents: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        let h = half_extents[axis];

        if d.abs() < 1.0e-12 {
            // Parallel to this slab: must be strictly between the planes
            if o.abs() >= h {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let t0 = (-h - o) * inv;
        let t1 = (h - o) * inv;
        t_min = t_min.max(t0.min(t1));
        t_max = t_max.min(t0.max(t1));
    }

    if t_max < 0.0 || t_max - t_min <= GRAZE_EPSILON {
        return None;
    }

    Some(t_min.max(0.0))
}

/// A capsule: all points within `radius` of the segment `a`-`b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    /// First segment endpoint
    pub a: Vec3,
    /// Second segment endpoint
    pub b: Vec3,
    /// Radius around the segment
    pub radius: f32,
}

impl Capsule {
    /// Creates a new capsule
    pub fn new(a: Vec3, b: Vec3, radius: f32) -> Self {
        Self { a, b, radius }
    }

    /// World-space bounds
    pub fn aabb(&self) -> AABB {
        let pad = Vec3::repeat(self.radius);
        AABB::new(self.a.inf(&self.b) - pad, self.a.sup(&self.b) + pad)
    }

    /// Squared distance from `point` to the core segment
    pub fn segment_distance_squared(&self, point: Vec3) -> f32 {
        (closest_point_on_segment(self.a, self.b, point) - point).norm_squared()
    }

    /// Distance along the ray to the capsule surface (0 if the origin is inside)
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        if self.radius <= 0.0 {
            return None;
        }
        let radius_sq = self.radius * self.radius;
        if self.segment_distance_squared(ray.origin) < radius_sq {
            return Some(0.0);
        }

        let ba = self.b - self.a;
        let oa = ray.origin - self.a;
        let baba = ba.norm_squared();
        let mut best: Option<f32> = None;

        if baba > f32::EPSILON {
            // Infinite cylinder around the segment, restricted to the segment's span
            let bard = ba.dot(&ray.direction);
            let baoa = ba.dot(&oa);
            let rdoa = ray.direction.dot(&oa);
            let oaoa = oa.norm_squared();

            let qa = baba - bard * bard;
            let qb = baba * rdoa - baoa * bard;
            let qc = baba * oaoa - baoa * baoa - radius_sq * baba;
            let h = qb * qb - qa * qc;

            if qa > f32::EPSILON && h > TANGENT_EPSILON * radius_sq * baba * baba {
                let t = (-qb - h.sqrt()) / qa;
                let y = baoa + t * bard;
                if t >= 0.0 && y > 0.0 && y < baba {
                    best = Some(t);
                }
            }
        }

        for cap in [self.a, self.b] {
            if let Some(t) = BoundingSphere::new(cap, self.radius).intersect_ray(ray) {
                best = Some(best.map_or(t, |current| current.min(t)));
            }
        }

        best
    }
}

/// Closest point on segment `a`-`b` to `point`
pub fn closest_point_on_segment(a: Vec3, b: Vec3, point: Vec3) -> Vec3 {
    let ab = b - a;
    let length_sq = ab.norm_squared();
    if length_sq <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(&ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Smallest squared distance between segment `a`-`b` and an oriented box.
///
/// The distance to a convex set is convex along a line, so a golden-section
/// search over the segment parameter converges to the minimum.
pub fn segment_box_distance_squared(a: Vec3, b: Vec3, obb: &OrientedBox) -> f32 {
    const ITERATIONS: usize = 48;
    let inv_phi = (5.0_f32.sqrt() - 1.0) * 0.5;
    let f = |t: f32| obb.distance_squared_to_point(a + (b - a) * t);

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    let mut x1 = hi - inv_phi * (hi - lo);
    let mut x2 = lo + inv_phi * (hi - lo);
    let (mut f1, mut f2) = (f(x1), f(x2));

    for _ in 0..ITERATIONS {
        if f1 <= f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - inv_phi * (hi - lo);
            f1 = f(x1);
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + inv_phi * (hi - lo);
            f2 = f(x2);
        }
    }

    f(0.0).min(f(1.0)).min(f1).min(f2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::abs3;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_4;

    fn forward_ray(origin: Vec3) -> Ray {
        Ray::new(origin, Vec3::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn test_sphere_hit_distance() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0);
        let t = sphere.intersect_ray(&forward_ray(Vec3::zeros())).unwrap();
        assert_relative_eq!(t, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_tangent_is_miss() {
        let sphere = BoundingSphere::new(Vec3::new(1.0, 0.0, 5.0), 1.0);
        assert!(sphere.intersect_ray(&forward_ray(Vec3::zeros())).is_none());
    }

    #[test]
    fn test_zero_radius_sphere_is_miss() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, 5.0), 0.0);
        assert!(sphere.intersect_ray(&forward_ray(Vec3::zeros())).is_none());
    }

    #[test]
    fn test_sphere_behind_origin_is_miss() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0);
        assert!(sphere.intersect_ray(&forward_ray(Vec3::zeros())).is_none());
    }

    #[test]
    fn test_origin_inside_sphere() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 2.0);
        assert_eq!(sphere.intersect_ray(&forward_ray(Vec3::zeros())), Some(0.0));
    }

    #[test]
    fn test_rotated_box_hit() {
        // 45 degrees about Y: the face toward -Z becomes an edge at distance sqrt(2)
        let obb = OrientedBox::new(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(1.0, 1.0, 1.0),
            Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_4),
        );
        let t = obb.intersect_ray(&forward_ray(Vec3::zeros())).unwrap();
        assert_relative_eq!(t, 10.0 - 2.0_f32.sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn test_box_edge_graze_is_miss() {
        let obb = OrientedBox::new(Vec3::new(1.0, 1.0, 5.0), Vec3::repeat(1.0), Quat::identity());
        assert!(obb.intersect_ray(&forward_ray(Vec3::zeros())).is_none());
    }

    #[test]
    fn test_flat_box_perpendicular_is_miss() {
        let obb = OrientedBox::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(1.0, 1.0, 0.0), Quat::identity());
        assert!(obb.intersect_ray(&forward_ray(Vec3::zeros())).is_none());
    }

    #[test]
    fn test_rotated_box_aabb_grows() {
        let obb = OrientedBox::new(
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
            Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_4),
        );
        let aabb = obb.aabb();
        assert_relative_eq!(aabb.max.x, 2.0_f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(aabb.max.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_capsule_body_and_cap_hits() {
        let capsule = Capsule::new(Vec3::new(0.0, -2.0, 5.0), Vec3::new(0.0, 2.0, 5.0), 1.0);
        let body = capsule.intersect_ray(&forward_ray(Vec3::zeros())).unwrap();
        assert_relative_eq!(body, 4.0, epsilon = 1e-4);

        let cap = capsule.intersect_ray(&forward_ray(Vec3::new(0.0, 2.5, 0.0))).unwrap();
        let expected = 5.0 - (1.0_f32 - 0.25).sqrt();
        assert_relative_eq!(cap, expected, epsilon = 1e-4);

        assert!(capsule.intersect_ray(&forward_ray(Vec3::new(0.0, 3.5, 0.0))).is_none());
    }

    #[test]
    fn test_obb_sat() {
        let a = OrientedBox::new(Vec3::zeros(), Vec3::repeat(1.0), Quat::identity());
        let touching = OrientedBox::new(Vec3::new(2.0, 0.0, 0.0), Vec3::repeat(1.0), Quat::identity());
        let apart = OrientedBox::new(Vec3::new(2.5, 0.0, 0.0), Vec3::repeat(1.0), Quat::identity());
        let rotated = OrientedBox::new(
            Vec3::new(2.3, 0.0, 0.0),
            Vec3::repeat(1.0),
            Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_4),
        );
        assert!(a.intersects(&touching));
        assert!(!a.intersects(&apart));
        // Rotated corner reaches 2.3 - sqrt(2) < 1
        assert!(a.intersects(&rotated));
    }

    #[test]
    fn test_segment_box_distance() {
        let obb = OrientedBox::new(Vec3::zeros(), Vec3::repeat(1.0), Quat::identity());
        let d = segment_box_distance_squared(Vec3::new(-5.0, 3.0, 0.0), Vec3::new(5.0, 3.0, 0.0), &obb);
        assert_relative_eq!(d, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn test_local_edges_cover_box() {
        let edges = OrientedBox::local_edges(Vec3::new(1.0, 2.0, 3.0));
        for (start, end) in edges {
            assert_relative_eq!(abs3(&start).x, 1.0, epsilon = 1e-6);
            assert_relative_eq!(abs3(&end).z, 3.0, epsilon = 1e-6);
            assert_relative_eq!(abs3(&start).y, 2.0, epsilon = 1e-6);
        }
    }
}
