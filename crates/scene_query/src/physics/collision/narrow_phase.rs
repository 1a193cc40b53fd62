//! Narrow-phase intersection tests
//!
//! Pure functions with no shared state. Ray functions expect a normalized
//! direction and report the distance along it from `origin`. Sweeps use the
//! Minkowski sum of the sweep sphere and the volume, so a sphere of radius
//! `r` moving along a ray is the same as a ray against the volume grown by `r`.

use crate::foundation::math::{abs3, Quat, Vec3};

use super::primitives::{
    local_slab, segment_box_distance_squared, BoundingSphere, Capsule, OrientedBox, Ray,
};
use super::shape::{Volume, WorldShape};

/// Ray against a sphere
pub fn ray_sphere_intersect(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    BoundingSphere::new(center, radius).intersect_ray(&Ray { origin, direction: dir })
}

/// Ray against an oriented box, via the inverse orientation and a slab test
pub fn ray_box_intersect(
    origin: Vec3,
    dir: Vec3,
    center: Vec3,
    half_extents: Vec3,
    orientation: Quat,
) -> Option<f32> {
    OrientedBox::new(center, half_extents, orientation).intersect_ray(&Ray { origin, direction: dir })
}

/// Ray against a capsule with core segment `a`-`b`
pub fn ray_capsule_intersect(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, radius: f32) -> Option<f32> {
    Capsule::new(a, b, radius).intersect_ray(&Ray { origin, direction: dir })
}

/// Sphere of `sweep_radius` moving along the ray, against a volume
pub fn swept_sphere_volume_intersect(
    origin: Vec3,
    dir: Vec3,
    sweep_radius: f32,
    volume: &Volume,
) -> Option<f32> {
    swept_sphere_shape_intersect(origin, dir, sweep_radius, &volume.world_shape())
}

/// Sphere of `sweep_radius` moving along the ray, against a world shape
pub fn swept_sphere_shape_intersect(
    origin: Vec3,
    dir: Vec3,
    sweep_radius: f32,
    shape: &WorldShape,
) -> Option<f32> {
    match shape {
        WorldShape::Sphere(sphere) => {
            ray_sphere_intersect(origin, dir, sphere.center, sphere.radius + sweep_radius)
        }
        WorldShape::Capsule(capsule) => {
            ray_capsule_intersect(origin, dir, capsule.a, capsule.b, capsule.radius + sweep_radius)
        }
        WorldShape::Box(obb) => {
            if sweep_radius <= 0.0 {
                obb.intersect_ray(&Ray { origin, direction: dir })
            } else {
                ray_rounded_box(origin, dir, obb, sweep_radius)
            }
        }
    }
}

/// Ray against a box whose surface is pushed out by `radius` with rounded edges and corners.
///
/// The inflated box is a superset of the rounded one. Its entry point is
/// exact unless it lands outside the original box on two or more axes, which
/// means the ray entered an edge or corner region; there the exact answer is
/// the nearest of the 12 edge capsules (corner spheres are their caps).
fn ray_rounded_box(origin: Vec3, dir: Vec3, obb: &OrientedBox, radius: f32) -> Option<f32> {
    let local_origin = obb.to_local(origin);
    let local_dir = obb.orientation.inverse_transform_vector(&dir);
    let he = obb.half_extents;

    let t = local_slab(local_origin, local_dir, he + Vec3::repeat(radius))?;

    let entry = abs3(&(local_origin + local_dir * t));
    let outside_axes = (0..3).filter(|&axis| entry[axis] > he[axis]).count();
    if outside_axes <= 1 {
        return Some(t);
    }

    let local_ray = Ray {
        origin: local_origin,
        direction: local_dir,
    };
    OrientedBox::local_edges(he)
        .iter()
        .filter_map(|&(a, b)| Capsule::new(a, b, radius).intersect_ray(&local_ray))
        .min_by(f32::total_cmp)
}

/// Static sphere against a world shape (touching counts)
pub fn sphere_overlaps_shape(sphere: &BoundingSphere, shape: &WorldShape) -> bool {
    let radius_sq = sphere.radius * sphere.radius;
    match shape {
        WorldShape::Sphere(other) => sphere.intersects(other),
        WorldShape::Box(obb) => obb.distance_squared_to_point(sphere.center) <= radius_sq,
        WorldShape::Capsule(capsule) => {
            let reach = sphere.radius + capsule.radius;
            capsule.segment_distance_squared(sphere.center) <= reach * reach
        }
    }
}

/// Static oriented box against a world shape (touching counts)
pub fn box_overlaps_shape(obb: &OrientedBox, shape: &WorldShape) -> bool {
    match shape {
        WorldShape::Sphere(sphere) => {
            obb.distance_squared_to_point(sphere.center) <= sphere.radius * sphere.radius
        }
        WorldShape::Box(other) => obb.intersects(other),
        WorldShape::Capsule(capsule) => {
            segment_box_distance_squared(capsule.a, capsule.b, obb) <= capsule.radius * capsule.radius
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::physics::collision::VolumeShape;
    use approx::assert_relative_eq;

    fn forward() -> Vec3 {
        Vec3::new(0.0, 0.0, 1.0)
    }

    #[test]
    fn test_swept_sphere_against_sphere() {
        let volume = Volume::new(Entity::new(1), VolumeShape::sphere(1.0), Vec3::new(0.0, 0.0, 5.0)).unwrap();
        let t = swept_sphere_volume_intersect(Vec3::zeros(), forward(), 0.5, &volume).unwrap();
        assert_relative_eq!(t, 3.5, epsilon = 1e-5);
    }

    #[test]
    fn test_swept_sphere_reaches_offset_sphere() {
        // Ray alone misses (offset 1.5 > radius 1) but a 0.6 sweep touches
        let volume = Volume::new(Entity::new(1), VolumeShape::sphere(1.0), Vec3::new(1.5, 0.0, 5.0)).unwrap();
        assert!(swept_sphere_volume_intersect(Vec3::zeros(), forward(), 0.0, &volume).is_none());
        assert!(swept_sphere_volume_intersect(Vec3::zeros(), forward(), 0.6, &volume).is_some());
    }

    #[test]
    fn test_swept_sphere_face_of_box() {
        let volume = Volume::new(
            Entity::new(2),
            VolumeShape::cuboid(Vec3::repeat(1.0)),
            Vec3::new(0.0, 0.0, 5.0),
        )
        .unwrap();
        let t = swept_sphere_volume_intersect(Vec3::zeros(), forward(), 0.5, &volume).unwrap();
        assert_relative_eq!(t, 3.5, epsilon = 1e-5);
    }

    #[test]
    fn test_swept_sphere_box_corner_gap_is_miss() {
        // Passes the box corner diagonally at distance (1.9-1)*sqrt(2) ~ 1.27 > 1.0
        let volume = Volume::new(
            Entity::new(3),
            VolumeShape::cuboid(Vec3::repeat(1.0)),
            Vec3::new(1.9, 1.9, 5.0),
        )
        .unwrap();
        // The inflated box (half extent 2) would have been hit
        let inflated = OrientedBox::new(Vec3::new(1.9, 1.9, 5.0), Vec3::repeat(2.0), Quat::identity());
        assert!(inflated.intersect_ray(&Ray::new(Vec3::zeros(), forward())).is_some());
        assert!(swept_sphere_volume_intersect(Vec3::zeros(), forward(), 1.0, &volume).is_none());
    }

    #[test]
    fn test_swept_sphere_box_edge_hit_distance() {
        // Sphere of radius 1 along z, box edge at x = y = 0.5 from the ray
        let center = Vec3::new(1.5, 1.5, 5.0);
        let volume = Volume::new(Entity::new(4), VolumeShape::cuboid(Vec3::repeat(1.0)), center).unwrap();
        let t = swept_sphere_volume_intersect(Vec3::zeros(), forward(), 1.0, &volume).unwrap();
        // Edge line at (0.5, 0.5, z): horizontal distance sqrt(0.5), enters front corner sphere
        let lateral_sq = 0.5_f32;
        let expected = 4.0 - (1.0 - lateral_sq).sqrt();
        assert_relative_eq!(t, expected, epsilon = 1e-4);
    }

    #[test]
    fn test_capsule_sweep() {
        let volume = Volume::new(Entity::new(5), VolumeShape::capsule(0.5, 1.0), Vec3::new(0.0, 0.0, 6.0)).unwrap();
        let t = swept_sphere_volume_intersect(Vec3::zeros(), forward(), 0.5, &volume).unwrap();
        assert_relative_eq!(t, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_overlap_tests() {
        let probe = BoundingSphere::new(Vec3::zeros(), 1.0);
        let near_box = OrientedBox::new(Vec3::new(1.5, 0.0, 0.0), Vec3::repeat(0.5), Quat::identity());
        let far_box = OrientedBox::new(Vec3::new(3.0, 0.0, 0.0), Vec3::repeat(0.5), Quat::identity());
        assert!(sphere_overlaps_shape(&probe, &WorldShape::Box(near_box)));
        assert!(!sphere_overlaps_shape(&probe, &WorldShape::Box(far_box)));

        let capsule = Capsule::new(Vec3::new(-5.0, 1.2, 0.0), Vec3::new(5.0, 1.2, 0.0), 0.3);
        assert!(box_overlaps_shape(
            &OrientedBox::new(Vec3::zeros(), Vec3::repeat(1.0), Quat::identity()),
            &WorldShape::Capsule(capsule)
        ));
        assert!(!box_overlaps_shape(
            &OrientedBox::new(Vec3::zeros(), Vec3::repeat(0.8), Quat::identity()),
            &WorldShape::Capsule(capsule)
        ));
    }
}
