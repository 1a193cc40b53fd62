//! Math utilities and types
//!
//! Provides the fundamental vector and rotation types used by every query,
//! plus checked constructors for values arriving from untyped callers
//! (script bindings, scene files).

use crate::error::{QueryError, QueryResult};

pub use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Tolerance used when deciding whether a quaternion is already unit length
pub const UNIT_EPSILON: f32 = 1.0e-3;

/// Build a vector from loose components, rejecting NaN and infinities
pub fn checked_vec3(x: f32, y: f32, z: f32) -> QueryResult<Vec3> {
    let v = Vec3::new(x, y, z);
    ensure_finite(&v, "vector")?;
    Ok(v)
}

/// Build a rotation from loose `{x, y, z, w}` components.
///
/// Components must be finite and describe a non-zero quaternion. Inputs that
/// are close to unit length are renormalized; anything further off is
/// treated as a malformed rotation rather than silently normalized.
pub fn checked_quat(x: f32, y: f32, z: f32, w: f32) -> QueryResult<Quat> {
    let q = Quaternion::new(w, x, y, z);
    if !q.coords.iter().all(|c| c.is_finite()) {
        return Err(QueryError::InvalidArgument(format!(
            "rotation has non-finite components ({x}, {y}, {z}, {w})"
        )));
    }
    let norm = q.norm();
    if (norm - 1.0).abs() > UNIT_EPSILON {
        return Err(QueryError::InvalidArgument(format!(
            "rotation ({x}, {y}, {z}, {w}) is not a unit quaternion (norm {norm})"
        )));
    }
    Ok(Unit::new_normalize(q))
}

/// Fail with `InvalidArgument` if any component of `v` is not finite
pub fn ensure_finite(v: &Vec3, what: &str) -> QueryResult<()> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(QueryError::InvalidArgument(format!(
            "{what} has non-finite components {v:?}"
        )))
    }
}

/// Normalize a direction, failing on zero-length or non-finite input.
///
/// Components are scaled by the largest magnitude first so the length can
/// neither overflow nor vanish for finite, non-zero input.
pub fn normalize_direction(direction: &Vec3) -> QueryResult<Vec3> {
    ensure_finite(direction, "direction")?;
    let scale = direction.amax();
    if scale <= 0.0 {
        return Err(QueryError::InvalidArgument(
            "direction must be non-zero".to_string(),
        ));
    }
    Ok((direction / scale).normalize())
}

/// Component-wise absolute value
pub fn abs3(v: &Vec3) -> Vec3 {
    v.map(f32::abs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_checked_vec3_rejects_nan() {
        assert!(checked_vec3(1.0, f32::NAN, 0.0).is_err());
        assert!(checked_vec3(1.0, 2.0, f32::INFINITY).is_err());
        assert_eq!(checked_vec3(1.0, 2.0, 3.0).unwrap(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_checked_quat_identity() {
        let q = checked_quat(0.0, 0.0, 0.0, 1.0).unwrap();
        assert_relative_eq!(q, Quat::identity(), epsilon = 1e-6);
    }

    #[test]
    fn test_checked_quat_rejects_non_unit() {
        assert!(checked_quat(0.0, 0.0, 0.0, 0.0).is_err());
        assert!(checked_quat(1.0, 1.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_normalize_direction() {
        let d = normalize_direction(&Vec3::new(0.0, 0.0, 5.0)).unwrap();
        assert_relative_eq!(d, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        assert!(normalize_direction(&Vec3::zeros()).is_err());
    }

    #[test]
    fn test_normalize_direction_extreme_magnitudes() {
        let huge = normalize_direction(&Vec3::new(1.0e20, 0.0, 0.0)).unwrap();
        assert_relative_eq!(huge, Vec3::x(), epsilon = 1e-6);

        let tiny = normalize_direction(&Vec3::new(1.0e-8, 0.0, 1.0e-8)).unwrap();
        assert_relative_eq!(tiny, Vec3::new(1.0, 0.0, 1.0).normalize(), epsilon = 1e-6);

        let subnormal = normalize_direction(&Vec3::new(0.0, -1.0e-40, 0.0)).unwrap();
        assert_relative_eq!(subnormal, -Vec3::y(), epsilon = 1e-6);
    }
}
