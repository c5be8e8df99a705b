//! Vector helpers shared by the sensor and locomotion.
//!
//! World convention: +Y is up, bodies face -Z, +X is to their right.

use glam::{Quat, Vec2, Vec3};

/// Body-local forward axis.
pub const FORWARD: Vec3 = Vec3::NEG_Z;

/// World up.
pub const UP: Vec3 = Vec3::Y;

/// Drop the vertical component.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Horizontal speed (XZ plane).
#[inline]
pub fn horizontal_speed(v: Vec3) -> f32 {
    Vec2::new(v.x, v.z).length()
}

/// Clamp horizontal speed to `max_speed`, leaving the vertical component untouched.
pub fn clamp_horizontal(v: Vec3, max_speed: f32) -> Vec3 {
    let speed = horizontal_speed(v);
    if speed <= max_speed || speed <= f32::EPSILON {
        return v;
    }
    let scale = max_speed.max(0.0) / speed;
    Vec3::new(v.x * scale, v.y, v.z * scale)
}

/// Is `normal` close enough to world up to count as flat ground?
#[inline]
pub fn is_flat(normal: Vec3, flat_cos: f32) -> bool {
    normal.dot(UP) >= flat_cos
}

/// A usable surface normal: finite and non-degenerate.
pub fn sanitize_normal(normal: Vec3) -> Option<Vec3> {
    if !normal.is_finite() {
        return None;
    }
    normal.try_normalize()
}

/// Rotation about world up. Positive `yaw` turns left (counter-clockwise from above).
#[inline]
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_rotation_y(yaw)
}

/// Rotation taking world up onto `normal`.
pub fn align_up_to(normal: Vec3) -> Quat {
    match sanitize_normal(normal) {
        Some(n) => Quat::from_rotation_arc(UP, n),
        None => Quat::IDENTITY,
    }
}

/// Interpolation factor for exponential smoothing at `rate` per second.
#[inline]
pub fn smoothing(rate: f32, dt: f32) -> f32 {
    if rate <= 0.0 {
        return 1.0;
    }
    1.0 - (-rate * dt).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_horizontal_preserves_vertical() {
        let v = Vec3::new(30.0, -5.0, 40.0);
        let clamped = clamp_horizontal(v, 10.0);
        assert!((horizontal_speed(clamped) - 10.0).abs() < 1e-4);
        assert_eq!(clamped.y, -5.0);

        let slow = Vec3::new(1.0, 3.0, 1.0);
        assert_eq!(clamp_horizontal(slow, 10.0), slow);
    }

    #[test]
    fn test_positive_yaw_turns_left() {
        let forward = yaw_rotation(std::f32::consts::FRAC_PI_2) * FORWARD;
        assert!((forward - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_flat_and_sanitize() {
        assert!(is_flat(UP, 0.999));
        let slope = Vec3::new(0.3, 1.0, 0.0).normalize();
        assert!(!is_flat(slope, 0.999));

        assert!(sanitize_normal(Vec3::ZERO).is_none());
        assert!(sanitize_normal(Vec3::new(f32::NAN, 1.0, 0.0)).is_none());
        assert_eq!(align_up_to(Vec3::ZERO), Quat::IDENTITY);
    }
}
