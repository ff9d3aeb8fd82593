//! 2D helpers layered on top of `glam`.

use glam::Vec2;

/// Rotates `v` counter-clockwise by `angle` radians.
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Scalar 2D cross product `a × b`.
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b)
}

/// Cross product of a scalar angular velocity with a lever arm, `ω × r`.
#[inline]
pub fn cross_scalar(w: f32, r: Vec2) -> Vec2 {
    Vec2::new(-w * r.y, w * r.x)
}

/// Normalizes `v` and returns its original length. Vectors shorter than
/// `tolerance` come back as zero.
#[inline]
pub fn normalize_with_length(v: Vec2, tolerance: f32) -> (Vec2, f32) {
    let length = v.length();
    if length > tolerance {
        (v / length, length)
    } else {
        (Vec2::ZERO, length)
    }
}

/// Inverse of a positive quantity; zero maps to zero ("infinite" mass).
#[inline]
pub fn safe_inverse(value: f32) -> f32 {
    if value.abs() <= f32::EPSILON {
        0.0
    } else {
        1.0 / value
    }
}
