//! Geometry primitives
//!
//! Everything here is pure and allocation-free. Degenerate input (zero-length
//! vectors, zero-area boxes, parallel lines) resolves to "no hit" or a zero
//! vector instead of NaN, since these run every frame.

pub mod aabb;
pub mod ray;

pub use aabb::Aabb;
pub use ray::{LineSegment, Ray};

use glam::Vec2;

/// Rotate `v` by `angle` radians around `anchor`
#[inline]
pub fn rotate_about(v: Vec2, angle: f32, anchor: Vec2) -> Vec2 {
    anchor + Vec2::from_angle(angle).rotate(v - anchor)
}

/// Left-hand perpendicular (90° counter-clockwise in y-up space)
#[inline]
pub fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Unit normal of `v`, or zero for a zero vector
#[inline]
pub fn normal(v: Vec2) -> Vec2 {
    perpendicular(v).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotate_about_anchor() {
        let p = rotate_about(Vec2::new(2.0, 1.0), FRAC_PI_2, Vec2::new(1.0, 1.0));
        assert!(p.distance(Vec2::new(1.0, 2.0)) < 1e-5);
    }

    #[test]
    fn test_zero_vector_normalizes_to_zero() {
        assert_eq!(Vec2::ZERO.normalize_or_zero(), Vec2::ZERO);
        assert_eq!(normal(Vec2::ZERO), Vec2::ZERO);
        assert_eq!(normal(Vec2::new(3.0, 0.0)), Vec2::Y);
    }
}
