//! Rays and line segments

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Below this, a ray and a segment are treated as parallel
const PARALLEL_EPSILON: f32 = 1e-6;

/// A half-line starting at `pos` heading along unit vector `dir`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub pos: Vec2,
    pub dir: Vec2,
}

impl Ray {
    /// Direction is normalized; a zero direction stays zero and hits nothing.
    pub fn new(pos: Vec2, dir: Vec2) -> Self {
        Self {
            pos,
            dir: dir.normalize_or_zero(),
        }
    }

    /// Point at distance `t` along the ray
    #[inline]
    pub fn point_at(&self, t: f32) -> Vec2 {
        self.pos + self.dir * t
    }

    /// Distance along the ray to where it crosses `segment`, if it does
    pub fn intersect_segment(&self, segment: &LineSegment) -> Option<f32> {
        let span = segment.end - segment.begin;
        let denom = self.dir.perp_dot(span);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let to_begin = segment.begin - self.pos;
        let t = to_begin.perp_dot(span) / denom;
        let u = to_begin.perp_dot(self.dir) / denom;

        if t >= 0.0 && (0.0..=1.0).contains(&u) {
            Some(t)
        } else {
            None
        }
    }
}

/// A finite line between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub begin: Vec2,
    pub end: Vec2,
}

impl LineSegment {
    pub fn new(begin: Vec2, end: Vec2) -> Self {
        Self { begin, end }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.begin.distance(self.end)
    }

    /// Unit direction from `begin` to `end` (zero for a point segment)
    pub fn direction(&self) -> Vec2 {
        (self.end - self.begin).normalize_or_zero()
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.begin + self.end) * 0.5
    }
}
