//! Axis-aligned bounding boxes
//!
//! Screen-space convention: `top` is the smaller y, `bottom` the larger.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ray::Ray;

/// An axis-aligned rectangle defined by its edges
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Aabb {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Box with its top-left corner at `pos`
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, pos.x + size.x, pos.y + size.y)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    #[inline]
    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width() + self.height())
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// True when the box has no interior (zero or negative extent on an axis)
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Smallest box enclosing both
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Strict overlap test: boxes that only share an edge do not overlap.
    ///
    /// A zero-area box never overlaps anything, even when it lies inside
    /// another box. Compares edges directly so that any box enclosing a
    /// leaf overlaps everything the leaf overlaps.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !self.is_degenerate()
            && !other.is_degenerate()
            && self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Inclusive point containment
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// True when `other` lies entirely inside this box (edges may touch)
    pub fn contains(&self, other: &Aabb) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    /// Grow the box by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Aabb {
        Aabb::new(
            self.left - margin,
            self.top - margin,
            self.right + margin,
            self.bottom + margin,
        )
    }

    /// Expand by a fixed margin, then stretch toward the direction of motion
    /// by `velocity * multiplier`.
    pub fn fattened(&self, margin: f32, velocity: Vec2, multiplier: f32) -> Aabb {
        let mut fat = self.expanded(margin);
        let skin = velocity * multiplier;

        if skin.x < 0.0 {
            fat.left += skin.x;
        } else {
            fat.right += skin.x;
        }
        if skin.y < 0.0 {
            fat.top += skin.y;
        } else {
            fat.bottom += skin.y;
        }
        fat
    }

    /// Minimum translation vector that moves `self` out of `other`.
    ///
    /// Returns `None` when the boxes do not overlap. The vector is always
    /// axis-aligned; on equal overlap the y axis wins.
    pub fn intersect(&self, other: &Aabb) -> Option<Vec2> {
        if !self.overlaps(other) {
            return None;
        }

        let overlap_x = if self.right >= other.left && self.right <= other.right {
            other.left - self.right
        } else {
            other.right - self.left
        };

        let overlap_y = if self.top <= other.bottom && self.top >= other.top {
            other.bottom - self.top
        } else {
            other.top - self.bottom
        };

        if overlap_x.abs() < overlap_y.abs() {
            Some(Vec2::new(overlap_x, 0.0))
        } else {
            Some(Vec2::new(0.0, overlap_y))
        }
    }

    /// Slab test: does the ray enter this box within `max_distance`?
    pub fn ray_cast(&self, ray: &Ray, max_distance: f32) -> bool {
        if ray.dir == Vec2::ZERO {
            return false;
        }

        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for (origin, dir, lo, hi) in [
            (ray.pos.x, ray.dir.x, self.left, self.right),
            (ray.pos.y, ray.dir.y, self.top, self.bottom),
        ] {
            if dir == 0.0 {
                // Parallel to this slab: must already be inside it
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let t1 = (lo - origin) * inv;
            let t2 = (hi - origin) * inv;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }

        t_max >= t_min.max(0.0) && t_min <= max_distance
    }
}
