//! How an actor takes part in collisions, and which side was hit

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Collision participation of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Invisible to collision; filtered out before any geometry test
    PreventCollision,
    /// Reported, never corrected, and never pushes anyone
    Passive,
    /// Reported and pushed out of `Active`, `Elastic` and `Fixed` actors
    #[default]
    Active,
    /// Like `Active`, but bounces: velocity is reflected on the hit axis
    Elastic,
    /// Immovable; pushes others, never moves itself
    Fixed,
}

impl CollisionKind {
    /// Excluded from candidate sets entirely
    #[inline]
    pub fn is_prevented(self) -> bool {
        self == CollisionKind::PreventCollision
    }

    /// Receives positional correction
    #[inline]
    pub fn is_movable(self) -> bool {
        matches!(self, CollisionKind::Active | CollisionKind::Elastic)
    }

    /// Causes correction on a movable partner
    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(
            self,
            CollisionKind::Active | CollisionKind::Elastic | CollisionKind::Fixed
        )
    }
}

/// Face of an actor's bounding box involved in a collision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    None,
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// Classify the face touched, given the MTV that pushes the actor out.
    ///
    /// A push toward -x means the contact is on the actor's right face; a
    /// push toward -y (up, in screen space) means the bottom face.
    pub fn from_mtv(mtv: Vec2) -> Side {
        if mtv == Vec2::ZERO {
            return Side::None;
        }
        if mtv.x.abs() > mtv.y.abs() {
            if mtv.x < 0.0 { Side::Right } else { Side::Left }
        } else if mtv.y < 0.0 {
            Side::Bottom
        } else {
            Side::Top
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::None => Side::None,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_from_mtv() {
        assert_eq!(Side::from_mtv(Vec2::new(-4.0, 0.0)), Side::Right);
        assert_eq!(Side::from_mtv(Vec2::new(4.0, 0.0)), Side::Left);
        assert_eq!(Side::from_mtv(Vec2::new(0.0, -5.0)), Side::Bottom);
        assert_eq!(Side::from_mtv(Vec2::new(0.0, 5.0)), Side::Top);
        assert_eq!(Side::from_mtv(Vec2::ZERO), Side::None);
    }

    #[test]
    fn test_opposite_round_trips() {
        for side in [Side::None, Side::Top, Side::Bottom, Side::Left, Side::Right] {
            assert_eq!(side.opposite().opposite(), side);
        }
        assert_eq!(Side::Left.opposite(), Side::Right);
    }

    #[test]
    fn test_kind_flags() {
        assert!(CollisionKind::PreventCollision.is_prevented());
        assert!(!CollisionKind::Fixed.is_movable());
        assert!(CollisionKind::Fixed.is_solid());
        assert!(!CollisionKind::Passive.is_solid());
        assert!(CollisionKind::Elastic.is_movable());
    }
}
