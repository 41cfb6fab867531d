//! The collidable actor contract
//!
//! The core never owns actors. It sees them as a per-frame slice and
//! remembers them only by [`EntityId`].

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::kind::CollisionKind;
use crate::geom::Aabb;

/// Stable identity of an actor, used as the tree's lookup key and for
/// pair deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything that can take part in collision detection
pub trait Collidable {
    fn id(&self) -> EntityId;

    /// Top-left corner
    fn pos(&self) -> Vec2;
    fn set_pos(&mut self, pos: Vec2);

    /// Velocity in units per frame; stretches the fattened tree bounds
    fn vel(&self) -> Vec2;
    fn set_vel(&mut self, vel: Vec2);

    /// Width and height
    fn size(&self) -> Vec2;

    fn collision_kind(&self) -> CollisionKind;

    fn is_killed(&self) -> bool;

    /// True bounding box
    fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos(), self.size())
    }

    /// Whether this actor enters candidate sets at all
    fn is_potential_collider(&self) -> bool {
        !self.is_killed() && !self.collision_kind().is_prevented()
    }
}

/// Plain rectangular actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub kind: CollisionKind,
    #[serde(default)]
    pub killed: bool,
}

impl Body {
    pub fn new(id: u32, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: EntityId(id),
            pos: Vec2::new(x, y),
            vel: Vec2::ZERO,
            size: Vec2::new(width, height),
            kind: CollisionKind::Active,
            killed: false,
        }
    }

    pub fn with_kind(mut self, kind: CollisionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_vel(mut self, dx: f32, dy: f32) -> Self {
        self.vel = Vec2::new(dx, dy);
        self
    }

    pub fn kill(&mut self) {
        self.killed = true;
    }

    /// Advance position by one frame of velocity
    pub fn step(&mut self) {
        self.pos += self.vel;
    }
}

impl Collidable for Body {
    fn id(&self) -> EntityId {
        self.id
    }

    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    fn vel(&self) -> Vec2 {
        self.vel
    }

    fn set_vel(&mut self, vel: Vec2) {
        self.vel = vel;
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn collision_kind(&self) -> CollisionKind {
        self.kind
    }

    fn is_killed(&self) -> bool {
        self.killed
    }
}
