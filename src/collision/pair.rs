//! Resolved collision pairs
//!
//! A pair is a transient per-frame value. Equality and hashing ignore
//! orientation, so `(a, b)` and `(b, a)` are the same pair.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Collidable, EntityId};
use super::kind::{CollisionKind, Side};

/// One collision between two actors
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionPair {
    pub left: EntityId,
    pub right: EntityId,
    /// Translation that moves `left` out of `right`
    pub mtv: Vec2,
    /// Face of `left` touching `right`
    pub side: Side,
}

/// Per-actor notification derived from a pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub actor: EntityId,
    pub other: EntityId,
    pub side: Side,
    /// Translation that moves `actor` out of `other`
    pub mtv: Vec2,
}

impl CollisionPair {
    pub fn new(left: EntityId, right: EntityId, mtv: Vec2) -> Self {
        Self {
            left,
            right,
            mtv,
            side: Side::from_mtv(mtv),
        }
    }

    /// Narrow-phase test between two actors
    pub fn test<E: Collidable>(left: &E, right: &E) -> Option<Self> {
        left.bounds()
            .intersect(&right.bounds())
            .map(|mtv| Self::new(left.id(), right.id(), mtv))
    }

    /// Orientation-independent key
    pub fn key(&self) -> (EntityId, EntityId) {
        if self.left <= self.right {
            (self.left, self.right)
        } else {
            (self.right, self.left)
        }
    }

    pub fn involves(&self, id: EntityId) -> bool {
        self.left == id || self.right == id
    }

    /// The two notifications, one from each participant's point of view
    pub fn events(&self) -> [CollisionEvent; 2] {
        [
            CollisionEvent {
                actor: self.left,
                other: self.right,
                side: self.side,
                mtv: self.mtv,
            },
            CollisionEvent {
                actor: self.right,
                other: self.left,
                side: self.side.opposite(),
                mtv: -self.mtv,
            },
        ]
    }

    /// Push the participants apart according to their collision kinds.
    ///
    /// `left` and `right` must be the actors named by this pair.
    pub fn resolve<E: Collidable>(&self, left: &mut E, right: &mut E) {
        debug_assert_eq!(left.id(), self.left);
        debug_assert_eq!(right.id(), self.right);

        let left_kind = left.collision_kind();
        let right_kind = right.collision_kind();
        let left_moves = left_kind.is_movable() && right_kind.is_solid();
        let right_moves = right_kind.is_movable() && left_kind.is_solid();

        let share = if left_moves && right_moves { 0.5 } else { 1.0 };

        if left_moves {
            apply_correction(left, self.mtv * share, self.side);
        }
        if right_moves {
            apply_correction(right, -self.mtv * share, self.side.opposite());
        }
    }
}

/// Move the actor and kill (or, for elastic actors, reflect) the velocity
/// component driving it into the contact face.
fn apply_correction<E: Collidable>(actor: &mut E, correction: Vec2, side: Side) {
    actor.set_pos(actor.pos() + correction);

    let mut vel = actor.vel();
    let bounce = actor.collision_kind() == CollisionKind::Elastic;
    match side {
        Side::Left => vel.x = if bounce { vel.x.abs() } else { vel.x.max(0.0) },
        Side::Right => vel.x = if bounce { -vel.x.abs() } else { vel.x.min(0.0) },
        Side::Top => vel.y = if bounce { vel.y.abs() } else { vel.y.max(0.0) },
        Side::Bottom => vel.y = if bounce { -vel.y.abs() } else { vel.y.min(0.0) },
        Side::None => {}
    }
    actor.set_vel(vel);
}

impl PartialEq for CollisionPair {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CollisionPair {}

impl Hash for CollisionPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Deduplicating pair collection that keeps discovery order
#[derive(Debug, Clone, Default)]
pub struct PairSet {
    seen: HashSet<(EntityId, EntityId)>,
    pairs: Vec<CollisionPair>,
}

impl PairSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if an equal pair (either orientation) is already present
    pub fn insert(&mut self, pair: CollisionPair) -> bool {
        if !self.seen.insert(pair.key()) {
            return false;
        }
        self.pairs.push(pair);
        true
    }

    pub fn contains_key(&self, a: EntityId, b: EntityId) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.seen.contains(&key)
    }

    pub fn contains(&self, pair: &CollisionPair) -> bool {
        self.seen.contains(&pair.key())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionPair> {
        self.pairs.iter()
    }

    pub fn into_vec(self) -> Vec<CollisionPair> {
        self.pairs
    }
}
