//! The resolver contract shared by every broad-phase strategy
//!
//! Per frame the engine calls `update` (sync the index with new positions)
//! and then `evaluate` (find, dedup and resolve pairs) with the same actor
//! snapshot. Every strategy must return the same pairs for the same input;
//! the broad phase is only an optimization.

use std::collections::HashMap;

use super::body::{Collidable, EntityId};
use super::dynamic::DynamicTreeCollisionResolver;
use super::naive::NaiveCollisionResolver;
use super::pair::{CollisionPair, PairSet};
use super::tree::DebugDraw;
use crate::error::CollisionError;
use crate::settings::{CollisionSettings, CollisionStrategy};

pub trait CollisionResolver<E: Collidable> {
    /// Start tracking an actor (on spawn)
    fn register(&mut self, target: &E) -> Result<(), CollisionError>;

    /// Stop tracking an actor (on despawn)
    fn remove(&mut self, target: &E) -> Result<(), CollisionError>;

    /// Sync internal state with the actors' current positions. Returns how
    /// many index entries had to move; diagnostic only.
    fn update(&mut self, targets: &[E]) -> usize;

    /// Find every colliding pair, apply corrections to `targets`, and
    /// return the pairs. Killed and `PreventCollision` actors are skipped.
    fn evaluate(&mut self, targets: &mut [E]) -> Vec<CollisionPair>;

    fn debug_draw(&self, draw: &mut dyn DebugDraw);
}

/// Build the resolver selected in `settings`
pub fn create_resolver<E: Collidable>(
    settings: &CollisionSettings,
) -> Box<dyn CollisionResolver<E>> {
    match settings.strategy {
        CollisionStrategy::Naive => Box::new(NaiveCollisionResolver),
        CollisionStrategy::DynamicAabbTree => Box::new(DynamicTreeCollisionResolver::new(settings)),
    }
}

/// Slice indices of the actors that can collide this frame
pub(crate) fn potential_colliders<E: Collidable>(targets: &[E]) -> Vec<usize> {
    targets
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_potential_collider())
        .map(|(i, _)| i)
        .collect()
}

pub(crate) fn index_by_id<E: Collidable>(
    targets: &[E],
    live: &[usize],
) -> HashMap<EntityId, usize> {
    live.iter().map(|&i| (targets[i].id(), i)).collect()
}

/// Apply every pair's correction in snapshot order and hand the pairs back
/// in that order.
///
/// Ordering by slice position (not discovery order) keeps the outcome
/// identical across strategies when an actor is in several pairs.
pub(crate) fn resolve_in_order<E: Collidable>(
    targets: &mut [E],
    index_of: &HashMap<EntityId, usize>,
    found: PairSet,
) -> Vec<CollisionPair> {
    let mut ordered: Vec<(usize, usize, CollisionPair)> = found
        .into_vec()
        .into_iter()
        .filter_map(|pair| {
            let left = *index_of.get(&pair.left)?;
            let right = *index_of.get(&pair.right)?;
            Some((left, right, pair))
        })
        .collect();
    ordered.sort_by_key(|&(left, right, _)| (left, right));

    for (left, right, pair) in &ordered {
        if left == right {
            continue;
        }
        let (a, b) = pair_mut(targets, *left, *right);
        pair.resolve(a, b);
    }

    log::trace!("resolved {} collision pairs", ordered.len());
    ordered.into_iter().map(|(_, _, pair)| pair).collect()
}

/// Two distinct mutable elements of one slice
fn pair_mut<E>(items: &mut [E], a: usize, b: usize) -> (&mut E, &mut E) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = items.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}
