//! Tree-accelerated resolver
//!
//! Each live actor queries the [`DynamicTree`] for overlapping fat leaves,
//! giving O(n log n) expected candidate generation. Candidate pairs are
//! oriented by snapshot position before the narrow-phase test, so results
//! match the all-pairs resolver exactly.

use super::body::Collidable;
use super::pair::{CollisionPair, PairSet};
use super::resolver::{CollisionResolver, index_by_id, potential_colliders, resolve_in_order};
use super::tree::{DebugDraw, DynamicTree};
use crate::error::CollisionError;
use crate::settings::CollisionSettings;

#[derive(Debug, Clone, Default)]
pub struct DynamicTreeCollisionResolver {
    tree: DynamicTree,
}

impl DynamicTreeCollisionResolver {
    pub fn new(settings: &CollisionSettings) -> Self {
        Self {
            tree: DynamicTree::new(settings.fatten_margin, settings.velocity_multiplier),
        }
    }

    pub fn tree(&self) -> &DynamicTree {
        &self.tree
    }
}

impl<E: Collidable> CollisionResolver<E> for DynamicTreeCollisionResolver {
    fn register(&mut self, target: &E) -> Result<(), CollisionError> {
        self.tree.register_actor(target)
    }

    fn remove(&mut self, target: &E) -> Result<(), CollisionError> {
        self.tree.remove_actor(target)
    }

    fn update(&mut self, targets: &[E]) -> usize {
        let moved = targets
            .iter()
            .filter(|target| self.tree.update_actor(*target))
            .count();
        log::trace!("tree update: {moved}/{} leaves re-inserted", targets.len());
        moved
    }

    fn evaluate(&mut self, targets: &mut [E]) -> Vec<CollisionPair> {
        let live = potential_colliders(targets);
        let index_of = index_by_id(targets, &live);
        let mut found = PairSet::new();

        let snapshot: &[E] = targets;
        for &i in &live {
            self.tree.query(&snapshot[i], |other| {
                // Killed, prevented, or not part of this frame
                let Some(&j) = index_of.get(&other) else {
                    return false;
                };
                let (left, right) = if i < j { (i, j) } else { (j, i) };
                if found.contains_key(snapshot[left].id(), snapshot[right].id()) {
                    return true;
                }
                match CollisionPair::test(&snapshot[left], &snapshot[right]) {
                    Some(pair) => {
                        found.insert(pair);
                        true
                    }
                    None => false,
                }
            });
        }

        resolve_in_order(targets, &index_of, found)
    }

    fn debug_draw(&self, draw: &mut dyn DebugDraw) {
        self.tree.debug_draw(draw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Body, CollisionKind, EntityId};
    use glam::Vec2;

    fn registered(bodies: &[Body]) -> DynamicTreeCollisionResolver {
        let mut resolver = DynamicTreeCollisionResolver::default();
        for body in bodies {
            CollisionResolver::<Body>::register(&mut resolver, body).unwrap();
        }
        resolver
    }

    #[test]
    fn test_double_register_is_error() {
        let body = Body::new(1, 0.0, 0.0, 10.0, 10.0);
        let mut resolver = registered(std::slice::from_ref(&body));
        let err = CollisionResolver::<Body>::register(&mut resolver, &body).unwrap_err();
        assert!(matches!(err, CollisionError::AlreadyRegistered(EntityId(1))));
        assert_eq!(resolver.tree().len(), 1);
    }

    #[test]
    fn test_update_counts_reinsertions() {
        let mut bodies = vec![
            Body::new(1, 0.0, 0.0, 10.0, 10.0),
            Body::new(2, 50.0, 0.0, 10.0, 10.0),
        ];
        let mut resolver = registered(&bodies);
        assert_eq!(resolver.update(&bodies), 0);

        bodies[1].pos += Vec2::new(20.0, 0.0);
        assert_eq!(resolver.update(&bodies), 1);
        assert_eq!(resolver.update(&bodies), 0);
    }

    #[test]
    fn test_prevented_actor_never_paired() {
        let mut bodies = vec![
            Body::new(1, 0.0, 0.0, 10.0, 10.0),
            Body::new(2, 2.0, 2.0, 10.0, 10.0).with_kind(CollisionKind::PreventCollision),
            Body::new(3, 4.0, 4.0, 10.0, 10.0),
        ];
        let mut resolver = registered(&bodies);
        resolver.update(&bodies);
        let pairs = resolver.evaluate(&mut bodies);
        assert_eq!(pairs.len(), 1);
        assert!(pairs.iter().all(|p| !p.involves(EntityId(2))));
        // The prevented actor is left where it was
        assert_eq!(bodies[1].pos, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_killed_actor_skipped() {
        let mut bodies = vec![
            Body::new(1, 0.0, 0.0, 10.0, 10.0),
            Body::new(2, 5.0, 0.0, 10.0, 10.0),
        ];
        let mut resolver = registered(&bodies);
        bodies[1].kill();
        resolver.update(&bodies);
        assert!(resolver.evaluate(&mut bodies).is_empty());
    }
}
