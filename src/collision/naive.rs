//! All-pairs resolver
//!
//! O(n²) and stateless. Kept as the reference the tree strategy is checked
//! against, and as a fallback for very small scenes.

use super::body::Collidable;
use super::pair::{CollisionPair, PairSet};
use super::resolver::{CollisionResolver, index_by_id, potential_colliders, resolve_in_order};
use super::tree::DebugDraw;
use crate::error::CollisionError;

#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveCollisionResolver;

impl<E: Collidable> CollisionResolver<E> for NaiveCollisionResolver {
    fn register(&mut self, _target: &E) -> Result<(), CollisionError> {
        Ok(())
    }

    fn remove(&mut self, _target: &E) -> Result<(), CollisionError> {
        Ok(())
    }

    fn update(&mut self, _targets: &[E]) -> usize {
        0
    }

    fn evaluate(&mut self, targets: &mut [E]) -> Vec<CollisionPair> {
        let live = potential_colliders(targets);
        let mut found = PairSet::new();

        for (n, &i) in live.iter().enumerate() {
            for &j in &live[n + 1..] {
                if let Some(pair) = CollisionPair::test(&targets[i], &targets[j]) {
                    found.insert(pair);
                }
            }
        }

        let index_of = index_by_id(targets, &live);
        resolve_in_order(targets, &index_of, found)
    }

    fn debug_draw(&self, _draw: &mut dyn DebugDraw) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Body, EntityId};

    #[test]
    fn test_empty_input() {
        let mut resolver = NaiveCollisionResolver;
        let mut bodies: Vec<Body> = Vec::new();
        assert!(resolver.evaluate(&mut bodies).is_empty());
        assert_eq!(resolver.update(&bodies), 0);
    }

    #[test]
    fn test_registration_is_noop() {
        let mut resolver = NaiveCollisionResolver;
        let body = Body::new(1, 0.0, 0.0, 1.0, 1.0);
        resolver.register(&body).unwrap();
        resolver.register(&body).unwrap();
        resolver.remove(&body).unwrap();
        resolver.remove(&body).unwrap();
    }

    #[test]
    fn test_finds_overlapping_pair_only() {
        let mut resolver = NaiveCollisionResolver;
        let mut bodies = vec![
            Body::new(1, 0.0, 0.0, 10.0, 10.0),
            Body::new(2, 5.0, 5.0, 10.0, 10.0),
            Body::new(3, 100.0, 100.0, 10.0, 10.0),
        ];
        let pairs = resolver.evaluate(&mut bodies);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].left, pairs[0].right), (EntityId(1), EntityId(2)));
    }
}
