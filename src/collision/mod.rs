//! Collision detection and resolution
//!
//! Broad phase (which actors might touch) is pluggable behind
//! [`CollisionResolver`]; narrow phase is an AABB overlap test producing a
//! minimum translation vector. Both strategies share the same pair model
//! and correction rules.

pub mod body;
pub mod dynamic;
pub mod kind;
pub mod naive;
pub mod pair;
pub mod resolver;
pub mod tree;

pub use body::{Body, Collidable, EntityId};
pub use dynamic::DynamicTreeCollisionResolver;
pub use kind::{CollisionKind, Side};
pub use naive::NaiveCollisionResolver;
pub use pair::{CollisionEvent, CollisionPair, PairSet};
pub use resolver::{CollisionResolver, create_resolver};
pub use tree::{DebugDraw, DynamicTree};
