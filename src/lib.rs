//! Actor Collision - broad and narrow phase for 2D game actors
//!
//! Core modules:
//! - `geom`: AABB, ray and segment primitives
//! - `collision`: Dynamic AABB tree, resolver strategies, pair model
//! - `settings`: Strategy selection and tree tuning
//! - `error`: Registration and configuration errors
//!
//! Per frame: `update` the resolver with the live actor snapshot, then
//! `evaluate` it to get corrected positions and the frame's collision pairs.

pub mod collision;
pub mod error;
pub mod geom;
pub mod settings;

pub use collision::{
    Body, Collidable, CollisionEvent, CollisionKind, CollisionPair, CollisionResolver, DynamicTree,
    DynamicTreeCollisionResolver, EntityId, NaiveCollisionResolver, Side, create_resolver,
};
pub use error::CollisionError;
pub use geom::{Aabb, LineSegment, Ray};
pub use settings::{CollisionSettings, CollisionStrategy};

/// Collision configuration constants
pub mod consts {
    /// Padding on every side of a tree leaf (world units)
    pub const FATTEN_MARGIN: f32 = 5.0;
    /// Frames of velocity a tree leaf is stretched by in the direction of motion
    pub const VELOCITY_MULTIPLIER: f32 = 2.0;
}
