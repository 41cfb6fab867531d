//! Error type for registration, configuration and tree validation
//!
//! The per-frame path (`update`/`evaluate`) never returns errors; only
//! lifecycle calls and diagnostics do.

use crate::collision::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum CollisionError {
    /// Entity is already present in the spatial index.
    #[error("entity {0} is already registered")]
    AlreadyRegistered(EntityId),
    /// Entity was never registered, or was already removed.
    #[error("entity {0} is not registered")]
    NotRegistered(EntityId),
    /// A numeric setting is out of range.
    #[error("invalid setting `{name}`: {value}")]
    InvalidSetting { name: &'static str, value: f32 },
    #[error("settings parse error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
    /// Structural check of the tree failed.
    #[error("tree invariant violated: {0}")]
    TreeInvariant(String),
}
