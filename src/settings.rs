//! Collision tuning
//!
//! Loaded from a JSON file next to the game's other settings. Missing
//! fields fall back to defaults, so older files keep working.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{FATTEN_MARGIN, VELOCITY_MULTIPLIER};
use crate::error::CollisionError;

/// Broad-phase strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollisionStrategy {
    /// Test every pair
    Naive,
    #[default]
    DynamicAabbTree,
}

impl CollisionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionStrategy::Naive => "Naive",
            CollisionStrategy::DynamicAabbTree => "DynamicAabbTree",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "naive" => Some(CollisionStrategy::Naive),
            "dynamicaabbtree" | "tree" | "dynamic" => Some(CollisionStrategy::DynamicAabbTree),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    pub strategy: CollisionStrategy,
    /// Padding added on every side of a leaf's box. Larger means fewer
    /// re-insertions but more narrow-phase rejections.
    pub fatten_margin: f32,
    /// Frames of velocity the leaf box is stretched by
    pub velocity_multiplier: f32,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            strategy: CollisionStrategy::default(),
            fatten_margin: FATTEN_MARGIN,
            velocity_multiplier: VELOCITY_MULTIPLIER,
        }
    }
}

impl CollisionSettings {
    pub fn with_strategy(strategy: CollisionStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Margins must be finite and non-negative
    pub fn validate(&self) -> Result<(), CollisionError> {
        for (name, value) in [
            ("fatten_margin", self.fatten_margin),
            ("velocity_multiplier", self.velocity_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CollisionError::InvalidSetting { name, value });
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, CollisionError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, CollisionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, CollisionError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from disk, falling back to defaults on any error
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded collision settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Using default collision settings ({err})");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CollisionError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Collision settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = CollisionSettings::from_json(r#"{ "strategy": "Naive" }"#).unwrap();
        assert_eq!(settings.strategy, CollisionStrategy::Naive);
        assert_eq!(settings.fatten_margin, FATTEN_MARGIN);
        assert_eq!(settings.velocity_multiplier, VELOCITY_MULTIPLIER);
    }

    #[test]
    fn test_rejects_negative_margin() {
        let err = CollisionSettings::from_json(r#"{ "fatten_margin": -1.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            CollisionError::InvalidSetting {
                name: "fatten_margin",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            CollisionSettings::from_json("{ strategy"),
            Err(CollisionError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "actor_collision_settings_{}.json",
            std::process::id()
        ));
        let settings = CollisionSettings {
            strategy: CollisionStrategy::Naive,
            fatten_margin: 8.0,
            velocity_multiplier: 1.5,
        };
        settings.save(&path).unwrap();
        assert_eq!(CollisionSettings::load(&path), settings);
        std::fs::remove_file(&path).unwrap();

        // Missing file falls back to defaults
        assert_eq!(CollisionSettings::load(&path), CollisionSettings::default());
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(
            CollisionStrategy::from_str("tree"),
            Some(CollisionStrategy::DynamicAabbTree)
        );
        assert_eq!(CollisionStrategy::from_str("NAIVE"), Some(CollisionStrategy::Naive));
        assert_eq!(CollisionStrategy::from_str("grid"), None);
        assert_eq!(CollisionStrategy::Naive.as_str(), "Naive");
    }
}
