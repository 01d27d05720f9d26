//! Setup errors.
//!
//! Runtime movement never fails: illegal requests are silently ignored.
//! The only fallible path is character initialization, where a missing
//! collider or nonsensical tuning must stop the character from running in
//! an undefined state.

use bevy::prelude::*;
use thiserror::Error;

/// Errors raised while initializing a character for locomotion.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SetupError {
    /// A configuration value is outside its valid range.
    #[error("invalid locomotion config `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// A component required by the probe or the physics backend is missing.
    #[error("entity {entity:?} is missing required component `{component}`")]
    MissingComponent {
        /// The character entity.
        entity: Entity,
        /// Name of the missing component.
        component: &'static str,
    },
}

impl SetupError {
    /// Creates an invalid config error.
    #[must_use]
    pub const fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidConfig { field, reason }
    }

    /// Creates a missing component error.
    #[must_use]
    pub const fn missing(entity: Entity, component: &'static str) -> Self {
        Self::MissingComponent { entity, component }
    }
}
