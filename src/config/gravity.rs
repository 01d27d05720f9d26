//! Configuration for gravity scaling and fall speed.

use bevy::prelude::*;

/// Configuration for gravity scaling and fall speed.
///
/// Gravity itself is integrated by the physics engine; the controller only
/// switches the body's gravity scale.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct GravityConfig {
    /// Gravity scale while rising or grounded.
    pub default_scale: f32,

    /// Gravity scale while falling. Higher than `default_scale` to avoid a floaty apex.
    pub falling_scale: f32,

    /// Maximum downward speed (units/second).
    pub max_fall_speed: f32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            default_scale: 1.0,
            falling_scale: 2.0,
            max_fall_speed: 600.0,
        }
    }
}
