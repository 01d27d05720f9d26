//! Configuration for moving platform conveyance.

use bevy::prelude::*;

/// Configuration for moving platform conveyance.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct ConveyanceConfig {
    /// Margin used by the backward boundary cast when a conveyed character
    /// is blocked. Post-resolution penetration never exceeds this value.
    pub max_penetration: f32,
}

impl Default for ConveyanceConfig {
    fn default() -> Self {
        Self {
            max_penetration: 0.25,
        }
    }
}
