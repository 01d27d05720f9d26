//! Configuration for wall jump mechanics.

use bevy::prelude::*;

/// Configuration for wall jump mechanics.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct WallJumpingConfig {
    /// Horizontal launch speed. The sign is chosen away from the wall.
    pub horizontal_speed: f32,

    /// Vertical launch speed.
    pub vertical_speed: f32,

    /// Air control multiplier while the post-wall-jump penalty is active.
    pub penalty_air_control: f32,

    /// Duration (seconds) of the reduced air control after a wall jump.
    pub penalty_duration: f32,
}

impl Default for WallJumpingConfig {
    fn default() -> Self {
        Self {
            horizontal_speed: 180.0,
            vertical_speed: 300.0,
            penalty_air_control: 0.2,
            penalty_duration: 0.25,
        }
    }
}
