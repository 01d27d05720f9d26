//! Configuration for horizontal movement.

use bevy::prelude::*;

/// Configuration for horizontal movement.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct WalkingConfig {
    /// Rate used when speeding up in the current direction (units/second^2).
    pub acceleration: f32,

    /// Rate used when the desired speed is zero (units/second^2).
    pub deceleration: f32,

    /// Rate used when the desired speed points against the current motion (units/second^2).
    pub turn_acceleration: f32,

    /// Default air control multiplier (0.0-1.0) applied to every rate while airborne.
    pub air_control: f32,

    /// Friction coefficient of the "high" surface material.
    pub high_friction: f32,
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            acceleration: 900.0,
            deceleration: 1200.0,
            turn_acceleration: 1800.0,
            air_control: 0.8,
            high_friction: 1.0,
        }
    }
}

impl WalkingConfig {
    /// Pick the rate for moving from `current` toward `target`.
    pub fn rate_for(&self, current: f32, target: f32) -> f32 {
        if target.abs() <= f32::EPSILON {
            self.deceleration
        } else if current * target < 0.0 {
            self.turn_acceleration
        } else {
            self.acceleration
        }
    }
}
