//! Configuration for core jump mechanics.

use bevy::prelude::*;

/// Configuration for core jump mechanics.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct JumpingConfig {
    /// Vertical speed set by a ground jump (units/second).
    pub speed: f32,

    /// Coyote time duration in seconds.
    pub coyote_time: f32,

    /// How long (seconds) the contact probe reports "not grounded" after a jump,
    /// so the character does not re-land on the slope it just left.
    pub probe_suppression: f32,
}

impl Default for JumpingConfig {
    fn default() -> Self {
        Self {
            speed: 320.0,
            coyote_time: 0.1,
            probe_suppression: 0.1,
        }
    }
}
