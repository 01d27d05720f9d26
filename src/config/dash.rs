//! Configuration for dash/evade motion.

use bevy::math::curve::EaseFunction;
use bevy::prelude::*;

/// Configuration for dash/evade motion.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct DashConfig {
    /// Distance covered by a dash.
    pub distance: f32,

    /// Duration of the dash in seconds.
    pub duration: f32,

    /// Easing applied to the position interpolation.
    pub easing: EaseFunction,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            distance: 64.0,
            duration: 0.2,
            easing: EaseFunction::QuadraticOut,
        }
    }
}
