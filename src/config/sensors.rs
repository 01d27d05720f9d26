//! Configuration for the terrain contact probe.

use bevy::prelude::*;

/// Configuration for the terrain contact probe rays.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct SensorConfig {
    /// Horizontal inset of the foot rays from the box edges, so a wall
    /// touching the side of the box is not mistaken for floor.
    pub foot_inset: f32,

    /// Maximum gap between the box bottom and the ground for a foot to count as grounded.
    pub ground_contact_distance: f32,

    /// Steepest walkable slope (radians). Steeper surfaces are treated as walls.
    pub max_slope_angle: f32,

    /// Maximum gap between the box side and a wall for wall contact.
    pub wall_contact_distance: f32,

    /// Vertical inset of the upper and lower wall rays from the box top and bottom.
    pub wall_inset: f32,

    /// Normal-relative separation speed above which a landing candidate is
    /// discarded (the character is moving away from that surface).
    pub landing_separation_speed: f32,

    /// How long (seconds) a one-way platform stays ignored after a drop-through request.
    pub drop_through_duration: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            foot_inset: 1.0,
            ground_contact_distance: 2.0,
            max_slope_angle: std::f32::consts::FRAC_PI_4,
            wall_contact_distance: 1.5,
            wall_inset: 2.0,
            landing_separation_speed: 1.0,
            drop_through_duration: 0.25,
        }
    }
}

impl SensorConfig {
    /// Smallest `normal.y` of a walkable surface.
    #[inline]
    pub fn min_ground_normal_y(&self) -> f32 {
        self.max_slope_angle.cos()
    }
}
