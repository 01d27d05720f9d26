//! Locomotion configuration.
//!
//! Tuning is split into small `Copy` structs per concern and grouped in the
//! [`LocomotionConfig`] component. Every value has a tuned default; builders
//! and presets cover the common adjustments.

use bevy::math::curve::EaseFunction;
use bevy::prelude::*;

use crate::error::SetupError;

mod conveyance;
mod dash;
mod gravity;
mod jumping;
mod sensors;
mod walking;
mod wall_jumping;

pub use conveyance::ConveyanceConfig;
pub use dash::DashConfig;
pub use gravity::GravityConfig;
pub use jumping::JumpingConfig;
pub use sensors::SensorConfig;
pub use walking::WalkingConfig;
pub use wall_jumping::WallJumpingConfig;

/// Per-character locomotion tuning.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct LocomotionConfig {
    /// Horizontal acceleration model.
    pub walking: WalkingConfig,
    /// Ground jump and coyote time.
    pub jumping: JumpingConfig,
    /// Wall jump launch and air control penalty.
    pub wall_jumping: WallJumpingConfig,
    /// Gravity scales and fall speed cap.
    pub gravity: GravityConfig,
    /// Contact probe geometry.
    pub sensors: SensorConfig,
    /// Dash/evade motion.
    pub dash: DashConfig,
    /// Manual collision resolution while conveyed.
    pub conveyance: ConveyanceConfig,
}

impl LocomotionConfig {
    /// Create a config optimized for responsive player control.
    pub fn player() -> Self {
        Self {
            walking: WalkingConfig {
                acceleration: 1400.0,
                deceleration: 1800.0,
                turn_acceleration: 2600.0,
                ..default()
            },
            ..default()
        }
    }

    /// Create a config for AI-controlled characters.
    pub fn ai() -> Self {
        Self {
            walking: WalkingConfig {
                acceleration: 600.0,
                deceleration: 800.0,
                turn_acceleration: 1200.0,
                air_control: 0.5,
                ..default()
            },
            ..default()
        }
    }

    /// Check every value the controller divides by or clamps against.
    ///
    /// Called once when a character is initialized; a failure keeps the
    /// character out of the locomotion systems.
    pub fn validate(&self) -> Result<(), SetupError> {
        let walking = &self.walking;
        positive("walking.acceleration", walking.acceleration)?;
        positive("walking.deceleration", walking.deceleration)?;
        positive("walking.turn_acceleration", walking.turn_acceleration)?;
        unit_interval("walking.air_control", walking.air_control)?;
        non_negative("walking.high_friction", walking.high_friction)?;

        non_negative("jumping.speed", self.jumping.speed)?;
        non_negative("jumping.coyote_time", self.jumping.coyote_time)?;
        non_negative("jumping.probe_suppression", self.jumping.probe_suppression)?;

        non_negative("wall_jumping.horizontal_speed", self.wall_jumping.horizontal_speed)?;
        non_negative("wall_jumping.vertical_speed", self.wall_jumping.vertical_speed)?;
        unit_interval(
            "wall_jumping.penalty_air_control",
            self.wall_jumping.penalty_air_control,
        )?;
        non_negative("wall_jumping.penalty_duration", self.wall_jumping.penalty_duration)?;

        non_negative("gravity.default_scale", self.gravity.default_scale)?;
        non_negative("gravity.falling_scale", self.gravity.falling_scale)?;
        positive("gravity.max_fall_speed", self.gravity.max_fall_speed)?;

        let sensors = &self.sensors;
        non_negative("sensors.foot_inset", sensors.foot_inset)?;
        non_negative("sensors.ground_contact_distance", sensors.ground_contact_distance)?;
        non_negative("sensors.wall_contact_distance", sensors.wall_contact_distance)?;
        non_negative("sensors.wall_inset", sensors.wall_inset)?;
        non_negative("sensors.landing_separation_speed", sensors.landing_separation_speed)?;
        non_negative("sensors.drop_through_duration", sensors.drop_through_duration)?;
        if !(sensors.max_slope_angle > 0.0
            && sensors.max_slope_angle < std::f32::consts::FRAC_PI_2)
        {
            return Err(SetupError::invalid(
                "sensors.max_slope_angle",
                "must be between 0 and 90 degrees (exclusive)",
            ));
        }

        non_negative("dash.distance", self.dash.distance)?;
        positive("dash.duration", self.dash.duration)?;
        positive("conveyance.max_penetration", self.conveyance.max_penetration)?;
        Ok(())
    }

    /// Builder: set acceleration, deceleration and turn acceleration.
    pub fn with_acceleration(mut self, acceleration: f32, deceleration: f32, turn: f32) -> Self {
        self.walking.acceleration = acceleration;
        self.walking.deceleration = deceleration;
        self.walking.turn_acceleration = turn;
        self
    }

    /// Builder: set default air control.
    pub fn with_air_control(mut self, air_control: f32) -> Self {
        self.walking.air_control = air_control;
        self
    }

    /// Builder: set jump speed.
    pub fn with_jump_speed(mut self, speed: f32) -> Self {
        self.jumping.speed = speed;
        self
    }

    /// Builder: set coyote time.
    pub fn with_coyote_time(mut self, time: f32) -> Self {
        self.jumping.coyote_time = time;
        self
    }

    /// Builder: set wall jump launch velocity (horizontal magnitude, vertical).
    pub fn with_wall_jump(mut self, horizontal: f32, vertical: f32) -> Self {
        self.wall_jumping.horizontal_speed = horizontal;
        self.wall_jumping.vertical_speed = vertical;
        self
    }

    /// Builder: set the post-wall-jump air control penalty.
    pub fn with_wall_jump_penalty(mut self, air_control: f32, duration: f32) -> Self {
        self.wall_jumping.penalty_air_control = air_control;
        self.wall_jumping.penalty_duration = duration;
        self
    }

    /// Builder: set default and falling gravity scales.
    pub fn with_gravity_scales(mut self, default_scale: f32, falling_scale: f32) -> Self {
        self.gravity.default_scale = default_scale;
        self.gravity.falling_scale = falling_scale;
        self
    }

    /// Builder: set max fall speed.
    pub fn with_max_fall_speed(mut self, speed: f32) -> Self {
        self.gravity.max_fall_speed = speed;
        self
    }

    /// Builder: set max walkable slope angle (radians).
    pub fn with_max_slope_angle(mut self, angle: f32) -> Self {
        self.sensors.max_slope_angle = angle;
        self
    }

    /// Builder: set ground and wall contact distances.
    pub fn with_contact_distances(mut self, ground: f32, wall: f32) -> Self {
        self.sensors.ground_contact_distance = ground;
        self.sensors.wall_contact_distance = wall;
        self
    }

    /// Builder: set dash distance, duration and easing.
    pub fn with_dash(mut self, distance: f32, duration: f32, easing: EaseFunction) -> Self {
        self.dash = DashConfig {
            distance,
            duration,
            easing,
        };
        self
    }

    /// Builder: set the conveyance penetration margin.
    pub fn with_max_penetration(mut self, margin: f32) -> Self {
        self.conveyance.max_penetration = margin;
        self
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), SetupError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SetupError::invalid(field, "must be a positive finite number"))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), SetupError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SetupError::invalid(field, "must be a non-negative finite number"))
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), SetupError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SetupError::invalid(field, "must be within 0.0..=1.0"))
    }
}
