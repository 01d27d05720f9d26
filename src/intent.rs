//! Movement intent component.
//!
//! Player input mapping and AI behaviors write a [`LocomotionIntent`] every
//! step; the locomotion systems read it. Continuous values (desired speed,
//! move input) persist until changed. One-shot requests (jump, drop-through,
//! dash, end-dash) are consumed by the step that handles them.

use bevy::prelude::*;

/// Per-step movement request for one character.
///
/// # Example
///
/// ```rust
/// use terrain_locomotion::prelude::*;
///
/// let mut intent = LocomotionIntent::new();
/// intent.set_desired_speed(120.0);
/// intent.set_move_input(1.0);
/// intent.request_jump();
/// assert!(intent.is_moving());
/// assert!(intent.jump_requested());
///
/// intent.clear();
/// assert!(!intent.is_moving());
/// assert!(!intent.jump_requested());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct LocomotionIntent {
    /// Target horizontal speed in world units per second.
    pub desired_speed: f32,
    /// Snap to `desired_speed` instead of accelerating (knockback).
    pub skip_acceleration: bool,
    /// Raw horizontal stick/key direction (-1.0 = left, 1.0 = right), used
    /// for wall-stick decisions.
    pub move_input: f32,
    /// Ignore landings this step (attack motions, evasion).
    pub contact_exempt: bool,
    pub(crate) jump: bool,
    pub(crate) drop_through: bool,
    pub(crate) dash: Option<Vec2>,
    pub(crate) end_dash: bool,
}

impl LocomotionIntent {
    /// Create an empty intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target horizontal speed.
    pub fn set_desired_speed(&mut self, speed: f32) {
        self.desired_speed = speed;
        self.skip_acceleration = false;
    }

    /// Set the horizontal speed and apply it without acceleration.
    pub fn snap_to_speed(&mut self, speed: f32) {
        self.desired_speed = speed;
        self.skip_acceleration = true;
    }

    /// Set the horizontal input direction (-1.0 = left, 1.0 = right).
    pub fn set_move_input(&mut self, direction: f32) {
        self.move_input = direction.clamp(-1.0, 1.0);
    }

    /// Mark the current action as ignoring ground contact.
    pub fn set_contact_exempt(&mut self, exempt: bool) {
        self.contact_exempt = exempt;
    }

    /// Ask for a jump this step.
    pub fn request_jump(&mut self) {
        self.jump = true;
    }

    /// Ask to drop through the one-way platform underfoot.
    pub fn request_drop_through(&mut self) {
        self.drop_through = true;
    }

    /// Ask for a dash along `direction`.
    pub fn request_dash(&mut self, direction: Vec2) {
        self.dash = Some(direction);
    }

    /// Signal that the dash animation has completed.
    pub fn request_end_dash(&mut self) {
        self.end_dash = true;
    }

    /// Whether a jump is waiting to be handled.
    pub fn jump_requested(&self) -> bool {
        self.jump
    }

    /// Whether a drop-through is waiting to be handled.
    pub fn drop_through_requested(&self) -> bool {
        self.drop_through
    }

    /// Pending dash direction.
    pub fn dash_requested(&self) -> Option<Vec2> {
        self.dash
    }

    /// Check if there is active horizontal movement.
    pub fn is_moving(&self) -> bool {
        self.desired_speed.abs() > 0.001
    }

    pub(crate) fn take_jump(&mut self) -> bool {
        std::mem::take(&mut self.jump)
    }

    pub(crate) fn take_drop_through(&mut self) -> bool {
        std::mem::take(&mut self.drop_through)
    }

    pub(crate) fn take_dash(&mut self) -> Option<Vec2> {
        self.dash.take()
    }

    pub(crate) fn take_end_dash(&mut self) -> bool {
        std::mem::take(&mut self.end_dash)
    }

    /// Clear all movement and pending requests.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
