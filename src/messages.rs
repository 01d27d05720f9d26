//! Messages emitted by the locomotion systems.

use bevy::prelude::*;

/// Fired on the step a character goes from airborne (or wall-stuck) to grounded.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct Landed {
    /// The character that landed.
    pub entity: Entity,
    /// The body it landed on.
    pub platform: Option<Entity>,
    /// Velocity just before touching down.
    pub impact_velocity: Vec2,
}

/// Fired when a dash curve reaches its end.
///
/// Contact handling stays disabled until the character's intent requests
/// the end of the dash.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct DashCompleted {
    /// The dashing character.
    pub entity: Entity,
    /// Where the curve ended.
    pub position: Vec2,
}
