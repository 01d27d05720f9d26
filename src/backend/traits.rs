//! Physics backend abstraction.
//!
//! Two seams separate the locomotion logic from the physics engine:
//!
//! - [`CharacterPhysicsBackend`] reads and writes the character's body
//!   (velocity, position, gravity scale, friction, body type).
//! - [`TerrainQuery`] answers geometric questions about the world around a
//!   character (ray casts, box casts, what a surface is and how it moves).
//!
//! The probe and the cast-and-correct resolution are pure functions over
//! [`TerrainQuery`], so they can be exercised against a hand-built world.

use bevy::prelude::*;

use crate::controller::{BodyMode, FrictionMode};
use crate::detection::{Platform, SurfaceHit};
use crate::probe::ProbeShape;

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the locomotion
/// controller. The controller keeps its own copy of the character's velocity
/// and position for the duration of a step; the backend is only touched when
/// that copy is refreshed at the start of the step and written back at the end.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2;

    /// Teleport an entity. Only used for directly-positioned bodies.
    fn set_position(world: &mut World, entity: Entity, position: Vec2);

    /// Set the multiplier applied to world gravity for this body.
    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32);

    /// Swap the body's surface material.
    ///
    /// `coefficient` is the configured high friction value; it is ignored for
    /// [`FrictionMode::Zero`].
    fn set_friction(world: &mut World, entity: Entity, mode: FrictionMode, coefficient: f32);

    /// Switch between a solver-integrated body and a directly-positioned one.
    fn set_body_mode(world: &mut World, entity: Entity, mode: BodyMode);

    /// Get the character's collision box, if it has a supported collider.
    fn get_probe_shape(world: &World, entity: Entity) -> Option<ProbeShape>;
}

/// Geometric queries against the world around one character.
///
/// Implementations exclude the character's own colliders, trigger volumes
/// and any entity the caller asked to ignore.
pub trait TerrainQuery {
    /// Cast a ray and return the closest solid hit within `max_distance`.
    fn cast_ray(&self, origin: Vec2, direction: Dir2, max_distance: f32) -> Option<SurfaceHit>;

    /// Sweep an axis-aligned box and return the first blocking hit within `max_distance`.
    fn cast_box(
        &self,
        center: Vec2,
        half_extents: Vec2,
        direction: Dir2,
        max_distance: f32,
    ) -> Option<SurfaceHit>;

    /// Linear velocity of a surface. Static geometry reports zero.
    fn surface_velocity(&self, _entity: Entity) -> Vec2 {
        Vec2::ZERO
    }

    /// Platform tag of a surface, if any.
    fn platform(&self, _entity: Entity) -> Option<Platform> {
        None
    }
}
