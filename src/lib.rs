//! # `terrain_locomotion`
//!
//! Terrain contact and locomotion for 2D side-scroller characters, with a
//! physics backend abstraction.
//!
//! Every fixed step this crate answers three questions for each character:
//! is it touching ground or a wall, how should its velocity evolve given the
//! player's or AI's intent, and how does it ride a surface that is itself
//! moving.
//!
//! - A [`TerrainContactProbe`](probe::TerrainContactProbe) casts two foot
//!   rays and an upper/lower ray pair per side and reports a
//!   [`ContactState`](detection::ContactState).
//! - A [`LocomotionController`](controller::LocomotionController) consumes the
//!   contact state and a [`LocomotionIntent`](intent::LocomotionIntent) and
//!   drives velocity, gravity scale, friction and body mode through the
//!   `Grounded` / `Airborne` / `WallStick` / `Conveyed` state machine.
//! - While conveyed on a moving platform the body is positioned directly and
//!   the controller resolves its own collisions with a box cast.
//!
//! ## System Order
//!
//! Systems run in `FixedUpdate`, in the phases of [`LocomotionSet`]:
//!
//! 1. **Preparation** - Initialize new characters, read the physics body, tick timers
//! 2. **Probe** - Sample terrain contact (backend)
//! 3. **Evaluation** - Landing, conveyance, drop-through, wall-stick
//! 4. **Movement** - Dash, jump, horizontal motion, gravity
//! 5. **Conveyance** - Move conveyed bodies with cast-and-correct (backend)
//! 6. **Writeback** - Push velocity, gravity scale, friction and body mode
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use terrain_locomotion::prelude::*;
//!
//! let controller = LocomotionController::default();
//! let config = LocomotionConfig::player();
//! let mut intent = LocomotionIntent::new();
//! intent.set_desired_speed(120.0);
//!
//! // Spawn these together with a collider and a rigid body.
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod config;
pub mod controller;
pub mod conveyance;
pub mod detection;
pub mod error;
pub mod intent;
pub mod messages;
pub mod probe;
pub mod state;

// Systems are internal - they're added automatically by the plugin
pub(crate) mod systems;

#[cfg(test)]
mod test_support;

#[cfg(feature = "avian2d")]
pub use backend::avian;

/// System sets for the locomotion phases.
///
/// The sets are chained: contact state is always sampled before anything
/// reads it in the same step.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    /// Phase 1: Initialize characters, refresh controller from the body, tick timers.
    Preparation,
    /// Phase 2: Sample terrain contact.
    Probe,
    /// Phase 3: Turn contact and intent into mode transitions.
    Evaluation,
    /// Phase 4: Compute this step's velocity.
    Movement,
    /// Phase 5: Move directly-positioned bodies.
    Conveyance,
    /// Phase 6: Write the result to the physics body.
    Writeback,
}

pub mod prelude {
    //! Convenient re-exports for common usage.
    //!
    //! ```rust,no_run
    //! use avian2d::prelude::*;
    //! use bevy::prelude::*;
    //! use terrain_locomotion::prelude::*;
    //!
    //! fn spawn_character(mut commands: Commands) {
    //!     commands.spawn((
    //!         Transform::from_xyz(0.0, 100.0, 0.0),
    //!         RigidBody::Dynamic,
    //!         Collider::rectangle(12.0, 24.0),
    //!         LocomotionController::default(),
    //!         LocomotionConfig::player(),
    //!     ));
    //! }
    //! ```

    pub use crate::backend::{CharacterPhysicsBackend, NoOpBackendPlugin, TerrainQuery};
    pub use crate::config::{
        ConveyanceConfig, DashConfig, GravityConfig, JumpingConfig, LocomotionConfig,
        SensorConfig, WalkingConfig, WallJumpingConfig,
    };
    pub use crate::controller::{BodyMode, FrictionMode, LocomotionController, MovementMode};
    pub use crate::detection::{ContactState, Platform, SurfaceHit, WallSide};
    pub use crate::error::SetupError;
    pub use crate::intent::LocomotionIntent;
    pub use crate::messages::{DashCompleted, Landed};
    pub use crate::probe::{ProbeShape, TerrainContactProbe};
    pub use crate::state::{LocomotionReady, LocomotionSetupFailed};
    pub use crate::{LocomotionPlugin, LocomotionSet};

    #[cfg(feature = "avian2d")]
    pub use crate::avian::{Avian2dBackend, PlatformContactHooks};
}

/// Main plugin for the locomotion systems.
///
/// Generic over a physics backend `B`, which provides body access and the
/// probe/conveyance systems that need the engine's spatial queries.
///
/// # Examples
///
/// With the Avian2D backend:
/// ```rust,no_run
/// use avian2d::prelude::*;
/// use bevy::prelude::*;
/// use terrain_locomotion::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(PhysicsPlugins::default().with_collision_hooks::<PlatformContactHooks>())
///     .add_plugins(LocomotionPlugin::<Avian2dBackend>::default())
///     .run();
/// ```
pub struct LocomotionPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for LocomotionPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> LocomotionPlugin<B> {
    /// Create a new locomotion plugin.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for LocomotionPlugin<B> {
    fn build(&self, app: &mut App) {
        app.register_type::<controller::LocomotionController>();
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<detection::ContactState>();
        app.register_type::<detection::Platform>();
        app.register_type::<intent::LocomotionIntent>();
        app.register_type::<probe::TerrainContactProbe>();
        app.register_type::<state::LocomotionReady>();

        app.add_message::<messages::Landed>();
        app.add_message::<messages::DashCompleted>();

        app.add_plugins(B::plugin());

        app.configure_sets(
            FixedUpdate,
            (
                LocomotionSet::Preparation,
                LocomotionSet::Probe,
                LocomotionSet::Evaluation,
                LocomotionSet::Movement,
                LocomotionSet::Conveyance,
                LocomotionSet::Writeback,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::initialize_characters::<B>,
                systems::read_body_state::<B>,
                systems::tick_timers,
            )
                .chain()
                .in_set(LocomotionSet::Preparation),
        );

        // Drop-through reads the contact of this step before wall-stick may change the mode.
        app.add_systems(
            FixedUpdate,
            (
                systems::evaluate_contacts,
                systems::handle_drop_through,
                systems::evaluate_wall_stick,
            )
                .chain()
                .in_set(LocomotionSet::Evaluation),
        );

        // Dash first so a new dash blocks the jump and walk of the same step.
        app.add_systems(
            FixedUpdate,
            (
                systems::apply_dash_requests,
                systems::apply_jump,
                systems::apply_horizontal,
                systems::apply_gravity,
                systems::advance_dashes,
            )
                .chain()
                .in_set(LocomotionSet::Movement),
        );

        app.add_systems(
            FixedUpdate,
            systems::write_body_state::<B>.in_set(LocomotionSet::Writeback),
        );
    }
}
