//! Marker components for character lifecycle.

use bevy::prelude::*;

use crate::error::SetupError;

/// Character passed setup and is driven by the locomotion systems.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct LocomotionReady;

/// Character failed setup and is left alone.
///
/// Remove this component (after fixing the cause) to retry initialization.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct LocomotionSetupFailed(pub SetupError);
