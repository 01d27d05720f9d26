use bevy::prelude::*;

/// Empty plugin for backends that register no systems of their own.
///
/// Such a backend only gets body reads and writes; it must fill
/// [`ContactState`](crate::detection::ContactState) itself (or leave contact
/// to gameplay code) and does not move conveyed bodies.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
