//! Detection result structures.
//!
//! These structures hold the results of terrain queries (raycasts and box
//! casts) and the per-step contact state derived from them.

use bevy::prelude::*;

/// Information about a raycast/shapecast hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Distance travelled along the cast direction before the hit.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec2,
    /// World position of the hit point.
    pub point: Vec2,
    /// Body (or collider, when it has no body) that was hit.
    pub entity: Entity,
}

impl SurfaceHit {
    /// Create a hit result.
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Entity) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// Side of the character a wall was found on.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallSide {
    /// Wall on the left (negative X).
    Left,
    /// Wall on the right (positive X).
    Right,
}

impl WallSide {
    /// -1.0 for the left side, 1.0 for the right side.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            WallSide::Left => -1.0,
            WallSide::Right => 1.0,
        }
    }

    /// Horizontal sign pointing away from this wall.
    #[inline]
    pub fn away(self) -> f32 {
        -self.sign()
    }
}

/// Tags a body the probe should treat specially when standing on it.
///
/// Moving platforms switch the rider into conveyed mode; one-way platforms
/// accept drop-through requests.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[reflect(Component)]
pub struct Platform {
    /// Kinematic/scripted mover (elevator, conveyor).
    pub moving: bool,
    /// Can be jumped through from below and dropped through from above.
    pub one_way: bool,
}

impl Platform {
    /// A moving platform.
    pub fn moving() -> Self {
        Self {
            moving: true,
            one_way: false,
        }
    }

    /// A static one-way platform.
    pub fn one_way() -> Self {
        Self {
            moving: false,
            one_way: true,
        }
    }
}

/// Terrain contact for the current physics step.
///
/// Overwritten every step by the probe before any controller system reads
/// it. `ground_normal` is only meaningful while [`is_grounded`](Self::is_grounded).
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ContactState {
    /// Body currently supporting the character.
    pub platform: Option<Entity>,
    /// Left foot ray is within contact distance.
    pub left_foot_grounded: bool,
    /// Right foot ray is within contact distance.
    pub right_foot_grounded: bool,
    /// Both left wall rays hit.
    pub wall_left: bool,
    /// Both right wall rays hit.
    pub wall_right: bool,
    /// Ground surface normal (points away from surface). Valid when grounded.
    pub ground_normal: Vec2,
    /// Gap between the box bottom and the ground. Valid when grounded.
    pub ground_distance: f32,
    /// `platform` is tagged as a moving platform.
    pub is_moving_platform: bool,
    /// `platform` is tagged as a one-way platform.
    pub is_one_way_platform: bool,
}

impl Default for ContactState {
    fn default() -> Self {
        Self {
            platform: None,
            left_foot_grounded: false,
            right_foot_grounded: false,
            wall_left: false,
            wall_right: false,
            ground_normal: Vec2::Y,
            ground_distance: f32::MAX,
            is_moving_platform: false,
            is_one_way_platform: false,
        }
    }
}

impl ContactState {
    /// Whether something supports the character this step.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.platform.is_some()
    }

    /// Forward-facing direction along the ground (normal rotated 90° clockwise).
    ///
    /// On flat ground this is `Vec2::X`.
    #[inline]
    pub fn ground_tangent(&self) -> Vec2 {
        Vec2::new(self.ground_normal.y, -self.ground_normal.x)
    }

    /// Grounded with the foot on the `direction` side hanging over nothing.
    pub fn is_on_ledge(&self, direction: f32) -> bool {
        if !self.is_grounded() {
            return false;
        }
        if direction > 0.0 {
            !self.right_foot_grounded
        } else if direction < 0.0 {
            !self.left_foot_grounded
        } else {
            false
        }
    }

    /// Whether the wall on `side` is in contact.
    #[inline]
    pub fn touching_wall(&self, side: WallSide) -> bool {
        match side {
            WallSide::Left => self.wall_left,
            WallSide::Right => self.wall_right,
        }
    }

    /// The contacted wall that `direction` points into, if any.
    pub fn wall_in_direction(&self, direction: f32) -> Option<WallSide> {
        if direction < -0.001 && self.wall_left {
            Some(WallSide::Left)
        } else if direction > 0.001 && self.wall_right {
            Some(WallSide::Right)
        } else {
            None
        }
    }
}
