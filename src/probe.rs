//! Terrain contact probe.
//!
//! Every physics step the probe casts two foot rays down from the edges of
//! the character's collision box and an upper/lower ray pair to each side,
//! and condenses the hits into a [`ContactState`].
//!
//! The foot rays reach far enough to find the ground under the lower foot on
//! the steepest walkable slope. The character is grounded when the nearer
//! foot is within the contact distance; the other foot is grounded when its
//! gap matches what the slope under the nearer foot predicts, so standing on
//! a slope is never mistaken for standing on a ledge.

use bevy::prelude::*;

use crate::backend::TerrainQuery;
use crate::config::SensorConfig;
use crate::detection::{ContactState, SurfaceHit, WallSide};

/// The character's axis-aligned collision box, relative to its body position.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct ProbeShape {
    /// Half width and half height of the box.
    pub half_extents: Vec2,
    /// Offset of the box center from the body position.
    pub offset: Vec2,
}

impl ProbeShape {
    /// A box centered on the body position.
    pub fn new(half_extents: Vec2) -> Self {
        Self {
            half_extents,
            offset: Vec2::ZERO,
        }
    }

    /// Builder: set the collider offset.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Box center for a body at `position`.
    #[inline]
    pub fn center(&self, position: Vec2) -> Vec2 {
        position + self.offset
    }

    /// Whether the box has a usable size.
    pub fn is_valid(&self) -> bool {
        self.half_extents.x > 0.0
            && self.half_extents.y > 0.0
            && self.half_extents.is_finite()
            && self.offset.is_finite()
    }
}

/// A platform excluded from contact for a limited time.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub(crate) struct IgnoredPlatform {
    /// The ignored body.
    pub(crate) entity: Entity,
    /// Seconds left before contact is restored.
    pub(crate) remaining: f32,
}

/// Per-character probe state: collision box, suppression window and
/// temporarily ignored platforms.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct TerrainContactProbe {
    pub(crate) shape: ProbeShape,
    suppression_timer: f32,
    ignored: Vec<IgnoredPlatform>,
}

impl TerrainContactProbe {
    /// Create a probe for the given collision box.
    pub fn new(shape: ProbeShape) -> Self {
        Self {
            shape,
            ..default()
        }
    }

    /// The collision box used for casts.
    pub fn shape(&self) -> ProbeShape {
        self.shape
    }

    /// Force "not grounded" results for `duration` seconds.
    ///
    /// Overwrites any running suppression window.
    pub fn suppress_for(&mut self, duration: f32) {
        self.suppression_timer = duration.max(0.0);
    }

    /// Whether ground sampling is currently suppressed.
    #[inline]
    pub fn is_suppressed(&self) -> bool {
        self.suppression_timer > 0.0
    }

    /// Seconds of suppression left.
    pub fn suppression_remaining(&self) -> f32 {
        self.suppression_timer
    }

    /// Stop colliding with and probing `platform` for `duration` seconds.
    ///
    /// The probe excludes the platform from its casts; the physics backend
    /// reads the same list to filter contact pairs.
    pub fn temporarily_ignore_platform(&mut self, platform: Entity, duration: f32) {
        let duration = duration.max(0.0);
        match self.ignored.iter_mut().find(|ignored| ignored.entity == platform) {
            Some(ignored) => ignored.remaining = ignored.remaining.max(duration),
            None => self.ignored.push(IgnoredPlatform {
                entity: platform,
                remaining: duration,
            }),
        }
    }

    /// Whether `platform` is currently ignored.
    pub fn is_ignoring(&self, platform: Entity) -> bool {
        self.ignored.iter().any(|ignored| ignored.entity == platform)
    }

    /// Entities currently ignored.
    pub fn ignored_platforms(&self) -> impl Iterator<Item = Entity> + '_ {
        self.ignored.iter().map(|ignored| ignored.entity)
    }

    /// Count down the suppression and ignore windows.
    pub fn tick(&mut self, dt: f32) {
        self.suppression_timer = (self.suppression_timer - dt).max(0.0);
        for ignored in &mut self.ignored {
            ignored.remaining -= dt;
        }
        self.ignored.retain(|ignored| ignored.remaining > 0.0);
    }
}

/// Sample the terrain around a character.
///
/// `previous` is the contact state from the last step; it decides whether a
/// ground hit is a landing candidate that must pass the separation check.
pub fn sample_contact(
    query: &impl TerrainQuery,
    probe: &TerrainContactProbe,
    position: Vec2,
    velocity: Vec2,
    previous: &ContactState,
    config: &SensorConfig,
) -> ContactState {
    let center = probe.shape.center(position);
    let half = probe.shape.half_extents;

    let mut contact = ContactState {
        wall_left: sample_wall(query, center, half, WallSide::Left, config),
        wall_right: sample_wall(query, center, half, WallSide::Right, config),
        ..default()
    };

    if probe.is_suppressed() {
        return contact;
    }

    let foot_offset = (half.x - config.foot_inset).max(0.0);
    let foot_span = foot_offset * 2.0;
    let reach =
        half.y + config.ground_contact_distance + foot_span * config.max_slope_angle.tan();
    let min_normal_y = config.min_ground_normal_y();

    let cast_foot = |x: f32| {
        query
            .cast_ray(center + Vec2::new(x, 0.0), Dir2::NEG_Y, reach)
            .filter(|hit| {
                let walkable = hit.normal.y >= min_normal_y;
                if !walkable {
                    debug!("foot ray hit a surface steeper than the slope limit; treating it as wall");
                }
                walkable
            })
    };
    let left = cast_foot(-foot_offset);
    let right = cast_foot(foot_offset);

    let nearest = match (left, right) {
        (Some(l), Some(r)) => {
            if l.distance <= r.distance {
                l
            } else {
                r
            }
        }
        (Some(hit), None) | (None, Some(hit)) => hit,
        (None, None) => return contact,
    };

    let nearest_gap = nearest.distance - half.y;
    if nearest_gap > config.ground_contact_distance {
        return contact;
    }

    if !previous.is_grounded() && is_separating(query, &nearest, velocity, config) {
        return contact;
    }

    // Expected height difference between the feet on this slope.
    let slope_drop = foot_span * nearest.normal.x.abs() / nearest.normal.y.max(f32::EPSILON);
    let foot_limit = nearest_gap.max(0.0) + config.ground_contact_distance + slope_drop;
    let foot_grounded = |hit: Option<SurfaceHit>| hit.is_some_and(|hit| hit.distance - half.y <= foot_limit);

    let platform = query.platform(nearest.entity).unwrap_or_default();
    contact.platform = Some(nearest.entity);
    contact.left_foot_grounded = foot_grounded(left);
    contact.right_foot_grounded = foot_grounded(right);
    contact.ground_normal = nearest.normal;
    contact.ground_distance = nearest_gap;
    contact.is_moving_platform = platform.moving;
    contact.is_one_way_platform = platform.one_way;
    contact
}

/// Whether the character is moving away from a candidate surface fast
/// enough that it must be passing through it rather than landing.
fn is_separating(
    query: &impl TerrainQuery,
    hit: &SurfaceHit,
    velocity: Vec2,
    config: &SensorConfig,
) -> bool {
    let relative = velocity - query.surface_velocity(hit.entity);
    relative.dot(hit.normal) > config.landing_separation_speed
}

/// Both the upper and the lower ray on `side` must hit a non-walkable surface.
fn sample_wall(
    query: &impl TerrainQuery,
    center: Vec2,
    half: Vec2,
    side: WallSide,
    config: &SensorConfig,
) -> bool {
    let direction = match side {
        WallSide::Left => Dir2::NEG_X,
        WallSide::Right => Dir2::X,
    };
    let reach = half.x + config.wall_contact_distance;
    let vertical = (half.y - config.wall_inset).max(0.0);
    let min_normal_y = config.min_ground_normal_y();

    [vertical, -vertical].into_iter().all(|dy| {
        query
            .cast_ray(center + Vec2::new(0.0, dy), direction, reach)
            .is_some_and(|hit| hit.normal.y < min_normal_y)
    })
}
