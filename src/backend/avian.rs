//! Avian2D physics backend implementation.
//!
//! This module provides the physics backend for Avian2D.
//! Enable with the `avian2d` feature.
//!
//! Besides body access, the backend owns the two systems that need
//! [`SpatialQuery`]: terrain probing and conveyed movement. One-way
//! platforms and drop-through are implemented with [`PlatformContactHooks`],
//! which must be registered on the physics plugins:
//!
//! ```rust,no_run
//! use avian2d::prelude::*;
//! use bevy::prelude::*;
//! use terrain_locomotion::prelude::*;
//!
//! App::new().add_plugins((
//!     PhysicsPlugins::default().with_collision_hooks::<PlatformContactHooks>(),
//!     LocomotionPlugin::<Avian2dBackend>::default(),
//! ));
//! ```

use avian2d::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::backend::{CharacterPhysicsBackend, TerrainQuery};
use crate::config::LocomotionConfig;
use crate::controller::{BodyMode, FrictionMode, LocomotionController};
use crate::detection::{ContactState, Platform, SurfaceHit};
use crate::probe::{sample_contact, ProbeShape, TerrainContactProbe};
use crate::state::LocomotionReady;
use crate::LocomotionSet;

/// Avian2D physics backend for the locomotion controller.
///
/// Conveyed characters become kinematic bodies whose [`Position`] is written
/// directly; otherwise the character is a dynamic body driven through
/// [`LinearVelocity`] and [`GravityScale`].
pub struct Avian2dBackend;

impl CharacterPhysicsBackend for Avian2dBackend {
    fn plugin() -> impl Plugin {
        Avian2dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<LinearVelocity>(entity)
            .map(|v| v.0)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<LinearVelocity>(entity) {
            vel.0 = velocity;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        // Try Avian's Position component first, then fall back to Transform
        world
            .get::<Position>(entity)
            .map(|p| p.0)
            .or_else(|| world.get::<Transform>(entity).map(|t| t.translation.xy()))
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation().xy())
            })
            .unwrap_or(Vec2::ZERO)
    }

    fn set_position(world: &mut World, entity: Entity, position: Vec2) {
        if let Some(mut pos) = world.get_mut::<Position>(entity) {
            pos.0 = position;
        }
    }

    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32) {
        if let Some(mut gravity) = world.get_mut::<GravityScale>(entity) {
            if gravity.0 != scale {
                gravity.0 = scale;
            }
            return;
        }
        if let Ok(mut entity) = world.get_entity_mut(entity) {
            entity.insert(GravityScale(scale));
        }
    }

    fn set_friction(world: &mut World, entity: Entity, mode: FrictionMode, coefficient: f32) {
        let friction = match mode {
            FrictionMode::Zero => Friction::ZERO.with_combine_rule(CoefficientCombine::Min),
            FrictionMode::High => {
                Friction::new(coefficient).with_combine_rule(CoefficientCombine::Max)
            }
        };
        if let Ok(mut entity) = world.get_entity_mut(entity) {
            entity.insert(friction);
        }
    }

    fn set_body_mode(world: &mut World, entity: Entity, mode: BodyMode) {
        let body = match mode {
            BodyMode::Dynamic => RigidBody::Dynamic,
            BodyMode::Conveyed => RigidBody::Kinematic,
        };
        if let Ok(mut entity) = world.get_entity_mut(entity) {
            entity.insert(body);
        }
    }

    fn get_probe_shape(world: &World, entity: Entity) -> Option<ProbeShape> {
        world.get::<Collider>(entity).and_then(probe_shape_of)
    }
}

/// Axis-aligned bounding box of a supported collider shape.
pub fn probe_shape_of(collider: &Collider) -> Option<ProbeShape> {
    let shape = collider.shape_scaled();
    let half_extents = if let Some(cuboid) = shape.as_cuboid() {
        Vec2::new(cuboid.half_extents.x, cuboid.half_extents.y)
    } else if let Some(capsule) = shape.as_capsule() {
        // Vertical capsule: half segment length plus the cap radius
        let segment = capsule.segment;
        let half_height = (segment.a.y - segment.b.y).abs() / 2.0;
        Vec2::new(capsule.radius, half_height + capsule.radius)
    } else if let Some(ball) = shape.as_ball() {
        Vec2::splat(ball.radius)
    } else {
        return None;
    };
    Some(ProbeShape::new(half_extents))
}

/// Plugin that sets up Avian2D-specific systems for the locomotion controller.
pub struct Avian2dBackendPlugin;

impl Plugin for Avian2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            prepare_avian_bodies.in_set(LocomotionSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            avian_probe_contacts.in_set(LocomotionSet::Probe),
        );
        app.add_systems(
            FixedUpdate,
            avian_convey.in_set(LocomotionSet::Conveyance),
        );
    }
}

// === Terrain queries ===

/// Spatial query access shared by the probe and conveyance systems.
#[derive(SystemParam)]
pub struct TerrainParams<'w, 's> {
    spatial: SpatialQuery<'w, 's>,
    colliders: Query<'w, 's, (Option<&'static ColliderOf>, Has<Sensor>)>,
    surfaces: Query<'w, 's, (Option<&'static LinearVelocity>, Option<&'static Platform>)>,
}

impl<'w, 's> TerrainParams<'w, 's> {
    /// Terrain as seen by `owner`: its own colliders, sensors and `excluded`
    /// bodies are invisible.
    pub fn for_character(
        &self,
        owner: Entity,
        layers: Option<&CollisionLayers>,
        excluded: impl IntoIterator<Item = Entity>,
    ) -> AvianTerrainQuery<'_, 'w, 's> {
        // Use the character's filters as the mask - this finds entities whose memberships
        // overlap with what the character is allowed to collide with
        let filter = match layers {
            Some(layers) => SpatialQueryFilter::from_mask(layers.filters),
            None => SpatialQueryFilter::default(),
        }
        .with_excluded_entities([owner]);

        AvianTerrainQuery {
            params: self,
            filter,
            owner,
            excluded: excluded.into_iter().collect(),
        }
    }

    /// The rigid body a collider belongs to, or the collider itself.
    fn body_of(&self, collider: Entity) -> Entity {
        self.colliders
            .get(collider)
            .ok()
            .and_then(|(collider_of, _)| collider_of.map(|of| of.body))
            .unwrap_or(collider)
    }
}

/// [`TerrainQuery`] backed by Avian's [`SpatialQuery`].
pub struct AvianTerrainQuery<'p, 'w, 's> {
    params: &'p TerrainParams<'w, 's>,
    filter: SpatialQueryFilter,
    owner: Entity,
    excluded: Vec<Entity>,
}

impl AvianTerrainQuery<'_, '_, '_> {
    fn accepts(&self, collider: Entity) -> bool {
        let (body, sensor) = match self.params.colliders.get(collider) {
            Ok((collider_of, sensor)) => (collider_of.map_or(collider, |of| of.body), sensor),
            Err(_) => (collider, false),
        };
        !sensor && body != self.owner && !self.excluded.contains(&body)
    }
}

impl TerrainQuery for AvianTerrainQuery<'_, '_, '_> {
    fn cast_ray(&self, origin: Vec2, direction: Dir2, max_distance: f32) -> Option<SurfaceHit> {
        self.params
            .spatial
            .cast_ray_predicate(origin, direction, max_distance, true, &self.filter, &|entity| {
                self.accepts(entity)
            })
            .map(|hit| {
                SurfaceHit::new(
                    hit.distance,
                    hit.normal,
                    origin + *direction * hit.distance,
                    self.params.body_of(hit.entity),
                )
            })
    }

    fn cast_box(
        &self,
        center: Vec2,
        half_extents: Vec2,
        direction: Dir2,
        max_distance: f32,
    ) -> Option<SurfaceHit> {
        let shape = Collider::rectangle(half_extents.x * 2.0, half_extents.y * 2.0);
        let config = ShapeCastConfig::from_max_distance(max_distance);
        self.params
            .spatial
            .cast_shape_predicate(&shape, center, 0.0, direction, &config, &self.filter, &|entity| {
                self.accepts(entity)
            })
            .map(|hit| {
                // normal1 is the surface normal on the hit shape
                SurfaceHit::new(hit.distance, hit.normal1, hit.point1, self.params.body_of(hit.entity))
            })
    }

    fn surface_velocity(&self, entity: Entity) -> Vec2 {
        self.params
            .surfaces
            .get(entity)
            .ok()
            .and_then(|(velocity, _)| velocity.map(|v| v.0))
            .unwrap_or(Vec2::ZERO)
    }

    fn platform(&self, entity: Entity) -> Option<Platform> {
        self.params
            .surfaces
            .get(entity)
            .ok()
            .and_then(|(_, platform)| platform.copied())
    }
}

// === Systems ===

/// Lock rotation on new characters and enable contact hooks on characters
/// and tagged platforms.
fn prepare_avian_bodies(
    mut commands: Commands,
    characters: Query<Entity, Added<LocomotionController>>,
    platforms: Query<Entity, (Added<Platform>, With<Collider>)>,
) {
    let hooks = ActiveCollisionHooks::FILTER_PAIRS | ActiveCollisionHooks::MODIFY_CONTACTS;
    for entity in &characters {
        commands
            .entity(entity)
            .insert_if_new((LockedAxes::ROTATION_LOCKED, hooks));
    }
    for entity in &platforms {
        commands.entity(entity).insert_if_new(hooks);
    }
}

/// Sample terrain contact for every character.
fn avian_probe_contacts(
    terrain: TerrainParams,
    mut characters: Query<
        (
            Entity,
            &LocomotionController,
            &TerrainContactProbe,
            &LocomotionConfig,
            &mut ContactState,
            Option<&CollisionLayers>,
        ),
        With<LocomotionReady>,
    >,
) {
    for (entity, controller, probe, config, mut contact, layers) in &mut characters {
        let query = terrain.for_character(entity, layers, probe.ignored_platforms());
        let sampled = sample_contact(
            &query,
            probe,
            controller.position(),
            controller.velocity(),
            &contact,
            &config.sensors,
        );
        *contact = sampled;
    }
}

/// Move conveyed characters by their own and the platform's velocity, with cast-and-correct.
fn avian_convey(
    time: Res<Time>,
    terrain: TerrainParams,
    mut characters: Query<
        (
            Entity,
            &mut LocomotionController,
            &TerrainContactProbe,
            &LocomotionConfig,
            Option<&CollisionLayers>,
        ),
        With<LocomotionReady>,
    >,
) {
    let dt = time.delta_secs();
    for (entity, mut controller, probe, config, layers) in &mut characters {
        if controller.body_mode() != BodyMode::Conveyed {
            continue;
        }
        let platform = controller.attached_platform();
        let query = terrain.for_character(
            entity,
            layers,
            probe.ignored_platforms().chain(platform),
        );
        controller.convey(&query, &probe.shape(), &config.conveyance, dt);
    }
}

// === Contact hooks ===

/// Collision hooks for one-way platforms and drop-through.
///
/// - A character never collides with a platform its probe is ignoring.
/// - A [`Platform::one_way`] platform only holds a character from above:
///   contacts whose normal is steeper than the character's walkable slope
///   are discarded, so the character can jump up through it.
#[derive(SystemParam)]
pub struct PlatformContactHooks<'w, 's> {
    colliders: Query<'w, 's, &'static ColliderOf>,
    characters: Query<'w, 's, (&'static TerrainContactProbe, &'static LocomotionConfig)>,
    platforms: Query<'w, 's, &'static Platform>,
}

impl PlatformContactHooks<'_, '_> {
    fn body_of(&self, collider: Entity) -> Entity {
        self.colliders.get(collider).map_or(collider, |of| of.body)
    }

    fn ignores(&self, character: Entity, platform: Entity) -> bool {
        self.characters
            .get(character)
            .is_ok_and(|(probe, _)| probe.is_ignoring(platform))
    }

    fn is_one_way(&self, entity: Entity) -> bool {
        self.platforms.get(entity).is_ok_and(|platform| platform.one_way)
    }
}

impl CollisionHooks for PlatformContactHooks<'_, '_> {
    fn filter_pairs(&self, collider1: Entity, collider2: Entity, _commands: &mut Commands) -> bool {
        let body1 = self.body_of(collider1);
        let body2 = self.body_of(collider2);
        !(self.ignores(body1, body2) || self.ignores(body2, body1))
    }

    fn modify_contacts(&self, contacts: &mut ContactPair, _commands: &mut Commands) -> bool {
        let body1 = self.body_of(contacts.collider1);
        let body2 = self.body_of(contacts.collider2);
        if self.ignores(body1, body2) || self.ignores(body2, body1) {
            return false;
        }

        // Manifold normals point from the first collider to the second.
        let (character, up) = if self.is_one_way(body1) {
            (body2, 1.0)
        } else if self.is_one_way(body2) {
            (body1, -1.0)
        } else {
            return true;
        };
        let Ok((_, config)) = self.characters.get(character) else {
            return true;
        };
        let min_normal_y = config.sensors.min_ground_normal_y();
        contacts
            .manifolds
            .iter()
            .all(|manifold| manifold.normal.y * up >= min_normal_y)
    }
}
