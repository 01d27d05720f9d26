//! Core locomotion systems.
//!
//! These systems drive [`LocomotionController`] once per fixed step. Body
//! reads and writes are generic over the physics backend and run as
//! exclusive systems; everything in between only touches components.

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::config::LocomotionConfig;
use crate::controller::{BodyMode, LocomotionController, MovementMode};
use crate::detection::ContactState;
use crate::error::SetupError;
use crate::intent::LocomotionIntent;
use crate::messages::{DashCompleted, Landed};
use crate::probe::{ProbeShape, TerrainContactProbe};
use crate::state::{LocomotionReady, LocomotionSetupFailed};

type Ready = (With<LocomotionReady>, Without<LocomotionSetupFailed>);

// === Preparation ===

/// Validate new characters and capture their collision box.
///
/// Characters that fail are tagged with [`LocomotionSetupFailed`] and never
/// touched by the other systems.
pub fn initialize_characters<B: CharacterPhysicsBackend>(world: &mut World) {
    let pending: Vec<(Entity, LocomotionConfig)> = world
        .query_filtered::<(Entity, &LocomotionConfig), (
            With<LocomotionController>,
            Without<LocomotionReady>,
            Without<LocomotionSetupFailed>,
        )>()
        .iter(world)
        .map(|(entity, config)| (entity, *config))
        .collect();

    for (entity, config) in pending {
        match prepare_character::<B>(world, entity, &config) {
            Ok(shape) => {
                let position = B::get_position(world, entity);
                if let Some(mut probe) = world.get_mut::<TerrainContactProbe>(entity) {
                    probe.shape = shape;
                }
                if let Some(mut controller) = world.get_mut::<LocomotionController>(entity) {
                    controller.reset(&config);
                    controller.sync_from_body(position, None);
                }
                world.entity_mut(entity).insert(LocomotionReady);
                debug!("locomotion ready for {entity:?}: box {:?}", shape.half_extents);
            }
            Err(err) => {
                error!("locomotion setup failed: {err}");
                world.entity_mut(entity).insert(LocomotionSetupFailed(err));
            }
        }
    }
}

fn prepare_character<B: CharacterPhysicsBackend>(
    world: &World,
    entity: Entity,
    config: &LocomotionConfig,
) -> Result<ProbeShape, SetupError> {
    config.validate()?;
    let shape = B::get_probe_shape(world, entity)
        .ok_or(SetupError::missing(entity, "Collider"))?;
    if !shape.is_valid() {
        return Err(SetupError::invalid(
            "collider",
            "collision box must have a positive, finite size",
        ));
    }
    Ok(shape)
}

/// Refresh the controller from the physics body.
///
/// Conveyed bodies keep the controller's own velocity; the body's is zero.
pub fn read_body_state<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, BodyMode)> = world
        .query_filtered::<(Entity, &LocomotionController), Ready>()
        .iter(world)
        .map(|(entity, controller)| (entity, controller.body_mode()))
        .collect();

    for (entity, body_mode) in entities {
        let position = B::get_position(world, entity);
        let velocity = (body_mode == BodyMode::Dynamic).then(|| B::get_velocity(world, entity));
        if let Some(mut controller) = world.get_mut::<LocomotionController>(entity) {
            controller.sync_from_body(position, velocity);
        }
    }
}

/// Count down every per-character timer once per step.
pub fn tick_timers(
    time: Res<Time>,
    mut characters: Query<
        (&mut LocomotionController, &mut TerrainContactProbe, &LocomotionConfig),
        Ready,
    >,
) {
    let dt = time.delta_secs();
    for (mut controller, mut probe, config) in &mut characters {
        controller.tick_timers(config, dt);
        probe.tick(dt);
    }
}

// === Evaluation ===

/// Apply fresh contact state to the movement mode.
pub fn evaluate_contacts(
    mut characters: Query<
        (
            Entity,
            &mut LocomotionController,
            &ContactState,
            &LocomotionIntent,
            &LocomotionConfig,
        ),
        Ready,
    >,
    mut landed: MessageWriter<Landed>,
) {
    for (entity, mut controller, contact, intent, config) in &mut characters {
        let impact_velocity = controller.written_velocity();
        let transition = controller.update_contact(contact, intent.contact_exempt, config);

        if transition.landed {
            debug!("{entity:?} landed on {:?}", contact.platform);
            landed.write(Landed {
                entity,
                platform: contact.platform,
                impact_velocity,
            });
        }
        if transition.entered_conveyance {
            debug!("{entity:?} conveyed by {:?}", controller.attached_platform());
        }
        if transition.exited_conveyance {
            debug!("{entity:?} left conveyance with velocity {:?}", controller.velocity());
        }
    }
}

/// Start ignoring the one-way platform underfoot on request.
pub fn handle_drop_through(
    mut characters: Query<
        (
            Entity,
            &mut LocomotionIntent,
            &mut TerrainContactProbe,
            &ContactState,
            &LocomotionConfig,
        ),
        Ready,
    >,
) {
    for (entity, mut intent, mut probe, contact, config) in &mut characters {
        if !intent.take_drop_through() {
            continue;
        }
        let Some(platform) = contact.platform.filter(|_| contact.is_one_way_platform) else {
            trace!("{entity:?} drop-through ignored: not on a one-way platform");
            continue;
        };
        probe.temporarily_ignore_platform(platform, config.sensors.drop_through_duration);
        debug!("{entity:?} dropping through {platform:?}");
    }
}

/// Enter or leave wall-stick based on move input.
pub fn evaluate_wall_stick(
    mut characters: Query<
        (
            Entity,
            &mut LocomotionController,
            &LocomotionIntent,
            &ContactState,
            &LocomotionConfig,
        ),
        Ready,
    >,
) {
    for (entity, mut controller, intent, contact, config) in &mut characters {
        if controller.should_stop_sticking_to_wall(intent.move_input, contact) {
            controller.stop_sticking_to_wall(config);
            debug!("{entity:?} released the wall");
        } else if let Some(side) = controller.should_stick_to_wall(intent.move_input, contact) {
            controller.start_sticking_to_wall(side);
            debug!("{entity:?} stuck to the {side:?} wall");
        }
    }
}

// === Movement ===

/// Start, end or restart dashes.
pub fn apply_dash_requests(
    mut characters: Query<
        (
            Entity,
            &mut LocomotionController,
            &mut LocomotionIntent,
            &LocomotionConfig,
        ),
        Ready,
    >,
) {
    for (entity, mut controller, mut intent, config) in &mut characters {
        if intent.take_end_dash() && controller.end_dash(config) {
            debug!("{entity:?} dash ended");
        }
        if let Some(direction) = intent.take_dash() {
            let position = controller.position();
            if controller.perform_dash(direction, position, config) {
                debug!("{entity:?} dashing along {direction:?}");
            }
        }
    }
}

/// Consume jump requests.
pub fn apply_jump(
    mut characters: Query<
        (
            Entity,
            &mut LocomotionController,
            &mut LocomotionIntent,
            &mut TerrainContactProbe,
            &LocomotionConfig,
        ),
        Ready,
    >,
) {
    for (entity, mut controller, mut intent, mut probe, config) in &mut characters {
        if intent.take_jump() && controller.try_jump(&mut probe, config) {
            debug!("{entity:?} jumped: velocity {:?}", controller.velocity());
        }
    }
}

/// Horizontal acceleration and friction material.
pub fn apply_horizontal(
    time: Res<Time>,
    mut characters: Query<
        (
            &mut LocomotionController,
            &LocomotionIntent,
            &ContactState,
            &LocomotionConfig,
        ),
        Ready,
    >,
) {
    let dt = time.delta_secs();
    for (mut controller, intent, contact, config) in &mut characters {
        if controller.is_dashing() {
            continue;
        }
        controller.set_desired_speed(
            intent.desired_speed,
            intent.skip_acceleration,
            contact,
            config,
            dt,
        );
        match controller.mode() {
            MovementMode::Grounded | MovementMode::Conveyed => {
                controller.update_friction(intent.desired_speed);
            }
            MovementMode::Airborne | MovementMode::WallStick => controller.apply_zero_friction(),
        }
    }
}

/// Gravity scale selection and fall speed clamp.
pub fn apply_gravity(
    mut characters: Query<(&mut LocomotionController, &LocomotionConfig), Ready>,
) {
    for (mut controller, config) in &mut characters {
        controller.update_gravity(config);
    }
}

/// Step running dashes along their curves.
pub fn advance_dashes(
    time: Res<Time>,
    mut characters: Query<(Entity, &mut LocomotionController), Ready>,
    mut completed: MessageWriter<DashCompleted>,
) {
    let dt = time.delta_secs();
    for (entity, mut controller) in &mut characters {
        let position = controller.position();
        if controller.advance_dash(position, dt) {
            let position = controller.dash().map_or(position, |dash| dash.target());
            completed.write(DashCompleted { entity, position });
        }
    }
}

// === Writeback ===

/// Push the controller's result to the physics body.
///
/// Body mode and friction are only written when they change.
pub fn write_body_state<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, LocomotionController, f32)> = world
        .query_filtered::<(Entity, &LocomotionController, &LocomotionConfig), Ready>()
        .iter(world)
        .map(|(entity, controller, config)| {
            (entity, controller.clone(), config.walking.high_friction)
        })
        .collect();

    for (entity, controller, high_friction) in entities {
        let body_mode = controller.body_mode();
        if controller.applied_body_mode != Some(body_mode) {
            B::set_body_mode(world, entity, body_mode);
        }

        match body_mode {
            BodyMode::Dynamic => {
                B::set_velocity(world, entity, controller.velocity());
                B::set_gravity_scale(world, entity, controller.gravity_scale());
            }
            BodyMode::Conveyed => {
                B::set_position(world, entity, controller.position());
                B::set_velocity(world, entity, Vec2::ZERO);
                B::set_gravity_scale(world, entity, 0.0);
            }
        }

        let friction = controller.friction();
        if controller.applied_friction != Some(friction) {
            B::set_friction(world, entity, friction, high_friction);
        }

        if let Some(mut stored) = world.get_mut::<LocomotionController>(entity) {
            stored.applied_body_mode = Some(body_mode);
            stored.applied_friction = Some(friction);
            stored.applied_velocity = controller.velocity();
        }
    }
}
