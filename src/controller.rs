//! Locomotion controller state machine.
//!
//! [`LocomotionController`] owns a character's velocity, gravity scale,
//! friction and body mode. It is pure state: the systems in
//! [`crate::systems`] refresh it from the physics body at the start of a
//! step, feed it the probe's [`ContactState`] and the character's intent,
//! and write the result back at the end of the step.

use bevy::math::curve::{Curve, EaseFunction};
use bevy::prelude::*;

use crate::backend::TerrainQuery;
use crate::config::{ConveyanceConfig, LocomotionConfig};
use crate::conveyance::resolve_kinematic_move;
use crate::detection::{ContactState, WallSide};
use crate::intent::LocomotionIntent;
use crate::probe::{ProbeShape, TerrainContactProbe};

/// High-level movement state, for gameplay and animation consumers.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MovementMode {
    /// Standing or walking on static ground.
    Grounded,
    /// Jumping or falling.
    #[default]
    Airborne,
    /// Clinging to a wall with gravity disabled.
    WallStick,
    /// Riding a moving platform as a directly-positioned body.
    Conveyed,
}

/// How the physics engine treats the character's body.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyMode {
    /// Velocity is integrated and contacts resolved by the solver.
    #[default]
    Dynamic,
    /// Position is written directly; the controller resolves its own collisions.
    Conveyed,
}

/// Active surface material.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrictionMode {
    /// Frictionless, for velocity-driven motion.
    #[default]
    Zero,
    /// Grippy, for standing still on slopes and platforms.
    High,
}

/// An in-progress dash: eased interpolation from `start` to `target`.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct DashState {
    start: Vec2,
    target: Vec2,
    elapsed: f32,
    duration: f32,
    easing: EaseFunction,
    finished: bool,
}

impl DashState {
    fn new(start: Vec2, target: Vec2, duration: f32, easing: EaseFunction) -> Self {
        Self {
            start,
            target,
            elapsed: 0.0,
            duration,
            easing,
            finished: false,
        }
    }

    /// Normalized progress through the dash, 0..=1.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Where the eased curve puts the body at the current progress.
    pub fn current_target(&self) -> Vec2 {
        let eased = self.easing.sample_clamped(self.progress());
        self.start.lerp(self.target, eased)
    }

    /// Final position of the dash.
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Whether the curve has run to completion.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Edge-triggered results of [`LocomotionController::update_contact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContactTransition {
    /// Airborne (or wall-stuck) to grounded this step.
    pub landed: bool,
    /// Switched to a directly-positioned body on a moving platform.
    pub entered_conveyance: bool,
    /// Switched back to a solver-integrated body.
    pub exited_conveyance: bool,
}

/// Per-character locomotion state.
///
/// Spawning this component pulls in the probe, contact state, intent and a
/// default config.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
#[require(ContactState, TerrainContactProbe, LocomotionIntent, LocomotionConfig)]
pub struct LocomotionController {
    velocity: Vec2,
    position: Vec2,
    gravity_scale: f32,
    air_control: f32,
    friction: FrictionMode,
    jump_count: u8,
    coyote_timer: f32,
    pending_wall_jump: Option<WallSide>,
    stuck_wall: Option<WallSide>,
    body_mode: BodyMode,
    mode: MovementMode,
    air_control_penalty_timer: f32,
    dash: Option<DashState>,
    attached: Option<Entity>,
    platform_velocity: Vec2,
    pub(crate) applied_velocity: Vec2,
    pub(crate) applied_friction: Option<FrictionMode>,
    pub(crate) applied_body_mode: Option<BodyMode>,
}

impl Default for LocomotionController {
    fn default() -> Self {
        Self::new(&LocomotionConfig::default())
    }
}

impl LocomotionController {
    /// Fresh spawn state for `config`.
    pub fn new(config: &LocomotionConfig) -> Self {
        Self {
            velocity: Vec2::ZERO,
            position: Vec2::ZERO,
            gravity_scale: config.gravity.default_scale,
            air_control: config.walking.air_control,
            friction: FrictionMode::High,
            jump_count: 0,
            coyote_timer: f32::MAX,
            pending_wall_jump: None,
            stuck_wall: None,
            body_mode: BodyMode::Dynamic,
            mode: MovementMode::Airborne,
            air_control_penalty_timer: 0.0,
            dash: None,
            attached: None,
            platform_velocity: Vec2::ZERO,
            applied_velocity: Vec2::ZERO,
            applied_friction: None,
            applied_body_mode: None,
        }
    }

    /// Back to spawn state, keeping the current body position.
    pub fn reset(&mut self, config: &LocomotionConfig) {
        let position = self.position;
        *self = Self::new(config);
        self.position = position;
    }

    // === Accessors ===

    /// Velocity the controller will write this step.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Override the velocity, e.g. for knockback.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Body position as of the start of this step (or after conveyance).
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Current gravity multiplier.
    pub fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    /// Current horizontal control factor while airborne.
    pub fn air_control(&self) -> f32 {
        self.air_control
    }

    /// Active surface material.
    pub fn friction(&self) -> FrictionMode {
        self.friction
    }

    /// Jumps taken since the last landing.
    pub fn jump_count(&self) -> u8 {
        self.jump_count
    }

    /// Seconds since last grounded.
    pub fn coyote_timer(&self) -> f32 {
        self.coyote_timer
    }

    /// Wall the next jump will launch away from, if any.
    pub fn pending_wall_jump(&self) -> Option<WallSide> {
        self.pending_wall_jump
    }

    /// Wall currently clung to.
    pub fn stuck_wall(&self) -> Option<WallSide> {
        self.stuck_wall
    }

    /// Physics body representation.
    pub fn body_mode(&self) -> BodyMode {
        self.body_mode
    }

    /// High-level movement state.
    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    /// In-progress dash.
    pub fn dash(&self) -> Option<&DashState> {
        self.dash.as_ref()
    }

    /// Whether a dash is running or waiting for [`end_dash`](Self::end_dash).
    pub fn is_dashing(&self) -> bool {
        self.dash.is_some()
    }

    /// Moving platform being ridden.
    pub fn attached_platform(&self) -> Option<Entity> {
        self.attached
    }

    /// Velocity written to the body at the end of the previous step.
    ///
    /// Unlike [`velocity`](Self::velocity) this is not refreshed from the
    /// body, so it still holds the approach speed on the step the solver
    /// stops a falling body.
    pub fn written_velocity(&self) -> Vec2 {
        self.applied_velocity
    }

    fn is_on_ground(&self) -> bool {
        matches!(self.mode, MovementMode::Grounded | MovementMode::Conveyed)
    }

    pub(crate) fn sync_from_body(&mut self, position: Vec2, velocity: Option<Vec2>) {
        self.position = position;
        if let Some(velocity) = velocity {
            self.velocity = velocity;
        }
    }

    // === Timers ===

    /// Advance the coyote timer and the air control penalty countdown.
    pub fn tick_timers(&mut self, config: &LocomotionConfig, dt: f32) {
        if self.mode == MovementMode::Airborne {
            self.coyote_timer += dt;
        }
        if self.air_control_penalty_timer > 0.0 {
            self.air_control_penalty_timer -= dt;
            if self.air_control_penalty_timer <= 0.0 {
                self.air_control_penalty_timer = 0.0;
                self.air_control = config.walking.air_control;
            }
        }
    }

    // === Contact ===

    /// Apply this step's contact state to the movement mode.
    ///
    /// `exempt` blocks landing for actions that deliberately ignore ground
    /// contact; a running dash blocks every transition.
    pub fn update_contact(
        &mut self,
        contact: &ContactState,
        exempt: bool,
        config: &LocomotionConfig,
    ) -> ContactTransition {
        let mut transition = ContactTransition::default();
        if self.is_dashing() {
            return transition;
        }

        if !contact.is_grounded() {
            if self.body_mode == BodyMode::Conveyed {
                self.exit_conveyance();
                transition.exited_conveyance = true;
            }
            if self.is_on_ground() {
                self.mode = MovementMode::Airborne;
            }
            return transition;
        }

        if !self.is_on_ground() {
            if exempt {
                return transition;
            }
            self.land(config);
            transition.landed = true;
        }
        self.coyote_timer = 0.0;

        match contact.platform.filter(|_| contact.is_moving_platform) {
            Some(platform) => {
                if self.attached != Some(platform) {
                    self.enter_conveyance(platform, contact.ground_distance);
                    transition.entered_conveyance = true;
                } else {
                    self.mode = MovementMode::Conveyed;
                }
            }
            None => {
                if self.body_mode == BodyMode::Conveyed {
                    self.exit_conveyance();
                    transition.exited_conveyance = true;
                }
                self.mode = MovementMode::Grounded;
            }
        }
        transition
    }

    fn land(&mut self, config: &LocomotionConfig) {
        self.jump_count = 0;
        self.pending_wall_jump = None;
        self.stuck_wall = None;
        self.gravity_scale = config.gravity.default_scale;
        self.mode = MovementMode::Grounded;
    }

    fn enter_conveyance(&mut self, platform: Entity, ground_distance: f32) {
        // Vertical landing speed is absorbed; horizontal speed is kept relative to the platform.
        self.velocity.y = 0.0;
        self.platform_velocity = Vec2::ZERO;
        // Rest exactly on the surface so the rider and platform move in lockstep.
        self.position.y -= ground_distance;
        self.attached = Some(platform);
        self.body_mode = BodyMode::Conveyed;
        self.mode = MovementMode::Conveyed;
    }

    fn exit_conveyance(&mut self) {
        self.velocity += self.platform_velocity;
        self.platform_velocity = Vec2::ZERO;
        self.attached = None;
        self.body_mode = BodyMode::Dynamic;
        if self.mode == MovementMode::Conveyed {
            self.mode = MovementMode::Grounded;
        }
    }

    // === Horizontal motion ===

    /// Accelerate toward `target` speed.
    ///
    /// On the ground the speed is measured along the ground tangent and the
    /// whole velocity follows the slope. In the air only the horizontal
    /// component changes, at a rate scaled by air control.
    pub fn set_desired_speed(
        &mut self,
        target: f32,
        skip_acceleration: bool,
        contact: &ContactState,
        config: &LocomotionConfig,
        dt: f32,
    ) {
        if self.mode == MovementMode::WallStick || self.is_dashing() {
            return;
        }

        if self.is_on_ground() && contact.is_grounded() {
            let tangent = contact.ground_tangent();
            let current = self.velocity.dot(tangent);
            let speed = if skip_acceleration {
                target
            } else {
                let rate = config.walking.rate_for(current, target);
                move_towards(current, target, rate * dt)
            };
            self.velocity = tangent * speed;
        } else {
            let current = self.velocity.x;
            self.velocity.x = if skip_acceleration {
                target
            } else {
                let rate = config.walking.rate_for(current, target) * self.air_control;
                move_towards(current, target, rate * dt)
            };
        }
    }

    // === Gravity ===

    /// Pick the gravity scale for this step and clamp fall speed.
    pub fn update_gravity(&mut self, config: &LocomotionConfig) {
        if self.is_dashing() {
            return;
        }
        match self.mode {
            MovementMode::Airborne => {
                self.gravity_scale = if self.velocity.y < 0.0 {
                    config.gravity.falling_scale
                } else {
                    config.gravity.default_scale
                };
            }
            MovementMode::WallStick => {
                self.velocity = Vec2::ZERO;
                self.gravity_scale = 0.0;
            }
            MovementMode::Grounded | MovementMode::Conveyed => {}
        }
        self.velocity.y = self.velocity.y.max(-config.gravity.max_fall_speed);
    }

    // === Friction ===

    /// Switch to the grippy material.
    pub fn apply_high_friction(&mut self) {
        self.friction = FrictionMode::High;
    }

    /// Switch to the frictionless material.
    pub fn apply_zero_friction(&mut self) {
        self.friction = FrictionMode::Zero;
    }

    /// Zero friction while moving on purpose, high friction while standing still.
    pub fn update_friction(&mut self, desired_speed: f32) {
        if desired_speed != 0.0 {
            self.apply_zero_friction();
        } else {
            self.apply_high_friction();
        }
    }

    // === Jumping ===

    /// Reserved second-jump policy. Always rejects.
    pub fn can_double_jump(&self) -> bool {
        false
    }

    /// Jump if allowed. Returns whether a jump happened.
    ///
    /// A pending wall jump launches away from that wall and reduces air
    /// control for the configured penalty window.
    pub fn try_jump(&mut self, probe: &mut TerrainContactProbe, config: &LocomotionConfig) -> bool {
        if self.is_dashing() {
            return false;
        }
        let ground_jump = self.jump_count == 0 && self.coyote_timer < config.jumping.coyote_time;
        if !ground_jump && !self.can_double_jump() {
            return false;
        }

        match self.pending_wall_jump.take() {
            Some(side) => {
                let wall = config.wall_jumping;
                self.velocity = Vec2::new(side.away() * wall.horizontal_speed, wall.vertical_speed);
                self.air_control = wall.penalty_air_control;
                self.air_control_penalty_timer = wall.penalty_duration;
            }
            None => self.velocity.y = config.jumping.speed,
        }

        self.gravity_scale = config.gravity.default_scale;
        probe.suppress_for(config.jumping.probe_suppression);
        self.jump_count = 1;
        self.coyote_timer = config.jumping.coyote_time;
        self.stuck_wall = None;
        self.mode = MovementMode::Airborne;
        true
    }

    // === Wall stick ===

    /// Airborne and pressing into a wall the probe reports.
    pub fn should_stick_to_wall(&self, move_input: f32, contact: &ContactState) -> Option<WallSide> {
        if self.mode != MovementMode::Airborne || self.is_dashing() {
            return None;
        }
        contact.wall_in_direction(move_input)
    }

    /// Cling to the wall on `side`: no velocity, no gravity, wall jump armed.
    pub fn start_sticking_to_wall(&mut self, side: WallSide) {
        self.velocity = Vec2::ZERO;
        self.gravity_scale = 0.0;
        self.pending_wall_jump = Some(side);
        self.stuck_wall = Some(side);
        self.coyote_timer = 0.0;
        self.jump_count = 0;
        self.mode = MovementMode::WallStick;
    }

    /// Ground found, wall lost, or input pointing away from the wall.
    pub fn should_stop_sticking_to_wall(&self, move_input: f32, contact: &ContactState) -> bool {
        let Some(side) = self.stuck_wall.filter(|_| self.mode == MovementMode::WallStick) else {
            return false;
        };
        contact.is_grounded() || !contact.touching_wall(side) || move_input * side.sign() < -0.001
    }

    /// Let go of the wall. The wall jump stays armed for the coyote window.
    pub fn stop_sticking_to_wall(&mut self, config: &LocomotionConfig) {
        self.gravity_scale = config.gravity.default_scale;
        self.stuck_wall = None;
        if self.mode == MovementMode::WallStick {
            self.mode = MovementMode::Airborne;
        }
    }

    // === Dash ===

    /// Start a dash from `position` along `direction`.
    ///
    /// Returns false for a zero direction. Leaves conveyance and wall-stick.
    pub fn perform_dash(&mut self, direction: Vec2, position: Vec2, config: &LocomotionConfig) -> bool {
        let Some(direction) = direction.try_normalize() else {
            return false;
        };
        if self.body_mode == BodyMode::Conveyed {
            self.exit_conveyance();
        }
        if self.mode == MovementMode::WallStick {
            self.stuck_wall = None;
            self.mode = MovementMode::Airborne;
        }

        let dash = config.dash;
        self.dash = Some(DashState::new(
            position,
            position + direction * dash.distance,
            dash.duration,
            dash.easing,
        ));
        self.velocity = Vec2::ZERO;
        self.gravity_scale = 0.0;
        self.apply_zero_friction();
        true
    }

    /// Step the dash curve. Returns true on the step the curve completes.
    ///
    /// Velocity is set so the body reaches the next curve sample by the end
    /// of the step. Once complete, velocity is held at zero until
    /// [`end_dash`](Self::end_dash).
    pub fn advance_dash(&mut self, position: Vec2, dt: f32) -> bool {
        let Some(dash) = self.dash.as_mut() else {
            return false;
        };
        if dash.finished {
            self.velocity = Vec2::ZERO;
            return false;
        }

        dash.elapsed = (dash.elapsed + dt).min(dash.duration);
        let next = dash.current_target();
        self.velocity = if dt > 0.0 {
            (next - position) / dt
        } else {
            Vec2::ZERO
        };

        if dash.elapsed >= dash.duration {
            dash.finished = true;
            return true;
        }
        false
    }

    /// Finish or cancel the dash and restore gravity. Returns whether one was running.
    pub fn end_dash(&mut self, config: &LocomotionConfig) -> bool {
        if self.dash.take().is_none() {
            return false;
        }
        self.gravity_scale = config.gravity.default_scale;
        true
    }

    // === Conveyance ===

    /// Advance a conveyed body by its own velocity plus the platform's
    /// motion over this step.
    ///
    /// The combined displacement is swept and corrected as one move, so a
    /// platform never carries its rider into a wall. `query` must exclude
    /// the attached platform; its velocity comes from
    /// [`TerrainQuery::surface_velocity`].
    pub fn convey(
        &mut self,
        query: &impl TerrainQuery,
        shape: &ProbeShape,
        config: &ConveyanceConfig,
        dt: f32,
    ) -> Vec2 {
        if self.body_mode != BodyMode::Conveyed {
            return self.position;
        }

        self.platform_velocity = self
            .attached
            .map_or(Vec2::ZERO, |platform| query.surface_velocity(platform));

        let step = resolve_kinematic_move(
            query,
            self.position,
            shape,
            (self.velocity + self.platform_velocity) * dt,
            config.max_penetration,
        );
        if let Some(hit) = step.hit {
            let into = self.velocity.dot(hit.normal);
            if into < 0.0 {
                self.velocity -= hit.normal * into;
            }
        }

        self.position = step.position;
        self.position
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
