//! Integration tests for the locomotion controller with the Avian2D backend.
//!
//! These tests verify the complete system behavior with actual physics simulation.
//! Each test produces PROOF through explicit contact/velocity/position checks.

#![cfg(feature = "avian2d")]

use avian2d::prelude::*;
use bevy::math::curve::EaseFunction;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use terrain_locomotion::prelude::*;

const FIXED_UPDATE_HZ: f64 = 60.0;
const PIXELS_PER_METER: f32 = 10.0;
const GRAVITY: f32 = 600.0;

/// Character collider is 12 wide and 24 tall.
const CHARACTER_HALF: Vec2 = Vec2::new(6.0, 12.0);

/// Top of the floor spawned by [`spawn_floor`].
const FLOOR_TOP: f32 = 10.0;

#[derive(Resource, Default)]
struct Landings(Vec<Landed>);

fn record_landings(mut reader: MessageReader<Landed>, mut landings: ResMut<Landings>) {
    landings.0.extend(reader.read().copied());
}

/// Create a minimal test app with physics and the locomotion controller.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    // Insert SceneSpawner resource to satisfy Avian's ColliderHierarchyPlugin
    app.insert_resource(bevy::scene::SceneSpawner::default());
    // Locomotion runs in FixedUpdate, physics runs in FixedPostUpdate
    app.add_plugins(
        PhysicsPlugins::default()
            .with_length_unit(PIXELS_PER_METER)
            .with_collision_hooks::<PlatformContactHooks>(),
    );
    app.add_plugins(LocomotionPlugin::<Avian2dBackend>::default());
    app.insert_resource(Gravity(Vec2::NEG_Y * GRAVITY));
    app.insert_resource(Time::<Fixed>::from_hz(FIXED_UPDATE_HZ));
    // Exactly one fixed step per update.
    app.insert_resource(TimeUpdateStrategy::ManualDuration(
        std::time::Duration::from_secs_f64(1.0 / FIXED_UPDATE_HZ),
    ));
    app.init_resource::<Landings>();
    app.add_systems(
        FixedUpdate,
        record_landings.after(LocomotionSet::Evaluation),
    );

    app.finish();
    app.cleanup();
    app
}

/// Spawn a static box collider.
fn spawn_block(app: &mut App, position: Vec2, half_size: Vec2) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            RigidBody::Static,
            Collider::rectangle(half_size.x * 2.0, half_size.y * 2.0),
        ))
        .id()
}

/// Spawn a wide floor whose top is at [`FLOOR_TOP`].
fn spawn_floor(app: &mut App) -> Entity {
    spawn_block(app, Vec2::ZERO, Vec2::new(400.0, FLOOR_TOP))
}

/// Spawn a thin platform with the given tag.
fn spawn_platform(app: &mut App, position: Vec2, half_size: Vec2, platform: Platform) -> Entity {
    let entity = spawn_block(app, position, half_size);
    app.world_mut().entity_mut(entity).insert(platform);
    entity
}

/// Spawn a character with the player preset.
fn spawn_character(app: &mut App, position: Vec2) -> Entity {
    spawn_character_with_config(app, position, LocomotionConfig::player())
}

fn spawn_character_with_config(
    app: &mut App,
    position: Vec2,
    config: LocomotionConfig,
) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            // Set explicitly so the first step's probe sees the spawn point.
            Position(position),
            RigidBody::Dynamic,
            Collider::rectangle(CHARACTER_HALF.x * 2.0, CHARACTER_HALF.y * 2.0),
            LocomotionController::new(&config),
            config,
            LocomotionIntent::new(),
        ))
        .id()
}

/// Center height of a character standing on a surface whose top is `top`.
fn standing_on(top: f32) -> f32 {
    top + CHARACTER_HALF.y
}

fn tick(app: &mut App) {
    app.update();
}

fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        tick(app);
    }
}

fn intent_mut(app: &mut App, entity: Entity) -> Mut<'_, LocomotionIntent> {
    app.world_mut()
        .get_mut::<LocomotionIntent>(entity)
        .expect("character has an intent")
}

fn contact(app: &App, entity: Entity) -> ContactState {
    *app.world().get::<ContactState>(entity).unwrap()
}

fn controller(app: &App, entity: Entity) -> &LocomotionController {
    app.world().get::<LocomotionController>(entity).unwrap()
}

fn position(app: &App, entity: Entity) -> Vec2 {
    app.world().get::<Position>(entity).unwrap().0
}

fn velocity(app: &App, entity: Entity) -> Vec2 {
    app.world().get::<LinearVelocity>(entity).unwrap().0
}

// ==================== Setup ====================

mod setup {
    use super::*;

    #[test]
    fn character_becomes_ready() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(FLOOR_TOP)));

        run_frames(&mut app, 2);

        let world = app.world();
        assert!(world.get::<LocomotionReady>(character).is_some());
        assert!(world.get::<LocomotionSetupFailed>(character).is_none());

        let probe = world.get::<TerrainContactProbe>(character).unwrap();
        println!("PROOF: probe shape={:?}", probe.shape());
        assert!((probe.shape().half_extents - CHARACTER_HALF).length() < 1e-3);

        // Rotation is locked and the contact hooks are active.
        assert!(world.get::<LockedAxes>(character).is_some());
        assert!(world.get::<ActiveCollisionHooks>(character).is_some());
    }

    #[test]
    fn unsupported_collider_fails_setup() {
        let mut app = create_test_app();
        let transform = Transform::from_xyz(0.0, 100.0, 0.0);
        let character = app
            .world_mut()
            .spawn((
                transform,
                GlobalTransform::from(transform),
                RigidBody::Dynamic,
                Collider::segment(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0)),
                LocomotionController::default(),
            ))
            .id();

        run_frames(&mut app, 2);

        let failed = app.world().get::<LocomotionSetupFailed>(character);
        println!("PROOF: setup failure={:?}", failed);
        assert!(failed.is_some());
        assert!(app.world().get::<LocomotionReady>(character).is_none());
    }

    #[test]
    fn invalid_config_fails_setup() {
        let mut app = create_test_app();
        let config = LocomotionConfig::player().with_jump_speed(-1.0);
        let character = spawn_character_with_config(&mut app, Vec2::new(0.0, 100.0), config);

        run_frames(&mut app, 2);

        let failed = app.world().get::<LocomotionSetupFailed>(character).cloned();
        println!("PROOF: setup failure={:?}", failed);
        assert!(matches!(
            failed,
            Some(LocomotionSetupFailed(SetupError::InvalidConfig { .. }))
        ));
    }
}

// ==================== Contact ====================

mod contact_detection {
    use super::*;

    #[test]
    fn character_on_floor_is_grounded() {
        let mut app = create_test_app();
        let floor = spawn_floor(&mut app);
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(FLOOR_TOP) + 0.5));

        run_frames(&mut app, 20);

        let contact = contact(&app, character);
        println!(
            "PROOF: grounded={}, platform={:?}, normal={:?}, distance={}",
            contact.is_grounded(),
            contact.platform,
            contact.ground_normal,
            contact.ground_distance
        );
        assert!(contact.is_grounded());
        assert_eq!(contact.platform, Some(floor));
        assert!(contact.ground_normal.y > 0.99);
        assert_eq!(controller(&app, character).mode(), MovementMode::Grounded);
    }

    #[test]
    fn character_high_above_floor_is_airborne() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        let character = spawn_character(&mut app, Vec2::new(0.0, 200.0));

        run_frames(&mut app, 3);

        let contact = contact(&app, character);
        println!("PROOF: grounded={}", contact.is_grounded());
        assert!(!contact.is_grounded());
        assert_eq!(controller(&app, character).mode(), MovementMode::Airborne);
    }

    #[test]
    fn falling_character_lands_once() {
        let mut app = create_test_app();
        let floor = spawn_floor(&mut app);
        let character = spawn_character(&mut app, Vec2::new(0.0, 60.0));

        run_frames(&mut app, 90);

        let landings = &app.world().resource::<Landings>().0;
        println!("PROOF: landings={:?}", landings);
        assert_eq!(landings.len(), 1);
        assert_eq!(landings[0].entity, character);
        assert_eq!(landings[0].platform, Some(floor));
        assert!(landings[0].impact_velocity.y < 0.0);
    }

    #[test]
    fn detects_wall_on_right() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        // Wall face one unit to the right of the character's side.
        spawn_block(&mut app, Vec2::new(CHARACTER_HALF.x + 1.0 + 10.0, 100.0), Vec2::new(10.0, 100.0));
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(FLOOR_TOP)));

        run_frames(&mut app, 5);

        let contact = contact(&app, character);
        println!(
            "PROOF: wall_left={}, wall_right={}",
            contact.wall_left, contact.wall_right
        );
        assert!(contact.wall_right);
        assert!(!contact.wall_left);
    }

    #[test]
    fn no_wall_when_far() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        spawn_block(&mut app, Vec2::new(60.0, 100.0), Vec2::new(10.0, 100.0));
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(FLOOR_TOP)));

        run_frames(&mut app, 5);

        let contact = contact(&app, character);
        assert!(!contact.wall_left && !contact.wall_right);
    }
}

// ==================== Movement ====================

mod movement {
    use super::*;

    #[test]
    fn desired_speed_accelerates_along_floor() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(FLOOR_TOP)));
        run_frames(&mut app, 5);

        let start = position(&app, character);
        intent_mut(&mut app, character).set_desired_speed(100.0);
        run_frames(&mut app, 30);

        let vel = velocity(&app, character);
        let moved = position(&app, character).x - start.x;
        println!("PROOF: vel={:?}, moved={}", vel, moved);
        assert!(vel.x > 90.0 && vel.x < 101.0);
        assert!(moved > 20.0);
        // Zero friction while moving.
        assert_eq!(controller(&app, character).friction(), FrictionMode::Zero);
    }

    #[test]
    fn idle_character_uses_high_friction() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(FLOOR_TOP)));

        run_frames(&mut app, 10);

        let friction = app.world().get::<Friction>(character).copied();
        println!("PROOF: friction={:?}", friction);
        assert_eq!(controller(&app, character).friction(), FrictionMode::High);
        assert!(friction.is_some_and(|f| f.dynamic_coefficient > 0.0));
    }

    #[test]
    fn jump_leaves_the_floor() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(FLOOR_TOP)));
        run_frames(&mut app, 10);
        assert!(contact(&app, character).is_grounded());

        let start_y = position(&app, character).y;
        intent_mut(&mut app, character).request_jump();
        tick(&mut app);

        let vel_after = velocity(&app, character);
        println!("PROOF: vel_after.y={}", vel_after.y);
        assert!(vel_after.y > 0.0);
        assert_eq!(controller(&app, character).jump_count(), 1);

        run_frames(&mut app, 10);
        let risen = position(&app, character).y - start_y;
        println!("PROOF: risen={}", risen);
        assert!(risen > 10.0);
        assert!(!contact(&app, character).is_grounded());
    }

    #[test]
    fn airborne_character_sticks_to_wall() {
        let mut app = create_test_app();
        spawn_block(&mut app, Vec2::new(CHARACTER_HALF.x + 0.5 + 10.0, 200.0), Vec2::new(10.0, 200.0));
        let character = spawn_character(&mut app, Vec2::new(0.0, 200.0));
        intent_mut(&mut app, character).set_move_input(1.0);

        run_frames(&mut app, 5);
        let stuck_y = position(&app, character).y;
        run_frames(&mut app, 30);

        let controller = controller(&app, character);
        let drift = (position(&app, character).y - stuck_y).abs();
        println!(
            "PROOF: mode={:?}, stuck_wall={:?}, drift={}",
            controller.mode(),
            controller.stuck_wall(),
            drift
        );
        assert_eq!(controller.mode(), MovementMode::WallStick);
        assert_eq!(controller.stuck_wall(), Some(WallSide::Right));
        assert!(drift < 1.0);
    }
}

// ==================== Platforms ====================

mod platforms {
    use super::*;

    #[test]
    fn jump_up_through_one_way_platform() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        let platform_top = 62.0;
        let platform = spawn_platform(
            &mut app,
            Vec2::new(0.0, 60.0),
            Vec2::new(40.0, 2.0),
            Platform::one_way(),
        );
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(FLOOR_TOP)));
        run_frames(&mut app, 5);

        intent_mut(&mut app, character).request_jump();
        let mut highest_bottom = f32::MIN;
        for _ in 0..40 {
            tick(&mut app);
            highest_bottom = highest_bottom.max(position(&app, character).y - CHARACTER_HALF.y);
        }
        println!("PROOF: highest_bottom={}, platform_top={}", highest_bottom, platform_top);
        assert!(highest_bottom > platform_top);

        run_frames(&mut app, 90);
        let contact = contact(&app, character);
        let y = position(&app, character).y;
        println!("PROOF: y={}, platform={:?}", y, contact.platform);
        assert!(contact.is_grounded());
        assert_eq!(contact.platform, Some(platform));
        assert!((y - standing_on(platform_top)).abs() < 1.5);
    }

    #[test]
    fn drop_through_one_way_platform() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        let platform_top = 62.0;
        spawn_platform(
            &mut app,
            Vec2::new(0.0, 60.0),
            Vec2::new(40.0, 2.0),
            Platform::one_way(),
        );
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(platform_top)));
        run_frames(&mut app, 10);
        assert!(contact(&app, character).is_grounded());

        intent_mut(&mut app, character).request_drop_through();
        run_frames(&mut app, 90);

        let y = position(&app, character).y;
        println!("PROOF: y={}, floor stand height={}", y, standing_on(FLOOR_TOP));
        assert!((y - standing_on(FLOOR_TOP)).abs() < 1.5);
    }

    #[test]
    fn solid_platform_ignores_drop_through() {
        let mut app = create_test_app();
        spawn_floor(&mut app);
        let platform_top = 62.0;
        spawn_block(&mut app, Vec2::new(0.0, 60.0), Vec2::new(40.0, 2.0));
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(platform_top)));
        run_frames(&mut app, 10);

        intent_mut(&mut app, character).request_drop_through();
        run_frames(&mut app, 30);

        let y = position(&app, character).y;
        println!("PROOF: y={}", y);
        assert!((y - standing_on(platform_top)).abs() < 1.5);
    }

    #[test]
    fn rider_is_conveyed_by_moving_platform() {
        let mut app = create_test_app();
        let platform_top = 22.0;
        let transform = Transform::from_xyz(0.0, 20.0, 0.0);
        let platform = app
            .world_mut()
            .spawn((
                transform,
                GlobalTransform::from(transform),
                RigidBody::Kinematic,
                Collider::rectangle(80.0, 4.0),
                LinearVelocity(Vec2::new(0.0, 30.0)),
                Platform::moving(),
            ))
            .id();
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(platform_top)));

        run_frames(&mut app, 5);
        assert_eq!(controller(&app, character).body_mode(), BodyMode::Conveyed);
        assert_eq!(app.world().get::<RigidBody>(character), Some(&RigidBody::Kinematic));

        let start = position(&app, character).y;
        run_frames(&mut app, 60);
        let risen = position(&app, character).y - start;
        let platform_y = position(&app, platform).y;
        println!("PROOF: risen={}, platform_y={}", risen, platform_y);

        // One second at 30 units/s.
        assert!((risen - 30.0).abs() < 2.0);
        // Still standing on top of it.
        assert!((position(&app, character).y - (platform_y + 2.0 + CHARACTER_HALF.y)).abs() < 1.5);
        assert_eq!(controller(&app, character).attached_platform(), Some(platform));
    }

    #[test]
    fn jumping_off_a_conveyor_restores_dynamic_body() {
        let mut app = create_test_app();
        let transform = Transform::from_xyz(0.0, 20.0, 0.0);
        app.world_mut().spawn((
            transform,
            GlobalTransform::from(transform),
            RigidBody::Kinematic,
            Collider::rectangle(400.0, 4.0),
            LinearVelocity(Vec2::new(40.0, 0.0)),
            Platform::moving(),
        ));
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(22.0)));
        run_frames(&mut app, 10);
        assert_eq!(controller(&app, character).body_mode(), BodyMode::Conveyed);

        intent_mut(&mut app, character).request_jump();
        run_frames(&mut app, 2);

        let vel = velocity(&app, character);
        println!("PROOF: body={:?}, vel={:?}", app.world().get::<RigidBody>(character), vel);
        assert_eq!(controller(&app, character).body_mode(), BodyMode::Dynamic);
        assert_eq!(app.world().get::<RigidBody>(character), Some(&RigidBody::Dynamic));
        assert!(vel.y > 0.0);
        assert_eq!(controller(&app, character).attached_platform(), None);
    }

    /// Spawn a kinematic moving platform, 4 units thick.
    fn spawn_moving_platform(app: &mut App, center: Vec2, width: f32, velocity: Vec2) -> Entity {
        let transform = Transform::from_translation(center.extend(0.0));
        app.world_mut()
            .spawn((
                transform,
                GlobalTransform::from(transform),
                RigidBody::Kinematic,
                Collider::rectangle(width, 4.0),
                LinearVelocity(velocity),
                Platform::moving(),
            ))
            .id()
    }

    #[test]
    fn rider_stays_on_descending_platform() {
        let mut app = create_test_app();
        let platform = spawn_moving_platform(
            &mut app,
            Vec2::new(0.0, 100.0),
            80.0,
            Vec2::new(0.0, -60.0),
        );
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(102.0)));
        run_frames(&mut app, 3);
        assert_eq!(controller(&app, character).body_mode(), BodyMode::Conveyed);

        let start = position(&app, platform).y;
        let mut widest_gap: f32 = 0.0;
        for frame in 0..60 {
            tick(&mut app);
            let gap = position(&app, character).y - standing_on(position(&app, platform).y + 2.0);
            widest_gap = widest_gap.max(gap.abs());
            assert_eq!(
                controller(&app, character).mode(),
                MovementMode::Conveyed,
                "frame {frame}: gap {gap}"
            );
            assert_eq!(controller(&app, character).attached_platform(), Some(platform));
        }

        let descended = start - position(&app, platform).y;
        let landings = app.world().resource::<Landings>().0.len();
        println!("PROOF: descended={descended}, widest_gap={widest_gap}, landings={landings}");
        assert!((descended - 60.0).abs() < 2.0);
        assert!(widest_gap < 1.5);
        assert_eq!(landings, 1);
    }

    #[test]
    fn conveyor_stops_rider_at_wall() {
        let mut app = create_test_app();
        spawn_moving_platform(&mut app, Vec2::new(0.0, 20.0), 400.0, Vec2::new(60.0, 0.0));
        // Face at x = 40, clear of the conveyor's top.
        spawn_block(&mut app, Vec2::new(50.0, 60.0), Vec2::new(10.0, 30.0));
        let character = spawn_character(&mut app, Vec2::new(0.0, standing_on(22.0)));

        run_frames(&mut app, 90);

        let right_edge = position(&app, character).x + CHARACTER_HALF.x;
        println!(
            "PROOF: right_edge={right_edge}, mode={:?}",
            controller(&app, character).mode()
        );
        assert!(right_edge <= 40.0 + 0.3, "rider pushed into wall: {right_edge}");
        assert!(right_edge > 38.0, "rider was carried up to the wall");
        assert_eq!(controller(&app, character).body_mode(), BodyMode::Conveyed);
        assert!((position(&app, character).y - standing_on(22.0)).abs() < 1.5);
    }
}

// ==================== Dash ====================

mod dash {
    use super::*;

    #[test]
    fn dash_reaches_target_and_reports_completion() {
        #[derive(Resource, Default)]
        struct Completions(Vec<DashCompleted>);

        fn record(mut reader: MessageReader<DashCompleted>, mut out: ResMut<Completions>) {
            out.0.extend(reader.read().copied());
        }

        let mut app = create_test_app();
        app.init_resource::<Completions>();
        app.add_systems(FixedUpdate, record.after(LocomotionSet::Movement));

        let config = LocomotionConfig::player().with_dash(60.0, 0.2, EaseFunction::Linear);
        let character = spawn_character_with_config(&mut app, Vec2::new(0.0, 200.0), config);
        run_frames(&mut app, 2);

        let start = position(&app, character);
        intent_mut(&mut app, character).request_dash(Vec2::X);
        run_frames(&mut app, 20);

        let completions = &app.world().resource::<Completions>().0;
        let end = position(&app, character);
        println!("PROOF: start={:?}, end={:?}, completions={:?}", start, end, completions);
        assert_eq!(completions.len(), 1);
        assert!((end.x - (start.x + 60.0)).abs() < 2.0);
        // No gravity during the dash.
        assert!((end.y - start.y).abs() < 1.0);
    }
}
