//! Wheeled catapult: a triangular chassis on two sprung, motorised wheels,
//! with an arm pinned to its top.
//!
//! Once the contact collaborator raises the collision flag, the caller runs
//! [`Catapult::move_frame`] every frame. The catapult rolls left until its
//! chassis passes the middle of the window, then parks, sweeps its arm for
//! [`SWEEP_FRAMES`] frames and keeps signalling the projectile to launch.

use rapier2d::prelude::*;
use tracing::info;

use crate::context::BuildContext;
use crate::physics::{exclusive_group, sprite_local_point, to_render, to_sim, GROUP_CATAPULT};
use crate::projectile::Projectile;
use crate::render::Sprite;
use crate::world::SimulationWorld;

/// Rest orientation of the arm in radians.
pub const ARM_REST_ANGLE: Real = 6.10865;
/// Arm rotation applied on each parked frame.
pub const ARM_STEP: Real = 0.11;
/// Number of parked frames during which the arm turns.
pub const SWEEP_FRAMES: u32 = 60;
/// Wheel motor speed while rolling towards the park position.
pub const ROLL_SPEED: Real = 4.0;

const WHEEL_MAX_TORQUE: Real = 1000.0;
const WHEEL_STIFFNESS: Real = 999.0;
const WHEEL_DAMPING: Real = 0.1;
const ARM_MAX_TORQUE: Real = 1000.0;

// Arm fixtures as sprite-pixel rectangles: (left, top, right, bottom).
const ARM_BEAM: [f32; 4] = [0.0, 65.0, 159.0, 79.0];
const ARM_POCKET: [f32; 4] = [142.0, 0.0, 159.0, 79.0];

/// Progress of the arm sweep. `Sweeping` counts completed frames and turns
/// into `Settled` when the count reaches [`SWEEP_FRAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmSweep {
    Sweeping { frames: u32 },
    Settled,
}

impl ArmSweep {
    /// Advances one parked frame. Returns the next state and whether the arm
    /// should turn this frame.
    pub fn advance(self) -> (Self, bool) {
        match self {
            ArmSweep::Sweeping { frames } if frames + 1 >= SWEEP_FRAMES => (ArmSweep::Settled, true),
            ArmSweep::Sweeping { frames } => (ArmSweep::Sweeping { frames: frames + 1 }, true),
            ArmSweep::Settled => (ArmSweep::Settled, false),
        }
    }

    /// Number of frames the arm has turned so far.
    pub fn frames(self) -> u32 {
        match self {
            ArmSweep::Sweeping { frames } => frames,
            ArmSweep::Settled => SWEEP_FRAMES,
        }
    }
}

/// What the catapult did on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatapultPhase {
    Rolling,
    Parked,
}

#[derive(Debug)]
pub struct Catapult {
    chassis: RigidBodyHandle,
    arm: RigidBodyHandle,
    wheels: [RigidBodyHandle; 2],
    wheel_joints: [ImpulseJointHandle; 2],
    arm_joint: ImpulseJointHandle,
    sweep: ArmSweep,
    collision: bool,
    park_x: f32,
}

impl Catapult {
    /// Assembles the catapult with the bottom of its chassis at (`x`, `y`) in
    /// render units. It parks once its chassis is left of the window center.
    pub fn new(ctx: &mut BuildContext, x: f32, y: f32) -> Self {
        let [base_w, base_h] = ctx.size(Sprite::Base);
        let origin = vector![to_sim(x), to_sim(y)];

        let chassis = Self::create_chassis(ctx, origin);
        let arm = Self::create_arm(ctx, origin + vector![0.0, to_sim(base_h + 15.0)]);
        let wheel_dx = to_sim(base_w / 2.0 - 30.0);
        let wheel_y = origin.y - to_sim(base_h / 2.0 - 5.0);
        let wheels = [
            Self::create_wheel(ctx, vector![origin.x - wheel_dx, wheel_y]),
            Self::create_wheel(ctx, vector![origin.x + wheel_dx, wheel_y]),
        ];

        let chassis_pos = Self::translation(ctx.world, chassis);
        let wheel_joints = wheels.map(|wheel| {
            let anchor = Self::translation(ctx.world, wheel) - chassis_pos;
            let suspension = GenericJointBuilder::new(JointAxesMask::LIN_X)
                .local_anchor1(Point::from(anchor))
                .local_anchor2(Point::origin())
                .motor_position(JointAxis::LinY, 0.0, WHEEL_STIFFNESS, WHEEL_DAMPING)
                .motor_velocity(JointAxis::AngX, 0.0, 1.0)
                .motor_max_force(JointAxis::AngX, WHEEL_MAX_TORQUE)
                .contacts_enabled(false)
                .build();
            ctx.world.insert_joint(chassis, wheel, suspension)
        });

        // The arm's frame is turned back by its rest angle so the joint reads
        // zero at rest. Both limits sit at zero: the arm only moves when the
        // sweep turns it.
        let pivot = Self::translation(ctx.world, arm) - chassis_pos;
        let hinge = GenericJointBuilder::new(JointAxesMask::LOCKED_REVOLUTE_AXES)
            .local_frame1(Isometry::new(Vector::zeros(), -ARM_REST_ANGLE))
            .local_frame2(Isometry::new(pivot, 0.0))
            .limits(JointAxis::AngX, [0.0, 0.0])
            .motor_velocity(JointAxis::AngX, 0.0, 1.0)
            .motor_max_force(JointAxis::AngX, ARM_MAX_TORQUE)
            .build();
        let arm_joint = ctx.world.insert_joint(arm, chassis, hinge);

        Self {
            chassis,
            arm,
            wheels,
            wheel_joints,
            arm_joint,
            sweep: ArmSweep::Sweeping { frames: 0 },
            collision: false,
            park_x: ctx.window.center()[0],
        }
    }

    fn translation(world: &SimulationWorld, handle: RigidBodyHandle) -> Vector<Real> {
        world
            .body(handle)
            .map(|body| *body.translation())
            .expect("catapult part was inserted into this world")
    }

    fn create_chassis(ctx: &mut BuildContext, origin: Vector<Real>) -> RigidBodyHandle {
        let [w, h] = ctx.size(Sprite::Base);
        let (w2, h2) = (to_sim(w) / 2.0, to_sim(h) / 2.0);
        let collider = ColliderBuilder::triangle(point![-w2, -h2], point![w2, -h2], point![0.0, h2])
            .density(1.0)
            .restitution(0.4)
            .collision_groups(exclusive_group(GROUP_CATAPULT))
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        ctx.spawn(
            Sprite::Base,
            RigidBodyBuilder::dynamic()
                .translation(origin + vector![0.0, h2])
                .build(),
            [collider],
        )
    }

    fn create_arm(ctx: &mut BuildContext, position: Vector<Real>) -> RigidBodyHandle {
        let size = ctx.size(Sprite::Catapult);
        let beam = Self::sprite_box(size, ARM_BEAM)
            .density(1.0)
            .restitution(0.5)
            .collision_groups(exclusive_group(GROUP_CATAPULT))
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let pocket = Self::sprite_box(size, ARM_POCKET)
            .density(1.0)
            .restitution(0.0)
            .collision_groups(exclusive_group(GROUP_CATAPULT))
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        ctx.spawn(
            Sprite::Catapult,
            RigidBodyBuilder::dynamic()
                .translation(position)
                .rotation(ARM_REST_ANGLE)
                .build(),
            [beam, pocket],
        )
    }

    /// Box collider covering a rectangle given in sprite pixels.
    fn sprite_box(size: [f32; 2], [left, top, right, bottom]: [f32; 4]) -> ColliderBuilder {
        let a = sprite_local_point(size, left, top);
        let b = sprite_local_point(size, right, bottom);
        let center = midpoint(a, b);
        ColliderBuilder::cuboid((b.x - a.x).abs() / 2.0, (b.y - a.y).abs() / 2.0).translation(center)
    }

    fn create_wheel(ctx: &mut BuildContext, position: Vector<Real>) -> RigidBodyHandle {
        let radius = to_sim(ctx.sprites.width(Sprite::Wheel)) / 2.0;
        let collider = ColliderBuilder::ball(radius)
            .density(0.8)
            .restitution(0.6)
            .collision_groups(exclusive_group(GROUP_CATAPULT))
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        ctx.spawn(
            Sprite::Wheel,
            RigidBodyBuilder::dynamic().translation(position).build(),
            [collider],
        )
    }

    /// Runs one frame of the catapult's behaviour. Only call this once the
    /// collision flag is set.
    ///
    /// Panics if the chassis or arm body is no longer in `world`.
    pub fn move_frame(&mut self, world: &mut SimulationWorld, projectile: &mut Projectile) -> CatapultPhase {
        let chassis_x = world
            .body(self.chassis)
            .map(|body| to_render(body.translation().x))
            .expect("catapult chassis must outlive the catapult");

        if chassis_x >= self.park_x {
            for joint in self.wheel_joints {
                world.set_motor_speed(joint, ROLL_SPEED);
            }
            return CatapultPhase::Rolling;
        }

        for joint in self.wheel_joints {
            world.set_motor_speed(joint, 0.0);
        }

        let (sweep, turns) = self.sweep.advance();
        if turns {
            self.rotate_arm(world);
        }
        if self.sweep.frames() == 0 {
            info!(x = chassis_x, "catapult parked");
        }
        if sweep == ArmSweep::Settled && self.sweep != ArmSweep::Settled {
            info!("catapult arm sweep finished");
        }
        self.sweep = sweep;

        projectile.launch(world);
        CatapultPhase::Parked
    }

    fn rotate_arm(&self, world: &mut SimulationWorld) {
        let angle = world
            .body(self.arm)
            .map(|body| body.rotation().angle())
            .expect("catapult arm must outlive the catapult");
        world.set_body_angle(self.arm, angle + ARM_STEP);
    }

    pub fn collision(&self) -> bool {
        self.collision
    }

    pub fn set_collision(&mut self, collision: bool) {
        self.collision = collision;
    }

    /// Frames the arm has turned, in `0..=SWEEP_FRAMES`.
    pub fn rotation_counter(&self) -> u32 {
        self.sweep.frames()
    }

    pub fn sweep(&self) -> ArmSweep {
        self.sweep
    }

    pub fn chassis(&self) -> RigidBodyHandle {
        self.chassis
    }

    pub fn arm(&self) -> RigidBodyHandle {
        self.arm
    }

    pub fn wheels(&self) -> [RigidBodyHandle; 2] {
        self.wheels
    }

    pub fn wheel_joints(&self) -> [ImpulseJointHandle; 2] {
        self.wheel_joints
    }

    pub fn arm_joint(&self) -> ImpulseJointHandle {
        self.arm_joint
    }

    /// Whether `body` is one of the catapult's parts.
    pub fn owns(&self, body: RigidBodyHandle) -> bool {
        body == self.chassis || body == self.arm || self.wheels.contains(&body)
    }
}

fn midpoint(a: Point<Real>, b: Point<Real>) -> Vector<Real> {
    (a.coords + b.coords) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::contact::{signals, ContactSignal};
    use crate::obstacles::create_ball;
    use crate::physics::wrap_angle;
    use crate::registry::ObjectRegistry;
    use crate::test_support::assert_angle_eq;

    struct Rig {
        world: SimulationWorld,
        registry: ObjectRegistry,
        catapult: Catapult,
        projectile: Projectile,
    }

    fn rig(x: f32) -> Rig {
        let config = GameConfig::default();
        let mut world = SimulationWorld::new(&config.physics);
        let mut registry = ObjectRegistry::new(config.window.center());
        let (catapult, projectile) = {
            let mut ctx = BuildContext::new(&mut world, &mut registry, &config.sprites, &config.window);
            (Catapult::new(&mut ctx, x, 50.0), Projectile::new(&mut ctx, 818.0, 390.0))
        };
        Rig {
            world,
            registry,
            catapult,
            projectile,
        }
    }

    /// A catapult at (`x`, 50) standing on the world boundary, with the
    /// projectile resting on the ground far to the left, out of its way.
    fn grounded_rig(x: f32) -> Rig {
        let config = GameConfig::default();
        let mut world = SimulationWorld::new(&config.physics);
        let mut registry = ObjectRegistry::new(config.window.center());
        registry.create_world_boundary(&mut world, to_sim(config.window.width), to_sim(config.window.height));
        let (catapult, projectile) = {
            let mut ctx = BuildContext::new(&mut world, &mut registry, &config.sprites, &config.window);
            (Catapult::new(&mut ctx, x, 50.0), Projectile::new(&mut ctx, 150.0, 30.0))
        };
        Rig {
            world,
            registry,
            catapult,
            projectile,
        }
    }

    /// Arm orientation relative to the chassis.
    fn arm_on_chassis(rig: &Rig) -> Real {
        let chassis = rig.world.body(rig.catapult.chassis()).unwrap().rotation().angle();
        arm_angle(rig) - chassis
    }

    fn arm_angle(rig: &Rig) -> Real {
        rig.world.body(rig.catapult.arm()).unwrap().rotation().angle()
    }

    #[test]
    fn test_assembly() {
        let rig = rig(890.0);
        let sprites: Vec<Sprite> = rig.registry.entities().iter().map(|e| e.sprite).collect();
        assert_eq!(
            sprites,
            vec![Sprite::Base, Sprite::Catapult, Sprite::Wheel, Sprite::Wheel, Sprite::Bird]
        );
        assert_eq!(rig.world.colliders_of(rig.catapult.arm()), 2);
        assert_angle_eq(arm_angle(&rig), ARM_REST_ANGLE);
        assert_eq!(rig.world.motor_speed(rig.catapult.wheel_joints()[0]), Some(0.0));
        assert!(!rig.catapult.collision());
        assert_eq!(rig.catapult.rotation_counter(), 0);
    }

    #[test]
    fn test_collision_flag_accessors() {
        let mut rig = rig(890.0);
        rig.catapult.set_collision(true);
        assert!(rig.catapult.collision());
        rig.catapult.set_collision(false);
        assert!(!rig.catapult.collision());
    }

    #[test]
    fn test_rolls_while_right_of_center() {
        let mut rig = rig(890.0);
        let phase = rig.catapult.move_frame(&mut rig.world, &mut rig.projectile);
        assert_eq!(phase, CatapultPhase::Rolling);
        for joint in rig.catapult.wheel_joints() {
            assert_eq!(rig.world.motor_speed(joint), Some(ROLL_SPEED));
        }
        assert_eq!(rig.catapult.rotation_counter(), 0);
        assert_angle_eq(arm_angle(&rig), ARM_REST_ANGLE);
        assert!(!rig.projectile.is_launched());
    }

    #[test]
    fn test_center_counts_as_rolling() {
        let mut rig = rig(512.0);
        let phase = rig.catapult.move_frame(&mut rig.world, &mut rig.projectile);
        assert_eq!(phase, CatapultPhase::Rolling);
    }

    #[test]
    fn test_parks_left_of_center() {
        let mut rig = rig(300.0);
        let phase = rig.catapult.move_frame(&mut rig.world, &mut rig.projectile);
        assert_eq!(phase, CatapultPhase::Parked);
        for joint in rig.catapult.wheel_joints() {
            assert_eq!(rig.world.motor_speed(joint), Some(0.0));
        }
        assert_eq!(rig.catapult.rotation_counter(), 1);
        assert_angle_eq(arm_angle(&rig), ARM_REST_ANGLE + ARM_STEP);
        assert!(rig.projectile.is_launched());
    }

    #[test]
    fn test_rotation_ceiling() {
        let mut rig = rig(300.0);
        for frame in 1..=SWEEP_FRAMES {
            rig.catapult.move_frame(&mut rig.world, &mut rig.projectile);
            assert_eq!(rig.catapult.rotation_counter(), frame);
        }
        assert_eq!(rig.catapult.sweep(), ArmSweep::Settled);
        let settled = arm_angle(&rig);
        assert_angle_eq(settled, ARM_REST_ANGLE + ARM_STEP * SWEEP_FRAMES as Real);

        for _ in 0..5 {
            rig.catapult.move_frame(&mut rig.world, &mut rig.projectile);
            assert_eq!(rig.catapult.rotation_counter(), SWEEP_FRAMES);
        }
        assert_eq!(arm_angle(&rig), settled);
    }

    #[test]
    fn test_arm_holds_rest_angle_on_the_chassis() {
        let mut rig = grounded_rig(890.0);
        for _ in 0..120 {
            rig.world.step();
        }
        assert!(
            wrap_angle(arm_on_chassis(&rig) - ARM_REST_ANGLE).abs() < 0.02,
            "arm sagged to {}",
            arm_on_chassis(&rig)
        );

        rig.catapult.set_collision(true);
        for _ in 0..60 {
            assert_eq!(
                rig.catapult.move_frame(&mut rig.world, &mut rig.projectile),
                CatapultPhase::Rolling
            );
            rig.world.step();
        }
        assert!(wrap_angle(arm_on_chassis(&rig) - ARM_REST_ANGLE).abs() < 0.02);
    }

    #[test]
    fn test_ball_landing_on_arm_sends_catapult_to_park_and_launch() {
        let mut rig = grounded_rig(890.0);
        let config = GameConfig::default();
        {
            let mut ctx = BuildContext::new(&mut rig.world, &mut rig.registry, &config.sprites, &config.window);
            create_ball(&mut ctx, 930.0, 140.0);
        }

        let mut parked = false;
        for _ in 0..1500 {
            let contacts = rig.world.step();
            if signals(&rig.registry, &contacts).contains(&ContactSignal::TriggerCatapult) {
                rig.catapult.set_collision(true);
            }
            if rig.catapult.collision()
                && rig.catapult.move_frame(&mut rig.world, &mut rig.projectile) == CatapultPhase::Parked
            {
                parked = true;
                break;
            }
        }

        assert!(rig.catapult.collision(), "ball never touched the catapult");
        assert!(parked, "catapult never reached the park position");
        let chassis_x = to_render(rig.world.body(rig.catapult.chassis()).unwrap().translation().x);
        assert!(chassis_x < config.window.center()[0]);
        assert!(rig.projectile.is_launched());
    }

    #[test]
    fn test_sweep_state_machine() {
        let mut sweep = ArmSweep::Sweeping { frames: 0 };
        let mut turns = 0;
        for _ in 0..100 {
            let (next, turned) = sweep.advance();
            if turned {
                turns += 1;
            }
            assert!(next.frames() >= sweep.frames());
            sweep = next;
        }
        assert_eq!(turns, SWEEP_FRAMES);
        assert_eq!(sweep, ArmSweep::Settled);
    }

    #[test]
    fn test_owns_its_parts() {
        let rig = rig(890.0);
        assert!(rig.catapult.owns(rig.catapult.chassis()));
        assert!(rig.catapult.owns(rig.catapult.wheels()[1]));
        assert!(!rig.catapult.owns(rig.projectile.body()));
    }
}
