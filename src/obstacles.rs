//! Factories for the static and loose pieces the mechanisms interact with.
//!
//! Positions are render-world units and angles are radians; every body is
//! sized from its sprite so the physics matches the art.

use rapier2d::prelude::*;

use crate::context::BuildContext;
use crate::error::BuildError;
use crate::physics::{exclusive_group, sprite_local_point, to_sim, to_sim_vec, GROUP_DEFLECTOR};
use crate::render::Sprite;

pub const DEFAULT_HEAVY_BALL_DENSITY: Real = 10.0;

const PROPELLER_MAX_TORQUE: Real = 4000.0;

const PIN_HEAD: [[f32; 2]; 8] = [
    [7.0, 74.0],
    [0.0, 56.0],
    [0.0, 48.0],
    [8.0, 22.0],
    [16.0, 22.0],
    [24.0, 48.0],
    [24.0, 56.0],
    [18.0, 74.0],
];
const PIN_NECK: [[f32; 2]; 8] = [
    [8.0, 21.0],
    [5.0, 14.0],
    [5.0, 8.0],
    [10.0, 0.0],
    [14.0, 0.0],
    [19.0, 8.0],
    [19.0, 14.0],
    [16.0, 21.0],
];
const RAMP_TRIANGLE: [[f32; 2]; 3] = [[199.0, 0.0], [0.0, 199.0], [199.0, 199.0]];

fn half_extents(ctx: &BuildContext, sprite: Sprite) -> (Real, Real) {
    let [w, h] = ctx.size(sprite);
    (to_sim(w) / 2.0, to_sim(h) / 2.0)
}

fn radius(ctx: &BuildContext, sprite: Sprite) -> Real {
    to_sim(ctx.size(sprite)[0]) / 2.0
}

fn sprite_polygon(ctx: &BuildContext, sprite: Sprite, pixels: &[[f32; 2]]) -> Result<ColliderBuilder, BuildError> {
    let size = ctx.size(sprite);
    let points: Vec<Point<Real>> = pixels
        .iter()
        .map(|[x, y]| sprite_local_point(size, *x, *y))
        .collect();
    ColliderBuilder::convex_hull(&points).ok_or(BuildError::DegenerateShape(sprite))
}

fn placed(builder: RigidBodyBuilder, x: f32, y: f32, angle: Real) -> RigidBody {
    builder
        .translation(to_sim_vec([x, y]))
        .rotation(angle)
        .build()
}

/// Dynamic body that can pick up speed; swept so it cannot pass through thin
/// statics like the world boundary.
fn loose() -> RigidBodyBuilder {
    RigidBodyBuilder::dynamic().ccd_enabled(true)
}

/// The pig at the end of the machine. Touching it finishes the run.
pub fn create_button(ctx: &mut BuildContext, x: f32, y: f32) -> RigidBodyHandle {
    let (hw, hh) = half_extents(ctx, Sprite::Pig);
    let collider = ColliderBuilder::cuboid(hw, hh)
        .density(1.0)
        .restitution(0.2)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build();
    ctx.spawn(Sprite::Pig, placed(RigidBodyBuilder::fixed(), x, y, 0.0), [collider])
}

/// The ball that starts the machine.
pub fn create_ball(ctx: &mut BuildContext, x: f32, y: f32) -> RigidBodyHandle {
    let collider = ColliderBuilder::ball(radius(ctx, Sprite::Ball))
        .density(1.0)
        .restitution(0.3)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build();
    ctx.spawn(Sprite::Ball, placed(loose(), x, y, 0.0), [collider])
}

pub fn create_heavy_ball(ctx: &mut BuildContext, x: f32, y: f32, density: Real) -> RigidBodyHandle {
    let collider = ColliderBuilder::ball(radius(ctx, Sprite::Heavyball))
        .density(density)
        .restitution(0.3)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build();
    ctx.spawn(Sprite::Heavyball, placed(loose(), x, y, 0.0), [collider])
}

pub fn create_platform(ctx: &mut BuildContext, x: f32, y: f32, angle: Real) -> RigidBodyHandle {
    create_slab(ctx, Sprite::Platform, x, y, angle)
}

pub fn create_small_platform(ctx: &mut BuildContext, x: f32, y: f32, angle: Real) -> RigidBodyHandle {
    create_slab(ctx, Sprite::Smallplatform, x, y, angle)
}

fn create_slab(ctx: &mut BuildContext, sprite: Sprite, x: f32, y: f32, angle: Real) -> RigidBodyHandle {
    let (hw, hh) = half_extents(ctx, sprite);
    let collider = ColliderBuilder::cuboid(hw, hh)
        .density(10.0)
        .restitution(0.1)
        .build();
    ctx.spawn(sprite, placed(RigidBodyBuilder::fixed(), x, y, angle), [collider])
}

pub fn create_ramp(ctx: &mut BuildContext, x: f32, y: f32, angle: Real) -> Result<RigidBodyHandle, BuildError> {
    let collider = sprite_polygon(ctx, Sprite::Ramp, &RAMP_TRIANGLE)?
        .density(10.0)
        .restitution(0.3)
        .collision_groups(exclusive_group(GROUP_DEFLECTOR))
        .build();
    Ok(ctx.spawn(Sprite::Ramp, placed(RigidBodyBuilder::fixed(), x, y, angle), [collider]))
}

pub fn create_bumper(ctx: &mut BuildContext, x: f32, y: f32, angle: Real) -> RigidBodyHandle {
    let (hw, hh) = half_extents(ctx, Sprite::Bumper);
    let collider = ColliderBuilder::cuboid(hw, hh)
        .density(10.0)
        .restitution(2.0)
        .collision_groups(exclusive_group(GROUP_DEFLECTOR))
        .build();
    ctx.spawn(Sprite::Bumper, placed(RigidBodyBuilder::fixed(), x, y, angle), [collider])
}

/// A bowling pin: a head and a neck polygon on one dynamic body.
pub fn create_pins(ctx: &mut BuildContext, x: f32, y: f32, angle: Real) -> Result<RigidBodyHandle, BuildError> {
    let head = sprite_polygon(ctx, Sprite::Pin, &PIN_HEAD)?
        .density(1.0)
        .restitution(0.1)
        .build();
    let neck = sprite_polygon(ctx, Sprite::Pin, &PIN_NECK)?
        .density(1.0)
        .restitution(0.1)
        .build();
    Ok(ctx.spawn(Sprite::Pin, placed(loose(), x, y, angle), [head, neck]))
}

/// A free-spinning paddle pinned to a hidden static hub.
pub fn create_propeller(ctx: &mut BuildContext, x: f32, y: f32, angle: Real) -> RigidBodyHandle {
    let (hw, hh) = half_extents(ctx, Sprite::Platform);
    let paddle = ColliderBuilder::cuboid(hw, hh)
        .density(10.0)
        .restitution(0.001)
        .collision_groups(exclusive_group(GROUP_DEFLECTOR))
        .build();
    let blade = ctx.spawn(
        Sprite::Propeller,
        placed(RigidBodyBuilder::dynamic(), x, y, angle),
        [paddle],
    );
    let hub = ctx.spawn_hidden(placed(RigidBodyBuilder::fixed(), x, y, angle), []);

    let joint = RevoluteJointBuilder::new()
        .local_anchor1(Point::origin())
        .local_anchor2(Point::origin())
        .motor_velocity(0.0, 1.0)
        .motor_max_force(PROPELLER_MAX_TORQUE)
        .contacts_enabled(false)
        .build();
    ctx.world.insert_joint(hub, blade, joint);
    blade
}

pub fn create_circle_bumper(ctx: &mut BuildContext, x: f32, y: f32) -> RigidBodyHandle {
    let collider = ColliderBuilder::ball(radius(ctx, Sprite::Circlebumper))
        .density(10.0)
        .restitution(1.0)
        .build();
    ctx.spawn(Sprite::Circlebumper, placed(RigidBodyBuilder::fixed(), x, y, 0.0), [collider])
}

/// A loose block or stick of the tower the bird knocks over.
pub fn create_tower_piece(ctx: &mut BuildContext, x: f32, y: f32, sprite: Sprite, angle: Real) -> RigidBodyHandle {
    let (hw, hh) = half_extents(ctx, sprite);
    let collider = ColliderBuilder::cuboid(hw, hh)
        .density(0.2)
        .restitution(0.5)
        .friction(1.0)
        .build();
    ctx.spawn(sprite, placed(loose(), x, y, angle), [collider])
}
