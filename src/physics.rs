use rapier2d::prelude::*;

// Simulation constants
pub const FIXED_TIME_STEP: Real = 1.0 / 60.0;
pub const VELOCITY_ITERATIONS: usize = 6;
pub const POSITION_ITERATIONS: usize = 2;

/// Render-world units per simulation-world unit.
pub const RENDER_SCALE: f32 = 10.0;

// Collision groups
pub const GROUP_WORLD: u32 = 0b0001;
pub const GROUP_CATAPULT: u32 = 0b0010;
pub const GROUP_DEFLECTOR: u32 = 0b0100;

/// Interaction groups for a collider that belongs to `group` and collides
/// with everything except other members of the same group.
pub fn exclusive_group(group: u32) -> InteractionGroups {
    InteractionGroups::new(
        Group::from_bits_truncate(group),
        Group::from_bits_truncate(!group),
    )
}

/// Simulation units to render units.
pub fn to_render(x: Real) -> f32 {
    x * RENDER_SCALE
}

/// Render units to simulation units.
pub fn to_sim(x: f32) -> Real {
    x / RENDER_SCALE
}

pub fn to_render_vec(v: Vector<Real>) -> [f32; 2] {
    [to_render(v.x), to_render(v.y)]
}

pub fn to_sim_vec(v: [f32; 2]) -> Vector<Real> {
    vector![to_sim(v[0]), to_sim(v[1])]
}

/// Converts a point given in sprite pixels (origin at the sprite's top-left
/// corner, y down) to a body-local point in simulation units (origin at the
/// sprite's center, y up).
pub fn sprite_local_point(size: [f32; 2], x: f32, y: f32) -> Point<Real> {
    point![to_sim(x - size[0] / 2.0), to_sim(-y + size[1] / 2.0)]
}

/// Wraps an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: Real) -> Real {
    use std::f32::consts::{PI, TAU};
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

#[derive(Debug, Clone)]
pub struct RigidBodySnapshot {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub rotation: f32,
}
