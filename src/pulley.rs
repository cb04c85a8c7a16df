//! Counterweighted pulley: two baskets hanging from two wheels by a single
//! rope.
//!
//! The wheels are static bodies with no colliders. They are turned by hand
//! each frame to match how much rope has run over them.

use rapier2d::prelude::*;
use tracing::debug;

use crate::context::BuildContext;
use crate::error::BuildError;
use crate::physics::to_sim;
use crate::pulley_joint::{PulleyJointDesc, PulleyJointHandle};
use crate::render::Sprite;
use crate::world::SimulationWorld;

/// Extra turn given to the second wheel so the two don't look identical.
pub const WHEEL_PHASE: Real = 2.4;

const BASKET_DENSITY: Real = 900.0;
const BASKET_WALL: f32 = 5.0;
// Resting heights of the baskets in simulation units. Uneven so the pulley
// starts slightly out of balance.
const BASKET_HEIGHTS: [Real; 2] = [35.0, 36.0];

/// Wheel orientations for a change `delta` in rope length on the first side.
/// No wrap-around is applied.
pub fn wheel_orientations(delta: Real, radius: Real) -> (Real, Real) {
    let theta = delta / radius;
    (theta, theta + WHEEL_PHASE)
}

#[derive(Debug)]
pub struct Pulley {
    baskets: [RigidBodyHandle; 2],
    wheels: [RigidBodyHandle; 2],
    joint: PulleyJointHandle,
    wheel_radius: Real,
    reference_length: Real,
}

impl Pulley {
    /// Builds the pulley centered on `x` with wheels `separation` apart.
    /// All arguments are render units.
    pub fn new(ctx: &mut BuildContext, x: f32, y: f32, separation: f32) -> Result<Self, BuildError> {
        let (x, y) = (to_sim(x), to_sim(y));
        let half_separation = to_sim(separation) / 2.0;
        let wheel_radius = to_sim(ctx.sprites.width(Sprite::Pulleywheel)) / 2.0 - to_sim(4.0);
        let wheel_altitude = 2.0 * (y - 1.2 * wheel_radius);
        let basket_half_height = to_sim(ctx.sprites.height(Sprite::Basket)) / 2.0;

        let basket_positions = [
            vector![x - half_separation - wheel_radius, BASKET_HEIGHTS[0]],
            vector![x + half_separation + wheel_radius, BASKET_HEIGHTS[1]],
        ];
        let wheel_positions = [
            vector![x - half_separation, wheel_altitude],
            vector![x + half_separation, wheel_altitude],
        ];

        let baskets = basket_positions.map(|position| Self::create_basket(ctx, position));
        let wheels = wheel_positions.map(|position| {
            ctx.spawn(
                Sprite::Pulleywheel,
                RigidBodyBuilder::fixed().translation(position).build(),
                [],
            )
        });

        let desc = PulleyJointDesc {
            body_a: baskets[0],
            body_b: baskets[1],
            ground_anchor_a: Point::from(wheel_positions[0] - vector![wheel_radius, 0.0]),
            ground_anchor_b: Point::from(wheel_positions[1] + vector![wheel_radius, 0.0]),
            anchor_a: Point::from(basket_positions[0] + vector![0.0, basket_half_height]),
            anchor_b: Point::from(basket_positions[1] + vector![0.0, basket_half_height]),
            ratio: 1.0,
        };
        let joint = ctx
            .world
            .insert_pulley_joint(&desc)
            .ok_or(BuildError::UnknownBody(baskets[0]))?;
        let reference_length = ctx
            .world
            .pulley_length_a(joint)
            .ok_or(BuildError::UnknownBody(baskets[0]))?;

        let registry = &mut *ctx.registry;
        registry.create_rope_connector(wheels[0], vector![-wheel_radius, 0.0], false, baskets[0], Vector::zeros(), true);
        registry.create_rope_connector(wheels[1], vector![wheel_radius, 0.0], false, baskets[1], Vector::zeros(), true);
        let top = vector![0.0, wheel_radius];
        registry.create_rope_connector(wheels[0], top, false, wheels[1], top, false);

        debug!(wheel_radius, reference_length, "pulley assembled");
        Ok(Self {
            baskets,
            wheels,
            joint,
            wheel_radius,
            reference_length,
        })
    }

    fn create_basket(ctx: &mut BuildContext, position: Vector<Real>) -> RigidBodyHandle {
        let [w, h] = ctx.size(Sprite::Basket);
        let (cw, ch) = (to_sim(w) / 2.0, to_sim(h) / 2.0);
        let sh = to_sim(BASKET_WALL) / 2.0;
        let part = |hx: Real, hy: Real, offset: Vector<Real>| {
            ColliderBuilder::cuboid(hx, hy)
                .translation(offset)
                .density(BASKET_DENSITY)
                .restitution(0.0)
                .build()
        };
        let colliders = [
            part(cw, sh, vector![0.0, sh - ch]),
            part(sh, ch, vector![-cw + sh, 0.0]),
            part(sh, ch, vector![cw - sh, 0.0]),
        ];
        ctx.spawn(
            Sprite::Basket,
            RigidBodyBuilder::dynamic()
                .translation(position)
                .linear_damping(0.2)
                .angular_damping(0.1)
                .build(),
            colliders,
        )
    }

    /// Turns both wheels to reflect the rope that has run over them since
    /// construction.
    ///
    /// Panics if the pulley joint is no longer in `world`.
    pub fn move_wheels(&self, world: &mut SimulationWorld) {
        let length = world
            .pulley_length_a(self.joint)
            .expect("pulley joint must outlive the pulley");
        let (first, second) = wheel_orientations(length - self.reference_length, self.wheel_radius);
        world.set_body_angle(self.wheels[0], first);
        world.set_body_angle(self.wheels[1], second);
    }

    pub fn baskets(&self) -> [RigidBodyHandle; 2] {
        self.baskets
    }

    pub fn wheels(&self) -> [RigidBodyHandle; 2] {
        self.wheels
    }

    pub fn joint(&self) -> PulleyJointHandle {
        self.joint
    }

    pub fn wheel_radius(&self) -> Real {
        self.wheel_radius
    }

    pub fn reference_length(&self) -> Real {
        self.reference_length
    }
}
