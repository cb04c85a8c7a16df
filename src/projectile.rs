use rapier2d::prelude::*;
use tracing::info;

use crate::context::BuildContext;
use crate::physics::{to_sim, to_sim_vec};
use crate::render::Sprite;
use crate::world::SimulationWorld;

/// Impulse delivered on launch, up and to the left.
pub const LAUNCH_IMPULSE: [Real; 2] = [-900.0, 900.0];

/// Launch state. The only transition is `Armed -> Launched`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaunchState {
    Armed,
    /// Launched with the impulse applied at `at` (simulation units).
    Launched { at: Point<Real> },
}

impl LaunchState {
    /// Fires from `Armed`; every other state is left unchanged.
    fn fire(self, at: Point<Real>) -> (Self, bool) {
        match self {
            LaunchState::Armed => (LaunchState::Launched { at }, true),
            launched @ LaunchState::Launched { .. } => (launched, false),
        }
    }
}

/// A single body that is kicked exactly once.
#[derive(Debug)]
pub struct Projectile {
    body: RigidBodyHandle,
    state: LaunchState,
}

impl Projectile {
    /// Creates the bird at (`x`, `y`) in render units.
    pub fn new(ctx: &mut BuildContext, x: f32, y: f32) -> Self {
        let radius = to_sim(ctx.sprites.width(Sprite::Bird)) / 2.0;
        let collider = ColliderBuilder::ball(radius)
            .density(1.0)
            .restitution(0.1)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let body = ctx.spawn(
            Sprite::Bird,
            RigidBodyBuilder::dynamic()
                .translation(to_sim_vec([x, y]))
                .ccd_enabled(true)
                .build(),
            [collider],
        );
        Self {
            body,
            state: LaunchState::Armed,
        }
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    pub fn is_launched(&self) -> bool {
        matches!(self.state, LaunchState::Launched { .. })
    }

    /// Applies the launch impulse the first time it is called. Returns whether
    /// an impulse was applied.
    ///
    /// Panics if the projectile's body is no longer in `world`.
    pub fn launch(&mut self, world: &mut SimulationWorld) -> bool {
        let body = world
            .body_mut(self.body)
            .expect("projectile body must outlive the projectile");
        let at = Point::from(*body.translation());
        let (state, fired) = self.state.fire(at);
        if fired {
            body.apply_impulse_at_point(vector![LAUNCH_IMPULSE[0], LAUNCH_IMPULSE[1]], at, true);
            info!(x = at.x, y = at.y, "projectile launched");
        }
        self.state = state;
        fired
    }
}
