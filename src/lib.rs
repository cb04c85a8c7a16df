mod catapult;
mod config;
mod contact;
mod context;
mod error;
mod game;
mod level;
mod obstacles;
mod physics;
mod projectile;
mod pulley;
mod pulley_joint;
mod registry;
mod render;
mod world;

#[cfg(test)]
mod test_support;

// Re-export public items
pub use catapult::{ArmSweep, Catapult, CatapultPhase, ARM_REST_ANGLE, ARM_STEP, ROLL_SPEED, SWEEP_FRAMES};
pub use config::{GameConfig, PhysicsConfig, SpriteSizes, WindowConfig};
pub use contact::{classify, signals, ContactSignal};
pub use context::BuildContext;
pub use error::{BuildError, ConfigError, ContraptionError};
pub use game::{format_clock, Game, GameInput, GameState, RESET_PROMPT, START_PROMPT};
pub use level::{build_level, Mechanisms, BIRD_POSITION, CATAPULT_POSITION, PULLEY_POSITION, PULLEY_SEPARATION};
pub use obstacles::{
    create_ball, create_bumper, create_button, create_circle_bumper, create_heavy_ball, create_pins,
    create_platform, create_propeller, create_ramp, create_small_platform, create_tower_piece,
    DEFAULT_HEAVY_BALL_DENSITY,
};
pub use physics::{
    sprite_local_point, to_render, to_render_vec, to_sim, to_sim_vec, wrap_angle, RigidBodySnapshot,
    FIXED_TIME_STEP, RENDER_SCALE,
};
pub use projectile::{LaunchState, Projectile, LAUNCH_IMPULSE};
pub use pulley::{wheel_orientations, Pulley, WHEEL_PHASE};
pub use pulley_joint::{PulleyJoint, PulleyJointDesc, PulleyJointHandle};
pub use registry::{Entity, EntityId, ObjectRegistry, RopeConnector, RopeEnd};
pub use render::{DrawMode, Renderer, Sprite};
pub use world::{BodyContact, SimulationWorld};
