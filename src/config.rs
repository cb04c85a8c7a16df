use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::physics::{FIXED_TIME_STEP, POSITION_ITERATIONS, VELOCITY_ITERATIONS};
use crate::render::Sprite;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_window_width() -> f32 {
    1024.0
}
const fn default_window_height() -> f32 {
    768.0
}
const fn default_gravity() -> [f32; 2] {
    [0.0, -1000.0]
}
const fn default_dt() -> f32 {
    FIXED_TIME_STEP
}
const fn default_velocity_iterations() -> usize {
    VELOCITY_ITERATIONS
}
const fn default_position_iterations() -> usize {
    POSITION_ITERATIONS
}

/// Built-in sprite sizes in render pixels. The tower pieces are sized so that
/// at the level's coordinates each one rests exactly on the piece below it, and
/// the bumper's top sits low enough at the ramp tip to kick a rolling ball
/// rather than trap it against the slope.
fn builtin_sprite_size(sprite: Sprite) -> [f32; 2] {
    match sprite {
        Sprite::Background => [1024.0, 768.0],
        Sprite::Line | Sprite::Pulleyline => [4.0, 4.0],
        Sprite::Pig => [60.0, 52.0],
        Sprite::ClockFace => [128.0, 64.0],
        Sprite::Ball => [24.0, 24.0],
        Sprite::Ramp => [200.0, 200.0],
        Sprite::Bumper => [20.0, 20.0],
        Sprite::Basket => [80.0, 60.0],
        Sprite::Platform => [200.0, 20.0],
        Sprite::Pin => [25.0, 75.0],
        Sprite::Heavyball => [40.0, 40.0],
        Sprite::Smallplatform => [100.0, 16.0],
        Sprite::Pulleywheel => [48.0, 48.0],
        Sprite::Circlebumper => [30.0, 30.0],
        Sprite::Base => [120.0, 50.0],
        Sprite::Wheel => [30.0, 30.0],
        Sprite::Catapult => [160.0, 80.0],
        Sprite::Block => [42.0, 42.0],
        Sprite::Stick => [166.0, 18.0],
        Sprite::Bird => [30.0, 30.0],
        Sprite::Propeller => [200.0, 20.0],
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub physics: PhysicsConfig,

    #[serde(default)]
    pub sprites: SpriteSizes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window width in render units.
    #[serde(default = "default_window_width")]
    pub width: f32,

    /// Window height in render units.
    #[serde(default = "default_window_height")]
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl WindowConfig {
    pub fn center(&self) -> [f32; 2] {
        [self.width / 2.0, self.height / 2.0]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Gravity in render units per second squared.
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 2],

    /// Fixed physics timestep in seconds.
    #[serde(default = "default_dt")]
    pub dt: f32,

    #[serde(default = "default_velocity_iterations")]
    pub velocity_iterations: usize,

    #[serde(default = "default_position_iterations")]
    pub position_iterations: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            dt: default_dt(),
            velocity_iterations: default_velocity_iterations(),
            position_iterations: default_position_iterations(),
        }
    }
}

/// Sprite sizes in render pixels. Only overridden kinds are stored; the rest
/// fall back to the built-in table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpriteSizes {
    overrides: BTreeMap<Sprite, [f32; 2]>,
}

impl SpriteSizes {
    pub fn size(&self, sprite: Sprite) -> [f32; 2] {
        self.overrides
            .get(&sprite)
            .copied()
            .unwrap_or_else(|| builtin_sprite_size(sprite))
    }

    pub fn width(&self, sprite: Sprite) -> f32 {
        self.size(sprite)[0]
    }

    pub fn height(&self, sprite: Sprite) -> f32 {
        self.size(sprite)[1]
    }

    pub fn set(&mut self, sprite: Sprite, size: [f32; 2]) {
        self.overrides.insert(sprite, size);
    }
}

impl GameConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.window.width > 0.0 && self.window.height > 0.0) {
            return Err(invalid("window", "width and height must be > 0"));
        }
        if !(self.physics.dt > 0.0) {
            return Err(invalid("physics.dt", "must be > 0"));
        }
        if self.physics.velocity_iterations == 0 || self.physics.position_iterations == 0 {
            return Err(invalid("physics", "solver iterations must be >= 1"));
        }
        for sprite in Sprite::ALL {
            let [w, h] = self.sprites.size(sprite);
            if !(w > 0.0 && h > 0.0) {
                return Err(invalid(
                    format!("sprites.{sprite:?}"),
                    "width and height must be > 0",
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}
