use rapier2d::prelude::RigidBodyHandle;
use thiserror::Error;

use crate::render::Sprite;

/// Top-level error type for contraption.
#[derive(Debug, Error)]
pub enum ContraptionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised while assembling bodies and mechanisms.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Sprite {0:?} produced a degenerate collision shape")]
    DegenerateShape(Sprite),

    #[error("Body {0:?} is not part of the simulation world")]
    UnknownBody(RigidBodyHandle),
}
