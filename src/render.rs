use serde::{Deserialize, Serialize};

/// Visual kind of a drawable entity or connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sprite {
    Background,
    Line,
    Pig,
    ClockFace,
    Ball,
    Ramp,
    Bumper,
    Basket,
    Platform,
    Pin,
    Heavyball,
    Smallplatform,
    Pulleywheel,
    Pulleyline,
    Circlebumper,
    Base,
    Wheel,
    Catapult,
    Block,
    Stick,
    Bird,
    Propeller,
}

impl Sprite {
    pub const ALL: [Sprite; 22] = [
        Sprite::Background,
        Sprite::Line,
        Sprite::Pig,
        Sprite::ClockFace,
        Sprite::Ball,
        Sprite::Ramp,
        Sprite::Bumper,
        Sprite::Basket,
        Sprite::Platform,
        Sprite::Pin,
        Sprite::Heavyball,
        Sprite::Smallplatform,
        Sprite::Pulleywheel,
        Sprite::Pulleyline,
        Sprite::Circlebumper,
        Sprite::Base,
        Sprite::Wheel,
        Sprite::Catapult,
        Sprite::Block,
        Sprite::Stick,
        Sprite::Bird,
        Sprite::Propeller,
    ];

    /// Whether this sprite is drawn as a circle rather than a box.
    pub fn is_round(self) -> bool {
        matches!(
            self,
            Sprite::Ball
                | Sprite::Heavyball
                | Sprite::Circlebumper
                | Sprite::Wheel
                | Sprite::Bird
                | Sprite::Pulleywheel
        )
    }
}

/// How the registry renders the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Sprites,
    Both,
    Lines,
}

impl DrawMode {
    pub fn next(self) -> Self {
        match self {
            DrawMode::Sprites => DrawMode::Both,
            DrawMode::Both => DrawMode::Lines,
            DrawMode::Lines => DrawMode::Sprites,
        }
    }

    pub fn includes_sprites(self) -> bool {
        matches!(self, DrawMode::Sprites | DrawMode::Both)
    }

    pub fn includes_lines(self) -> bool {
        matches!(self, DrawMode::Lines | DrawMode::Both)
    }
}

/// Drawing backend. All positions are in render-world units with y pointing up.
pub trait Renderer {
    fn draw_sprite(&mut self, sprite: Sprite, position: [f32; 2], angle: f32);
    fn draw_outline(&mut self, sprite: Sprite, position: [f32; 2], angle: f32);
    fn draw_line(&mut self, sprite: Sprite, from: [f32; 2], to: [f32; 2]);
    /// Draws `text` with its left end on `position`.
    fn draw_text(&mut self, text: &str, position: [f32; 2]);
    /// Draws `text` centered in the window.
    fn draw_centered_text(&mut self, text: &str);
}
