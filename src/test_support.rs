use crate::render::{Renderer, Sprite};

/// A draw call captured by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Sprite(Sprite, [f32; 2], f32),
    Outline(Sprite, [f32; 2], f32),
    Line(Sprite, [f32; 2], [f32; 2]),
    Text(String),
    CenteredText(String),
}

/// Renderer that records every call in submission order.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<DrawCall>,
}

impl Renderer for RecordingRenderer {
    fn draw_sprite(&mut self, sprite: Sprite, position: [f32; 2], angle: f32) {
        self.calls.push(DrawCall::Sprite(sprite, position, angle));
    }

    fn draw_outline(&mut self, sprite: Sprite, position: [f32; 2], angle: f32) {
        self.calls.push(DrawCall::Outline(sprite, position, angle));
    }

    fn draw_line(&mut self, sprite: Sprite, from: [f32; 2], to: [f32; 2]) {
        self.calls.push(DrawCall::Line(sprite, from, to));
    }

    fn draw_text(&mut self, text: &str, _position: [f32; 2]) {
        self.calls.push(DrawCall::Text(text.to_string()));
    }

    fn draw_centered_text(&mut self, text: &str) {
        self.calls.push(DrawCall::CenteredText(text.to_string()));
    }
}

pub fn assert_angle_eq(actual: f32, expected: f32) {
    let diff = crate::physics::wrap_angle(actual - expected);
    assert!(diff.abs() < 1e-3, "angle {actual} != {expected} (diff {diff})");
}
