use contraption::{Game, GameConfig, GameInput, Renderer, Sprite, SpriteSizes};
use macroquad::prelude::*;
use tracing::error;

/// At most this many physics steps are taken per rendered frame.
const MAX_STEPS_PER_FRAME: usize = 4;

fn window_conf() -> Conf {
    let window = GameConfig::default().window;
    Conf {
        window_title: "Contraption".to_owned(),
        window_width: window.width as i32,
        window_height: window.height as i32,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match GameConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!(%err, %path, "could not load config");
                return;
            }
        },
        None => GameConfig::default(),
    };
    let dt = config.physics.dt;

    let mut game = match Game::new(config) {
        Ok(game) => game,
        Err(err) => {
            error!(%err, "could not build the contraption");
            return;
        }
    };

    let mut accumulator = 0.0;
    loop {
        for input in pressed_inputs() {
            if let Err(err) = game.handle_input(input) {
                error!(%err, ?input, "input failed");
                return;
            }
        }

        accumulator += get_frame_time();
        let mut steps = 0;
        while accumulator >= dt && steps < MAX_STEPS_PER_FRAME {
            game.process_frame();
            accumulator -= dt;
            steps += 1;
        }
        if steps == MAX_STEPS_PER_FRAME {
            accumulator = 0.0;
        }

        let mut renderer = ScreenRenderer::new(&game.config().sprites, game.config().window.height);
        clear_background(Color::from_rgba(12, 16, 24, 255));
        game.render(&mut renderer);
        draw_text(
            &format!("fps {}  mode {:?}", get_fps(), game.draw_mode()),
            20.0,
            screen_height() - 20.0,
            20.0,
            GRAY,
        );

        next_frame().await;
    }
}

fn pressed_inputs() -> Vec<GameInput> {
    let mut inputs = Vec::new();
    if is_key_pressed(KeyCode::F1) {
        inputs.push(GameInput::Reset);
    }
    if is_key_pressed(KeyCode::F2) {
        inputs.push(GameInput::CycleDrawMode);
    }
    if is_key_pressed(KeyCode::Space) {
        inputs.push(GameInput::Start);
    }
    inputs
}

/// Draws sprites as flat shapes scaled to the macroquad window.
struct ScreenRenderer<'a> {
    sprites: &'a SpriteSizes,
    world_height: f32,
    scale: f32,
}

impl<'a> ScreenRenderer<'a> {
    fn new(sprites: &'a SpriteSizes, world_height: f32) -> Self {
        Self {
            sprites,
            world_height,
            scale: screen_height() / world_height,
        }
    }

    fn to_screen(&self, position: [f32; 2]) -> Vec2 {
        vec2(position[0] * self.scale, (self.world_height - position[1]) * self.scale)
    }

    /// Screen-space outline of a sprite placed at `position` and `angle`.
    fn corners(&self, sprite: Sprite, position: [f32; 2], angle: f32) -> Vec<Vec2> {
        let [w, h] = self.sprites.size(sprite);
        let (hw, hh) = (w / 2.0, h / 2.0);
        let local = match sprite {
            Sprite::Ramp => vec![vec2(hw, hh), vec2(-hw, -hh), vec2(hw, -hh)],
            Sprite::Base => vec![vec2(-hw, -hh), vec2(hw, -hh), vec2(0.0, hh)],
            _ => vec![vec2(-hw, -hh), vec2(hw, -hh), vec2(hw, hh), vec2(-hw, hh)],
        };
        let rotation = Mat2::from_angle(angle);
        let origin = vec2(position[0], position[1]);
        local
            .into_iter()
            .map(|corner| {
                let p = origin + rotation * corner;
                self.to_screen([p.x, p.y])
            })
            .collect()
    }
}

fn sprite_color(sprite: Sprite) -> Color {
    match sprite {
        Sprite::Pig => Color::from_rgba(120, 200, 90, 255),
        Sprite::Ball | Sprite::Bird => Color::from_rgba(220, 60, 60, 255),
        Sprite::Heavyball => DARKGRAY,
        Sprite::Ramp | Sprite::Platform | Sprite::Smallplatform => Color::from_rgba(150, 110, 70, 255),
        Sprite::Bumper | Sprite::Circlebumper => PINK,
        Sprite::Pin => WHITE,
        Sprite::Basket => Color::from_rgba(180, 140, 80, 255),
        Sprite::Pulleywheel | Sprite::Wheel => GRAY,
        Sprite::Base | Sprite::Catapult => Color::from_rgba(130, 90, 50, 255),
        Sprite::Block | Sprite::Stick => Color::from_rgba(200, 170, 120, 255),
        Sprite::Propeller => ORANGE,
        Sprite::ClockFace => Color::from_rgba(0, 0, 0, 180),
        Sprite::Line | Sprite::Pulleyline => LIGHTGRAY,
        Sprite::Background => Color::from_rgba(40, 60, 90, 255),
    }
}

impl Renderer for ScreenRenderer<'_> {
    fn draw_sprite(&mut self, sprite: Sprite, position: [f32; 2], angle: f32) {
        let color = sprite_color(sprite);
        if sprite.is_round() {
            let center = self.to_screen(position);
            let radius = self.sprites.width(sprite) / 2.0 * self.scale;
            draw_circle(center.x, center.y, radius, color);
            // Spoke so rotation is visible.
            let spoke = center + Mat2::from_angle(-angle) * vec2(radius, 0.0);
            draw_line(center.x, center.y, spoke.x, spoke.y, 2.0, BLACK);
            return;
        }
        let points = self.corners(sprite, position, angle);
        for i in 1..points.len() - 1 {
            draw_triangle(points[0], points[i], points[i + 1], color);
        }
    }

    fn draw_outline(&mut self, sprite: Sprite, position: [f32; 2], angle: f32) {
        if sprite.is_round() {
            let center = self.to_screen(position);
            let radius = self.sprites.width(sprite) / 2.0 * self.scale;
            draw_circle_lines(center.x, center.y, radius, 1.5, YELLOW);
            return;
        }
        let points = self.corners(sprite, position, angle);
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            draw_line(a.x, a.y, b.x, b.y, 1.5, YELLOW);
        }
    }

    fn draw_line(&mut self, sprite: Sprite, from: [f32; 2], to: [f32; 2]) {
        let (a, b) = (self.to_screen(from), self.to_screen(to));
        let thickness = self.sprites.width(sprite) * self.scale / 2.0;
        draw_line(a.x, a.y, b.x, b.y, thickness, sprite_color(sprite));
    }

    fn draw_text(&mut self, text: &str, position: [f32; 2]) {
        let p = self.to_screen(position);
        draw_text(text, p.x, p.y, 28.0, WHITE);
    }

    fn draw_centered_text(&mut self, text: &str) {
        let size = measure_text(text, None, 36, 1.0);
        draw_text(
            text,
            (screen_width() - size.width) / 2.0,
            (screen_height() + size.height) / 2.0,
            36.0,
            WHITE,
        );
    }
}
