//! The playable contraption: world, registry and mechanisms driven by a small
//! state machine.
//!
//! Each frame the caller feeds inputs through [`Game::handle_input`], advances
//! the simulation with [`Game::process_frame`] and draws with
//! [`Game::render`]. Time is simulation time, so a headless run and a
//! windowed run read the same clock.

use rapier2d::prelude::Real;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::contact::{self, ContactSignal};
use crate::context::BuildContext;
use crate::error::{BuildError, ContraptionError};
use crate::level::{build_level, Mechanisms};
use crate::obstacles::create_ball;
use crate::physics::to_sim;
use crate::registry::ObjectRegistry;
use crate::render::{DrawMode, Renderer, Sprite};
use crate::world::SimulationWorld;

/// Where the ball is dropped in, measured from the top right corner.
const BALL_INSET: f32 = 35.0;
/// Clock face offset from the top left corner.
const CLOCK_OFFSET: [f32; 2] = [68.0, 48.0];
/// Clock text offset from the top left corner.
const CLOCK_TEXT_OFFSET: [f32; 2] = [23.0, 18.0];

pub const START_PROMPT: &str = "Hit space to begin.";
pub const RESET_PROMPT: &str = "Hit space to reset.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameState {
    /// Level built, ball not yet dropped.
    Initial,
    /// Ball dropped at `started_at` seconds of simulation time.
    Running { started_at: Real },
    /// The pig was hit `total` seconds after the start.
    Finished { total: Real },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameInput {
    /// Drop the ball, or start over once finished.
    Start,
    /// Rebuild the level from scratch.
    Reset,
    /// Cycle sprites, sprites with outlines, and outlines only.
    CycleDrawMode,
}

/// Formats seconds as `m:ss`.
pub fn format_clock(seconds: Real) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor();
    let rest = (seconds - 60.0 * minutes).floor();
    format!("{}:{:02}", minutes as u32, rest as u32)
}

// Field order matters: the registry and the mechanisms only hold handles into
// the world, so they are dropped before it.
pub struct Game {
    registry: ObjectRegistry,
    mechanisms: Mechanisms,
    world: SimulationWorld,
    config: GameConfig,
    state: GameState,
    draw_mode: DrawMode,
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self, ContraptionError> {
        config.validate()?;
        let mut registry = ObjectRegistry::new(config.window.center());
        let (world, mechanisms) = Self::build(&config, &mut registry)?;
        Ok(Self {
            registry,
            mechanisms,
            world,
            config,
            state: GameState::Initial,
            draw_mode: DrawMode::default(),
        })
    }

    fn build(
        config: &GameConfig,
        registry: &mut ObjectRegistry,
    ) -> Result<(SimulationWorld, Mechanisms), BuildError> {
        let mut world = SimulationWorld::new(&config.physics);
        registry.create_world_boundary(
            &mut world,
            to_sim(config.window.width),
            to_sim(config.window.height),
        );
        let mechanisms = {
            let mut ctx = BuildContext::new(&mut world, registry, &config.sprites, &config.window);
            build_level(&mut ctx)?
        };
        Ok((world, mechanisms))
    }

    /// Clears the registry, then replaces the world and everything in it.
    fn reset(&mut self) -> Result<(), BuildError> {
        self.rebuild(Self::build)
    }

    /// Builds into a fresh registry and swaps it in only on success, so the
    /// registry never holds handles into a world that was thrown away. On
    /// failure the old world stays next to an empty registry.
    fn rebuild<F>(&mut self, build: F) -> Result<(), BuildError>
    where
        F: FnOnce(&GameConfig, &mut ObjectRegistry) -> Result<(SimulationWorld, Mechanisms), BuildError>,
    {
        self.registry.clear();
        let mut registry = ObjectRegistry::new(self.config.window.center());
        let (world, mechanisms) = build(&self.config, &mut registry)?;
        self.registry = registry;
        self.mechanisms = mechanisms;
        self.world = world;
        self.state = GameState::Initial;
        info!("game reset");
        Ok(())
    }

    pub fn handle_input(&mut self, input: GameInput) -> Result<(), BuildError> {
        match input {
            GameInput::Start => match self.state {
                GameState::Initial => self.start(),
                GameState::Finished { .. } => self.reset()?,
                GameState::Running { .. } => debug!("start ignored while running"),
            },
            GameInput::Reset => self.reset()?,
            GameInput::CycleDrawMode => {
                self.draw_mode = self.draw_mode.next();
                debug!(mode = ?self.draw_mode, "draw mode changed");
            }
        }
        Ok(())
    }

    fn start(&mut self) {
        let window = &self.config.window;
        let mut ctx = BuildContext::new(&mut self.world, &mut self.registry, &self.config.sprites, window);
        create_ball(&mut ctx, window.width - BALL_INSET, window.height);
        self.state = GameState::Running {
            started_at: self.world.time(),
        };
        info!("ball dropped");
    }

    /// Steps the world once and lets the mechanisms react.
    pub fn process_frame(&mut self) {
        let contacts = self.world.step();
        for signal in contact::signals(&self.registry, &contacts) {
            self.route(signal);
        }

        self.mechanisms.pulley.move_wheels(&mut self.world);
        if self.mechanisms.catapult.collision() {
            self.mechanisms
                .catapult
                .move_frame(&mut self.world, &mut self.mechanisms.projectile);
        }
    }

    fn route(&mut self, signal: ContactSignal) {
        match signal {
            ContactSignal::TriggerCatapult => {
                if !self.mechanisms.catapult.collision() {
                    info!(time = self.world.time(), "catapult triggered");
                    self.mechanisms.catapult.set_collision(true);
                }
            }
            ContactSignal::HitButton => {
                if let GameState::Running { started_at } = self.state {
                    let total = self.world.time() - started_at;
                    self.state = GameState::Finished { total };
                    info!(total, "pig hit, run finished");
                }
            }
        }
    }

    /// Seconds shown on the clock.
    pub fn clock(&self) -> Real {
        match self.state {
            GameState::Initial => 0.0,
            GameState::Running { started_at } => self.world.time() - started_at,
            GameState::Finished { total } => total,
        }
    }

    pub fn prompt(&self) -> Option<&'static str> {
        match self.state {
            GameState::Initial => Some(START_PROMPT),
            GameState::Running { .. } => None,
            GameState::Finished { .. } => Some(RESET_PROMPT),
        }
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        self.registry.draw(&self.world, renderer, self.draw_mode);

        let height = self.config.window.height;
        let [face_x, face_y] = CLOCK_OFFSET;
        renderer.draw_sprite(Sprite::ClockFace, [face_x, height - face_y], 0.0);
        let [text_x, text_y] = CLOCK_TEXT_OFFSET;
        renderer.draw_text(&format_clock(self.clock()), [text_x, height - text_y]);

        if let Some(prompt) = self.prompt() {
            renderer.draw_centered_text(prompt);
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn world(&self) -> &SimulationWorld {
        &self.world
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn mechanisms(&self) -> &Mechanisms {
        &self.mechanisms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{to_render, wrap_angle};
    use crate::test_support::{DrawCall, RecordingRenderer};

    fn game() -> Game {
        Game::new(GameConfig::default()).unwrap()
    }

    fn balls(game: &Game) -> usize {
        game.registry()
            .entities()
            .iter()
            .filter(|e| e.sprite == Sprite::Ball)
            .count()
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(9.99), "0:09");
        assert_eq!(format_clock(59.9), "0:59");
        assert_eq!(format_clock(61.0), "1:01");
        assert_eq!(format_clock(600.0), "10:00");
    }

    #[test]
    fn test_new_game_is_initial() {
        let game = game();
        assert_eq!(game.state(), GameState::Initial);
        assert_eq!(game.draw_mode(), DrawMode::Sprites);
        assert!(game.registry().boundary().is_some());
        assert_eq!(balls(&game), 0);
        assert_eq!(game.clock(), 0.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = GameConfig::default();
        config.physics.dt = 0.0;
        assert!(matches!(Game::new(config), Err(ContraptionError::Config(_))));
    }

    #[test]
    fn test_start_drops_one_ball() {
        let mut game = game();
        game.handle_input(GameInput::Start).unwrap();
        assert!(matches!(game.state(), GameState::Running { .. }));
        assert_eq!(balls(&game), 1);

        game.handle_input(GameInput::Start).unwrap();
        assert!(matches!(game.state(), GameState::Running { .. }));
        assert_eq!(balls(&game), 1);
    }

    #[test]
    fn test_clock_runs_with_simulation_time() {
        let mut game = game();
        game.handle_input(GameInput::Start).unwrap();
        for _ in 0..120 {
            game.process_frame();
        }
        assert!((game.clock() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_draw_mode_cycles() {
        let mut game = game();
        let mut seen = Vec::new();
        for _ in 0..3 {
            game.handle_input(GameInput::CycleDrawMode).unwrap();
            seen.push(game.draw_mode());
        }
        assert_eq!(seen, vec![DrawMode::Both, DrawMode::Lines, DrawMode::Sprites]);
    }

    #[test]
    fn test_pig_hit_only_counts_while_running() {
        let mut game = game();
        game.route(ContactSignal::HitButton);
        assert_eq!(game.state(), GameState::Initial);

        game.handle_input(GameInput::Start).unwrap();
        for _ in 0..30 {
            game.process_frame();
        }
        game.route(ContactSignal::HitButton);
        let GameState::Finished { total } = game.state() else {
            panic!("run should be finished");
        };
        assert!((total - 0.5).abs() < 1e-3);

        for _ in 0..30 {
            game.process_frame();
        }
        assert_eq!(game.clock(), total);
        game.route(ContactSignal::HitButton);
        assert_eq!(game.state(), GameState::Finished { total });
    }

    #[test]
    fn test_start_after_finish_resets() {
        let mut game = game();
        let fresh = game.registry().entities().len();
        game.handle_input(GameInput::Start).unwrap();
        game.process_frame();
        game.route(ContactSignal::HitButton);

        game.handle_input(GameInput::Start).unwrap();
        assert_eq!(game.state(), GameState::Initial);
        assert_eq!(game.registry().entities().len(), fresh);
        assert_eq!(balls(&game), 0);
        assert_eq!(game.world().time(), 0.0);
    }

    #[test]
    fn test_reset_rebuilds_while_running() {
        let mut game = game();
        let fresh_bodies = game.world().body_count();
        game.handle_input(GameInput::Start).unwrap();
        game.handle_input(GameInput::Reset).unwrap();
        assert_eq!(game.state(), GameState::Initial);
        assert_eq!(game.world().body_count(), fresh_bodies);
        assert!(!game.mechanisms().catapult.collision());
    }

    #[test]
    fn test_failed_rebuild_leaves_no_stale_entities() {
        let mut game = game();
        game.handle_input(GameInput::Start).unwrap();
        let result = game.rebuild(|config, registry| {
            let mut world = SimulationWorld::new(&config.physics);
            let body = {
                let mut ctx = BuildContext::new(&mut world, registry, &config.sprites, &config.window);
                create_ball(&mut ctx, 100.0, 100.0)
            };
            Err(BuildError::UnknownBody(body))
        });

        assert!(result.is_err());
        assert!(game.registry().entities().is_empty());
        assert!(game.registry().boundary().is_none());
        // Still renders: nothing in the registry points into a dropped world.
        game.render(&mut RecordingRenderer::default());
    }

    #[test]
    fn test_reset_entities_resolve_in_the_new_world() {
        let mut game = game();
        game.handle_input(GameInput::Start).unwrap();
        for _ in 0..10 {
            game.process_frame();
        }
        game.handle_input(GameInput::Reset).unwrap();
        for entity in game.registry().entities() {
            assert!(game.world().contains_body(entity.body));
        }
        assert!(game.world().contains_body(game.mechanisms().catapult.chassis()));
    }

    #[test]
    fn test_trigger_sets_catapult_flag() {
        let mut game = game();
        game.route(ContactSignal::TriggerCatapult);
        assert!(game.mechanisms().catapult.collision());
    }

    #[test]
    fn test_render_shows_clock_and_prompt() {
        let mut game = game();
        let mut renderer = RecordingRenderer::default();
        game.render(&mut renderer);
        assert!(renderer.calls.contains(&DrawCall::Text("0:00".to_string())));
        assert_eq!(
            renderer.calls.last(),
            Some(&DrawCall::CenteredText(START_PROMPT.to_string()))
        );

        game.handle_input(GameInput::Start).unwrap();
        let mut renderer = RecordingRenderer::default();
        game.render(&mut renderer);
        assert!(!renderer
            .calls
            .iter()
            .any(|call| matches!(call, DrawCall::CenteredText(_))));
    }

    fn snapshots(game: &Game) -> Vec<([f32; 2], [f32; 2], f32)> {
        game.registry()
            .entities()
            .iter()
            .map(|entity| {
                let s = game.world().body_snapshot(entity.body).unwrap();
                (s.position, s.velocity, s.rotation)
            })
            .collect()
    }

    #[test]
    fn test_runs_are_reproducible() {
        let mut first = game();
        let mut second = game();
        first.handle_input(GameInput::Start).unwrap();
        second.handle_input(GameInput::Start).unwrap();
        for _ in 0..300 {
            first.process_frame();
            second.process_frame();
        }
        assert_eq!(snapshots(&first), snapshots(&second));
        assert_eq!(first.state(), second.state());
        assert_eq!(
            first.mechanisms().catapult.collision(),
            second.mechanisms().catapult.collision()
        );
    }

    #[test]
    fn test_tower_stands_until_hit() {
        let mut game = game();
        let tower: Vec<_> = game
            .registry()
            .entities()
            .iter()
            .filter(|e| matches!(e.sprite, Sprite::Stick | Sprite::Block))
            .map(|e| e.body)
            .collect();
        let before: Vec<_> = tower
            .iter()
            .map(|body| game.world().body_snapshot(*body).unwrap())
            .collect();

        for _ in 0..300 {
            game.process_frame();
        }
        for (body, start) in tower.iter().zip(&before) {
            let now = game.world().body_snapshot(*body).unwrap();
            let dx = to_render(now.position[0] - start.position[0]);
            let dy = to_render(now.position[1] - start.position[1]);
            assert!(dx.hypot(dy) < 3.0, "tower piece moved by ({dx}, {dy})");
            assert!(wrap_angle(now.rotation - start.rotation).abs() < 0.05);
        }
    }

    #[test]
    fn test_nothing_falls_through_the_floor() {
        let mut game = game();
        for _ in 0..480 {
            game.process_frame();
        }
        for entity in game.registry().entities() {
            let y = game.world().body_snapshot(entity.body).unwrap().position[1];
            assert!(y > 0.0, "{:?} ended at y = {y}", entity.sprite);
        }
    }

    #[test]
    fn test_headless_run_is_stable() {
        let mut game = game();
        game.handle_input(GameInput::Start).unwrap();
        for _ in 0..300 {
            game.process_frame();
        }
        let pulley = &game.mechanisms().pulley;
        for body in pulley.baskets() {
            let t = game.world().body(body).unwrap().translation();
            assert!(t.x.is_finite() && t.y.is_finite());
        }
    }
}
