use std::process::ExitCode;
use std::time::Instant;

use contraption::{format_clock, Game, GameConfig, GameInput, GameState};
use tracing::{error, info};

const DEFAULT_FRAMES: usize = 600;
const PRINT_INTERVAL: usize = 60;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn run() -> Result<(), contraption::ContraptionError> {
    let frames = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<usize>().ok())
        .unwrap_or(DEFAULT_FRAMES);
    let config = match std::env::args().nth(2) {
        Some(path) => GameConfig::load(&path)?,
        None => GameConfig::default(),
    };

    info!(frames, "running headless contraption");
    let start_time = Instant::now();
    let mut game = Game::new(config)?;
    game.handle_input(GameInput::Start)?;

    for frame in 0..frames {
        game.process_frame();

        if frame % PRINT_INTERVAL == 0 || frame == frames - 1 {
            let mechanisms = game.mechanisms();
            let bird = game.world().body_snapshot(mechanisms.projectile.body());
            info!(
                frame = frame + 1,
                clock = %format_clock(game.clock()),
                catapult = mechanisms.catapult.collision(),
                arm_frames = mechanisms.catapult.rotation_counter(),
                launched = mechanisms.projectile.is_launched(),
                bird = ?bird.map(|b| b.position),
                "frame"
            );
        }
        if let GameState::Finished { total } = game.state() {
            info!(frame = frame + 1, total, "pig reached");
            break;
        }
    }

    let duration = start_time.elapsed();
    info!(
        seconds = duration.as_secs_f64(),
        state = ?game.state(),
        "simulation complete"
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "contraption failed");
            ExitCode::FAILURE
        }
    }
}
