//! The contraption itself: every obstacle and mechanism in one layout.
//!
//! Coordinates are render units with the origin at the bottom left of the
//! window. The ball enters from the top right, runs through the top row of
//! ramps and pins, drops down the middle row onto the pulley and bird, and the
//! bird ends up on the catapult that finally flings it at the tower.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use tracing::info;

use crate::catapult::Catapult;
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::obstacles::{
    create_bumper, create_button, create_circle_bumper, create_heavy_ball, create_pins, create_platform,
    create_propeller, create_ramp, create_small_platform, create_tower_piece, DEFAULT_HEAVY_BALL_DENSITY,
};
use crate::projectile::Projectile;
use crate::pulley::Pulley;
use crate::render::Sprite;

pub const PULLEY_POSITION: [f32; 2] = [775.0, 275.0];
pub const PULLEY_SEPARATION: f32 = 190.0;
pub const BIRD_POSITION: [f32; 2] = [818.0, 390.0];
pub const CATAPULT_POSITION: [f32; 2] = [890.0, 50.0];

const PIN_ROW: [f32; 5] = [280.0, 245.0, 210.0, 175.0, 140.0];
const CIRCLE_BUMPERS: [[f32; 2]; 5] = [
    [870.0, 310.0],
    [985.0, 310.0],
    [927.5, 260.0],
    [875.0, 210.0],
    [985.0, 210.0],
];

/// The mechanisms of a built level. Everything else lives only in the world
/// and the registry.
#[derive(Debug)]
pub struct Mechanisms {
    pub pulley: Pulley,
    pub projectile: Projectile,
    pub catapult: Catapult,
}

/// Places the whole contraption. The ball is not part of it; it is dropped in
/// when the run starts.
pub fn build_level(ctx: &mut BuildContext) -> Result<Mechanisms, BuildError> {
    let [width, height] = [ctx.window.width, ctx.window.height];

    let [pig_w, pig_h] = ctx.size(Sprite::Pig);
    create_button(ctx, pig_w / 2.0, pig_h / 2.0);

    build_top_row(ctx, width, height)?;
    let (pulley, projectile) = build_middle_row(ctx)?;
    let catapult = build_bottom_row(ctx);
    build_tower(ctx);

    info!(
        entities = ctx.registry.entities().len(),
        ropes = ctx.registry.ropes().len(),
        "level built"
    );
    Ok(Mechanisms {
        pulley,
        projectile,
        catapult,
    })
}

fn build_top_row(ctx: &mut BuildContext, width: f32, height: f32) -> Result<(), BuildError> {
    let [ramp_w, ramp_h] = ctx.size(Sprite::Ramp);
    create_ramp(ctx, width - ramp_w / 2.0, height - ramp_h / 2.0, 0.0)?;
    create_bumper(ctx, 824.0, 575.0, 0.0);
    create_ramp(ctx, 410.0, height - ramp_h / 2.0, 0.0)?;
    create_ramp(ctx, 410.0 + ramp_w, height - ramp_h / 2.0, -FRAC_PI_2)?;
    create_platform(ctx, 220.0, 574.0, 0.0);
    for x in PIN_ROW {
        create_pins(ctx, x, 590.0, 0.0)?;
    }
    Ok(())
}

fn build_middle_row(ctx: &mut BuildContext) -> Result<(Pulley, Projectile), BuildError> {
    let ramp_h = ctx.size(Sprite::Ramp)[1];
    create_ramp(ctx, 20.0, 550.0, -FRAC_PI_2)?;
    create_platform(ctx, 75.0, 550.0 - ramp_h / 2.0, 0.0);
    create_heavy_ball(ctx, 150.0, 525.0, DEFAULT_HEAVY_BALL_DENSITY);
    create_platform(ctx, 240.0, 381.0, -FRAC_PI_4);
    create_platform(ctx, 405.0, 313.0, 0.0);
    create_small_platform(ctx, 511.0, 356.0, FRAC_PI_2);
    create_propeller(ctx, 405.0, 430.0, FRAC_PI_2);
    create_small_platform(ctx, 556.0, 440.0, 0.0);
    create_heavy_ball(ctx, 520.0, 500.0, DEFAULT_HEAVY_BALL_DENSITY);

    let [px, py] = PULLEY_POSITION;
    let pulley = Pulley::new(ctx, px, py, PULLEY_SEPARATION)?;
    create_small_platform(ctx, 790.0, 349.0, 3.12414);

    let [bx, by] = BIRD_POSITION;
    let projectile = Projectile::new(ctx, bx, by);
    Ok((pulley, projectile))
}

fn build_bottom_row(ctx: &mut BuildContext) -> Catapult {
    create_small_platform(ctx, 833.0, 295.0, FRAC_PI_2);
    create_small_platform(ctx, 1016.5, 295.0, FRAC_PI_2);
    create_small_platform(ctx, 855.0, 205.0, 5.23599);
    create_small_platform(ctx, 1000.0, 205.0, 4.27606);
    for [x, y] in CIRCLE_BUMPERS {
        create_circle_bumper(ctx, x, y);
    }
    let [cx, cy] = CATAPULT_POSITION;
    Catapult::new(ctx, cx, cy)
}

fn build_tower(ctx: &mut BuildContext) {
    let [w, h] = ctx.size(Sprite::Block);
    create_tower_piece(ctx, 200.0, 83.0, Sprite::Stick, FRAC_PI_2);
    create_tower_piece(ctx, 300.0, 83.0, Sprite::Stick, FRAC_PI_2);
    create_tower_piece(ctx, 250.0, 175.0, Sprite::Stick, 0.0);

    for x in [250.0, 250.0 - w, 250.0 + w] {
        create_tower_piece(ctx, x, 205.0, Sprite::Block, 0.0);
    }
    for x in [250.0 - w / 2.0, 250.0 + w / 2.0] {
        create_tower_piece(ctx, x, 205.0 + h, Sprite::Block, 0.0);
    }
    create_tower_piece(ctx, 250.0, 205.0 + 2.0 * h, Sprite::Block, 0.0);
}
