//! Hand-built snapshots for unit tests.

use mayhem_core::constants::{BALL_BOUNCE_VY, BALL_RADII, ITEM_LIFETIME_FRAMES};
use mayhem_core::sim::{
    BallSnapshot, BonusKind, ItemSnapshot, PlayState, PlayerSnapshot, Upgrades,
};
use mayhem_core::WorldSnapshot;

/// An 800x450 level-1 field in `Playing` with the player standing at x = 400.
pub(crate) fn world_with(balls: Vec<BallSnapshot>) -> WorldSnapshot {
    WorldSnapshot {
        frame_count: 0,
        state: PlayState::Playing,
        level: 1,
        score: 0,
        lives: 3,
        combo: 0,
        combo_timer: 0,
        slow_mo_timer: 0,
        double_shot_timer: 0,
        scale: 1.0,
        width: 800.0,
        height: 450.0,
        rng_state: 1,
        character: 0,
        player: PlayerSnapshot {
            x: 400.0,
            y: 388.0,
            half_w: 15.0,
            half_h: 22.0,
            speed: 4.0,
            shoot_cooldown: 0,
            invincible: 0,
        },
        balls,
        blocks: Vec::new(),
        shots: Vec::new(),
        items: Vec::new(),
        upgrades: Upgrades::default(),
        upgrade_offers: Vec::new(),
    }
}

pub(crate) fn ball_at(x: f64, y: f64, vx: f64, vy: f64, tier: u8) -> BallSnapshot {
    let t = tier.min(3) as usize;
    BallSnapshot {
        x,
        y,
        vx,
        vy,
        radius: BALL_RADII[t],
        tier,
        bounce_vy: BALL_BOUNCE_VY[t],
    }
}

pub(crate) fn item_at(x: f64, y: f64, kind: BonusKind) -> ItemSnapshot {
    ItemSnapshot {
        x,
        y,
        kind,
        ttl: ITEM_LIFETIME_FRAMES,
    }
}
