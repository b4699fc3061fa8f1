use serde::{Deserialize, Serialize};

use crate::constants::{
    BALL_BOUNCE_VY, BALL_RADII, BALL_SCORES, BALL_SPAWN_VX, CHARACTER_COUNT, COMBO_WINDOW_FRAMES,
    DEFAULT_SCALE, DOUBLE_SHOT_FRAMES, GRAVITY, GROUND_HEIGHT, HIT_INVINCIBLE_FRAMES,
    ITEM_DROP_CHANCE_PCT, ITEM_FALL_SPEED, ITEM_LIFETIME_FRAMES, ITEM_SIZE, MAX_BALLS,
    MAX_COMBO_MULTIPLIER, MAX_LEVEL, MAX_LIVES, MAX_UPGRADE_LEVEL, PLAYER_HEIGHT, PLAYER_SPEEDS,
    PLAYER_WIDTH, PUSH_OUT_EPSILON, SHIELD_FRAMES, SHOOT_COOLDOWN_FRAMES, SHOT_SPEEDS,
    SIZE_REDUCTION_STEP, SLOW_MO_FRAMES, SLOW_MO_TIME_SCALE, SPLIT_CHILD_OFFSET,
    SPLIT_CHILD_VY_FACTOR, SPLIT_SPREAD_VX_BASE, SPLIT_SPREAD_VX_PER_TIER, STARTING_LIVES,
    TERMINAL_BALL_TIER, UPGRADE_OFFER_COUNT, WORLD_HEIGHT, WORLD_WIDTH, ARROW_SPREAD,
};
use crate::error::RuleCode;
use crate::rng::SeededRng;
use crate::tape::{Command, FrameInput};

mod game;

pub use game::{advance_ball, split_children};
use game::Game;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    Menu,
    CharSelect,
    LevelIntro,
    Playing,
    UpgradeSelect,
    Paused,
    GameOver,
    Win,
}

impl PlayState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::CharSelect => "char_select",
            Self::LevelIntro => "level_intro",
            Self::Playing => "playing",
            Self::UpgradeSelect => "upgrade_select",
            Self::Paused => "paused",
            Self::GameOver => "game_over",
            Self::Win => "win",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    ExtraAmmo,
    MoveSpeed,
    ShotSpeed,
    SizeReduction,
    ExtraArrows,
    ExtraLife,
}

impl UpgradeKind {
    pub const ALL: [Self; 6] = [
        Self::ExtraAmmo,
        Self::MoveSpeed,
        Self::ShotSpeed,
        Self::SizeReduction,
        Self::ExtraArrows,
        Self::ExtraLife,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::ExtraAmmo => "Extra Ammo",
            Self::MoveSpeed => "Move Speed",
            Self::ShotSpeed => "Shot Speed",
            Self::SizeReduction => "Size Reduction",
            Self::ExtraArrows => "Extra Arrows",
            Self::ExtraLife => "Extra Life",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    Shield,
    SlowTime,
    DoubleShot,
}

impl BonusKind {
    pub const ALL: [Self; 3] = [Self::Shield, Self::SlowTime, Self::DoubleShot];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrades {
    pub move_speed: u8,
    pub shot_speed: u8,
    pub extra_ammo: u8,
    pub extra_arrows: u8,
    pub size_reduction: u8,
}

impl Upgrades {
    /// Current level for upgradable kinds; `None` for one-shot upgrades.
    pub fn level(&self, kind: UpgradeKind) -> Option<u8> {
        match kind {
            UpgradeKind::ExtraAmmo => Some(self.extra_ammo),
            UpgradeKind::MoveSpeed => Some(self.move_speed),
            UpgradeKind::ShotSpeed => Some(self.shot_speed),
            UpgradeKind::SizeReduction => Some(self.size_reduction),
            UpgradeKind::ExtraArrows => Some(self.extra_arrows),
            UpgradeKind::ExtraLife => None,
        }
    }

    /// In-flight shot cap: `2 * (1 + extraArrows) + 2 * extraAmmo`.
    pub fn max_shots(&self) -> usize {
        2 * (1 + self.extra_arrows as usize) + 2 * self.extra_ammo as usize
    }

    pub fn shot_speed(&self, scale: f64) -> f64 {
        SHOT_SPEEDS[(self.shot_speed as usize).min(SHOT_SPEEDS.len() - 1)] * scale
    }

    pub fn player_speed(&self, scale: f64) -> f64 {
        PLAYER_SPEEDS[(self.move_speed as usize).min(PLAYER_SPEEDS.len() - 1)] * scale
    }

    fn size_factor(&self) -> f64 {
        1.0 - SIZE_REDUCTION_STEP * self.size_reduction as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub tier: u8,
    pub bounce_vy: f64,
}

impl BallSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.tier >= TERMINAL_BALL_TIER
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BlockSnapshot {
    /// Whether the closed rectangle overlaps the open horizontal/vertical span given.
    pub fn overlaps(&self, left: f64, right: f64, top: f64, bottom: f64) -> bool {
        bottom > self.y && top < self.y + self.h && right > self.x && left < self.x + self.w
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub x: f64,
    pub y: f64,
    pub half_w: f64,
    pub half_h: f64,
    pub speed: f64,
    pub shoot_cooldown: i32,
    pub invincible: i32,
}

impl PlayerSnapshot {
    pub fn top(&self) -> f64 {
        self.y - self.half_h
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.half_h
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotSnapshot {
    pub x: f64,
    pub tip_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub x: f64,
    pub y: f64,
    pub kind: BonusKind,
    pub ttl: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub frame_count: u32,
    pub state: PlayState,
    pub level: u32,
    pub score: u32,
    pub lives: i32,
    pub combo: u32,
    pub combo_timer: i32,
    pub slow_mo_timer: i32,
    pub double_shot_timer: i32,
    pub scale: f64,
    pub width: f64,
    pub height: f64,
    pub rng_state: u32,
    pub character: u8,
    pub player: PlayerSnapshot,
    pub balls: Vec<BallSnapshot>,
    pub blocks: Vec<BlockSnapshot>,
    pub shots: Vec<ShotSnapshot>,
    pub items: Vec<ItemSnapshot>,
    pub upgrades: Upgrades,
    pub upgrade_offers: Vec<UpgradeKind>,
}

impl WorldSnapshot {
    /// Y coordinate of the floor line; balls bounce when their bottom crosses it.
    pub fn ground_y(&self) -> f64 {
        self.height - GROUND_HEIGHT * self.scale
    }

    pub fn time_scale(&self) -> f64 {
        if self.slow_mo_timer > 0 {
            SLOW_MO_TIME_SCALE
        } else {
            1.0
        }
    }

    pub fn max_shots(&self) -> usize {
        self.upgrades.max_shots()
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn validate(&self) -> Result<(), RuleCode> {
        let field = [self.scale, self.width, self.height];
        if field.iter().any(|v| !v.is_finite()) {
            return Err(RuleCode::NonFiniteValue);
        }
        if self.scale <= 0.0 || self.width <= 0.0 || self.ground_y() <= 0.0 {
            return Err(RuleCode::FieldGeometry);
        }

        let p = &self.player;
        if ![p.x, p.y, p.half_w, p.half_h, p.speed]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(RuleCode::NonFiniteValue);
        }
        if p.half_w <= 0.0 || p.half_h <= 0.0 || p.speed < 0.0 {
            return Err(RuleCode::PlayerGeometry);
        }
        if p.x < 0.0 || p.x > self.width {
            return Err(RuleCode::PlayerBounds);
        }

        for ball in &self.balls {
            if ![ball.x, ball.y, ball.vx, ball.vy, ball.radius, ball.bounce_vy]
                .iter()
                .all(|v| v.is_finite())
            {
                return Err(RuleCode::NonFiniteValue);
            }
            if ball.radius <= 0.0 {
                return Err(RuleCode::BallRadius);
            }
            if ball.tier > TERMINAL_BALL_TIER {
                return Err(RuleCode::BallTier);
            }
            if ball.x < 0.0 || ball.x > self.width || ball.y < 0.0 || ball.y > self.ground_y() {
                return Err(RuleCode::BallBounds);
            }
        }

        for block in &self.blocks {
            if ![block.x, block.y, block.w, block.h]
                .iter()
                .all(|v| v.is_finite())
            {
                return Err(RuleCode::NonFiniteValue);
            }
            if block.w <= 0.0 || block.h <= 0.0 {
                return Err(RuleCode::BlockGeometry);
            }
        }

        for item in &self.items {
            if !item.x.is_finite() || !item.y.is_finite() {
                return Err(RuleCode::NonFiniteValue);
            }
            if item.x < 0.0 || item.x > self.width || item.y > self.ground_y() {
                return Err(RuleCode::ItemBounds);
            }
        }

        if self.shots.len() > self.max_shots() {
            return Err(RuleCode::PlayerShotCap);
        }

        let u = &self.upgrades;
        if [
            u.move_speed,
            u.shot_speed,
            u.extra_ammo,
            u.extra_arrows,
            u.size_reduction,
        ]
        .iter()
        .any(|level| *level > MAX_UPGRADE_LEVEL)
        {
            return Err(RuleCode::UpgradeLevelRange);
        }

        if self.lives < 0 || (self.lives == 0 && self.state == PlayState::Playing) {
            return Err(RuleCode::LivesStateConsistency);
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayResult {
    pub final_score: u32,
    pub final_rng_state: u32,
    pub frame_count: u32,
    pub final_level: u32,
}

pub struct LiveGame {
    game: Game,
}

pub fn replay(seed: u32, commands: &[Command]) -> ReplayResult {
    let mut game = Game::new(seed);

    for command in commands {
        game.apply(*command);
    }

    game.result()
}

impl LiveGame {
    pub fn new(seed: u32) -> Self {
        Self {
            game: Game::new(seed),
        }
    }

    #[inline]
    pub fn apply(&mut self, command: Command) {
        self.game.apply(command);
    }

    #[inline]
    pub fn state(&self) -> PlayState {
        self.game.state()
    }

    #[inline]
    pub fn snapshot(&self) -> WorldSnapshot {
        self.game.world_snapshot()
    }

    #[inline]
    pub fn result(&self) -> ReplayResult {
        self.game.result()
    }

    #[inline]
    pub fn max_combo(&self) -> u32 {
        self.game.max_combo()
    }

    #[inline]
    pub fn validate(&self) -> Result<(), RuleCode> {
        self.game.world_snapshot().validate()
    }
}

/// Tiers of the balls a level opens with: one large ball per two levels, plus a medium one on odd levels.
fn level_ball_tiers(level: u32) -> Vec<u8> {
    let large = (level / 2) as usize;
    let mut tiers = vec![0u8; large];
    if level % 2 == 1 {
        tiers.push(1);
    }
    tiers
}

fn level_blocks(level: u32, width: f64, ground_y: f64, scale: f64) -> Vec<BlockSnapshot> {
    let platform_h = 16.0 * scale;
    match level % 3 {
        0 => vec![
            BlockSnapshot {
                x: width * 0.2,
                y: ground_y - 170.0 * scale,
                w: 120.0 * scale,
                h: platform_h,
            },
            BlockSnapshot {
                x: width * 0.8 - 120.0 * scale,
                y: ground_y - 170.0 * scale,
                w: 120.0 * scale,
                h: platform_h,
            },
        ],
        2 if level >= 5 => vec![BlockSnapshot {
            x: width * 0.5 - 80.0 * scale,
            y: ground_y - 210.0 * scale,
            w: 160.0 * scale,
            h: platform_h,
        }],
        _ => Vec::new(),
    }
}

fn combo_multiplier(combo: u32) -> u32 {
    combo.clamp(1, MAX_COMBO_MULTIPLIER)
}
