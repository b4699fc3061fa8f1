// Field geometry (pixels at scale 1.0).
pub const WORLD_WIDTH: f64 = 800.0;
pub const WORLD_HEIGHT: f64 = 450.0;
pub const GROUND_HEIGHT: f64 = 40.0;
pub const DEFAULT_SCALE: f64 = 1.0;

// Ball physics.
pub const GRAVITY: f64 = 0.28;
pub const SLOW_MO_TIME_SCALE: f64 = 0.5;
pub const TERMINAL_BALL_TIER: u8 = 3;
pub const BALL_RADII: [f64; 4] = [45.0, 32.0, 22.0, 14.0];
pub const BALL_BOUNCE_VY: [f64; 4] = [-9.5, -9.0, -8.5, -8.0];
pub const BALL_SPAWN_VX: [f64; 4] = [1.6, 1.9, 2.2, 2.5];
pub const BALL_SCORES: [u32; 4] = [50, 100, 150, 200];
/// Zero-distance fallback used when a ball centre sits exactly on a block edge.
pub const PUSH_OUT_EPSILON: f64 = 0.01;

// Splits.
pub const SPLIT_SPREAD_VX_BASE: f64 = 2.2;
pub const SPLIT_SPREAD_VX_PER_TIER: f64 = 0.5;
pub const SPLIT_CHILD_VY_FACTOR: f64 = 0.7;
pub const SPLIT_CHILD_OFFSET: f64 = 10.0;

// Player.
pub const PLAYER_WIDTH: f64 = 30.0;
pub const PLAYER_HEIGHT: f64 = 44.0;
pub const PLAYER_SPEEDS: [f64; 4] = [4.0, 4.8, 5.6, 6.4];
pub const SIZE_REDUCTION_STEP: f64 = 0.12;
pub const STARTING_LIVES: i32 = 3;
pub const MAX_LIVES: i32 = 9;
pub const HIT_INVINCIBLE_FRAMES: i32 = 120;
pub const CHARACTER_COUNT: u8 = 3;

// Shots.
pub const SHOT_SPEEDS: [f64; 4] = [7.0, 9.0, 11.0, 13.0];
pub const SHOOT_COOLDOWN_FRAMES: i32 = 10;
pub const ARROW_SPREAD: f64 = 12.0;

// Scoring.
pub const COMBO_WINDOW_FRAMES: i32 = 90;
pub const MAX_COMBO_MULTIPLIER: u32 = 8;

// Bonus items.
pub const ITEM_DROP_CHANCE_PCT: u32 = 14;
pub const ITEM_FALL_SPEED: f64 = 2.0;
pub const ITEM_SIZE: f64 = 16.0;
pub const ITEM_LIFETIME_FRAMES: i32 = 360;
pub const SHIELD_FRAMES: i32 = 300;
pub const SLOW_MO_FRAMES: i32 = 240;
pub const DOUBLE_SHOT_FRAMES: i32 = 300;

// Progression.
pub const MAX_LEVEL: u32 = 10;
pub const MAX_UPGRADE_LEVEL: u8 = 3;
pub const UPGRADE_OFFER_COUNT: usize = 3;
pub const MAX_BALLS: usize = 48;
