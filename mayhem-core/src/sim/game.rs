use super::*;

#[derive(Clone)]
pub(super) struct Game {
    state: PlayState,
    frame_count: u32,
    level: u32,
    score: u32,
    lives: i32,
    combo: u32,
    combo_timer: i32,
    max_combo: u32,
    slow_mo_timer: i32,
    double_shot_timer: i32,
    character: u8,
    scale: f64,
    width: f64,
    height: f64,
    player: PlayerSnapshot,
    balls: Vec<BallSnapshot>,
    blocks: Vec<BlockSnapshot>,
    shots: Vec<ShotSnapshot>,
    items: Vec<ItemSnapshot>,
    upgrades: Upgrades,
    upgrade_offers: Vec<UpgradeKind>,
    rng: SeededRng,
}

impl Game {
    pub(super) fn new(seed: u32) -> Self {
        let mut game = Self {
            state: PlayState::Menu,
            frame_count: 0,
            level: 0,
            score: 0,
            lives: STARTING_LIVES,
            combo: 0,
            combo_timer: 0,
            max_combo: 0,
            slow_mo_timer: 0,
            double_shot_timer: 0,
            character: 0,
            scale: DEFAULT_SCALE,
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            player: PlayerSnapshot {
                x: WORLD_WIDTH / 2.0,
                y: 0.0,
                half_w: 0.0,
                half_h: 0.0,
                speed: 0.0,
                shoot_cooldown: 0,
                invincible: 0,
            },
            balls: Vec::with_capacity(MAX_BALLS),
            blocks: Vec::new(),
            shots: Vec::new(),
            items: Vec::new(),
            upgrades: Upgrades::default(),
            upgrade_offers: Vec::with_capacity(UPGRADE_OFFER_COUNT),
            rng: SeededRng::new(seed),
        };
        game.refresh_player_stats();
        game
    }

    #[inline]
    pub(super) fn state(&self) -> PlayState {
        self.state
    }

    #[inline]
    pub(super) fn max_combo(&self) -> u32 {
        self.max_combo
    }

    #[inline]
    fn ground_y(&self) -> f64 {
        self.height - GROUND_HEIGHT * self.scale
    }

    pub(super) fn result(&self) -> ReplayResult {
        ReplayResult {
            final_score: self.score,
            final_rng_state: self.rng.state(),
            frame_count: self.frame_count,
            final_level: self.level,
        }
    }

    pub(super) fn world_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            frame_count: self.frame_count,
            state: self.state,
            level: self.level,
            score: self.score,
            lives: self.lives,
            combo: self.combo,
            combo_timer: self.combo_timer,
            slow_mo_timer: self.slow_mo_timer,
            double_shot_timer: self.double_shot_timer,
            scale: self.scale,
            width: self.width,
            height: self.height,
            rng_state: self.rng.state(),
            character: self.character,
            player: self.player,
            balls: self.balls.clone(),
            blocks: self.blocks.clone(),
            shots: self.shots.clone(),
            items: self.items.clone(),
            upgrades: self.upgrades,
            upgrade_offers: self.upgrade_offers.clone(),
        }
    }

    /// Advances exactly one frame. Commands that do not apply to the current state are ignored.
    pub(super) fn apply(&mut self, command: Command) {
        match (self.state, command) {
            (PlayState::Menu, Command::StartGame) => {
                self.state = PlayState::CharSelect;
            }
            (PlayState::CharSelect, Command::SelectCharacter(index)) => {
                if index < CHARACTER_COUNT {
                    self.character = index;
                }
            }
            (PlayState::CharSelect, Command::ConfirmCharacter) => self.start_run(),
            (PlayState::LevelIntro, Command::ResumeFromIntro) => {
                self.state = PlayState::Playing;
            }
            (PlayState::Playing, Command::Play(input)) => self.step_playing(input),
            (PlayState::UpgradeSelect, Command::SelectUpgrade(index)) => {
                if let Some(kind) = self.upgrade_offers.get(index as usize).copied() {
                    self.apply_upgrade(kind);
                    self.upgrade_offers.clear();
                    self.level += 1;
                    self.load_level();
                }
            }
            (PlayState::GameOver | PlayState::Win, Command::BackToMenu) => {
                self.state = PlayState::Menu;
            }
            _ => {}
        }
        self.frame_count = self.frame_count.wrapping_add(1);
    }

    fn start_run(&mut self) {
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.combo = 0;
        self.combo_timer = 0;
        self.upgrades = Upgrades::default();
        self.level = 1;
        self.refresh_player_stats();
        self.load_level();
    }

    fn load_level(&mut self) {
        let ground_y = self.ground_y();
        self.balls.clear();
        self.shots.clear();
        self.items.clear();
        self.slow_mo_timer = 0;
        self.double_shot_timer = 0;
        self.blocks = level_blocks(self.level, self.width, ground_y, self.scale);

        let tiers = level_ball_tiers(self.level);
        let count = tiers.len();
        for (index, tier) in tiers.into_iter().enumerate() {
            let t = tier as usize;
            let radius = BALL_RADII[t] * self.scale;
            let slot = (index + 1) as f64 / (count + 1) as f64;
            let direction = if index % 2 == 0 { 1.0 } else { -1.0 };
            let jitter = self.rng.next_range(-40, 41) as f64 * self.scale;
            self.balls.push(BallSnapshot {
                x: (self.width * slot + jitter).clamp(radius, self.width - radius),
                y: 110.0 * self.scale,
                vx: BALL_SPAWN_VX[t] * self.scale * direction,
                vy: 0.0,
                radius,
                tier,
                bounce_vy: BALL_BOUNCE_VY[t] * self.scale,
            });
        }

        self.player.x = self.width / 2.0;
        self.player.y = ground_y - self.player.half_h;
        self.player.shoot_cooldown = 0;
        self.player.invincible = 0;
        self.state = PlayState::LevelIntro;
    }

    fn refresh_player_stats(&mut self) {
        let factor = self.upgrades.size_factor();
        self.player.half_w = PLAYER_WIDTH * self.scale * factor / 2.0;
        self.player.half_h = PLAYER_HEIGHT * self.scale * factor / 2.0;
        self.player.speed = self.upgrades.player_speed(self.scale);
        self.player.y = self.ground_y() - self.player.half_h;
        self.player.x = self
            .player
            .x
            .clamp(self.player.half_w, self.width - self.player.half_w);
    }

    fn apply_upgrade(&mut self, kind: UpgradeKind) {
        let u = &mut self.upgrades;
        let slot = match kind {
            UpgradeKind::ExtraAmmo => &mut u.extra_ammo,
            UpgradeKind::MoveSpeed => &mut u.move_speed,
            UpgradeKind::ShotSpeed => &mut u.shot_speed,
            UpgradeKind::SizeReduction => &mut u.size_reduction,
            UpgradeKind::ExtraArrows => &mut u.extra_arrows,
            UpgradeKind::ExtraLife => {
                self.lives = (self.lives + 1).min(MAX_LIVES);
                return;
            }
        };
        *slot = (*slot + 1).min(MAX_UPGRADE_LEVEL);
        self.refresh_player_stats();
    }

    fn roll_upgrade_offers(&mut self) {
        let mut pool: Vec<UpgradeKind> = UpgradeKind::ALL
            .into_iter()
            .filter(|kind| match self.upgrades.level(*kind) {
                Some(level) => level < MAX_UPGRADE_LEVEL,
                None => self.lives < MAX_LIVES,
            })
            .collect();

        self.upgrade_offers.clear();
        while self.upgrade_offers.len() < UPGRADE_OFFER_COUNT && !pool.is_empty() {
            let pick = self.rng.next_int(pool.len() as u32) as usize;
            self.upgrade_offers.push(pool.swap_remove(pick));
        }
    }

    fn step_playing(&mut self, input: FrameInput) {
        self.tick_timers();
        self.move_player(input);
        if input.fire {
            self.fire_volley();
        }

        let time_scale = if self.slow_mo_timer > 0 {
            SLOW_MO_TIME_SCALE
        } else {
            1.0
        };
        let gravity = GRAVITY * self.scale;
        let ground_y = self.ground_y();
        for ball in &mut self.balls {
            advance_ball(ball, &self.blocks, self.width, ground_y, gravity, time_scale);
        }

        self.advance_shots();
        self.resolve_shot_hits();
        self.advance_items();
        self.resolve_player_hits();

        if self.state == PlayState::Playing && self.balls.is_empty() {
            self.finish_level();
        }
    }

    fn tick_timers(&mut self) {
        let p = &mut self.player;
        p.shoot_cooldown = (p.shoot_cooldown - 1).max(0);
        p.invincible = (p.invincible - 1).max(0);
        self.slow_mo_timer = (self.slow_mo_timer - 1).max(0);
        self.double_shot_timer = (self.double_shot_timer - 1).max(0);
        if self.combo_timer > 0 {
            self.combo_timer -= 1;
            if self.combo_timer == 0 {
                self.combo = 0;
            }
        }
    }

    fn move_player(&mut self, input: FrameInput) {
        let direction = match (input.left, input.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => return,
        };
        let p = self.player;
        let next_x = (p.x + direction * p.speed).clamp(p.half_w, self.width - p.half_w);
        let blocked = self.blocks.iter().any(|block| {
            block.overlaps(next_x - p.half_w, next_x + p.half_w, p.top(), p.bottom())
        });
        if !blocked {
            self.player.x = next_x;
        }
    }

    fn fire_volley(&mut self) {
        let cap = self.upgrades.max_shots();
        if self.player.shoot_cooldown > 0 || self.shots.len() >= cap {
            return;
        }

        let bonus = if self.double_shot_timer > 0 { 1 } else { 0 };
        let arrows = 1 + self.upgrades.extra_arrows as usize + bonus;
        let center = (arrows as f64 - 1.0) / 2.0;
        let tip_y = self.player.top();
        for index in 0..arrows {
            if self.shots.len() >= cap {
                break;
            }
            let offset = (index as f64 - center) * ARROW_SPREAD * self.scale;
            self.shots.push(ShotSnapshot {
                x: (self.player.x + offset).clamp(0.0, self.width),
                tip_y,
            });
        }
        self.player.shoot_cooldown = SHOOT_COOLDOWN_FRAMES;
    }

    fn advance_shots(&mut self) {
        let speed = self.upgrades.shot_speed(self.scale);
        let blocks = &self.blocks;
        self.shots.retain_mut(|shot| {
            shot.tip_y -= speed;
            if shot.tip_y <= 0.0 {
                return false;
            }
            !blocks.iter().any(|block| {
                shot.x >= block.x
                    && shot.x <= block.x + block.w
                    && shot.tip_y <= block.y + block.h
                    && shot.tip_y >= block.y
            })
        });
    }

    fn resolve_shot_hits(&mut self) {
        let mut shot_index = 0;
        while shot_index < self.shots.len() {
            let shot = self.shots[shot_index];
            let hit = self.balls.iter().position(|ball| {
                (ball.x - shot.x).abs() < ball.radius && ball.y + ball.radius >= shot.tip_y
            });

            match hit {
                Some(ball_index) => {
                    self.shots.swap_remove(shot_index);
                    let ball = self.balls.swap_remove(ball_index);
                    self.pop_ball(ball);
                }
                None => shot_index += 1,
            }
        }
    }

    fn pop_ball(&mut self, ball: BallSnapshot) {
        self.combo = if self.combo_timer > 0 { self.combo + 1 } else { 1 };
        self.combo_timer = COMBO_WINDOW_FRAMES;
        self.max_combo = self.max_combo.max(self.combo);
        self.score = self
            .score
            .saturating_add(BALL_SCORES[ball.tier as usize] * combo_multiplier(self.combo));

        if !ball.is_terminal() {
            for child in split_children(&ball, self.scale, self.width) {
                if self.balls.len() < MAX_BALLS {
                    self.balls.push(child);
                }
            }
        }

        if self.rng.chance_pct(ITEM_DROP_CHANCE_PCT) {
            let kind = BonusKind::ALL[self.rng.next_int(BonusKind::ALL.len() as u32) as usize];
            let half = ITEM_SIZE * self.scale / 2.0;
            self.items.push(ItemSnapshot {
                x: ball.x.clamp(half, self.width - half),
                y: ball.y.min(self.ground_y() - half),
                kind,
                ttl: ITEM_LIFETIME_FRAMES,
            });
        }
    }

    fn advance_items(&mut self) {
        let rest_y = self.ground_y() - ITEM_SIZE * self.scale / 2.0;
        let fall = ITEM_FALL_SPEED * self.scale;
        let reach_x = self.player.half_w + ITEM_SIZE * self.scale / 2.0;
        let reach_y = self.player.half_h + ITEM_SIZE * self.scale / 2.0;
        let player = self.player;

        let mut collected = Vec::new();
        self.items.retain_mut(|item| {
            item.y = (item.y + fall).min(rest_y);
            item.ttl -= 1;
            if (item.x - player.x).abs() < reach_x && (item.y - player.y).abs() < reach_y {
                collected.push(item.kind);
                return false;
            }
            item.ttl > 0
        });

        for kind in collected {
            match kind {
                BonusKind::Shield => {
                    self.player.invincible = self.player.invincible.max(SHIELD_FRAMES);
                }
                BonusKind::SlowTime => self.slow_mo_timer = SLOW_MO_FRAMES,
                BonusKind::DoubleShot => self.double_shot_timer = DOUBLE_SHOT_FRAMES,
            }
        }
    }

    fn resolve_player_hits(&mut self) {
        if self.player.invincible > 0 {
            return;
        }
        let p = self.player;
        let touched = self.balls.iter().any(|ball| {
            let cx = ball.x.clamp(p.x - p.half_w, p.x + p.half_w);
            let cy = ball.y.clamp(p.top(), p.bottom());
            let dx = ball.x - cx;
            let dy = ball.y - cy;
            dx * dx + dy * dy < ball.radius * ball.radius
        });
        if !touched {
            return;
        }

        self.lives -= 1;
        self.combo = 0;
        self.combo_timer = 0;
        self.player.invincible = HIT_INVINCIBLE_FRAMES;
        if self.lives <= 0 {
            self.lives = 0;
            self.state = PlayState::GameOver;
        }
    }

    fn finish_level(&mut self) {
        self.shots.clear();
        self.items.clear();
        if self.level >= MAX_LEVEL {
            self.state = PlayState::Win;
        } else {
            self.roll_upgrade_offers();
            self.state = PlayState::UpgradeSelect;
        }
    }
}

/// One frame of arcade ball motion: gravity, wall reflection, authored floor bounce, block push-out.
pub fn advance_ball(
    ball: &mut BallSnapshot,
    blocks: &[BlockSnapshot],
    width: f64,
    ground_y: f64,
    gravity: f64,
    time_scale: f64,
) {
    let r = ball.radius;
    ball.vy += gravity * time_scale;
    ball.x += ball.vx * time_scale;
    ball.y += ball.vy * time_scale;

    if ball.x - r < 0.0 {
        ball.x = r;
        ball.vx = ball.vx.abs();
    }
    if ball.x + r > width {
        ball.x = width - r;
        ball.vx = -ball.vx.abs();
    }
    if ball.y - r < 0.0 {
        ball.y = r;
        ball.vy = ball.vy.abs();
    }
    if ball.y + r > ground_y {
        ball.y = ground_y - r;
        ball.vy = ball.bounce_vy;
    }

    for block in blocks {
        let nx = ball.x.clamp(block.x, block.x + block.w);
        let ny = ball.y.clamp(block.y, block.y + block.h);
        let dx = ball.x - nx;
        let dy = ball.y - ny;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq >= r * r {
            continue;
        }

        let dist = match dist_sq.sqrt() {
            d if d > 0.0 => d,
            _ => PUSH_OUT_EPSILON,
        };
        ball.x += (dx / dist) * (r - dist);
        ball.y += (dy / dist) * (r - dist);

        let overlap_x = r - (ball.x - (block.x + block.w / 2.0)).abs() + block.w / 2.0;
        let overlap_y = r - (ball.y - (block.y + block.h / 2.0)).abs() + block.h / 2.0;
        if overlap_x < overlap_y {
            ball.vx = -ball.vx;
        } else if ball.y < block.y {
            ball.vy = ball.bounce_vy;
        } else {
            ball.vy = ball.vy.abs();
        }
    }

    ball.x = ball.x.clamp(r, (width - r).max(r));
    ball.y = ball.y.clamp(r, (ground_y - r).max(r));
}

/// The two children produced when a non-terminal ball is popped.
pub fn split_children(ball: &BallSnapshot, scale: f64, width: f64) -> [BallSnapshot; 2] {
    let child_tier = (ball.tier + 1).min(TERMINAL_BALL_TIER);
    let t = child_tier as usize;
    let radius = BALL_RADII[t] * scale;
    let spread = (SPLIT_SPREAD_VX_BASE + ball.tier as f64 * SPLIT_SPREAD_VX_PER_TIER) * scale;
    let vy = ball.bounce_vy * SPLIT_CHILD_VY_FACTOR;
    let bounce_vy = BALL_BOUNCE_VY[t] * scale;
    let offset = SPLIT_CHILD_OFFSET * scale;
    let max_x = (width - radius).max(radius);

    [-1.0, 1.0].map(|side| BallSnapshot {
        x: (ball.x + side * offset).clamp(radius, max_x),
        y: ball.y,
        vx: side * spread,
        vy,
        radius,
        tier: child_tier,
        bounce_vy,
    })
}
