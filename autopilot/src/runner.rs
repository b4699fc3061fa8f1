use crate::engine::tuning::Tuning;
use crate::engine::{Autopilot, Branch, Movement};
use crate::menu::MenuPilot;
use crate::profiles::create_profile;
use anyhow::{anyhow, Context, Result};
use mayhem_core::sim::PlayState;
use mayhem_core::tape::{encode_command, serialize_tape};
use mayhem_core::{verify_tape, Command, LiveGame};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

const STATUS_INTERVAL_FRAMES: u32 = 180;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BranchFrames {
    pub idle: u32,
    pub emergency_dodge: u32,
    pub bonus_pursuit: u32,
    pub aggressive: u32,
    pub engage: u32,
    pub reposition: u32,
}

impl BranchFrames {
    fn record(&mut self, branch: Branch) {
        let slot = match branch {
            Branch::Idle => &mut self.idle,
            Branch::EmergencyDodge => &mut self.emergency_dodge,
            Branch::BonusPursuit => &mut self.bonus_pursuit,
            Branch::Aggressive => &mut self.aggressive,
            Branch::Engage => &mut self.engage,
            Branch::Reposition => &mut self.reposition,
        };
        *slot += 1;
    }

    pub fn get(&self, branch: Branch) -> u32 {
        match branch {
            Branch::Idle => self.idle,
            Branch::EmergencyDodge => self.emergency_dodge,
            Branch::BonusPursuit => self.bonus_pursuit,
            Branch::Aggressive => self.aggressive,
            Branch::Engage => self.engage,
            Branch::Reposition => self.reposition,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub profile_id: String,
    pub profile_fingerprint: String,
    pub seed: u32,
    pub max_frames: u32,
    pub frame_count: u32,
    pub final_score: u32,
    pub final_rng_state: u32,
    pub final_lives: i32,
    pub final_level: u32,
    pub game_over: bool,
    pub won: bool,
    pub max_combo: u32,
    pub play_frames: u32,
    pub move_frames: u32,
    pub fire_frames: u32,
    pub faults: u32,
    pub branch_frames: BranchFrames,
}

#[derive(Clone, Debug)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    pub commands: Vec<u8>,
    pub tape: Vec<u8>,
}

pub fn run_autopilot(profile: &str, seed: u32, max_frames: u32) -> Result<RunArtifact> {
    let tuning = create_profile(profile)?;
    run_with_tuning(tuning, seed, max_frames)
}

/// Plays one run from the title screen until game over, a win, or `max_frames`.
pub fn run_with_tuning(tuning: Tuning, seed: u32, max_frames: u32) -> Result<RunArtifact> {
    if max_frames == 0 {
        return Err(anyhow!("max_frames must be > 0"));
    }
    tuning
        .validate()
        .with_context(|| format!("tuning profile '{}' is invalid", tuning.id))?;

    let mut game = LiveGame::new(seed);
    game.validate()
        .map_err(|rule| anyhow!("initial invariant failure: {rule}"))?;

    let profile_id = tuning.id.clone();
    let profile_fingerprint = tuning.fingerprint();
    let mut autopilot = Autopilot::new(tuning);
    let mut pilot = MenuPilot::default();

    let mut commands = Vec::with_capacity(max_frames as usize);
    let mut branch_frames = BranchFrames::default();
    let (mut play_frames, mut move_frames, mut fire_frames) = (0u32, 0u32, 0u32);
    let mut last_level = 0u32;
    let mut last_status = String::new();

    let mut world = game.snapshot();
    while world.frame_count < max_frames
        && !matches!(world.state, PlayState::GameOver | PlayState::Win)
    {
        let command = if world.is_playing() {
            if world.level != last_level {
                info!(seed = %format!("{seed:#010x}"), level = world.level, "level start");
                last_level = world.level;
            }
            if world.frame_count % STATUS_INTERVAL_FRAMES == 0 {
                let status = format!(
                    "L{}-B{}-S{}-V{}-C{}",
                    world.level,
                    world.balls.len(),
                    world.score,
                    world.lives,
                    world.combo
                );
                if status != last_status {
                    info!(
                        level = world.level,
                        balls = world.balls.len(),
                        score = world.score,
                        lives = world.lives,
                        combo = world.combo,
                        "status"
                    );
                    last_status = status;
                }
            }

            let decision = autopilot.tick(&world);
            play_frames += 1;
            branch_frames.record(decision.branch);
            if decision.movement != Movement::Hold {
                move_frames += 1;
            }
            if decision.fire {
                fire_frames += 1;
            }
            Command::Play(decision.to_input())
        } else {
            pilot.next_command(&world).unwrap_or(Command::IDLE)
        };

        commands.push(encode_command(command));
        game.apply(command);
        world = game.snapshot();
    }

    game.validate()
        .map_err(|rule| anyhow!("final invariant failure: {rule}"))?;

    let result = game.result();
    let tape = serialize_tape(seed, &commands, result.final_score, result.final_rng_state);
    let budget = max_frames.max(commands.len() as u32).max(1);
    let journal = verify_tape(&tape, budget)
        .map_err(|err| anyhow!("generated tape failed verification: {err}"))?;

    Ok(RunArtifact {
        metrics: RunMetrics {
            profile_id,
            profile_fingerprint,
            seed,
            max_frames,
            frame_count: result.frame_count,
            final_score: result.final_score,
            final_rng_state: result.final_rng_state,
            final_lives: world.lives,
            final_level: journal.final_level,
            game_over: world.state == PlayState::GameOver,
            won: world.state == PlayState::Win,
            max_combo: game.max_combo(),
            play_frames,
            move_frames,
            fire_frames,
            faults: autopilot.faults(),
            branch_frames,
        },
        commands,
        tape,
    })
}

pub fn write_tape(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frame_budget_is_rejected() {
        assert!(run_autopilot("balanced", 1, 0).is_err());
    }

    #[test]
    fn branch_frames_count_each_branch() {
        let mut frames = BranchFrames::default();
        for branch in Branch::ALL {
            frames.record(branch);
        }
        frames.record(Branch::Engage);
        for branch in Branch::ALL {
            let expected = if branch == Branch::Engage { 2 } else { 1 };
            assert_eq!(frames.get(branch), expected, "{}", branch.as_str());
        }
    }

    #[test]
    fn short_run_reaches_play_and_records_a_valid_tape() -> Result<()> {
        let artifact = run_autopilot("balanced", 0xA57E_0001, 900)?;
        let metrics = &artifact.metrics;
        assert_eq!(metrics.frame_count as usize, artifact.commands.len());
        assert!(metrics.play_frames > 0);
        assert_eq!(metrics.faults, 0);
        assert_eq!(metrics.branch_frames.idle, 0);
        let journal = verify_tape(&artifact.tape, 900)?;
        assert_eq!(journal.final_score, metrics.final_score);
        Ok(())
    }
}
