//! Per-tick decision engine.
//!
//! Every tick is recomputed from the current [`WorldSnapshot`]; nothing the
//! engine computes survives into the next tick. [`think`] is the pure entry
//! point, [`Autopilot::tick`] the fault-tolerant one the runner drives.

pub mod arbiter;
pub mod bonus;
pub mod danger;
pub mod dodge;
pub mod split;
pub mod targeting;
pub mod trajectory;
pub mod tuning;

#[cfg(test)]
pub(crate) mod testing;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use mayhem_core::{FrameInput, RuleCode, WorldSnapshot};
use serde::Serialize;
use tracing::warn;

use self::danger::DangerField;
use self::trajectory::Field;
use self::tuning::Tuning;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Left,
    Right,
    Hold,
}

/// Which arm of the priority chain produced a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Idle,
    EmergencyDodge,
    BonusPursuit,
    Aggressive,
    Engage,
    Reposition,
}

impl Branch {
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::EmergencyDodge,
        Self::BonusPursuit,
        Self::Aggressive,
        Self::Engage,
        Self::Reposition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::EmergencyDodge => "emergency_dodge",
            Self::BonusPursuit => "bonus_pursuit",
            Self::Aggressive => "aggressive",
            Self::Engage => "engage",
            Self::Reposition => "reposition",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Decision {
    pub target_x: Option<f64>,
    pub movement: Movement,
    pub fire: bool,
    pub branch: Branch,
}

impl Decision {
    /// Hold still, do not fire.
    pub fn neutral() -> Self {
        Self {
            target_x: None,
            movement: Movement::Hold,
            fire: false,
            branch: Branch::Idle,
        }
    }

    pub fn to_input(&self) -> FrameInput {
        FrameInput {
            left: self.movement == Movement::Left,
            right: self.movement == Movement::Right,
            fire: self.fire,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineFault {
    InvalidSnapshot { rule: RuleCode },
    InvalidTuning { reason: String },
    Panicked { message: String },
}

impl fmt::Display for EngineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSnapshot { rule } => write!(f, "invalid world snapshot ({rule})"),
            Self::InvalidTuning { reason } => write!(f, "invalid tuning ({reason})"),
            Self::Panicked { message } => write!(f, "decision panicked: {message}"),
        }
    }
}

impl std::error::Error for EngineFault {}

/// Everything one tick's components share: the snapshot, tuning and the danger field built from them.
pub struct Scene<'a> {
    pub world: &'a WorldSnapshot,
    pub tuning: &'a Tuning,
    pub field: Field,
    pub danger: DangerField,
}

impl<'a> Scene<'a> {
    pub fn new(world: &'a WorldSnapshot, tuning: &'a Tuning) -> Self {
        let field = Field::of(world);
        let danger = DangerField::build(world, &field, tuning);
        Self {
            world,
            tuning,
            field,
            danger,
        }
    }
}

/// Decide one tick. Outside of `Playing` the decision is neutral.
pub fn think(world: &WorldSnapshot, tuning: &Tuning) -> Result<Decision, EngineFault> {
    if !world.is_playing() {
        return Ok(Decision::neutral());
    }
    world
        .validate()
        .map_err(|rule| EngineFault::InvalidSnapshot { rule })?;
    tuning
        .validate()
        .map_err(|err| EngineFault::InvalidTuning {
            reason: err.to_string(),
        })?;
    Ok(arbiter::decide(&Scene::new(world, tuning)))
}

/// Tick boundary: a fault in one tick costs that tick only.
#[derive(Clone, Debug)]
pub struct Autopilot {
    tuning: Tuning,
    faults: u32,
}

impl Autopilot {
    pub fn new(tuning: Tuning) -> Self {
        Self { tuning, faults: 0 }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn faults(&self) -> u32 {
        self.faults
    }

    pub fn tick(&mut self, world: &WorldSnapshot) -> Decision {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| think(world, &self.tuning)))
            .unwrap_or_else(|payload| {
                Err(EngineFault::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });
        match outcome {
            Ok(decision) => decision,
            Err(fault) => {
                self.faults += 1;
                warn!(frame = world.frame_count, faults = self.faults, "autopilot tick fault: {fault}");
                Decision::neutral()
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{ball_at, world_with};
    use mayhem_core::sim::PlayState;

    #[test]
    fn non_playing_states_are_neutral() {
        let mut world = world_with(vec![ball_at(400.0, 340.0, 0.0, 2.0, 0)]);
        world.state = PlayState::UpgradeSelect;
        assert_eq!(think(&world, &Tuning::default()), Ok(Decision::neutral()));
    }

    #[test]
    fn invalid_snapshot_is_a_fault() {
        let mut world = world_with(vec![ball_at(400.0, 200.0, 0.0, 0.0, 2)]);
        world.balls[0].radius = 0.0;
        assert_eq!(
            think(&world, &Tuning::default()),
            Err(EngineFault::InvalidSnapshot {
                rule: RuleCode::BallRadius
            })
        );
    }

    #[test]
    fn tick_recovers_after_a_fault() {
        let mut autopilot = Autopilot::new(Tuning::default());
        let mut world = world_with(vec![ball_at(400.0, 150.0, 0.0, 0.0, 3)]);
        world.balls[0].tier = 9;
        assert_eq!(autopilot.tick(&world), Decision::neutral());
        assert_eq!(autopilot.faults(), 1);

        world.balls[0].tier = 3;
        let decision = autopilot.tick(&world);
        assert_ne!(decision.branch, Branch::Idle);
        assert_eq!(autopilot.faults(), 1);
    }

    #[test]
    fn stalling_tuning_is_a_fault_not_a_hang() {
        let tuning = Tuning {
            dodge_step: 0.0,
            ..Tuning::default()
        };
        let world = world_with(vec![ball_at(400.0, 300.0, 0.0, 4.0, 0)]);
        assert!(matches!(
            think(&world, &tuning),
            Err(EngineFault::InvalidTuning { .. })
        ));

        let mut autopilot = Autopilot::new(tuning);
        assert_eq!(autopilot.tick(&world), Decision::neutral());
        assert_eq!(autopilot.faults(), 1);
    }

    #[test]
    fn same_snapshot_same_decision() {
        let tuning = Tuning::default();
        let mut world = world_with(vec![
            ball_at(250.0, 120.0, 1.6, 0.0, 0),
            ball_at(520.0, 200.0, -2.2, -3.0, 2),
        ]);
        world.player.x = 330.0;
        assert_eq!(think(&world, &tuning), think(&world, &tuning));
    }

    #[test]
    fn decision_maps_to_frame_input() {
        let decision = Decision {
            target_x: Some(10.0),
            movement: Movement::Left,
            fire: true,
            branch: Branch::Engage,
        };
        let input = decision.to_input();
        assert!(input.left && !input.right && input.fire);
        assert_eq!(Decision::neutral().to_input(), FrameInput::default());
    }
}
