pub mod benchmark;
pub mod engine;
pub mod menu;
pub mod profiles;
pub mod runner;
pub mod upgrades;
pub mod util;

pub use engine::tuning::Tuning;
pub use engine::{think, Autopilot, Branch, Decision, EngineFault, Movement};
