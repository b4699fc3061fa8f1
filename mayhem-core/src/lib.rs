pub mod constants;
pub mod error;
pub mod rng;
pub mod sim;
pub mod tape;

pub use error::{RuleCode, TapeError};
pub use sim::{replay, LiveGame, ReplayResult, WorldSnapshot};
pub use tape::{verify_tape, Command, FrameInput, TapeJournal};
