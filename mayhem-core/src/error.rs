use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCode {
    NonFiniteValue,
    FieldGeometry,
    BallRadius,
    BallTier,
    BallBounds,
    BlockGeometry,
    PlayerBounds,
    PlayerGeometry,
    PlayerShotCap,
    LivesStateConsistency,
    ItemBounds,
    UpgradeLevelRange,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteValue => write!(f, "NON_FINITE_VALUE"),
            Self::FieldGeometry => write!(f, "FIELD_GEOMETRY"),
            Self::BallRadius => write!(f, "BALL_RADIUS"),
            Self::BallTier => write!(f, "BALL_TIER"),
            Self::BallBounds => write!(f, "BALL_BOUNDS"),
            Self::BlockGeometry => write!(f, "BLOCK_GEOMETRY"),
            Self::PlayerBounds => write!(f, "PLAYER_BOUNDS"),
            Self::PlayerGeometry => write!(f, "PLAYER_GEOMETRY"),
            Self::PlayerShotCap => write!(f, "PLAYER_SHOT_CAP"),
            Self::LivesStateConsistency => write!(f, "LIVES_STATE_CONSISTENCY"),
            Self::ItemBounds => write!(f, "ITEM_BOUNDS"),
            Self::UpgradeLevelRange => write!(f, "UPGRADE_LEVEL_RANGE"),
        }
    }
}

impl std::error::Error for RuleCode {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TapeError {
    TapeTooShort { actual: usize, min: usize },
    InvalidMagic { found: u32 },
    UnsupportedVersion { found: u8 },
    HeaderReservedNonZero,
    CommandCountOutOfRange { count: u32, max_commands: u32 },
    TapeLengthMismatch { expected: usize, actual: usize },
    UnknownCommand { index: u32, byte: u8 },
    CrcMismatch { stored: u32, computed: u32 },
    ScoreMismatch { claimed: u32, computed: u32 },
    RngMismatch { claimed: u32, computed: u32 },
}

impl fmt::Display for TapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TapeTooShort { actual, min } => {
                write!(f, "tape too short: got {actual} bytes, need at least {min}")
            }
            Self::InvalidMagic { found } => write!(f, "invalid tape magic: 0x{found:08x}"),
            Self::UnsupportedVersion { found } => write!(f, "unsupported tape version: {found}"),
            Self::HeaderReservedNonZero => write!(f, "header reserved bytes are non-zero"),
            Self::CommandCountOutOfRange {
                count,
                max_commands,
            } => write!(
                f,
                "command count out of range: {count} (allowed 1..={max_commands})"
            ),
            Self::TapeLengthMismatch { expected, actual } => write!(
                f,
                "tape length mismatch: expected {expected} bytes, got {actual}"
            ),
            Self::UnknownCommand { index, byte } => {
                write!(f, "unknown command byte at index {index}: 0x{byte:02x}")
            }
            Self::CrcMismatch { stored, computed } => write!(
                f,
                "crc mismatch: stored=0x{stored:08x}, computed=0x{computed:08x}"
            ),
            Self::ScoreMismatch { claimed, computed } => {
                write!(f, "score mismatch: claimed={claimed}, computed={computed}")
            }
            Self::RngMismatch { claimed, computed } => {
                write!(
                    f,
                    "rng mismatch: claimed=0x{claimed:08x}, computed=0x{computed:08x}"
                )
            }
        }
    }
}

impl std::error::Error for TapeError {}
