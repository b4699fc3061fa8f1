use serde::{Deserialize, Serialize};

use crate::error::TapeError;
use crate::sim::replay;

pub const TAPE_MAGIC: u32 = 0x4D48_594D; // "MYHM"
pub const TAPE_VERSION: u8 = 1;
pub const TAPE_HEADER_SIZE: usize = 16;
pub const TAPE_FOOTER_SIZE: usize = 12;
pub const MAX_COMMANDS_DEFAULT: u32 = 216_000;

const PLAY_MASK: u8 = 0x07;
const OP_START_GAME: u8 = 0x10;
const OP_SELECT_CHARACTER: u8 = 0x20;
const OP_CONFIRM_CHARACTER: u8 = 0x30;
const OP_RESUME_FROM_INTRO: u8 = 0x40;
const OP_SELECT_UPGRADE: u8 = 0x50;
const OP_BACK_TO_MENU: u8 = 0x60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

/// One frame's worth of host input: either in-play controls or a menu actuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Play(FrameInput),
    StartGame,
    SelectCharacter(u8),
    ConfirmCharacter,
    ResumeFromIntro,
    SelectUpgrade(u8),
    BackToMenu,
}

impl Command {
    pub const IDLE: Self = Self::Play(FrameInput {
        left: false,
        right: false,
        fire: false,
    });
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeHeader {
    pub magic: u32,
    pub version: u8,
    pub seed: u32,
    pub command_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeFooter {
    pub final_score: u32,
    pub final_rng_state: u32,
    pub checksum: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TapeView<'a> {
    pub header: TapeHeader,
    pub commands: &'a [u8],
    pub footer: TapeFooter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeJournal {
    pub seed: u32,
    pub command_count: u32,
    pub final_score: u32,
    pub final_rng_state: u32,
    pub final_level: u32,
    pub tape_checksum: u32,
}

#[inline]
pub fn encode_input_byte(input: FrameInput) -> u8 {
    (if input.left { 0x01 } else { 0 })
        | (if input.right { 0x02 } else { 0 })
        | (if input.fire { 0x04 } else { 0 })
}

#[inline]
pub fn decode_input_byte(byte: u8) -> FrameInput {
    FrameInput {
        left: (byte & 0x01) != 0,
        right: (byte & 0x02) != 0,
        fire: (byte & 0x04) != 0,
    }
}

pub fn encode_command(command: Command) -> u8 {
    match command {
        Command::Play(input) => encode_input_byte(input),
        Command::StartGame => OP_START_GAME,
        Command::SelectCharacter(index) => OP_SELECT_CHARACTER | (index & 0x0F),
        Command::ConfirmCharacter => OP_CONFIRM_CHARACTER,
        Command::ResumeFromIntro => OP_RESUME_FROM_INTRO,
        Command::SelectUpgrade(index) => OP_SELECT_UPGRADE | (index & 0x0F),
        Command::BackToMenu => OP_BACK_TO_MENU,
    }
}

pub fn decode_command(byte: u8) -> Option<Command> {
    let arg = byte & 0x0F;
    match byte & 0xF0 {
        0x00 if byte <= PLAY_MASK => Some(Command::Play(decode_input_byte(byte))),
        OP_START_GAME if arg == 0 => Some(Command::StartGame),
        OP_SELECT_CHARACTER => Some(Command::SelectCharacter(arg)),
        OP_CONFIRM_CHARACTER if arg == 0 => Some(Command::ConfirmCharacter),
        OP_RESUME_FROM_INTRO if arg == 0 => Some(Command::ResumeFromIntro),
        OP_SELECT_UPGRADE => Some(Command::SelectUpgrade(arg)),
        OP_BACK_TO_MENU if arg == 0 => Some(Command::BackToMenu),
        _ => None,
    }
}

pub fn parse_tape(bytes: &[u8], max_commands: u32) -> Result<TapeView<'_>, TapeError> {
    let min_len = TAPE_HEADER_SIZE + TAPE_FOOTER_SIZE;
    if bytes.len() < min_len {
        return Err(TapeError::TapeTooShort {
            actual: bytes.len(),
            min: min_len,
        });
    }

    let magic = read_u32_le(bytes, 0);
    if magic != TAPE_MAGIC {
        return Err(TapeError::InvalidMagic { found: magic });
    }

    let version = bytes[4];
    if version != TAPE_VERSION {
        return Err(TapeError::UnsupportedVersion { found: version });
    }
    if bytes[5..8].iter().any(|b| *b != 0) {
        return Err(TapeError::HeaderReservedNonZero);
    }

    let seed = read_u32_le(bytes, 8);
    let command_count = read_u32_le(bytes, 12);
    if command_count == 0 || command_count > max_commands {
        return Err(TapeError::CommandCountOutOfRange {
            count: command_count,
            max_commands,
        });
    }

    let expected_len = TAPE_HEADER_SIZE + command_count as usize + TAPE_FOOTER_SIZE;
    if bytes.len() != expected_len {
        return Err(TapeError::TapeLengthMismatch {
            expected: expected_len,
            actual: bytes.len(),
        });
    }

    let body_start = TAPE_HEADER_SIZE;
    let body_end = body_start + command_count as usize;
    let commands = &bytes[body_start..body_end];
    if let Some((index, byte)) = commands
        .iter()
        .enumerate()
        .find(|(_, byte)| decode_command(**byte).is_none())
    {
        return Err(TapeError::UnknownCommand {
            index: index as u32,
            byte: *byte,
        });
    }

    let final_score = read_u32_le(bytes, body_end);
    let final_rng_state = read_u32_le(bytes, body_end + 4);
    let checksum = read_u32_le(bytes, body_end + 8);
    let computed = crc32(&bytes[..body_end]);
    if checksum != computed {
        return Err(TapeError::CrcMismatch {
            stored: checksum,
            computed,
        });
    }

    Ok(TapeView {
        header: TapeHeader {
            magic,
            version,
            seed,
            command_count,
        },
        commands,
        footer: TapeFooter {
            final_score,
            final_rng_state,
            checksum,
        },
    })
}

pub fn serialize_tape(seed: u32, commands: &[u8], final_score: u32, final_rng_state: u32) -> Vec<u8> {
    let total_len = TAPE_HEADER_SIZE + commands.len() + TAPE_FOOTER_SIZE;
    let mut data = vec![0u8; total_len];

    write_u32_le(&mut data, 0, TAPE_MAGIC);
    data[4] = TAPE_VERSION;
    write_u32_le(&mut data, 8, seed);
    write_u32_le(&mut data, 12, commands.len() as u32);

    let body_start = TAPE_HEADER_SIZE;
    let body_end = body_start + commands.len();
    data[body_start..body_end].copy_from_slice(commands);

    write_u32_le(&mut data, body_end, final_score);
    write_u32_le(&mut data, body_end + 4, final_rng_state);

    let checksum = crc32(&data[..body_end]);
    write_u32_le(&mut data, body_end + 8, checksum);

    data
}

/// Parses the tape, replays its commands from the recorded seed, and checks the footer claims.
pub fn verify_tape(bytes: &[u8], max_commands: u32) -> Result<TapeJournal, TapeError> {
    let tape = parse_tape(bytes, max_commands)?;
    let commands: Vec<Command> = tape
        .commands
        .iter()
        .filter_map(|byte| decode_command(*byte))
        .collect();
    let result = replay(tape.header.seed, &commands);

    if result.final_score != tape.footer.final_score {
        return Err(TapeError::ScoreMismatch {
            claimed: tape.footer.final_score,
            computed: result.final_score,
        });
    }
    if result.final_rng_state != tape.footer.final_rng_state {
        return Err(TapeError::RngMismatch {
            claimed: tape.footer.final_rng_state,
            computed: result.final_rng_state,
        });
    }

    Ok(TapeJournal {
        seed: tape.header.seed,
        command_count: tape.header.command_count,
        final_score: result.final_score,
        final_rng_state: result.final_rng_state,
        final_level: result.final_level,
        tape_checksum: tape.footer.checksum,
    })
}

#[inline]
fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[inline]
fn write_u32_le(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;

    while i < 256 {
        let mut c = i as u32;
        let mut j = 0;

        while j < 8 {
            c = if (c & 1) != 0 {
                0xEDB8_8320u32 ^ (c >> 1)
            } else {
                c >> 1
            };
            j += 1;
        }

        table[i] = c;
        i += 1;
    }

    table
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;

    for byte in data {
        let idx = ((crc ^ (*byte as u32)) & 0xFF) as usize;
        crc = CRC_TABLE[idx] ^ (crc >> 8);
    }

    crc ^ 0xFFFF_FFFFu32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_matches_known_vector() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn every_command_byte_decodes_back_to_itself() {
        for byte in 0u8..=0xFF {
            if let Some(command) = decode_command(byte) {
                assert_eq!(encode_command(command), byte, "byte 0x{byte:02x}");
            }
        }
    }

    #[test]
    fn reserved_bytes_do_not_decode() {
        assert_eq!(decode_command(0x08), None);
        assert_eq!(decode_command(0x11), None);
        assert_eq!(decode_command(0x70), None);
        assert_eq!(decode_command(0xFF), None);
    }

    #[test]
    fn parses_serialized_tape() {
        let commands = [0x10u8, 0x20, 0x30, 0x40, 0x05];
        let bytes = serialize_tape(0xABCD_1234, &commands, 777, 0x1111_2222);
        let tape = parse_tape(&bytes, 100).unwrap();

        assert_eq!(tape.header.seed, 0xABCD_1234);
        assert_eq!(tape.header.command_count, 5);
        assert_eq!(tape.commands, commands);
        assert_eq!(tape.footer.final_score, 777);
        assert_eq!(tape.footer.final_rng_state, 0x1111_2222);
    }

    #[test]
    fn rejects_tape_too_short() {
        let bytes = [0u8; TAPE_HEADER_SIZE + TAPE_FOOTER_SIZE - 1];
        assert!(matches!(
            parse_tape(&bytes, 100),
            Err(TapeError::TapeTooShort { .. })
        ));
    }

    #[test]
    fn rejects_flipped_body_byte() {
        let mut bytes = serialize_tape(1, &[0x00, 0x01, 0x02], 0, 1);
        bytes[TAPE_HEADER_SIZE + 1] = 0x02;
        assert!(matches!(
            parse_tape(&bytes, 100),
            Err(TapeError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn rejects_unknown_command_byte() {
        let bytes = serialize_tape(1, &[0x00, 0x7F], 0, 1);
        assert_eq!(
            parse_tape(&bytes, 100),
            Err(TapeError::UnknownCommand {
                index: 1,
                byte: 0x7F
            })
        );
    }

    #[test]
    fn rejects_too_many_commands() {
        let bytes = serialize_tape(1, &[0x00; 8], 0, 1);
        assert!(matches!(
            parse_tape(&bytes, 4),
            Err(TapeError::CommandCountOutOfRange { count: 8, .. })
        ));
    }
}
