use mayhem_core::sim::{replay, LiveGame, PlayState};
use mayhem_core::tape::{encode_command, serialize_tape, verify_tape, Command, FrameInput};
use mayhem_core::TapeError;

fn scripted_commands() -> Vec<Command> {
    let mut commands = vec![
        Command::StartGame,
        Command::SelectCharacter(1),
        Command::ConfirmCharacter,
        Command::ResumeFromIntro,
    ];
    for frame in 0..900u32 {
        commands.push(Command::Play(FrameInput {
            left: frame % 120 < 40,
            right: frame % 120 >= 80,
            fire: frame % 4 == 0,
        }));
    }
    commands
}

#[test]
fn live_game_matches_replay() {
    let commands = scripted_commands();
    let mut game = LiveGame::new(0xDEAD_BEEF);
    for command in &commands {
        game.apply(*command);
    }
    assert_eq!(game.result(), replay(0xDEAD_BEEF, &commands));
    assert_ne!(game.state(), PlayState::Menu);
}

#[test]
fn recorded_tape_verifies() {
    let commands = scripted_commands();
    let result = replay(0x1234_5678, &commands);
    let bytes: Vec<u8> = commands.iter().map(|c| encode_command(*c)).collect();
    let tape = serialize_tape(0x1234_5678, &bytes, result.final_score, result.final_rng_state);

    let journal = verify_tape(&tape, 10_000).expect("tape must verify");
    assert_eq!(journal.seed, 0x1234_5678);
    assert_eq!(journal.command_count, commands.len() as u32);
    assert_eq!(journal.final_score, result.final_score);
    assert_eq!(journal.final_level, result.final_level);
}

#[test]
fn inflated_score_claim_is_rejected() {
    let commands = scripted_commands();
    let result = replay(7, &commands);
    let bytes: Vec<u8> = commands.iter().map(|c| encode_command(*c)).collect();
    let tape = serialize_tape(7, &bytes, result.final_score + 50, result.final_rng_state);

    assert_eq!(
        verify_tape(&tape, 10_000),
        Err(TapeError::ScoreMismatch {
            claimed: result.final_score + 50,
            computed: result.final_score,
        })
    );
}

#[test]
fn snapshot_json_keeps_discrete_state() {
    let mut game = LiveGame::new(99);
    for command in scripted_commands().into_iter().take(40) {
        game.apply(command);
    }
    let snapshot = game.snapshot();
    let encoded = serde_json::to_string(&snapshot).unwrap();
    let decoded: mayhem_core::WorldSnapshot = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded.state, snapshot.state);
    assert_eq!(decoded.level, snapshot.level);
    assert_eq!(decoded.balls.len(), snapshot.balls.len());
    assert_eq!(decoded.upgrades, snapshot.upgrades);
    assert!(encoded.contains("\"state\":\"playing\""));
}
