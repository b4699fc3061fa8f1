//! Menu and between-level navigation.
//!
//! This is host-loop bookkeeping: the pilot owns a small cooldown and the
//! character-select phase, and is only consulted while the game is not in
//! `Playing`.

use mayhem_core::sim::{PlayState, UpgradeKind};
use mayhem_core::{Command, WorldSnapshot};
use tracing::info;

use crate::upgrades::choose_upgrade;

const START_COOLDOWN: u32 = 30;
const CHARACTER_PICK_COOLDOWN: u32 = 10;
const CONFIRM_COOLDOWN: u32 = 30;
const INTRO_COOLDOWN: u32 = 20;
const UPGRADE_COOLDOWN: u32 = 30;
const GAME_OVER_COOLDOWN: u32 = 90;
const WIN_COOLDOWN: u32 = 120;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum CharacterPhase {
    #[default]
    Pick,
    Confirm,
}

#[derive(Clone, Debug, Default)]
pub struct MenuPilot {
    cooldown: u32,
    phase: CharacterPhase,
    character: u8,
}

impl MenuPilot {
    pub fn new(character: u8) -> Self {
        Self {
            character,
            ..Self::default()
        }
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Command for this frame, or `None` to idle.
    pub fn next_command(&mut self, world: &WorldSnapshot) -> Option<Command> {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }

        match world.state {
            PlayState::Menu => {
                info!("starting game");
                self.cooldown = START_COOLDOWN;
                self.phase = CharacterPhase::Pick;
                Some(Command::StartGame)
            }
            PlayState::CharSelect => match self.phase {
                CharacterPhase::Pick => {
                    self.phase = CharacterPhase::Confirm;
                    self.cooldown = CHARACTER_PICK_COOLDOWN;
                    Some(Command::SelectCharacter(self.character))
                }
                CharacterPhase::Confirm => {
                    info!(character = self.character, "character selected, starting");
                    self.phase = CharacterPhase::Pick;
                    self.cooldown = CONFIRM_COOLDOWN;
                    Some(Command::ConfirmCharacter)
                }
            },
            PlayState::LevelIntro => {
                self.cooldown = INTRO_COOLDOWN;
                Some(Command::ResumeFromIntro)
            }
            PlayState::UpgradeSelect => {
                self.cooldown = UPGRADE_COOLDOWN;
                let index = choose_upgrade(&world.upgrade_offers, world.lives)?;
                let picked = world.upgrade_offers[index];
                info!(
                    picked = picked.display_name(),
                    offered = %offer_names(&world.upgrade_offers),
                    "upgrade chosen"
                );
                u8::try_from(index).ok().map(Command::SelectUpgrade)
            }
            PlayState::GameOver => {
                info!(level = world.level, score = world.score, "game over");
                self.cooldown = GAME_OVER_COOLDOWN;
                Some(Command::BackToMenu)
            }
            PlayState::Win => {
                info!(score = world.score, "run won");
                self.cooldown = WIN_COOLDOWN;
                Some(Command::BackToMenu)
            }
            PlayState::Playing | PlayState::Paused => None,
        }
    }
}

fn offer_names(offers: &[UpgradeKind]) -> String {
    offers
        .iter()
        .map(|kind| kind.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mayhem_core::LiveGame;

    fn drain(pilot: &mut MenuPilot, world: &WorldSnapshot) -> (Option<Command>, u32) {
        let mut idle = 0;
        loop {
            match pilot.next_command(world) {
                Some(command) => return (Some(command), idle),
                None if idle > 200 => return (None, idle),
                None => idle += 1,
            }
        }
    }

    #[test]
    fn walks_from_menu_into_play() {
        let mut game = LiveGame::new(0xA57E_0001);
        let mut pilot = MenuPilot::default();
        let mut frames = 0;
        while game.state() != PlayState::Playing && frames < 500 {
            let command = pilot
                .next_command(&game.snapshot())
                .unwrap_or(Command::IDLE);
            game.apply(command);
            frames += 1;
        }
        assert_eq!(game.state(), PlayState::Playing);
        assert_eq!(game.snapshot().character, 0);
        assert!(frames > START_COOLDOWN + CHARACTER_PICK_COOLDOWN);
    }

    #[test]
    fn character_pick_precedes_confirm() {
        let mut world = LiveGame::new(1).snapshot();
        world.state = PlayState::CharSelect;
        let mut pilot = MenuPilot::new(2);
        assert_eq!(drain(&mut pilot, &world), (Some(Command::SelectCharacter(2)), 0));
        assert_eq!(
            drain(&mut pilot, &world),
            (Some(Command::ConfirmCharacter), CHARACTER_PICK_COOLDOWN)
        );
    }

    #[test]
    fn upgrade_pick_uses_preference() {
        let mut world = LiveGame::new(1).snapshot();
        world.state = PlayState::UpgradeSelect;
        world.lives = 3;
        world.upgrade_offers = vec![
            UpgradeKind::ExtraLife,
            UpgradeKind::ShotSpeed,
            UpgradeKind::MoveSpeed,
        ];
        let mut pilot = MenuPilot::default();
        assert_eq!(pilot.next_command(&world), Some(Command::SelectUpgrade(2)));
        assert_eq!(pilot.cooldown(), UPGRADE_COOLDOWN);
    }

    #[test]
    fn paused_and_playing_do_nothing() {
        let mut world = LiveGame::new(1).snapshot();
        let mut pilot = MenuPilot::default();
        for state in [PlayState::Paused, PlayState::Playing] {
            world.state = state;
            assert_eq!(pilot.next_command(&world), None);
        }
    }

    #[test]
    fn game_over_returns_to_menu_after_cooldown() {
        let mut world = LiveGame::new(1).snapshot();
        world.state = PlayState::GameOver;
        let mut pilot = MenuPilot::default();
        assert_eq!(pilot.next_command(&world), Some(Command::BackToMenu));
        assert_eq!(drain(&mut pilot, &world).1, GAME_OVER_COOLDOWN);
    }
}
