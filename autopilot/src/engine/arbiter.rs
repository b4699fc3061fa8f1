//! Fixed-priority chain turning the scene into one movement and fire intent.

use super::bonus::find_best_bonus;
use super::danger::in_immediate_danger;
use super::dodge::find_safest_position;
use super::split::is_split_safe;
use super::targeting::{ball_above_player, find_best_target};
use super::{Branch, Decision, Movement, Scene};

pub fn decide(scene: &Scene<'_>) -> Decision {
    let world = scene.world;
    let tuning = scene.tuning;
    let player = &world.player;
    let scale = scene.field.scale;
    let tolerance = tuning.shoot_tolerance * scale;

    let immune = player.invincible > 0;
    let direct = in_immediate_danger(world, tuning.safety_margin);
    let near_danger = scene.danger.danger_at(player.x, tuning.immediate_cutoff);
    let threshold = tuning.caution_threshold(world.level, world.lives);

    let mut target_x = player.x;
    let mut fire = false;

    let branch = if !immune && (direct || near_danger > threshold) {
        target_x = find_safest_position(scene, true);
        Branch::EmergencyDodge
    } else if let Some(bonus) = (!direct).then(|| find_best_bonus(scene)).flatten() {
        target_x = bonus.x;
        Branch::BonusPursuit
    } else if player.invincible > tuning.aggressive_grace_frames {
        if let Some(target) = find_best_target(scene) {
            target_x = target.x;
            fire = (player.x - target.x).abs() < tolerance * tuning.aggressive_tolerance_factor;
        }
        Branch::Aggressive
    } else {
        let combo_active = world.combo_timer > 0;
        let limit = tuning.danger_threshold
            * if combo_active {
                tuning.combo_danger_factor
            } else {
                tuning.normal_danger_factor
            };
        match find_best_target(scene) {
            Some(target) if scene.danger.danger_at(target.x, tuning.path_cutoff) < limit => {
                target_x = target.x;
                if (player.x - target.x).abs() < tolerance {
                    // The source ball may be gone; a stale index simply means no shot.
                    fire = world.balls.get(target.ball_index).is_some_and(|ball| {
                        ball.is_terminal()
                            || is_split_safe(ball, scene)
                            || (combo_active && world.combo >= tuning.combo_streak)
                    });
                }
                Branch::Engage
            }
            _ => {
                target_x = find_safest_position(scene, false);
                Branch::Reposition
            }
        }
    };

    if !fire && branch != Branch::EmergencyDodge && player.shoot_cooldown <= 0 {
        if let Some(index) = ball_above_player(scene) {
            fire = immune || is_split_safe(&world.balls[index], scene);
        }
    }

    let dead_zone = tuning.move_dead_zone * scale;
    let diff = target_x - player.x;
    let movement = if diff < -dead_zone {
        Movement::Left
    } else if diff > dead_zone {
        Movement::Right
    } else {
        Movement::Hold
    };

    let weapon_ready = player.shoot_cooldown <= 0 && world.shots.len() < world.max_shots();

    Decision {
        target_x: Some(target_x),
        movement,
        fire: fire && weapon_ready,
        branch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{ball_at, item_at, world_with};
    use crate::engine::tuning::Tuning;
    use mayhem_core::sim::{BonusKind, ShotSnapshot};

    fn threatened_world() -> mayhem_core::WorldSnapshot {
        let mut world = world_with(vec![ball_at(400.0, 340.0, 0.0, 2.0, 0)]);
        world.player.x = 400.0;
        world
    }

    #[test]
    fn emergency_dodge_never_fires() {
        let tuning = Tuning::default();
        let mut world = threatened_world();
        world.balls.push(ball_at(400.0, 120.0, 0.0, 0.0, 3));
        let decision = decide(&Scene::new(&world, &tuning));
        assert_eq!(decision.branch, Branch::EmergencyDodge);
        assert!(!decision.fire);
        assert_ne!(decision.movement, Movement::Hold);
    }

    #[test]
    fn immunity_suppresses_emergency() {
        let tuning = Tuning::default();
        let mut world = threatened_world();
        world.player.invincible = 10;
        let decision = decide(&Scene::new(&world, &tuning));
        assert_ne!(decision.branch, Branch::EmergencyDodge);
    }

    #[test]
    fn cooldown_blocks_fire() {
        let tuning = Tuning::default();
        let mut world = world_with(vec![ball_at(400.0, 150.0, 0.0, 0.0, 3)]);
        world.player.x = 400.0;
        world.player.invincible = 60;
        let ready = decide(&Scene::new(&world, &tuning));
        assert_eq!(ready.branch, Branch::Aggressive);
        assert!(ready.fire);

        world.player.shoot_cooldown = 4;
        assert!(!decide(&Scene::new(&world, &tuning)).fire);
    }

    #[test]
    fn shot_cap_blocks_fire() {
        let tuning = Tuning::default();
        let mut world = world_with(vec![ball_at(400.0, 150.0, 0.0, 0.0, 3)]);
        world.player.x = 400.0;
        world.player.invincible = 60;
        world.shots = vec![ShotSnapshot { x: 10.0, tip_y: 50.0 }; world.max_shots()];
        assert!(!decide(&Scene::new(&world, &tuning)).fire);
    }

    #[test]
    fn bonus_pursuit_moves_toward_item() {
        let tuning = Tuning::default();
        let mut world = world_with(Vec::new());
        world.player.x = 300.0;
        world.items = vec![item_at(360.0, 390.0, BonusKind::Shield)];
        let decision = decide(&Scene::new(&world, &tuning));
        assert_eq!(decision.branch, Branch::BonusPursuit);
        assert_eq!(decision.target_x, Some(360.0));
        assert_eq!(decision.movement, Movement::Right);
    }

    #[test]
    fn dead_zone_holds_position() {
        let tuning = Tuning::default();
        let mut world = world_with(Vec::new());
        world.player.x = 300.0;
        world.items = vec![item_at(301.5, 390.0, BonusKind::Shield)];
        let decision = decide(&Scene::new(&world, &tuning));
        assert_eq!(decision.movement, Movement::Hold);
    }
}
