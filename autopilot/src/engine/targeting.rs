//! Interception scoring: where and when to fire at which ball.

use mayhem_core::sim::BallSnapshot;

use super::trajectory::simulate;
use super::Scene;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    /// Index of the source ball in the snapshot this target was scored against.
    pub ball_index: usize,
    pub tier: u8,
    pub frame: u32,
    pub score: f64,
}

/// Crowd gating: large balls are off limits once the field gets busy.
pub fn is_eligible(tier: u8, ball_count: usize, scene: &Scene<'_>) -> bool {
    let tuning = scene.tuning;
    if ball_count >= tuning.swarm_ball_count {
        tier >= 3
    } else if ball_count >= tuning.crowded_ball_count {
        tier >= 2
    } else {
        true
    }
}

pub fn find_best_target(scene: &Scene<'_>) -> Option<Target> {
    let world = scene.world;
    let ball_count = world.balls.len();
    let mut best: Option<Target> = None;

    for (index, ball) in world.balls.iter().enumerate() {
        if !is_eligible(ball.tier, ball_count, scene) {
            continue;
        }
        for (x, y, frame) in interception_points(ball, scene) {
            let Some(score) = score_point(ball, x, y, frame, scene) else {
                continue;
            };
            if best.map_or(true, |b| score > b.score) {
                best = Some(Target {
                    x,
                    y,
                    ball_index: index,
                    tier: ball.tier,
                    frame,
                    score,
                });
            }
        }
    }
    best
}

/// The current position plus every other predicted frame.
fn interception_points(ball: &BallSnapshot, scene: &Scene<'_>) -> Vec<(f64, f64, u32)> {
    let future = simulate(
        ball,
        scene.tuning.predict_frames,
        &scene.world.blocks,
        &scene.field,
    );
    std::iter::once((ball.x, ball.y, 0))
        .chain(future.iter().step_by(2).map(|s| (s.x, s.y, s.frame)))
        .collect()
}

fn score_point(ball: &BallSnapshot, x: f64, y: f64, frame: u32, scene: &Scene<'_>) -> Option<f64> {
    let world = scene.world;
    let tuning = scene.tuning;
    let player = &world.player;
    let scale = scene.field.scale;
    let ground_y = scene.field.ground_y;

    if y > ground_y - tuning.floor_clearance * scale || y < tuning.ceiling_clearance {
        return None;
    }

    let shot_speed = world.upgrades.shot_speed(scale);
    let travel = (ground_y - y) / shot_speed;
    if travel < 0.0 {
        return None;
    }
    let shoot_frame = frame as f64 - travel;
    if shoot_frame < -tuning.late_shot_slack {
        return None;
    }

    let distance = (player.x - x).abs();
    let frames_needed = if distance == 0.0 {
        0.0
    } else {
        distance / player.speed.max(f64::EPSILON)
    };
    if shoot_frame > 0.0 && frames_needed > shoot_frame * tuning.reach_slack {
        return None;
    }

    let danger = scene.danger.danger_at(x, tuning.target_danger_cutoff);
    let mut score = tuning.base_score;
    score -= danger * tuning.target_danger_weight(world.level);
    score -= frame as f64 * tuning.arrival_penalty;
    score += 3u8.saturating_sub(ball.tier) as f64 * tuning.tier_bonus;
    score -= frames_needed * tuning.move_cost;
    score -= distance * tuning.distance_cost;

    if distance < tuning.shoot_tolerance * scale && frame <= tuning.overhead_frames {
        score += tuning.overhead_bonus;
    }
    if y > ground_y * tuning.mid_band_low && y < ground_y * tuning.mid_band_high {
        score += tuning.mid_height_bonus;
    }

    if world.combo_timer > 0 {
        let urgency = (world.combo as f64 * tuning.combo_bonus_per_hit).min(tuning.combo_bonus_cap);
        let total = frames_needed.max(shoot_frame.max(0.0)) + travel;
        if total < world.combo_timer as f64 {
            score += urgency;
            score += (tuning.combo_window - total) * tuning.combo_speed_weight;
        }
    }

    Some(score)
}

/// A ball hanging over the player's head, close enough for a free shot.
pub fn ball_above_player(scene: &Scene<'_>) -> Option<usize> {
    let world = scene.world;
    let tuning = scene.tuning;
    let scale = scene.field.scale;
    let tolerance = tuning.shoot_tolerance * scale;
    let ceiling = scene.field.ground_y - tuning.floor_clearance * scale;

    world.balls.iter().position(|ball| {
        let reach = tolerance + ball.radius * tuning.overhead_radius_factor;
        (ball.x - world.player.x).abs() < reach && ball.y < ceiling
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{ball_at, world_with};
    use crate::engine::tuning::Tuning;

    #[test]
    fn crowd_gating_thresholds() {
        let tuning = Tuning::default();
        let world = world_with(Vec::new());
        let scene = Scene::new(&world, &tuning);
        assert!(is_eligible(0, 6, &scene));
        assert!(!is_eligible(1, 7, &scene));
        assert!(is_eligible(2, 7, &scene));
        assert!(!is_eligible(2, 11, &scene));
        assert!(is_eligible(3, 11, &scene));
    }

    #[test]
    fn no_balls_no_target() {
        let tuning = Tuning::default();
        let world = world_with(Vec::new());
        let scene = Scene::new(&world, &tuning);
        assert!(find_best_target(&scene).is_none());
        assert!(ball_above_player(&scene).is_none());
    }

    #[test]
    fn overhead_ball_is_preferred() {
        let tuning = Tuning::default();
        let mut world = world_with(vec![
            ball_at(620.0, 150.0, 1.0, 0.0, 2),
            ball_at(400.0, 150.0, 0.0, 0.0, 2),
        ]);
        world.player.x = 400.0;
        let scene = Scene::new(&world, &tuning);
        let target = find_best_target(&scene).unwrap();
        assert_eq!(target.ball_index, 1);
        assert!((target.x - 400.0).abs() < tuning.shoot_tolerance);
        assert_eq!(ball_above_player(&scene), Some(1));
    }

    #[test]
    fn unreachable_points_are_skipped() {
        let tuning = Tuning::default();
        let mut world = world_with(vec![ball_at(780.0, 120.0, 0.0, 0.0, 3)]);
        world.player.x = 20.0;
        world.player.speed = 0.5;
        let scene = Scene::new(&world, &tuning);
        assert!(find_best_target(&scene).is_none());
    }

    #[test]
    fn points_near_the_floor_are_not_targets() {
        let tuning = Tuning::default();
        let mut world = world_with(vec![ball_at(400.0, 396.0, 0.0, 0.0, 3)]);
        world.player.x = 400.0;
        world.player.invincible = 200;
        let scene = Scene::new(&world, &tuning);
        if let Some(target) = find_best_target(&scene) {
            assert!(target.y <= scene.field.ground_y - tuning.floor_clearance);
            assert!(target.frame > 0);
        }
    }

    #[test]
    fn combo_rewards_quick_kills() {
        let tuning = Tuning::default();
        let mut world = world_with(vec![ball_at(400.0, 150.0, 0.0, 0.0, 3)]);
        world.player.x = 400.0;
        let calm = {
            let scene = Scene::new(&world, &tuning);
            find_best_target(&scene).unwrap().score
        };
        world.combo = 3;
        world.combo_timer = 80;
        let scene = Scene::new(&world, &tuning);
        let chasing = find_best_target(&scene).unwrap().score;
        assert!(chasing > calm + 45.0 - 1e-9);
    }
}
