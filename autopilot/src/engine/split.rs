//! Veto for shots whose split children would land on the player.

use mayhem_core::sim::{split_children, BallSnapshot};

use super::trajectory::simulate;
use super::Scene;

/// The pair of balls the host spawns when `ball` is popped. Terminal balls have none.
pub fn predicted_children(ball: &BallSnapshot, scene: &Scene<'_>) -> Option<[BallSnapshot; 2]> {
    if ball.is_terminal() {
        return None;
    }
    Some(split_children(ball, scene.field.scale, scene.field.width))
}

/// Whether popping `ball` now leaves the player clear of both children.
pub fn is_split_safe(ball: &BallSnapshot, scene: &Scene<'_>) -> bool {
    let Some(children) = predicted_children(ball, scene) else {
        return true;
    };
    let player = &scene.world.player;
    let horizon = scene.tuning.split_horizon;

    children.iter().all(|child| {
        let r = child.radius;
        let lateral = r + player.half_w + scene.tuning.split_lateral_margin;
        simulate(child, horizon, &scene.world.blocks, &scene.field)
            .iter()
            .all(|s| {
                let in_band = s.y + r >= player.top() && s.y - r <= player.bottom();
                !(in_band && (s.x - player.x).abs() < lateral)
            })
    })
}
