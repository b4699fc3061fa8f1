//! Discretized search for the safest reachable standing position.

use super::Scene;

/// Best x to move toward; returns the current x when no candidate beats the baseline.
pub fn find_safest_position(scene: &Scene<'_>, urgent: bool) -> f64 {
    let world = scene.world;
    let tuning = scene.tuning;
    let player = &world.player;
    let current_x = player.x;
    let (top, bottom) = (player.top(), player.bottom());
    let half_w = player.half_w;
    let center = world.width / 2.0;
    let distance_penalty = if urgent {
        tuning.urgent_distance_penalty
    } else {
        tuning.calm_distance_penalty
    };

    let mut best_x = current_x;
    let mut best_safety = f64::NEG_INFINITY;

    let start = half_w + tuning.dodge_edge_padding;
    let end = world.width - half_w - tuning.dodge_edge_padding;
    let mut x = start;
    while x < end {
        let candidate = x;
        x += tuning.dodge_step;

        let blocked = world
            .blocks
            .iter()
            .any(|block| block.overlaps(candidate - half_w, candidate + half_w, top, bottom));
        if blocked {
            continue;
        }

        let mut safety = 0.0;
        for zone in scene.danger.zones() {
            if zone.covers(candidate) {
                safety -= zone.severity * time_weight(zone.frame, scene);
            } else {
                let clearance = (zone.edge_distance(candidate) / tuning.clearance_scale)
                    .min(tuning.clearance_cap);
                safety += clearance * tuning.clearance_weight;
            }
        }
        safety -= (candidate - current_x).abs() * distance_penalty;
        safety -= (candidate - center).abs() * tuning.center_bias;

        if safety > best_safety {
            best_safety = safety;
            best_x = candidate;
        }
    }

    best_x
}

fn time_weight(frame: u32, scene: &Scene<'_>) -> f64 {
    let t = scene.tuning;
    if frame <= t.near_frames {
        t.near_weight
    } else if frame <= t.mid_frames {
        t.mid_weight
    } else {
        t.far_weight
    }
}
