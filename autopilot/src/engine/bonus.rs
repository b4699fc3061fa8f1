//! Detours for falling power-ups.

use mayhem_core::constants::ITEM_SIZE;
use mayhem_core::sim::BonusKind;

use super::tuning::Tuning;
use super::Scene;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BonusTarget {
    pub x: f64,
    pub y: f64,
    pub kind: BonusKind,
    pub item_index: usize,
    pub score: f64,
}

pub fn bonus_value(kind: BonusKind, tuning: &Tuning) -> f64 {
    match kind {
        BonusKind::Shield => tuning.shield_value,
        BonusKind::SlowTime => tuning.slow_time_value,
        BonusKind::DoubleShot => tuning.double_shot_value,
    }
}

/// Best item within reach of the ground, or `None` when nothing is worth the trip.
pub fn find_best_bonus(scene: &Scene<'_>) -> Option<BonusTarget> {
    let tuning = scene.tuning;
    if !tuning.bonus_enabled {
        return None;
    }
    let world = scene.world;
    let scale = scene.field.scale;
    let half = ITEM_SIZE * scale / 2.0;
    let reach_line = scene.field.ground_y - tuning.bonus_reach_band * scale;

    world
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.y + half >= reach_line)
        .map(|(index, item)| {
            let distance = (item.x - world.player.x).abs();
            let danger = scene.danger.danger_at(item.x, tuning.path_cutoff);
            let score = bonus_value(item.kind, tuning)
                - distance * tuning.bonus_distance_cost
                - danger * tuning.bonus_danger_weight;
            BonusTarget {
                x: item.x,
                y: item.y,
                kind: item.kind,
                item_index: index,
                score,
            }
        })
        .filter(|candidate| candidate.score >= tuning.bonus_min_score)
        .fold(None, |best: Option<BonusTarget>, candidate| match best {
            Some(b) if b.score >= candidate.score => Some(b),
            _ => Some(candidate),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{item_at, world_with};

    #[test]
    fn value_table_orders_protection_first() {
        let t = Tuning::default();
        assert!(bonus_value(BonusKind::Shield, &t) > bonus_value(BonusKind::SlowTime, &t));
        assert!(bonus_value(BonusKind::SlowTime, &t) > bonus_value(BonusKind::DoubleShot, &t));
    }

    #[test]
    fn nearby_shield_beats_distant_slow_time() {
        let tuning = Tuning::default();
        let mut world = world_with(Vec::new());
        world.player.x = 400.0;
        world.items = vec![
            item_at(700.0, 390.0, BonusKind::SlowTime),
            item_at(450.0, 390.0, BonusKind::Shield),
        ];
        let scene = Scene::new(&world, &tuning);
        let best = find_best_bonus(&scene).unwrap();
        assert_eq!(best.kind, BonusKind::Shield);
        assert_eq!(best.item_index, 1);
    }

    #[test]
    fn marginal_or_high_items_are_ignored() {
        let tuning = Tuning::default();
        let mut world = world_with(Vec::new());
        world.player.x = 20.0;
        world.items = vec![
            item_at(780.0, 390.0, BonusKind::DoubleShot),
            item_at(30.0, 100.0, BonusKind::Shield),
        ];
        let scene = Scene::new(&world, &tuning);
        assert!(find_best_bonus(&scene).is_none());
    }

    #[test]
    fn disabled_profile_never_detours() {
        let tuning = Tuning {
            bonus_enabled: false,
            ..Tuning::default()
        };
        let mut world = world_with(Vec::new());
        world.items = vec![item_at(410.0, 390.0, BonusKind::Shield)];
        let scene = Scene::new(&world, &tuning);
        assert!(find_best_bonus(&scene).is_none());
    }
}
