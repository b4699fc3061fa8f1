//! Time-stamped threat intervals along the horizontal axis.

use mayhem_core::constants::TERMINAL_BALL_TIER;
use mayhem_core::sim::PlayerSnapshot;
use mayhem_core::WorldSnapshot;

use super::trajectory::{simulate, Field};
use super::tuning::Tuning;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DangerZone {
    pub x_min: f64,
    pub x_max: f64,
    pub severity: f64,
    pub frame: u32,
}

impl DangerZone {
    pub fn covers(&self, x: f64) -> bool {
        x >= self.x_min && x <= self.x_max
    }

    /// Horizontal distance from `x` to the nearer edge of the zone.
    pub fn edge_distance(&self, x: f64) -> f64 {
        (x - self.x_min).abs().min((x - self.x_max).abs())
    }
}

/// Severity decays with time to arrival and grows with ball size.
pub fn zone_severity(frame: u32, tier: u8) -> f64 {
    let time_factor = 1.0 / (frame as f64 + 1.0);
    let size_factor = 1.0 + TERMINAL_BALL_TIER.saturating_sub(tier) as f64 * 0.3;
    time_factor * size_factor
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DangerField {
    zones: Vec<DangerZone>,
}

impl DangerField {
    pub fn build(world: &WorldSnapshot, field: &Field, tuning: &Tuning) -> Self {
        let player = &world.player;
        let band_top = player.top() - tuning.safety_margin;
        let band_bottom = player.bottom();
        let reach = player.half_w + tuning.safety_margin;

        let mut zones = Vec::new();
        for ball in &world.balls {
            let r = ball.radius;
            let future = simulate(ball, tuning.danger_lookahead, &world.blocks, field);
            let current = std::iter::once((ball.x, ball.y, 0));
            let path = current.chain(future.iter().map(|s| (s.x, s.y, s.frame)));
            for (x, y, frame) in path {
                if y + r < band_top || y - r > band_bottom {
                    continue;
                }
                zones.push(DangerZone {
                    x_min: x - r - reach,
                    x_max: x + r + reach,
                    severity: zone_severity(frame, ball.tier),
                    frame,
                });
            }
        }
        Self { zones }
    }

    pub fn from_zones(zones: Vec<DangerZone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[DangerZone] {
        &self.zones
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Summed severity of every zone covering `x` no later than `max_frame`.
    pub fn danger_at(&self, x: f64, max_frame: u32) -> f64 {
        self.zones
            .iter()
            .filter(|z| z.frame <= max_frame && z.covers(x))
            .map(|z| z.severity)
            .sum()
    }
}

/// Zero-lookahead check: does any ball touch the player's box grown by `margin` right now.
pub fn in_immediate_danger(world: &WorldSnapshot, margin: f64) -> bool {
    let p: &PlayerSnapshot = &world.player;
    world.balls.iter().any(|ball| {
        let cx = ball.x.clamp(p.x - p.half_w, p.x + p.half_w);
        let cy = ball.y.clamp(p.top(), p.bottom());
        let dx = ball.x - cx;
        let dy = ball.y - cy;
        let hit = ball.radius + margin;
        dx * dx + dy * dy < hit * hit
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{ball_at, world_with};

    #[test]
    fn severity_decays_with_frame() {
        for tier in 0..=3u8 {
            let mut previous = f64::INFINITY;
            for frame in 0..60 {
                let severity = zone_severity(frame, tier);
                assert!(severity >= 0.0);
                assert!(severity <= previous);
                previous = severity;
            }
        }
        assert!(zone_severity(4, 0) > zone_severity(4, 3));
        assert_eq!(zone_severity(0, 3), 1.0);
    }

    #[test]
    fn danger_sums_overlapping_zones_under_cutoff() {
        let field = DangerField::from_zones(vec![
            DangerZone {
                x_min: 0.0,
                x_max: 100.0,
                severity: 0.5,
                frame: 2,
            },
            DangerZone {
                x_min: 50.0,
                x_max: 150.0,
                severity: 0.25,
                frame: 4,
            },
            DangerZone {
                x_min: 50.0,
                x_max: 150.0,
                severity: 1.0,
                frame: 30,
            },
        ]);
        assert_eq!(field.danger_at(75.0, 12), 0.75);
        assert_eq!(field.danger_at(75.0, 3), 0.5);
        assert_eq!(field.danger_at(125.0, u32::MAX), 1.25);
        assert_eq!(field.danger_at(400.0, u32::MAX), 0.0);
    }

    #[test]
    fn falling_ball_marks_the_player_column() {
        let tuning = Tuning::default();
        let mut world = world_with(vec![ball_at(400.0, 300.0, 0.0, 2.0, 0)]);
        world.player.x = 400.0;
        let field = Field::of(&world);
        let danger = DangerField::build(&world, &field, &tuning);

        assert!(!danger.is_empty());
        assert!(danger.zones().iter().all(|z| z.severity >= 0.0));
        assert!(danger.danger_at(400.0, 12) > tuning.danger_threshold);
        assert_eq!(danger.danger_at(40.0, u32::MAX), 0.0);
    }

    #[test]
    fn high_ball_out_of_band_is_ignored() {
        let tuning = Tuning::default();
        let world = world_with(vec![ball_at(400.0, 60.0, 0.0, -6.0, 3)]);
        let danger = DangerField::build(&world, &Field::of(&world), &tuning);
        assert!(danger.zones().iter().all(|z| z.frame > 0));
    }

    #[test]
    fn immediate_danger_uses_margin() {
        let mut world = world_with(vec![ball_at(400.0, 380.0, 0.0, 0.0, 3)]);
        world.player.x = 400.0 + 15.0 + 14.0 + 5.0;
        assert!(in_immediate_danger(&world, 10.0));
        assert!(!in_immediate_danger(&world, 0.0));
    }
}
