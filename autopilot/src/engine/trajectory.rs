//! Forward prediction of a single ball, frame for frame with the host's arcade motion.

use mayhem_core::constants::GRAVITY;
use mayhem_core::sim::{advance_ball, BallSnapshot, BlockSnapshot};
use mayhem_core::WorldSnapshot;

/// Field geometry and clock shared by every prediction in one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    pub width: f64,
    pub ground_y: f64,
    pub scale: f64,
    pub time_scale: f64,
}

impl Field {
    pub fn of(world: &WorldSnapshot) -> Self {
        Self {
            width: world.width,
            ground_y: world.ground_y(),
            scale: world.scale,
            time_scale: world.time_scale(),
        }
    }

    fn gravity(&self) -> f64 {
        GRAVITY * self.scale
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectorySample {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub frame: u32,
}

/// Predicts `frames` future samples (frames `1..=frames`) without touching the input ball.
pub fn simulate(
    ball: &BallSnapshot,
    frames: u32,
    blocks: &[BlockSnapshot],
    field: &Field,
) -> Vec<TrajectorySample> {
    let mut state = *ball;
    let mut samples = Vec::with_capacity(frames as usize);
    for frame in 1..=frames {
        step(&mut state, blocks, field);
        samples.push(TrajectorySample {
            x: state.x,
            y: state.y,
            vx: state.vx,
            vy: state.vy,
            frame,
        });
    }
    samples
}

fn step(ball: &mut BallSnapshot, blocks: &[BlockSnapshot], field: &Field) {
    advance_ball(
        ball,
        blocks,
        field.width,
        field.ground_y,
        field.gravity(),
        field.time_scale,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Field {
        Field {
            width: 800.0,
            ground_y: 410.0,
            scale: 1.0,
            time_scale: 1.0,
        }
    }

    fn ball(x: f64, y: f64, vx: f64, vy: f64, tier: u8) -> BallSnapshot {
        let radius = [45.0, 32.0, 22.0, 14.0][tier as usize];
        let bounce_vy = [-9.5, -9.0, -8.5, -8.0][tier as usize];
        BallSnapshot {
            x,
            y,
            vx,
            vy,
            radius,
            tier,
            bounce_vy,
        }
    }

    #[test]
    fn identical_inputs_give_identical_paths() {
        let blocks = [BlockSnapshot {
            x: 300.0,
            y: 250.0,
            w: 120.0,
            h: 16.0,
        }];
        let b = ball(280.0, 120.0, 2.5, -1.0, 1);
        let first = simulate(&b, 100, &blocks, &field());
        let second = simulate(&b, 100, &blocks, &field());
        assert_eq!(first, second);
        assert_eq!(first.len(), 100);
        assert_eq!(first[0].frame, 1);
        assert_eq!(first[99].frame, 100);
    }

    #[test]
    fn samples_stay_inside_the_field() {
        let f = field();
        let blocks = [
            BlockSnapshot {
                x: 0.0,
                y: 200.0,
                w: 180.0,
                h: 20.0,
            },
            BlockSnapshot {
                x: 560.0,
                y: 300.0,
                w: 240.0,
                h: 20.0,
            },
            BlockSnapshot {
                x: 380.0,
                y: 370.0,
                w: 40.0,
                h: 40.0,
            },
        ];
        for tier in 0..=3u8 {
            for (x, vx) in [(50.0f64, -6.0f64), (400.0, 3.0), (760.0, 9.0), (200.0, 0.0)] {
                let b = ball(x.max(45.0), 60.0, vx, -4.0, tier);
                for sample in simulate(&b, 400, &blocks, &f) {
                    assert!(sample.x >= b.radius && sample.x <= f.width - b.radius);
                    assert!(sample.y >= b.radius && sample.y <= f.ground_y - b.radius);
                }
            }
        }
    }

    #[test]
    fn floor_contact_uses_authored_bounce() {
        let b = ball(400.0, 410.0 - 14.0 - 1.0, 0.0, 6.0, 3);
        let samples = simulate(&b, 1, &[], &field());
        assert_eq!(samples[0].vy, -8.0);
        assert_eq!(samples[0].y, 410.0 - 14.0);
    }

    #[test]
    fn walls_reflect_horizontal_velocity() {
        let b = ball(784.0, 100.0, 5.0, 0.0, 3);
        let samples = simulate(&b, 1, &[], &field());
        assert!(samples[0].vx < 0.0);
        assert_eq!(samples[0].x, 800.0 - 14.0);
    }

    #[test]
    fn slow_motion_halves_progress() {
        let b = ball(400.0, 100.0, 4.0, 0.0, 2);
        let normal = simulate(&b, 1, &[], &field());
        let slow = simulate(
            &b,
            1,
            &[],
            &Field {
                time_scale: 0.5,
                ..field()
            },
        );
        assert!((normal[0].x - 404.0).abs() < 1e-9);
        assert!((slow[0].x - 402.0).abs() < 1e-9);
    }

    #[test]
    fn centre_inside_block_is_pushed_out() {
        let block = BlockSnapshot {
            x: 380.0,
            y: 200.0,
            w: 40.0,
            h: 40.0,
        };
        let b = ball(400.0, 220.0, 0.0, -0.28, 3);
        let samples = simulate(&b, 1, &[block], &field());
        assert!(samples[0].x.is_finite() && samples[0].y.is_finite());
    }

    #[test]
    fn landing_on_a_block_top_bounces() {
        let block = BlockSnapshot {
            x: 300.0,
            y: 300.0,
            w: 200.0,
            h: 20.0,
        };
        let b = ball(400.0, 300.0 - 14.0 - 1.0, 0.0, 5.0, 3);
        let samples = simulate(&b, 1, &[block], &field());
        assert_eq!(samples[0].vy, -8.0);
        assert!(samples[0].y <= 300.0 - 14.0 + 1e-9);
    }
}
