//! Fixed tuning constants for the decision engine.
//!
//! A `Tuning` is chosen before a run starts and never changes while the run
//! is in progress.

use anyhow::{bail, Context, Result};
use mayhem_core::tape::crc32;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Longest prediction horizon a profile may ask for.
pub const MAX_HORIZON_FRAMES: u32 = 600;
/// Finest x resolution of the safe position scan, in pixels.
pub const MIN_DODGE_STEP: f64 = 1.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub id: String,
    pub description: String,

    // Prediction horizons (frames).
    pub predict_frames: u32,
    pub danger_lookahead: u32,
    pub split_horizon: u32,
    pub split_lateral_margin: f64,

    // Danger field.
    pub safety_margin: f64,
    pub danger_threshold: f64,
    pub threshold_level_step: f64,
    pub threshold_level_cap: u32,
    pub critical_lives: i32,
    pub critical_lives_factor: f64,
    pub immediate_cutoff: u32,
    pub path_cutoff: u32,

    // Safe position search.
    pub dodge_step: f64,
    pub dodge_edge_padding: f64,
    pub near_weight: f64,
    pub mid_weight: f64,
    pub far_weight: f64,
    pub near_frames: u32,
    pub mid_frames: u32,
    pub clearance_scale: f64,
    pub clearance_cap: f64,
    pub clearance_weight: f64,
    pub urgent_distance_penalty: f64,
    pub calm_distance_penalty: f64,
    pub center_bias: f64,

    // Target selection.
    pub crowded_ball_count: usize,
    pub swarm_ball_count: usize,
    pub shoot_tolerance: f64,
    pub aggressive_tolerance_factor: f64,
    pub floor_clearance: f64,
    pub ceiling_clearance: f64,
    pub late_shot_slack: f64,
    pub reach_slack: f64,
    pub base_score: f64,
    pub danger_weight: f64,
    pub danger_weight_per_level: f64,
    pub target_danger_cutoff: u32,
    pub arrival_penalty: f64,
    pub tier_bonus: f64,
    pub move_cost: f64,
    pub distance_cost: f64,
    pub overhead_bonus: f64,
    pub overhead_frames: u32,
    pub mid_height_bonus: f64,
    pub mid_band_low: f64,
    pub mid_band_high: f64,
    pub combo_bonus_per_hit: f64,
    pub combo_bonus_cap: f64,
    pub combo_window: f64,
    pub combo_speed_weight: f64,

    // Decision arbiter.
    pub aggressive_grace_frames: i32,
    pub normal_danger_factor: f64,
    pub combo_danger_factor: f64,
    pub combo_streak: u32,
    pub overhead_radius_factor: f64,
    pub move_dead_zone: f64,

    // Bonus items.
    pub bonus_enabled: bool,
    pub bonus_reach_band: f64,
    pub shield_value: f64,
    pub slow_time_value: f64,
    pub double_shot_value: f64,
    pub bonus_distance_cost: f64,
    pub bonus_danger_weight: f64,
    pub bonus_min_score: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            id: "balanced".to_string(),
            description: "Survival-first arbiter with split vetoes and combo chasing.".to_string(),

            predict_frames: 100,
            danger_lookahead: 35,
            split_horizon: 18,
            split_lateral_margin: 5.0,

            safety_margin: 10.0,
            danger_threshold: 0.3,
            threshold_level_step: 0.025,
            threshold_level_cap: 8,
            critical_lives: 1,
            critical_lives_factor: 0.75,
            immediate_cutoff: 12,
            path_cutoff: 20,

            dodge_step: 10.0,
            dodge_edge_padding: 5.0,
            near_weight: 40.0,
            mid_weight: 25.0,
            far_weight: 10.0,
            near_frames: 5,
            mid_frames: 12,
            clearance_scale: 80.0,
            clearance_cap: 1.5,
            clearance_weight: 0.3,
            urgent_distance_penalty: 0.02,
            calm_distance_penalty: 0.006,
            center_bias: 0.0005,

            crowded_ball_count: 7,
            swarm_ball_count: 11,
            shoot_tolerance: 24.0,
            aggressive_tolerance_factor: 1.5,
            floor_clearance: 40.0,
            ceiling_clearance: 10.0,
            late_shot_slack: 2.0,
            reach_slack: 1.05,
            base_score: 100.0,
            danger_weight: 35.0,
            danger_weight_per_level: 5.0,
            target_danger_cutoff: 15,
            arrival_penalty: 0.5,
            tier_bonus: 30.0,
            move_cost: 0.4,
            distance_cost: 0.05,
            overhead_bonus: 80.0,
            overhead_frames: 3,
            mid_height_bonus: 15.0,
            mid_band_low: 0.2,
            mid_band_high: 0.6,
            combo_bonus_per_hit: 15.0,
            combo_bonus_cap: 60.0,
            combo_window: 90.0,
            combo_speed_weight: 0.5,

            aggressive_grace_frames: 20,
            normal_danger_factor: 2.0,
            combo_danger_factor: 4.0,
            combo_streak: 3,
            overhead_radius_factor: 0.3,
            move_dead_zone: 2.0,

            bonus_enabled: true,
            bonus_reach_band: 120.0,
            shield_value: 120.0,
            slow_time_value: 80.0,
            double_shot_value: 50.0,
            bonus_distance_cost: 0.15,
            bonus_danger_weight: 40.0,
            bonus_min_score: 30.0,
        }
    }
}

impl Tuning {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("failed reading tuning profile {}", path.display()))?;
        let tuning: Self = serde_json::from_slice(&data)
            .with_context(|| format!("invalid tuning profile {}", path.display()))?;
        tuning
            .validate()
            .with_context(|| format!("rejected tuning profile {}", path.display()))?;
        Ok(tuning)
    }

    /// Rejects profiles a tick cannot finish with. Every number must be finite
    /// and non-negative, and the scan step and horizons must stay within their bounds.
    pub fn validate(&self) -> Result<()> {
        if !self.dodge_step.is_finite() || self.dodge_step < MIN_DODGE_STEP {
            bail!(
                "dodge_step must be a finite value >= {MIN_DODGE_STEP}, got {}",
                self.dodge_step
            );
        }
        if !self.clearance_scale.is_finite() || self.clearance_scale <= 0.0 {
            bail!("clearance_scale must be > 0, got {}", self.clearance_scale);
        }
        if self.mid_band_low > self.mid_band_high {
            bail!(
                "mid_band_low ({}) must not exceed mid_band_high ({})",
                self.mid_band_low,
                self.mid_band_high
            );
        }

        let horizons = [
            ("predict_frames", self.predict_frames),
            ("danger_lookahead", self.danger_lookahead),
            ("split_horizon", self.split_horizon),
        ];
        for (name, frames) in horizons {
            if frames == 0 || frames > MAX_HORIZON_FRAMES {
                bail!("{name} must be in 1..={MAX_HORIZON_FRAMES}, got {frames}");
            }
        }

        let values = [
            ("split_lateral_margin", self.split_lateral_margin),
            ("safety_margin", self.safety_margin),
            ("danger_threshold", self.danger_threshold),
            ("threshold_level_step", self.threshold_level_step),
            ("critical_lives_factor", self.critical_lives_factor),
            ("dodge_edge_padding", self.dodge_edge_padding),
            ("near_weight", self.near_weight),
            ("mid_weight", self.mid_weight),
            ("far_weight", self.far_weight),
            ("clearance_cap", self.clearance_cap),
            ("clearance_weight", self.clearance_weight),
            ("urgent_distance_penalty", self.urgent_distance_penalty),
            ("calm_distance_penalty", self.calm_distance_penalty),
            ("center_bias", self.center_bias),
            ("shoot_tolerance", self.shoot_tolerance),
            ("aggressive_tolerance_factor", self.aggressive_tolerance_factor),
            ("floor_clearance", self.floor_clearance),
            ("ceiling_clearance", self.ceiling_clearance),
            ("late_shot_slack", self.late_shot_slack),
            ("reach_slack", self.reach_slack),
            ("base_score", self.base_score),
            ("danger_weight", self.danger_weight),
            ("danger_weight_per_level", self.danger_weight_per_level),
            ("arrival_penalty", self.arrival_penalty),
            ("tier_bonus", self.tier_bonus),
            ("move_cost", self.move_cost),
            ("distance_cost", self.distance_cost),
            ("overhead_bonus", self.overhead_bonus),
            ("mid_height_bonus", self.mid_height_bonus),
            ("mid_band_low", self.mid_band_low),
            ("mid_band_high", self.mid_band_high),
            ("combo_bonus_per_hit", self.combo_bonus_per_hit),
            ("combo_bonus_cap", self.combo_bonus_cap),
            ("combo_window", self.combo_window),
            ("combo_speed_weight", self.combo_speed_weight),
            ("normal_danger_factor", self.normal_danger_factor),
            ("combo_danger_factor", self.combo_danger_factor),
            ("overhead_radius_factor", self.overhead_radius_factor),
            ("move_dead_zone", self.move_dead_zone),
            ("bonus_reach_band", self.bonus_reach_band),
            ("shield_value", self.shield_value),
            ("slow_time_value", self.slow_time_value),
            ("double_shot_value", self.double_shot_value),
            ("bonus_distance_cost", self.bonus_distance_cost),
            ("bonus_danger_weight", self.bonus_danger_weight),
            ("bonus_min_score", self.bonus_min_score),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be finite and >= 0, got {value}");
            }
        }
        Ok(())
    }

    /// Stable content hash of the profile, independent of its id and description.
    pub fn fingerprint(&self) -> String {
        let mut body = self.clone();
        body.id.clear();
        body.description.clear();
        let encoded = serde_json::to_vec(&body).unwrap_or_default();
        format!("crc32:{:08x}:len:{}", crc32(&encoded), encoded.len())
    }

    /// Emergency-dodge threshold: tighter on later levels and on the last life.
    pub fn caution_threshold(&self, level: u32, lives: i32) -> f64 {
        let steps = level.saturating_sub(1).min(self.threshold_level_cap) as f64;
        let mut threshold = self.danger_threshold * (1.0 - self.threshold_level_step * steps);
        if lives <= self.critical_lives {
            threshold *= self.critical_lives_factor;
        }
        threshold
    }

    pub fn target_danger_weight(&self, level: u32) -> f64 {
        self.danger_weight + self.danger_weight_per_level * level.saturating_sub(1) as f64
    }
}
