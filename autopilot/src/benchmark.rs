use crate::profiles::profile_ids;
use crate::runner::{run_autopilot, RunMetrics};
use crate::util::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Score,
    Survival,
    Hybrid,
}

impl Objective {
    pub fn run_value(self, metrics: &RunMetrics) -> f64 {
        let lives = metrics.final_lives.max(0) as f64;
        let level = metrics.final_level as f64;
        let win = if metrics.won { 1.0 } else { 0.0 };
        match self {
            Self::Score => {
                metrics.final_score as f64 + level * 250.0 + lives * 120.0 + win * 2_000.0
            }
            Self::Survival => {
                metrics.play_frames as f64 + lives * 850.0 + level * 600.0 + win * 5_000.0
                    - metrics.faults as f64 * 100.0
            }
            Self::Hybrid => {
                metrics.final_score as f64 * 0.75
                    + metrics.play_frames as f64 * 0.4
                    + level * 400.0
                    + lives * 260.0
                    + win * 3_000.0
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::Survival => "survival",
            Self::Hybrid => "hybrid",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub profiles: Vec<String>,
    pub seeds: Vec<u32>,
    pub max_frames: u32,
    pub objective: Objective,
    pub out_dir: PathBuf,
    pub save_top: usize,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub profile_id: String,
    pub profile_fingerprint: String,
    pub seed: u32,
    pub seed_hex: String,
    pub frame_count: u32,
    pub final_score: u32,
    pub final_lives: i32,
    pub final_level: u32,
    pub game_over: bool,
    pub won: bool,
    pub max_combo: u32,
    pub objective_value: f64,
    pub move_frames: u32,
    pub fire_frames: u32,
    pub dodge_frames: u32,
    pub faults: u32,
}

impl RunRecord {
    fn from_run(run: &InternalRun) -> Self {
        let m = &run.metrics;
        Self {
            profile_id: m.profile_id.clone(),
            profile_fingerprint: m.profile_fingerprint.clone(),
            seed: m.seed,
            seed_hex: seed_to_hex(m.seed),
            frame_count: m.frame_count,
            final_score: m.final_score,
            final_lives: m.final_lives,
            final_level: m.final_level,
            game_over: m.game_over,
            won: m.won,
            max_combo: m.max_combo,
            objective_value: run.objective_value,
            move_frames: m.move_frames,
            fire_frames: m.fire_frames,
            dodge_frames: m.branch_frames.emergency_dodge,
            faults: m.faults,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileAggregate {
    pub profile_id: String,
    pub profile_fingerprint: String,
    pub runs: usize,
    pub avg_score: f64,
    pub max_score: u32,
    pub avg_level: f64,
    pub max_level: u32,
    pub avg_frames: f64,
    pub avg_lives: f64,
    pub min_lives: i32,
    pub win_rate: f64,
    pub objective_value: f64,
    pub avg_max_combo: f64,
    pub avg_fire_frames: f64,
    pub avg_dodge_frames: f64,
    pub total_faults: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedTapeRecord {
    pub rank: usize,
    pub metric: String,
    pub profile_id: String,
    pub profile_fingerprint: String,
    pub seed: u32,
    pub seed_hex: String,
    pub score: u32,
    pub level: u32,
    pub frames: u32,
    pub path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub objective: Objective,
    pub max_frames: u32,
    pub jobs: Option<usize>,
    pub profiles: Vec<String>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub profile_rankings: Vec<ProfileAggregate>,
    pub runs: Vec<RunRecord>,
    pub saved_tapes: Vec<SavedTapeRecord>,
}

#[derive(Clone, Debug)]
struct InternalRun {
    metrics: RunMetrics,
    objective_value: f64,
    tape: Vec<u8>,
}

pub fn resolve_profiles(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(profile_ids()),
        Some(raw) => {
            let profiles: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect();
            if profiles.is_empty() {
                return Err(anyhow!("--profiles resolved to empty list"));
            }
            Ok(profiles)
        }
    }
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.profiles.is_empty() {
        return Err(anyhow!("benchmark requires at least one profile"));
    }
    if config.jobs == Some(0) {
        return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_jobs: Vec<(String, u32)> = config
        .profiles
        .iter()
        .flat_map(|profile| config.seeds.iter().map(move |seed| (profile.clone(), *seed)))
        .collect();
    info!(
        runs = run_jobs.len(),
        objective = config.objective.as_str(),
        "benchmark starting"
    );

    let run_one = |(profile, seed): &(String, u32)| -> Result<InternalRun> {
        let artifact = run_autopilot(profile, *seed, config.max_frames).with_context(|| {
            format!("benchmark run failed for profile={profile} seed={seed:#x}")
        })?;
        let objective_value = config.objective.run_value(&artifact.metrics);
        Ok(InternalRun {
            metrics: artifact.metrics,
            objective_value,
            tape: artifact.tape,
        })
    };

    let run_results: Vec<Result<InternalRun>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };
    let runs = run_results.into_iter().collect::<Result<Vec<_>>>()?;

    let mut rankings = rank_profiles(&runs);
    rankings.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.avg_score.total_cmp(&a.avg_score))
            .then_with(|| a.profile_id.cmp(&b.profile_id))
    });

    let mut run_records: Vec<RunRecord> = runs.iter().map(RunRecord::from_run).collect();
    run_records.sort_by(|a, b| {
        b.objective_value
            .total_cmp(&a.objective_value)
            .then_with(|| b.final_score.cmp(&a.final_score))
            .then_with(|| a.seed.cmp(&b.seed))
    });

    let mut saved_tapes = Vec::new();
    if config.save_top > 0 {
        let metrics: [(&str, fn(&InternalRun) -> f64); 3] = [
            ("objective", |run| run.objective_value),
            ("score", |run| run.metrics.final_score as f64),
            ("level", |run| run.metrics.final_level as f64),
        ];
        for (name, metric) in metrics {
            save_top_tapes(
                &config.out_dir,
                &runs,
                name,
                config.save_top,
                metric,
                &mut saved_tapes,
            )?;
        }
    }

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        objective: config.objective,
        max_frames: config.max_frames,
        jobs: config.jobs,
        profiles: config.profiles,
        seeds: config.seeds,
        run_count: run_records.len(),
        profile_rankings: rankings,
        runs: run_records,
        saved_tapes,
    };

    let report_path = config.out_dir.join("summary.json");
    fs::write(
        &report_path,
        serde_json::to_vec_pretty(&report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", report_path.display()))?;

    Ok(report)
}

fn rank_profiles(runs: &[InternalRun]) -> Vec<ProfileAggregate> {
    let mut grouped: HashMap<&str, Vec<&InternalRun>> = HashMap::new();
    for run in runs {
        grouped
            .entry(run.metrics.profile_id.as_str())
            .or_default()
            .push(run);
    }

    grouped
        .into_iter()
        .map(|(profile_id, group)| {
            let n = group.len() as f64;
            let avg = |f: fn(&RunMetrics) -> f64| group.iter().map(|r| f(&r.metrics)).sum::<f64>() / n;
            ProfileAggregate {
                profile_id: profile_id.to_string(),
                profile_fingerprint: group
                    .first()
                    .map(|r| r.metrics.profile_fingerprint.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
                runs: group.len(),
                avg_score: avg(|m| m.final_score as f64),
                max_score: group.iter().map(|r| r.metrics.final_score).max().unwrap_or_default(),
                avg_level: avg(|m| m.final_level as f64),
                max_level: group.iter().map(|r| r.metrics.final_level).max().unwrap_or_default(),
                avg_frames: avg(|m| m.frame_count as f64),
                avg_lives: avg(|m| m.final_lives as f64),
                min_lives: group.iter().map(|r| r.metrics.final_lives).min().unwrap_or_default(),
                win_rate: group.iter().filter(|r| r.metrics.won).count() as f64 / n,
                objective_value: group.iter().map(|r| r.objective_value).sum::<f64>() / n,
                avg_max_combo: avg(|m| m.max_combo as f64),
                avg_fire_frames: avg(|m| m.fire_frames as f64),
                avg_dodge_frames: avg(|m| m.branch_frames.emergency_dodge as f64),
                total_faults: group.iter().map(|r| r.metrics.faults).sum(),
            }
        })
        .collect()
}

fn save_top_tapes(
    out_dir: &Path,
    runs: &[InternalRun],
    metric_name: &str,
    count: usize,
    metric: fn(&InternalRun) -> f64,
    saved_tapes: &mut Vec<SavedTapeRecord>,
) -> Result<()> {
    let mut order: Vec<&InternalRun> = runs.iter().collect();
    order.sort_by(|a, b| {
        metric(b)
            .total_cmp(&metric(a))
            .then_with(|| b.metrics.final_score.cmp(&a.metrics.final_score))
            .then_with(|| a.metrics.seed.cmp(&b.metrics.seed))
    });

    let save_dir = out_dir.join(format!("top-{metric_name}"));
    fs::create_dir_all(&save_dir)
        .with_context(|| format!("failed creating {}", save_dir.display()))?;

    for (idx, run) in order.into_iter().take(count).enumerate() {
        let rank = idx + 1;
        let m = &run.metrics;
        let safe_profile: String = m
            .profile_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let base = format!(
            "rank{rank:02}-{safe_profile}-seed{:08x}-score{}-level{}",
            m.seed, m.final_score, m.final_level
        );
        let tape_path = save_dir.join(format!("{base}.tape"));
        fs::write(&tape_path, &run.tape)
            .with_context(|| format!("failed writing {}", tape_path.display()))?;

        let meta = serde_json::json!({
            "rank": rank,
            "metric": metric_name,
            "objective_value": run.objective_value,
            "metrics": m,
        });
        let meta_path = save_dir.join(format!("{base}.json"));
        fs::write(
            &meta_path,
            serde_json::to_vec_pretty(&meta).context("failed to serialize top tape metadata")?,
        )
        .with_context(|| format!("failed writing {}", meta_path.display()))?;

        saved_tapes.push(SavedTapeRecord {
            rank,
            metric: metric_name.to_string(),
            profile_id: m.profile_id.clone(),
            profile_fingerprint: m.profile_fingerprint.clone(),
            seed: m.seed,
            seed_hex: seed_to_hex(m.seed),
            score: m.final_score,
            level: m.final_level,
            frames: m.frame_count,
            path: tape_path.to_string_lossy().into_owned(),
        });
    }

    Ok(())
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "profile_id,profile_fingerprint,seed_hex,seed,frame_count,final_score,final_lives,final_level,game_over,won,max_combo,objective_value,move_frames,fire_frames,dodge_frames,faults\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            row.profile_id,
            row.profile_fingerprint,
            row.seed_hex,
            row.seed,
            row.frame_count,
            row.final_score,
            row.final_lives,
            row.final_level,
            row.game_over,
            row.won,
            row.max_combo,
            row.objective_value,
            row.move_frames,
            row.fire_frames,
            row.dodge_frames,
            row.faults
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[ProfileAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,profile_id,profile_fingerprint,runs,avg_score,max_score,avg_level,max_level,avg_frames,avg_lives,min_lives,win_rate,objective_value,avg_max_combo,avg_fire_frames,avg_dodge_frames,total_faults\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{:.2},{},{:.2},{},{:.2},{:.2},{},{:.4},{:.4},{:.2},{:.2},{:.2},{}\n",
            idx + 1,
            row.profile_id,
            row.profile_fingerprint,
            row.runs,
            row.avg_score,
            row.max_score,
            row.avg_level,
            row.max_level,
            row.avg_frames,
            row.avg_lives,
            row.min_lives,
            row.win_rate,
            row.objective_value,
            row.avg_max_combo,
            row.avg_fire_frames,
            row.avg_dodge_frames,
            row.total_faults
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
