use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mayhem_autopilot::benchmark::{resolve_profiles, run_benchmark, BenchmarkConfig, Objective};
use mayhem_autopilot::profiles::{create_profile, describe_profiles, profile_manifest_entries};
use mayhem_autopilot::runner::{run_autopilot, write_tape};
use mayhem_autopilot::util::{log_filter, parse_seed, resolve_seeds, seed_to_hex};
use mayhem_autopilot::{think, Branch};
use mayhem_core::tape::{parse_tape, MAX_COMMANDS_DEFAULT};
use mayhem_core::{verify_tape, WorldSnapshot};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "mayhem-autopilot")]
#[command(about = "Autopilot for the ball-popping arcade game: single runs, tapes and benchmarks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List built-in tuning profiles
    ListProfiles,
    /// Export every built-in profile with its fingerprint
    ProfileManifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Play one seed and write the command tape
    Run {
        #[arg(long, default_value = "balanced")]
        profile: String,
        #[arg(long)]
        seed: String,
        #[arg(long, default_value_t = 36_000)]
        max_frames: u32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a tape and check its claimed score
    VerifyTape {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = MAX_COMMANDS_DEFAULT)]
        max_frames: u32,
    },
    /// Run every profile over a set of seeds in parallel
    Benchmark {
        #[arg(long)]
        profiles: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long, default_value_t = 36_000)]
        max_frames: u32,
        #[arg(long, value_enum, default_value_t = CliObjective::Hybrid)]
        objective: CliObjective,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        save_top: usize,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Decide a single tick for a world snapshot stored as JSON
    Decide {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "balanced")]
        profile: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliObjective {
    Score,
    Survival,
    Hybrid,
}

impl From<CliObjective> for Objective {
    fn from(value: CliObjective) -> Self {
        match value {
            CliObjective::Score => Objective::Score,
            CliObjective::Survival => Objective::Survival,
            CliObjective::Hybrid => Objective::Hybrid,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    match Cli::parse().command {
        Commands::ListProfiles => {
            for (id, description) in describe_profiles() {
                println!("{id:14} {description}");
            }
        }
        Commands::ProfileManifest { output } => {
            let manifest = profile_manifest_entries()?;
            let encoded = serde_json::to_vec_pretty(&manifest)?;
            if let Some(path) = output {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, encoded)?;
                println!("wrote={}", path.display());
                println!("profiles={}", manifest.len());
            } else {
                println!("{}", String::from_utf8_lossy(&encoded));
            }
        }
        Commands::Run {
            profile,
            seed,
            max_frames,
            output,
        } => {
            let seed = parse_seed(&seed)?;
            let artifact = run_autopilot(&profile, seed, max_frames)?;
            let m = &artifact.metrics;
            let output_path = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "tapes/{}-{}-score{}-level{}.tape",
                    m.profile_id.replace(['/', ':', '\\'], "-"),
                    seed_to_hex(seed).replace("0x", "seed"),
                    m.final_score,
                    m.final_level
                ))
            });
            write_tape(&output_path, &artifact.tape)?;

            println!("profile={}", m.profile_id);
            println!("profile_fingerprint={}", m.profile_fingerprint);
            println!("seed={}", seed_to_hex(seed));
            println!("frames={}", m.frame_count);
            println!("score={}", m.final_score);
            println!("level={}", m.final_level);
            println!("lives={}", m.final_lives);
            println!("outcome={}", outcome(m.won, m.game_over));
            println!("max_combo={}", m.max_combo);
            println!("faults={}", m.faults);
            for branch in Branch::ALL {
                println!("branch.{}={}", branch.as_str(), m.branch_frames.get(branch));
            }
            println!("rng={:#010x}", m.final_rng_state);
            println!("output={}", output_path.display());
        }
        Commands::VerifyTape { input, max_frames } => {
            let bytes =
                fs::read(&input).with_context(|| format!("failed reading {}", input.display()))?;
            let tape = parse_tape(&bytes, max_frames)?;
            let journal = verify_tape(&bytes, max_frames)?;
            println!("input={}", input.display());
            println!("seed={}", seed_to_hex(tape.header.seed));
            println!("command_count={}", tape.header.command_count);
            println!("final_score={}", journal.final_score);
            println!("final_level={}", journal.final_level);
            println!("final_rng_state={:#010x}", journal.final_rng_state);
            println!("checksum={:#010x}", journal.tape_checksum);
        }
        Commands::Benchmark {
            profiles,
            seeds,
            seed_file,
            seed_start,
            seed_count,
            max_frames,
            objective,
            out_dir,
            save_top,
            jobs,
        } => {
            let profiles = resolve_profiles(profiles.as_deref())?;
            for profile in &profiles {
                create_profile(profile)?;
            }
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let objective: Objective = objective.into();
            let out_dir = out_dir.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "benchmarks/{}-{}",
                    objective.as_str(),
                    timestamp_suffix()
                ))
            });

            let report = run_benchmark(BenchmarkConfig {
                profiles,
                seeds,
                max_frames,
                objective,
                out_dir: out_dir.clone(),
                save_top,
                jobs,
            })?;

            println!("objective={}", objective.as_str());
            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("top profiles:");
            for (idx, row) in report.profile_rankings.iter().enumerate() {
                println!(
                    "  {}. {} objective={:.2} avg_score={:.1} avg_level={:.2} win_rate={:.2}",
                    idx + 1,
                    row.profile_id,
                    row.objective_value,
                    row.avg_score,
                    row.avg_level,
                    row.win_rate
                );
            }
        }
        Commands::Decide { input, profile } => {
            let tuning = create_profile(&profile)?;
            let data =
                fs::read(&input).with_context(|| format!("failed reading {}", input.display()))?;
            let world: WorldSnapshot = serde_json::from_slice(&data)
                .with_context(|| format!("invalid world snapshot {}", input.display()))?;
            let decision = think(&world, &tuning)?;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
    }

    Ok(())
}

fn outcome(won: bool, game_over: bool) -> &'static str {
    match (won, game_over) {
        (true, _) => "win",
        (false, true) => "game_over",
        (false, false) => "frame_cap",
    }
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{now}")
}
