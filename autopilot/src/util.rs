use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use tracing_subscriber::filter::EnvFilter;

pub const DEFAULT_SEED_START: u32 = 0xA57E_0001;

pub fn parse_seed(seed: &str) -> Result<u32> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {s}")),
        None => s
            .parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {s}")),
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

fn parse_seed_tokens<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Vec<u32>> {
    tokens
        .map(str::trim)
        .filter(|token| !token.is_empty() && !token.starts_with('#'))
        .map(parse_seed)
        .collect()
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    let seeds = parse_seed_tokens(input.split(','))?;
    if seeds.is_empty() {
        return Err(anyhow!("no seeds parsed from --seeds"));
    }
    Ok(seeds)
}

/// One seed per line; blank lines and `#` comments are skipped.
pub fn parse_seed_file(path: &Path) -> Result<Vec<u32>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading seed file {}", path.display()))?;
    let seeds = parse_seed_tokens(data.lines())?;
    if seeds.is_empty() {
        return Err(anyhow!("seed file {} had no seeds", path.display()));
    }
    Ok(seeds)
}

/// `count` seeds from a 32-bit LCG starting at `start`.
pub fn seed_sequence(start: u32, count: u32) -> Vec<u32> {
    std::iter::successors(Some(start), |cur| {
        Some(cur.wrapping_mul(1_664_525).wrapping_add(1_013_904_223))
    })
    .take(count as usize)
    .collect()
}

/// A seed file wins over a CSV list, which wins over a generated sequence.
pub fn resolve_seeds(
    seeds: Option<&str>,
    seed_file: Option<&Path>,
    seed_start: Option<&str>,
    seed_count: u32,
) -> Result<Vec<u32>> {
    if let Some(path) = seed_file {
        return parse_seed_file(path);
    }
    if let Some(csv) = seeds {
        return parse_seed_csv(csv);
    }
    let start = seed_start.map(parse_seed).transpose()?.unwrap_or(DEFAULT_SEED_START);
    Ok(seed_sequence(start, seed_count))
}

/// Log filter for the CLI: `RUST_LOG` directives when set, `info` otherwise.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
