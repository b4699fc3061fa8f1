//! Named tuning presets.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::engine::tuning::Tuning;

const FILE_PREFIX: &str = "file:";

#[derive(Clone, Debug, Serialize)]
pub struct ProfileManifestEntry {
    pub id: String,
    pub description: String,
    pub config_hash: String,
    pub config: serde_json::Value,
}

fn builtin_profiles() -> Vec<Tuning> {
    let balanced = Tuning::default();

    let cautious = Tuning {
        id: "cautious".to_string(),
        description: "Dodges earlier, keeps wider margins and skips risky combo shots.".to_string(),
        safety_margin: 14.0,
        danger_threshold: 0.22,
        danger_weight: 45.0,
        normal_danger_factor: 1.5,
        combo_danger_factor: 2.5,
        combo_streak: 6,
        crowded_ball_count: 6,
        bonus_danger_weight: 60.0,
        ..Tuning::default()
    };

    let combo_chaser = Tuning {
        id: "combo-chaser".to_string(),
        description: "Leans into streaks: bigger combo rewards and looser path limits.".to_string(),
        combo_bonus_per_hit: 20.0,
        combo_bonus_cap: 90.0,
        combo_speed_weight: 0.8,
        combo_danger_factor: 5.0,
        combo_streak: 2,
        aggressive_grace_frames: 12,
        ..Tuning::default()
    };

    vec![balanced, cautious, combo_chaser]
}

pub fn profile_ids() -> Vec<String> {
    builtin_profiles().into_iter().map(|t| t.id).collect()
}

pub fn describe_profiles() -> Vec<(String, String)> {
    builtin_profiles()
        .into_iter()
        .map(|t| (t.id, t.description))
        .collect()
}

/// Resolves a built-in id or a `file:<path>` JSON profile.
pub fn create_profile(id: &str) -> Result<Tuning> {
    if let Some(path) = id.strip_prefix(FILE_PREFIX) {
        let mut tuning = Tuning::from_file(Path::new(path))?;
        if tuning.id.is_empty() || tuning.id == Tuning::default().id {
            tuning.id = id.to_string();
        }
        return Ok(tuning);
    }
    let tuning = builtin_profiles()
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| anyhow!("unknown profile '{id}' (expected one of: {})", profile_ids().join(", ")))?;
    tuning
        .validate()
        .with_context(|| format!("built-in profile '{id}' is invalid"))?;
    Ok(tuning)
}

pub fn profile_manifest_entries() -> Result<Vec<ProfileManifestEntry>> {
    builtin_profiles()
        .into_iter()
        .map(|tuning| {
            let config = serde_json::to_value(&tuning)
                .with_context(|| format!("failed serializing profile {}", tuning.id))?;
            Ok(ProfileManifestEntry {
                config_hash: tuning.fingerprint(),
                id: tuning.id,
                description: tuning.description,
                config,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    #[test]
    fn builtin_ids_resolve_and_are_unique() -> Result<()> {
        let ids = profile_ids();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
        for id in &ids {
            assert_eq!(&create_profile(id)?.id, id);
        }
        assert_eq!(create_profile("balanced")?, Tuning::default());
        Ok(())
    }

    #[test]
    fn fingerprints_differ_between_profiles() -> Result<()> {
        let hashes: HashSet<String> = profile_manifest_entries()?
            .into_iter()
            .map(|entry| entry.config_hash)
            .collect();
        assert_eq!(hashes.len(), 3);
        Ok(())
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let err = create_profile("yolo").unwrap_err();
        assert!(err.to_string().contains("unknown profile"));
    }

    #[test]
    fn file_profile_takes_its_path_as_id() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("wide.json");
        fs::write(&path, r#"{ "safety_margin": 20.0 }"#)?;
        let profile_ref = format!("file:{}", path.display());
        let tuning = create_profile(&profile_ref)?;
        assert_eq!(tuning.id, profile_ref);
        assert_eq!(tuning.safety_margin, 20.0);
        Ok(())
    }

    #[test]
    fn file_profile_with_zero_dodge_step_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("stuck.json");
        fs::write(&path, r#"{ "dodge_step": 0.0 }"#)?;
        let err = create_profile(&format!("file:{}", path.display())).unwrap_err();
        assert!(format!("{err:#}").contains("dodge_step"), "{err:#}");
        Ok(())
    }
}
