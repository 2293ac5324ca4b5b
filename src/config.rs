use std::env;
use std::path::PathBuf;

use glam::Vec3;
use tracing::warn;

pub const ASSET_DIR_VAR: &str = "HYPERCUBE_ASSET_DIR";
pub const MOVE_STEP_VAR: &str = "HYPERCUBE_MOVE_STEP";
pub const VERTICAL_STEP_VAR: &str = "HYPERCUBE_VERTICAL_STEP";
pub const VOLUME_VAR: &str = "HYPERCUBE_VOLUME";

/// Viewer settings. Defaults match the stock layout; env vars override.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub asset_dir: PathBuf,
    pub window_title: String,
    pub window_size: (u32, u32),
    pub movement_step: f32,
    pub vertical_step: f32,
    pub camera_home: Vec3,
    pub camera_target: Vec3,
    pub icon_size: u32,
    pub volume: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            window_title: "HyperCube".to_string(),
            window_size: (1280, 720),
            movement_step: 1.0,
            vertical_step: 1.0,
            camera_home: Vec3::new(0.0, -10.0, 0.0),
            camera_target: Vec3::ZERO,
            icon_size: 50,
            volume: 1.0,
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ASSET_DIR_VAR) {
            config.asset_dir = PathBuf::from(dir);
        }
        if let Some(step) = parse_positive(&lookup, MOVE_STEP_VAR) {
            config.movement_step = step;
        }
        if let Some(step) = parse_positive(&lookup, VERTICAL_STEP_VAR) {
            config.vertical_step = step;
        }
        if let Some(raw) = lookup(VOLUME_VAR) {
            match raw.trim().parse::<f32>() {
                Ok(v) if (0.0..=1.0).contains(&v) => config.volume = v,
                _ => warn!("ignoring {VOLUME_VAR}={raw:?}: expected a number in 0.0..=1.0"),
            }
        }

        config
    }
}

fn parse_positive<F>(lookup: &F, key: &str) -> Option<f32>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() && v > 0.0 => Some(v),
        _ => {
            warn!("ignoring {key}={raw:?}: expected a positive number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = ViewerConfig::from_lookup(|_| None);
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.camera_home, Vec3::new(0.0, -10.0, 0.0));
        assert_eq!(config.movement_step, 1.0);
        assert_eq!(config.vertical_step, 1.0);
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = ViewerConfig::from_lookup(lookup_from(&[
            (ASSET_DIR_VAR, "/opt/hypercube"),
            (MOVE_STEP_VAR, "2.5"),
            (VERTICAL_STEP_VAR, " 0.5 "),
            (VOLUME_VAR, "0.25"),
        ]));
        assert_eq!(config.asset_dir, PathBuf::from("/opt/hypercube"));
        assert_eq!(config.movement_step, 2.5);
        assert_eq!(config.vertical_step, 0.5);
        assert_eq!(config.volume, 0.25);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = ViewerConfig::from_lookup(lookup_from(&[
            (MOVE_STEP_VAR, "fast"),
            (VERTICAL_STEP_VAR, "-1"),
            (VOLUME_VAR, "3"),
        ]));
        assert_eq!(config.movement_step, 1.0);
        assert_eq!(config.vertical_step, 1.0);
        assert_eq!(config.volume, 1.0);
    }
}
