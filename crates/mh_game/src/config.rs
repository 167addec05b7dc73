//! `assets/config/game.json`: every section is optional and falls back to
//! its defaults, so an empty object is a valid config.

use std::fs;
use std::path::Path;

use mh_core::time::StepMode;
use mh_platform::window::PlatformConfig;
use mh_sim::{EnvironmentConfig, MotionConfig, WindConfig};
use serde::Deserialize;

pub const CONFIG_PATH: &str = "assets/config/game.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub version: u32,
    pub window: WindowConfig,
    pub time: TimeConfig,
    pub motion: MotionConfig,
    pub environment: EnvironmentConfig,
    pub wind: WindConfig,
    pub avatar_model_path: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            version: 1,
            window: WindowConfig::default(),
            time: TimeConfig::default(),
            motion: MotionConfig::default(),
            environment: EnvironmentConfig::default(),
            wind: WindConfig::default(),
            avatar_model_path: default_avatar_model_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        let platform = PlatformConfig::default();
        Self {
            title: platform.title,
            width: platform.width,
            height: platform.height,
        }
    }
}

impl WindowConfig {
    pub fn to_platform(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.title.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TimeConfig {
    #[serde(default)]
    pub step_mode: StepMode,
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f64,
    /// Longest frame fed to the clock; longer stalls are dropped.
    #[serde(default = "default_max_frame_time")]
    pub max_frame_time: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            step_mode: StepMode::Fixed,
            fixed_dt: default_fixed_dt(),
            max_frame_time: default_max_frame_time(),
        }
    }
}

const fn default_fixed_dt() -> f64 {
    1.0 / 60.0
}

const fn default_max_frame_time() -> f64 {
    0.25
}

fn default_avatar_model_path() -> String {
    "assets/models/hand.glb".to_string()
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Startup load. Never fails: a missing file and an invalid file both yield
/// the defaults, at different log levels.
pub fn load_or_default(path: &Path) -> GameConfig {
    if !path.exists() {
        log::warn!(
            "Config '{}' not found. Using defaults.",
            path.display()
        );
        return GameConfig::default();
    }
    match load_config_from_path(path) {
        Ok(config) => {
            log::info!("Config loaded from '{}'", path.display());
            config
        }
        Err(err) => {
            log::error!("{err}. Using defaults.");
            GameConfig::default()
        }
    }
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.version != 1 {
        return Err(format!(
            "Config validation failed: unsupported version {}",
            config.version
        ));
    }
    if config.window.width == 0 || config.window.height == 0 {
        return Err("Config validation failed: window size must be non-zero".to_string());
    }
    let time = &config.time;
    if !(time.fixed_dt.is_finite() && time.fixed_dt > 0.0) {
        return Err("Config validation failed: time.fixed_dt must be > 0".to_string());
    }
    if !(time.max_frame_time.is_finite() && time.max_frame_time >= time.fixed_dt) {
        return Err(
            "Config validation failed: time.max_frame_time must be >= time.fixed_dt".to_string(),
        );
    }
    if config.avatar_model_path.trim().is_empty() {
        return Err("Config validation failed: avatar_model_path is empty".to_string());
    }
    config.motion.validate()?;
    config.environment.validate()?;
    config.wind.validate()?;
    Ok(())
}

/// Sections other than `motion` that differ between `old` and `new`. Those
/// only take effect on restart.
pub fn restart_only_changes(old: &GameConfig, new: &GameConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if old.window != new.window {
        changed.push("window");
    }
    if old.time != new.time {
        changed.push("time");
    }
    if old.environment != new.environment {
        changed.push("environment");
    }
    if old.wind != new.wind {
        changed.push("wind");
    }
    if old.avatar_model_path != new.avatar_model_path {
        changed.push("avatar_model_path");
    }
    changed
}
