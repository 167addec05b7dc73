//! Environment provider: static scenery plus the fixed set of collectibles.
//!
//! Collectibles either come from a seeded random scatter above the meadow (the
//! default) or from a JSON layout file. Scenery is always generated and has no
//! gameplay effect.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::collectible::Collectible;
use crate::config::MotionConfig;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub seed: u64,
    pub collectible_count: usize,
    /// Boxes spawn with x and z in `[-spawn_half_range, spawn_half_range)`.
    pub spawn_half_range: f32,
    pub min_height: f32,
    pub height_range: f32,
    pub max_points: u32,
    pub collectible_size: f32,
    pub mountain_count: usize,
    pub cloud_count: usize,
    pub ground_size: f32,
    /// Optional JSON layout that replaces the random collectibles.
    pub layout_path: Option<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            collectible_count: 15,
            spawn_half_range: 10.0,
            min_height: 1.5,
            height_range: 3.0,
            max_points: 10,
            collectible_size: 0.04,
            mountain_count: 10,
            cloud_count: 15,
            ground_size: 100.0,
            layout_path: None,
        }
    }
}

/// Upper bound on any single box's value, generated or from a layout.
pub const MAX_POINTS_PER_BOX: u32 = 1000;

impl EnvironmentConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_points == 0 {
            return Err("Environment validation failed: max_points must be >= 1".to_string());
        }
        if self.max_points > MAX_POINTS_PER_BOX {
            return Err(format!(
                "Environment validation failed: max_points must be <= {MAX_POINTS_PER_BOX}"
            ));
        }
        if !(self.collectible_size.is_finite() && self.collectible_size > 0.0) {
            return Err("Environment validation failed: collectible_size must be > 0".to_string());
        }
        if !(self.spawn_half_range.is_finite() && self.spawn_half_range >= 0.0) {
            return Err(
                "Environment validation failed: spawn_half_range must be >= 0".to_string(),
            );
        }
        if !(self.height_range.is_finite() && self.height_range >= 0.0) {
            return Err("Environment validation failed: height_range must be >= 0".to_string());
        }
        if !(self.ground_size.is_finite() && self.ground_size > 0.0) {
            return Err("Environment validation failed: ground_size must be > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mountain {
    /// Center of the cone's base.
    pub base: Vec3,
    pub radius: f32,
    pub height: f32,
    pub yaw: f32,
    /// HSL lightness of the mountain's green.
    pub lightness: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub ground_y: f32,
    pub ground_size: f32,
    pub mountains: Vec<Mountain>,
    pub clouds: Vec<Cloud>,
    pub collectibles: Vec<Collectible>,
}

impl Environment {
    /// Scenery and collectibles from `config.seed`. Same seed, same world.
    pub fn generate(config: &EnvironmentConfig, motion: &MotionConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        // Scenery is drawn first so changing the box count keeps the skyline.
        let mountains = (0..config.mountain_count)
            .map(|_| {
                let radius = rng.gen::<f32>() * 3.0 + 1.0;
                let height = rng.gen::<f32>() * 8.0 + 5.0;
                let x = (rng.gen::<f32>() - 0.5) * 100.0;
                let z = -rng.gen::<f32>() * 20.0 - 30.0;
                Mountain {
                    base: Vec3::new(x, motion.ground_y, z),
                    radius,
                    height,
                    yaw: rng.gen::<f32>() * std::f32::consts::TAU,
                    lightness: rng.gen::<f32>() * 0.3 + 0.3,
                }
            })
            .collect();
        let clouds = (0..config.cloud_count)
            .map(|_| {
                let radius = rng.gen::<f32>() * 2.0 + 1.0;
                let center = Vec3::new(
                    (rng.gen::<f32>() - 0.5) * 80.0,
                    rng.gen::<f32>() * 10.0 + 15.0,
                    (rng.gen::<f32>() - 0.5) * 80.0,
                );
                Cloud { center, radius }
            })
            .collect();
        let collectibles = random_collectibles(&mut rng, config);

        Self {
            ground_y: motion.ground_y,
            ground_size: config.ground_size,
            mountains,
            clouds,
            collectibles,
        }
    }

    /// Generated scenery with collectibles from `config.layout_path` when set.
    /// A broken layout file falls back to the generated boxes.
    pub fn load(config: &EnvironmentConfig, motion: &MotionConfig) -> Self {
        let mut env = Self::generate(config, motion);
        let Some(layout_path) = &config.layout_path else {
            return env;
        };
        match load_layout_from_path(Path::new(layout_path)) {
            Ok(layout) => {
                log::info!(
                    "Collectible layout '{}' loaded ({} boxes)",
                    layout.layout_id,
                    layout.collectibles.len()
                );
                env.collectibles = layout.into_collectibles(config.collectible_size);
            }
            Err(err) => {
                log::error!("{err}. Using generated collectibles.");
            }
        }
        env
    }

    pub fn total_points(&self) -> u32 {
        self.collectibles
            .iter()
            .fold(0u32, |total, c| total.saturating_add(c.points))
    }
}

fn random_collectibles(rng: &mut StdRng, config: &EnvironmentConfig) -> Vec<Collectible> {
    (0..config.collectible_count)
        .map(|i| {
            let hue = rng.gen::<f32>();
            let position = Vec3::new(
                (rng.gen::<f32>() - 0.5) * 2.0 * config.spawn_half_range,
                rng.gen::<f32>() * config.height_range + config.min_height,
                (rng.gen::<f32>() - 0.5) * 2.0 * config.spawn_half_range,
            );
            let points = rng.gen_range(1..=config.max_points);
            Collectible::new(i as u32 + 1, position, points, config.collectible_size, hue)
        })
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutFile {
    pub version: String,
    pub layout_id: String,
    pub collectibles: Vec<LayoutEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutEntry {
    pub id: u32,
    pub position: [f32; 3],
    pub points: u32,
    #[serde(default)]
    pub hue: f32,
}

impl LayoutFile {
    pub fn into_collectibles(self, size: f32) -> Vec<Collectible> {
        self.collectibles
            .into_iter()
            .map(|e| Collectible::new(e.id, Vec3::from_array(e.position), e.points, size, e.hue))
            .collect()
    }
}

pub fn load_layout_from_path(path: &Path) -> Result<LayoutFile, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let layout: LayoutFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse layout JSON {}: {e}", path.display()))?;
    validate_layout(&layout)?;
    Ok(layout)
}

fn validate_layout(layout: &LayoutFile) -> Result<(), String> {
    if layout.collectibles.is_empty() {
        return Err("Layout validation failed: collectibles list is empty".to_string());
    }
    let mut ids = HashSet::new();
    for entry in &layout.collectibles {
        if !ids.insert(entry.id) {
            return Err(format!(
                "Layout validation failed: duplicate collectible id {}",
                entry.id
            ));
        }
        if entry.points == 0 {
            return Err(format!(
                "Layout validation failed: collectible {} must be worth at least 1 point",
                entry.id
            ));
        }
        if entry.points > MAX_POINTS_PER_BOX {
            return Err(format!(
                "Layout validation failed: collectible {} is worth more than {MAX_POINTS_PER_BOX} points",
                entry.id
            ));
        }
        if entry.position.iter().any(|v| !v.is_finite()) {
            return Err(format!(
                "Layout validation failed: collectible {} has a non-finite position",
                entry.id
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "mh_layout_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn generation_is_reproducible_per_seed() {
        let config = EnvironmentConfig::default();
        let motion = MotionConfig::default();
        let a = Environment::generate(&config, &motion);
        let b = Environment::generate(&config, &motion);
        assert_eq!(a, b);

        let other = Environment::generate(
            &EnvironmentConfig {
                seed: 99,
                ..config
            },
            &motion,
        );
        assert_ne!(a.collectibles, other.collectibles);
    }

    #[test]
    fn generated_values_stay_in_documented_ranges() {
        let config = EnvironmentConfig::default();
        let env = Environment::generate(&config, &MotionConfig::default());
        assert_eq!(env.collectibles.len(), 15);
        assert_eq!(env.mountains.len(), 10);
        assert_eq!(env.clouds.len(), 15);

        let mut ids = HashSet::new();
        for c in &env.collectibles {
            assert!(ids.insert(c.id));
            assert!((1..=10).contains(&c.points));
            assert!(c.position.x >= -10.0 && c.position.x < 10.0);
            assert!(c.position.z >= -10.0 && c.position.z < 10.0);
            assert!(c.position.y >= 1.5 && c.position.y < 4.5);
            assert!(!c.is_collected());
        }
        for m in &env.mountains {
            assert!(m.radius >= 1.0 && m.radius < 4.0);
            assert!(m.height >= 5.0 && m.height < 13.0);
            assert!(m.base.z <= -30.0 && m.base.z > -50.0);
        }
        for cloud in &env.clouds {
            assert!(cloud.center.y >= 15.0 && cloud.center.y < 25.0);
        }
    }

    #[test]
    fn layout_file_replaces_generated_boxes() {
        let path = temp_file_path("valid");
        fs::write(
            &path,
            r#"{
              "version": "0.1",
              "layout_id": "test",
              "collectibles": [
                { "id": 10, "position": [0.0, 2.0, 0.0], "points": 5 },
                { "id": 11, "position": [1.0, 3.0, -1.0], "points": 2, "hue": 0.4 }
              ]
            }"#,
        )
        .expect("write layout");

        let config = EnvironmentConfig {
            layout_path: Some(path.to_string_lossy().to_string()),
            ..EnvironmentConfig::default()
        };
        let env = Environment::load(&config, &MotionConfig::default());
        assert_eq!(env.collectibles.len(), 2);
        assert_eq!(env.collectibles[0].id, 10);
        assert_eq!(env.collectibles[1].hue, 0.4);
        assert_eq!(env.total_points(), 7);
        assert_eq!(env.mountains.len(), 10);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn broken_layout_falls_back_to_generated() {
        let config = EnvironmentConfig {
            layout_path: Some("definitely/not/here.json".to_string()),
            ..EnvironmentConfig::default()
        };
        let env = Environment::load(&config, &MotionConfig::default());
        assert_eq!(env.collectibles.len(), 15);
    }

    #[test]
    fn bundled_practice_layout_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/layouts/practice.json");
        let layout = load_layout_from_path(&path).expect("bundled layout should load");
        assert_eq!(layout.layout_id, "practice_row");
        let boxes = layout.into_collectibles(0.04);
        assert_eq!(boxes.len(), 5);
        assert_eq!(boxes.iter().map(|b| b.points).sum::<u32>(), 19);
    }

    #[test]
    fn layout_rejects_duplicate_ids() {
        let path = temp_file_path("dup");
        fs::write(
            &path,
            r#"{"version":"0.1","layout_id":"dup","collectibles":[
                {"id":1,"position":[0,2,0],"points":1},
                {"id":1,"position":[1,2,0],"points":1}]}"#,
        )
        .expect("write layout");
        let err = load_layout_from_path(&path).expect_err("duplicate ids should fail");
        assert!(err.contains("duplicate collectible id"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn layout_rejects_zero_points() {
        let path = temp_file_path("zero");
        fs::write(
            &path,
            r#"{"version":"0.1","layout_id":"zero","collectibles":[
                {"id":1,"position":[0,2,0],"points":0}]}"#,
        )
        .expect("write layout");
        let err = load_layout_from_path(&path).expect_err("zero points should fail");
        assert!(err.contains("at least 1 point"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn layout_rejects_empty_list() {
        let path = temp_file_path("empty");
        fs::write(
            &path,
            r#"{"version":"0.1","layout_id":"empty","collectibles":[]}"#,
        )
        .expect("write layout");
        let err = load_layout_from_path(&path).expect_err("empty layout should fail");
        assert!(err.contains("empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn layout_rejects_oversized_points() {
        let path = temp_file_path("huge");
        fs::write(
            &path,
            r#"{"version":"0.1","layout_id":"huge","collectibles":[
                {"id":1,"position":[0,2,0],"points":4294967295},
                {"id":2,"position":[0,2,0],"points":1}]}"#,
        )
        .expect("write layout");
        let err = load_layout_from_path(&path).expect_err("oversized points should fail");
        assert!(err.contains("worth more than 1000 points"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn config_validation_caps_max_points() {
        let config = EnvironmentConfig {
            max_points: u32::MAX,
            ..EnvironmentConfig::default()
        };
        assert!(config.validate().is_err());
        let at_cap = EnvironmentConfig {
            max_points: MAX_POINTS_PER_BOX,
            ..EnvironmentConfig::default()
        };
        assert!(at_cap.validate().is_ok());
    }

    #[test]
    fn total_points_saturates() {
        let mut env = Environment::generate(&EnvironmentConfig::default(), &MotionConfig::default());
        env.collectibles = vec![
            Collectible::new(1, Vec3::Y, u32::MAX, 0.04, 0.0),
            Collectible::new(2, Vec3::Y, 1, 0.04, 0.0),
        ];
        assert_eq!(env.total_points(), u32::MAX);
    }

    #[test]
    fn config_validation_catches_zero_max_points() {
        let config = EnvironmentConfig {
            max_points: 0,
            ..EnvironmentConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(EnvironmentConfig::default().validate().is_ok());
    }
}
