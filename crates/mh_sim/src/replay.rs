//! Scripted input sequences for driving a [`World`] without a window.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::avatar::MoveInput;
use crate::wind::WindState;
use crate::world::{StepReport, World};

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub move_y: f32,
    #[serde(default)]
    pub jump_pressed: bool,
    #[serde(default)]
    pub wind: [f32; 2],
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded(&self) -> Vec<(MoveInput, WindState)> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let input = MoveInput::new(frame.move_x, frame.move_y, frame.jump_pressed);
            let wind = WindState {
                x: frame.wind[0],
                z: frame.wind[1],
            };
            for _ in 0..frame.repeat.max(1) {
                out.push((input, wind));
            }
        }
        out
    }

    /// Steps `world` through every expanded frame and returns all reports.
    pub fn run(&self, world: &mut World) -> Vec<StepReport> {
        self.expanded()
            .into_iter()
            .map(|(input, wind)| world.step(self.fixed_dt, input, wind))
            .collect()
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectible::Collectible;
    use crate::config::MotionConfig;
    use glam::Vec3;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "mh_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_replay(name_hint: &str, body: &str) -> ReplaySequence {
        let path = temp_file_path(name_hint);
        fs::write(&path, body).expect("write replay file");
        let replay = load_replay_from_path(&path).expect("replay should load");
        let _ = fs::remove_file(path);
        replay
    }

    fn course() -> Vec<Collectible> {
        vec![
            Collectible::new(1, Vec3::new(0.0, 1.2, 0.0), 4, 0.4, 0.1),
            Collectible::new(2, Vec3::new(2.5, 1.2, 0.0), 7, 0.4, 0.5),
            Collectible::new(3, Vec3::new(-6.0, 2.0, 6.0), 1, 0.4, 0.9),
        ]
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let replay = write_replay(
            "parse",
            r#"{
              "frames": [
                { "move_x": 1.0, "repeat": 3 },
                { "move_y": 4.0, "jump_pressed": true, "wind": [0.01, -0.02] }
              ]
            }"#,
        );
        assert!((replay.fixed_dt - 1.0 / 60.0).abs() < 1e-9);
        let expanded = replay.expanded();
        assert_eq!(expanded.len(), 4);
        let (input, wind) = expanded[3];
        assert!(input.jump_pressed);
        assert_eq!(input.y, 1.0);
        assert_eq!(wind, WindState { x: 0.01, z: -0.02 });
    }

    #[test]
    fn replay_rejects_empty_frames() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let replay = write_replay(
            "deterministic",
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "move_x": 1.0, "repeat": 60 },
                { "move_x": 1.0, "jump_pressed": true, "repeat": 1 },
                { "move_x": 1.0, "move_y": 0.5, "wind": [0.03, 0.0], "repeat": 120 },
                { "move_x": -1.0, "jump_pressed": true, "repeat": 45 }
              ]
            }"#,
        );

        let mut run_a = World::new(MotionConfig::default(), course());
        let mut run_b = World::new(MotionConfig::default(), course());
        run_a.spawn_avatar();
        run_b.spawn_avatar();
        let reports_a = replay.run(&mut run_a);
        let reports_b = replay.run(&mut run_b);

        assert_eq!(reports_a, reports_b);
        assert_eq!(run_a.avatar(), run_b.avatar());
        assert_eq!(run_a.score(), run_b.score());
        assert_eq!(run_a.step_count(), 226);
    }

    #[test]
    fn scripted_hops_collect_boxes_on_the_way_up() {
        // Hop in place under box 1, walk right half a second to sit under
        // box 2, hop again.
        let replay = write_replay(
            "hops",
            r#"{
              "frames": [
                { "jump_pressed": true, "repeat": 300 },
                { "move_x": 1.0, "repeat": 30 },
                { "jump_pressed": true, "repeat": 300 }
              ]
            }"#,
        );

        let mut world = World::new(MotionConfig::default(), course());
        world.spawn_avatar();
        let reports = replay.run(&mut world);

        let collected: Vec<u32> = reports
            .iter()
            .flat_map(|r| r.collected.iter().map(|e| e.id))
            .collect();
        assert_eq!(collected, vec![1, 2]);
        assert_eq!(world.score(), 11);
        assert_eq!(world.score(), world.collected_points_total());
        assert!(!world.collectibles()[2].is_collected());
    }
}
