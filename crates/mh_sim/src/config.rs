use glam::Vec3;
use serde::Deserialize;

/// Tuning constants for avatar motion. Defaults give a low, Mars-like gravity.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Vertical acceleration, m/s^2. Negative.
    pub gravity: f32,
    /// Horizontal speed at full stick deflection, m/s.
    pub move_speed: f32,
    /// Vertical velocity set by a jump, m/s.
    pub jump_speed: f32,
    pub ground_y: f32,
    /// The play area is the square `[-b, b]` on x and z.
    pub bounds_half_extent: f32,
    /// Full size of the avatar's bounding box (x, y, z).
    pub avatar_size: [f32; 3],
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            gravity: -3.73,
            move_speed: 5.0,
            jump_speed: 8.0,
            ground_y: 0.0,
            bounds_half_extent: 25.0,
            avatar_size: [0.18, 0.18, 0.07],
        }
    }
}

impl MotionConfig {
    pub fn avatar_half_extents(&self) -> Vec3 {
        Vec3::from_array(self.avatar_size) * 0.5
    }

    /// Height of the avatar's center when it rests on the ground.
    pub fn ground_contact_height(&self) -> f32 {
        self.ground_y + self.avatar_size[1] * 0.5
    }

    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            self.gravity,
            self.move_speed,
            self.jump_speed,
            self.ground_y,
            self.bounds_half_extent,
        ]
        .iter()
        .chain(self.avatar_size.iter())
        .all(|v| v.is_finite());
        if !finite {
            return Err("Motion validation failed: values must be finite".to_string());
        }
        if self.gravity >= 0.0 {
            return Err("Motion validation failed: gravity must be < 0".to_string());
        }
        if self.jump_speed <= 0.0 {
            return Err("Motion validation failed: jump_speed must be > 0".to_string());
        }
        if self.move_speed < 0.0 {
            return Err("Motion validation failed: move_speed must be >= 0".to_string());
        }
        if self.bounds_half_extent <= 0.0 {
            return Err("Motion validation failed: bounds_half_extent must be > 0".to_string());
        }
        if self.avatar_size.iter().any(|v| *v <= 0.0) {
            return Err("Motion validation failed: avatar_size must be > 0 on every axis".to_string());
        }
        Ok(())
    }
}
