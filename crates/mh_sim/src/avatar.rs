use glam::Vec3;

use crate::bounds::Aabb3;
use crate::config::MotionConfig;
use crate::wind::WindState;

/// Direction and jump intent for one step. Axes are clamped to [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    pub x: f32,
    pub y: f32,
    pub jump_pressed: bool,
}

impl MoveInput {
    pub fn new(x: f32, y: f32, jump_pressed: bool) -> Self {
        Self {
            x: clamp_axis(x),
            y: clamp_axis(y),
            jump_pressed,
        }
    }

    pub const IDLE: MoveInput = MoveInput {
        x: 0.0,
        y: 0.0,
        jump_pressed: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avatar {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    pub half_extents: Vec3,
}

impl Avatar {
    /// Resting on the ground at the origin, not yet marked grounded. The
    /// first step settles it.
    pub fn spawn(config: &MotionConfig) -> Self {
        Self {
            position: Vec3::new(0.0, config.ground_contact_height(), 0.0),
            velocity: Vec3::ZERO,
            grounded: false,
            half_extents: config.avatar_half_extents(),
        }
    }

    pub fn bounds(&self) -> Aabb3 {
        Aabb3::from_center(self.position, self.half_extents)
    }

    pub fn step(&mut self, input: MoveInput, wind: WindState, dt: f32, config: &MotionConfig) {
        let input = MoveInput::new(input.x, input.y, input.jump_pressed);

        self.velocity.y += config.gravity * dt;

        // Stick up means away from the camera, which looks down -z.
        self.velocity.x = input.x * config.move_speed;
        self.velocity.z = -input.y * config.move_speed;

        // Wind is re-applied in full every step; it never accumulates.
        self.velocity.x += wind.x;
        self.velocity.z += wind.z;

        // Jump only from the ground: no double jump, no buffering.
        if input.jump_pressed && self.grounded {
            self.velocity.y = config.jump_speed;
            self.grounded = false;
        }

        self.position += self.velocity * dt;

        let contact = config.ground_contact_height();
        if self.position.y <= contact {
            self.position.y = contact;
            self.velocity.y = 0.0;
            self.grounded = true;
        }

        // Walls stop position only; velocity keeps pushing.
        let bound = config.bounds_half_extent;
        self.position.x = self.position.x.clamp(-bound, bound);
        self.position.z = self.position.z.clamp(-bound, bound);
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn airborne(height: f32) -> Avatar {
        let config = MotionConfig::default();
        let mut avatar = Avatar::spawn(&config);
        avatar.position.y = height;
        avatar
    }

    #[test]
    fn first_step_from_spawn_settles_on_ground() {
        let config = MotionConfig::default();
        let mut avatar = Avatar::spawn(&config);
        assert!(!avatar.grounded);

        avatar.step(MoveInput::IDLE, WindState::CALM, DT, &config);
        assert_eq!(avatar.position.y, config.ground_contact_height());
        assert_eq!(avatar.velocity.y, 0.0);
        assert!(avatar.grounded);
    }

    #[test]
    fn gravity_is_integrated_before_position() {
        let config = MotionConfig::default();
        let mut avatar = airborne(2.0);
        avatar.step(MoveInput::IDLE, WindState::CALM, DT, &config);

        let expected_vy = config.gravity * DT;
        assert!((avatar.velocity.y - expected_vy).abs() < 1e-6);
        assert!((avatar.position.y - (2.0 + expected_vy * DT)).abs() < 1e-6);
        assert!(!avatar.grounded);
    }

    #[test]
    fn free_fall_converges_to_ground_and_stays() {
        let config = MotionConfig::default();
        for dt in [1.0 / 240.0, DT, 0.05, 0.2] {
            let mut avatar = airborne(3.0);
            let mut landed_at = None;
            for i in 0..10_000 {
                avatar.step(MoveInput::IDLE, WindState::CALM, dt, &config);
                assert!(avatar.position.y >= config.ground_contact_height());
                if avatar.grounded && landed_at.is_none() {
                    landed_at = Some(i);
                }
                if landed_at.is_some() {
                    assert_eq!(avatar.position.y, config.ground_contact_height());
                    assert_eq!(avatar.velocity.y, 0.0);
                }
            }
            assert!(landed_at.is_some(), "never landed with dt={dt}");
        }
    }

    #[test]
    fn jump_from_ground_sets_jump_speed() {
        let config = MotionConfig::default();
        let mut avatar = Avatar::spawn(&config);
        avatar.step(MoveInput::IDLE, WindState::CALM, DT, &config);
        assert!(avatar.grounded);

        avatar.step(MoveInput::new(0.0, 0.0, true), WindState::CALM, DT, &config);
        assert_eq!(avatar.velocity.y, 8.0);
        assert!(!avatar.grounded);
        assert!(avatar.position.y > config.ground_contact_height());
    }

    #[test]
    fn jump_while_airborne_is_ignored() {
        let config = MotionConfig::default();
        let mut pressed = airborne(2.0);
        let mut idle = airborne(2.0);
        pressed.velocity.y = 1.5;
        idle.velocity.y = 1.5;

        pressed.step(MoveInput::new(0.0, 0.0, true), WindState::CALM, DT, &config);
        idle.step(MoveInput::IDLE, WindState::CALM, DT, &config);
        assert_eq!(pressed.velocity.y, idle.velocity.y);
        assert_eq!(pressed.position, idle.position);
        assert!(!pressed.grounded);
    }

    #[test]
    fn forward_input_moves_toward_negative_z() {
        let config = MotionConfig::default();
        let mut avatar = Avatar::spawn(&config);
        avatar.step(MoveInput::new(1.0, 1.0, false), WindState::CALM, DT, &config);
        assert_eq!(avatar.velocity.x, 5.0);
        assert_eq!(avatar.velocity.z, -5.0);
        assert!(avatar.position.x > 0.0);
        assert!(avatar.position.z < 0.0);
    }

    #[test]
    fn wind_is_added_after_input_and_does_not_accumulate() {
        let config = MotionConfig::default();
        let wind = WindState { x: 0.25, z: -0.5 };
        let mut avatar = Avatar::spawn(&config);
        for _ in 0..10 {
            avatar.step(MoveInput::new(0.5, 0.0, false), wind, DT, &config);
            assert!((avatar.velocity.x - 2.75).abs() < 1e-6);
            assert!((avatar.velocity.z + 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        let config = MotionConfig::default();
        let mut avatar = Avatar::spawn(&config);
        let wild = MoveInput {
            x: 7.0,
            y: f32::NAN,
            jump_pressed: false,
        };
        avatar.step(wild, WindState::CALM, DT, &config);
        assert_eq!(avatar.velocity.x, config.move_speed);
        assert_eq!(avatar.velocity.z, 0.0);
    }

    #[test]
    fn horizontal_bounds_hold_under_sustained_input() {
        let config = MotionConfig::default();
        let bound = config.bounds_half_extent;
        let mut avatar = Avatar::spawn(&config);
        let gust = WindState { x: 0.02, z: 0.02 };
        for _ in 0..2_000 {
            avatar.step(MoveInput::new(1.0, -1.0, true), gust, DT, &config);
            assert!(avatar.position.x.abs() <= bound);
            assert!(avatar.position.z.abs() <= bound);
        }
        assert_eq!(avatar.position.x, bound);
        assert_eq!(avatar.position.z, bound);
        // Velocity is not zeroed by the wall.
        assert!(avatar.velocity.x > 0.0);
    }

    #[test]
    fn bounds_follow_position() {
        let config = MotionConfig::default();
        let avatar = Avatar::spawn(&config);
        let aabb = avatar.bounds();
        assert!((aabb.min.y - config.ground_y).abs() < 1e-6);
        assert!((aabb.size().x - 0.18).abs() < 1e-6);
        assert!((aabb.size().z - 0.07).abs() < 1e-6);
    }
}
