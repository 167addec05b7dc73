//! On-screen joystick and jump button, driven by mouse or touch pointers.
//!
//! Positions are in physical window pixels with y pointing down, exactly as
//! winit reports them. The joystick output flips y so that dragging the knob
//! toward the top of the screen means "forward".

use glam::Vec2;

/// Pixels between the pad edge and the furthest knob center.
pub const KNOB_MARGIN: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

#[derive(Debug, Clone)]
pub struct VirtualJoystick {
    center: Vec2,
    radius: f32,
    owner: Option<PointerId>,
    knob_offset: Vec2,
}

impl VirtualJoystick {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            owner: None,
            knob_offset: Vec2::ZERO,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Move the pad after a resize. An active drag is dropped.
    pub fn relayout(&mut self, center: Vec2, radius: f32) {
        self.center = center;
        self.radius = radius;
        self.reset();
    }

    pub fn max_distance(&self) -> f32 {
        (self.radius - KNOB_MARGIN).max(1.0)
    }

    pub fn contains(&self, position: Vec2) -> bool {
        position.distance_squared(self.center) <= self.radius * self.radius
    }

    pub fn is_dragging(&self) -> bool {
        self.owner.is_some()
    }

    /// Start a drag if `position` is on the pad. Returns whether the pointer
    /// was captured.
    pub fn press(&mut self, pointer: PointerId, position: Vec2) -> bool {
        if self.owner.is_some() || !self.contains(position) {
            return false;
        }
        self.owner = Some(pointer);
        self.track(position);
        true
    }

    pub fn drag(&mut self, pointer: PointerId, position: Vec2) {
        if self.owner == Some(pointer) {
            self.track(position);
        }
    }

    pub fn release(&mut self, pointer: PointerId) {
        if self.owner == Some(pointer) {
            self.reset();
        }
    }

    pub fn knob_offset(&self) -> Vec2 {
        self.knob_offset
    }

    /// Normalized direction in [-1, 1] per axis, y inverted to "up is forward".
    pub fn axis(&self) -> Vec2 {
        let max = self.max_distance();
        Vec2::new(self.knob_offset.x / max, -self.knob_offset.y / max)
            .clamp(Vec2::splat(-1.0), Vec2::ONE)
    }

    fn track(&mut self, position: Vec2) {
        let delta = position - self.center;
        let max = self.max_distance();
        let distance = delta.length();
        self.knob_offset = if distance > max {
            delta / distance * max
        } else {
            delta
        };
    }

    fn reset(&mut self) {
        self.owner = None;
        self.knob_offset = Vec2::ZERO;
    }
}

#[derive(Debug, Clone)]
pub struct JumpButton {
    center: Vec2,
    radius: f32,
    owner: Option<PointerId>,
}

impl JumpButton {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            owner: None,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn relayout(&mut self, center: Vec2, radius: f32) {
        self.center = center;
        self.radius = radius;
        self.owner = None;
    }

    pub fn press(&mut self, pointer: PointerId, position: Vec2) -> bool {
        if self.owner.is_some()
            || position.distance_squared(self.center) > self.radius * self.radius
        {
            return false;
        }
        self.owner = Some(pointer);
        true
    }

    pub fn release(&mut self, pointer: PointerId) {
        if self.owner == Some(pointer) {
            self.owner = None;
        }
    }

    pub fn is_held(&self) -> bool {
        self.owner.is_some()
    }
}
