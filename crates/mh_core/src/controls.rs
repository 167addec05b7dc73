//! Input aggregation: folds keyboard state and the on-screen controls into one
//! direction vector and jump flag per simulation step.

use glam::Vec2;

use crate::input::{InputState, Key};
use crate::joystick::{JumpButton, PointerId, VirtualJoystick};

/// Direction and jump intent for one simulation step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlSample {
    pub move_x: f32,
    pub move_y: f32,
    pub jump_pressed: bool,
}

/// Screen placement of the on-screen controls for a given viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlLayout {
    pub joystick_center: Vec2,
    pub joystick_radius: f32,
    pub jump_center: Vec2,
    pub jump_radius: f32,
}

impl ControlLayout {
    /// Joystick in the bottom-left corner, jump button bottom-right, both
    /// scaled from the shorter side of the viewport.
    pub fn for_viewport(width: u32, height: u32) -> Self {
        let short = width.min(height).max(1) as f32;
        let joystick_radius = (short * 0.16).clamp(50.0, 120.0);
        let jump_radius = joystick_radius * 0.55;
        let margin = short * 0.06;
        let bottom = height as f32 - margin;
        Self {
            joystick_center: Vec2::new(margin + joystick_radius, bottom - joystick_radius),
            joystick_radius,
            jump_center: Vec2::new(width as f32 - margin - jump_radius, bottom - jump_radius),
            jump_radius,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlAggregator {
    layout: ControlLayout,
    joystick: VirtualJoystick,
    jump_button: JumpButton,
}

impl ControlAggregator {
    pub fn new(layout: ControlLayout) -> Self {
        Self {
            layout,
            joystick: VirtualJoystick::new(layout.joystick_center, layout.joystick_radius),
            jump_button: JumpButton::new(layout.jump_center, layout.jump_radius),
        }
    }

    pub fn layout(&self) -> ControlLayout {
        self.layout
    }

    pub fn joystick(&self) -> &VirtualJoystick {
        &self.joystick
    }

    pub fn jump_button(&self) -> &JumpButton {
        &self.jump_button
    }

    pub fn relayout(&mut self, width: u32, height: u32) {
        self.layout = ControlLayout::for_viewport(width, height);
        self.joystick
            .relayout(self.layout.joystick_center, self.layout.joystick_radius);
        self.jump_button
            .relayout(self.layout.jump_center, self.layout.jump_radius);
    }

    /// Route a pointer press to whichever control it lands on. Returns true
    /// when a control captured it.
    pub fn pointer_down(&mut self, pointer: PointerId, position: Vec2) -> bool {
        if self.joystick.press(pointer, position) {
            log::trace!("Joystick captured {:?}", pointer);
            return true;
        }
        self.jump_button.press(pointer, position)
    }

    pub fn pointer_moved(&mut self, pointer: PointerId, position: Vec2) {
        self.joystick.drag(pointer, position);
    }

    pub fn pointer_up(&mut self, pointer: PointerId) {
        self.joystick.release(pointer);
        self.jump_button.release(pointer);
    }

    /// While the joystick is dragged it owns the direction; otherwise the
    /// keyboard does. Jump is level-triggered from either source.
    pub fn sample(&self, input: &InputState) -> ControlSample {
        let (move_x, move_y) = if self.joystick.is_dragging() {
            let axis = self.joystick.axis();
            (axis.x, axis.y)
        } else {
            input.move_axis()
        };
        ControlSample {
            move_x: move_x.clamp(-1.0, 1.0),
            move_y: move_y.clamp(-1.0, 1.0),
            jump_pressed: input.is_held(Key::Space) || self.jump_button.is_held(),
        }
    }
}
