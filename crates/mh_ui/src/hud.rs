//! Always-visible heads-up display: score and the on-screen controls.
//!
//! Control geometry arrives in physical pixels (winit's space); egui paints
//! in logical points, so everything is divided by `pixels_per_point`.

use egui::{Align2, Color32, FontId, Pos2, Stroke};
use glam::Vec2;
use mh_core::controls::ControlAggregator;
use mh_core::joystick::KNOB_MARGIN;

const PAD_FILL: Color32 = Color32::from_rgba_premultiplied(40, 40, 40, 60);
const PAD_STROKE: Color32 = Color32::from_rgba_premultiplied(150, 150, 150, 150);
const KNOB_FILL: Color32 = Color32::from_rgba_premultiplied(180, 180, 180, 180);
const JUMP_FILL: Color32 = Color32::from_rgba_premultiplied(120, 40, 40, 140);
const JUMP_HELD_FILL: Color32 = Color32::from_rgba_premultiplied(200, 60, 60, 200);

/// Snapshot of what the HUD shows this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HudState {
    pub score: u32,
    pub joystick_center: Vec2,
    pub joystick_radius: f32,
    pub knob_offset: Vec2,
    pub jump_center: Vec2,
    pub jump_radius: f32,
    pub jump_held: bool,
}

impl HudState {
    pub fn from_controls(score: u32, controls: &ControlAggregator) -> Self {
        let joystick = controls.joystick();
        let jump = controls.jump_button();
        Self {
            score,
            joystick_center: joystick.center(),
            joystick_radius: joystick.radius(),
            knob_offset: joystick.knob_offset(),
            jump_center: jump.center(),
            jump_radius: jump.radius(),
            jump_held: jump.is_held(),
        }
    }

    pub fn score_label(&self) -> String {
        format!("Score: {}", self.score)
    }

    pub fn paint(&self, ctx: &egui::Context) {
        let ppp = ctx.pixels_per_point();
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Background,
            egui::Id::new("mh_hud"),
        ));
        let screen = ctx.screen_rect();

        painter.text(
            Pos2::new(screen.right() - 20.0, 16.0),
            Align2::RIGHT_TOP,
            self.score_label(),
            FontId::proportional(28.0),
            Color32::WHITE,
        );

        let pad_center = to_points(self.joystick_center, ppp);
        painter.circle_filled(pad_center, self.joystick_radius / ppp, PAD_FILL);
        painter.circle_stroke(
            pad_center,
            self.joystick_radius / ppp,
            Stroke::new(2.0, PAD_STROKE),
        );
        painter.circle_filled(
            to_points(self.joystick_center + self.knob_offset, ppp),
            KNOB_MARGIN / ppp,
            KNOB_FILL,
        );

        let jump_center = to_points(self.jump_center, ppp);
        let fill = if self.jump_held {
            JUMP_HELD_FILL
        } else {
            JUMP_FILL
        };
        painter.circle_filled(jump_center, self.jump_radius / ppp, fill);
        painter.text(
            jump_center,
            Align2::CENTER_CENTER,
            "JUMP",
            FontId::proportional(16.0),
            Color32::WHITE,
        );
    }
}

pub fn to_points(physical: Vec2, pixels_per_point: f32) -> Pos2 {
    let ppp = if pixels_per_point > 0.0 {
        pixels_per_point
    } else {
        1.0
    };
    Pos2::new(physical.x / ppp, physical.y / ppp)
}
