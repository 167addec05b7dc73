//! egui layer drawn on top of the 3D scene.
//!
//! egui needs a `RenderPass<'static>` while `begin_render_pass` borrows the
//! encoder, so a frame goes through four calls:
//!
//!   1. `prepare()` runs the UI and tessellates it
//!   2. `upload()` pushes textures and buffers (borrows the encoder mutably)
//!   3. `paint()` draws into a pass created with `forget_lifetime()`
//!   4. `cleanup()` frees textures egui dropped
//!
//! The HUD is painted every frame. The debug window only when `visible`
//! (toggled by F3).

use mh_core::time::TimeState;
use winit::window::Window;

use crate::hud::HudState;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub avatar_position: Option<[f32; 3]>,
    pub avatar_velocity: Option<[f32; 3]>,
    pub grounded: bool,
    pub wind: [f32; 2],
    pub collected: usize,
    pub collectible_count: usize,
    pub score: u32,
    pub triangles: u32,
    /// Where the avatar mesh came from (file path, or "fallback box").
    pub model_source: String,
    pub step_mode: String,
    pub paused: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    /// Advance exactly one simulation step while paused.
    pub single_step: bool,
}

pub struct Overlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl Overlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    /// True while the pointer is over an egui window, so game controls
    /// should ignore it.
    pub fn wants_pointer(&self) -> bool {
        self.visible && self.egui_ctx.is_pointer_over_area()
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        stats: &OverlayStats,
        hud: &HudState,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            hud.paint(ctx);
            if self.visible {
                egui::Window::new("Debug")
                    .default_pos([10.0, 10.0])
                    .show(ctx, |ui| debug_window(ui, time, stats, &mut actions));
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn debug_window(
    ui: &mut egui::Ui,
    time: &TimeState,
    stats: &OverlayStats,
    actions: &mut OverlayActions,
) {
    ui.label(format!("FPS: {:.1}", time.smoothed_fps));
    ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
    ui.label(format!(
        "Steps this frame: {} ({})",
        time.steps_this_frame, stats.step_mode
    ));
    ui.label(format!("Total steps: {}", time.fixed_step_count));
    ui.label(format!("Triangles: {}", stats.triangles));

    ui.separator();
    match (stats.avatar_position, stats.avatar_velocity) {
        (Some(p), Some(v)) => {
            ui.label(format!("Position: ({:.2}, {:.2}, {:.2})", p[0], p[1], p[2]));
            ui.label(format!("Velocity: ({:.2}, {:.2}, {:.2})", v[0], v[1], v[2]));
            ui.label(format!("Grounded: {}", stats.grounded));
        }
        _ => {
            ui.label("Avatar: loading...");
        }
    }
    ui.label(format!("Model: {}", stats.model_source));
    ui.label(format!(
        "Wind: ({:.4}, {:.4})",
        stats.wind[0], stats.wind[1]
    ));
    ui.label(format!(
        "Collected: {}/{} (score {})",
        stats.collected, stats.collectible_count, stats.score
    ));

    ui.separator();
    ui.horizontal(|ui| {
        let pause_label = if stats.paused { "Resume" } else { "Pause" };
        if ui.button(pause_label).clicked() {
            actions.toggle_pause = true;
        }
        if stats.paused && ui.button("Step").clicked() {
            actions.single_step = true;
        }
    });
    if stats.paused {
        ui.label("\u{23f8} PAUSED");
    }
}
