//! Marshand -- main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Everything happens in
//! `RedrawRequested`:
//!
//!   1. `begin_frame()` measures wall time; the wind timer and collect pulses
//!      advance on that same wall time
//!   2. config hot reload and the avatar loader are checked at the frame
//!      boundary, never mid-step
//!   3. `while should_step()` runs the simulation in fixed (or measured) slices
//!   4. the frame mesh is rebuilt on the CPU, uploaded, and drawn with depth;
//!      egui composites the HUD and the F3 debug window on top
//!
//! The world has no avatar until the model loader reports, so stepping is a
//! no-op for the first few frames.

mod avatar_model;
mod config;
mod feedback;
mod scene_mesh;
mod watcher;

use std::path::PathBuf;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use avatar_model::{AvatarLoader, AvatarModel};
use config::{load_config_from_path, load_or_default, restart_only_changes, GameConfig};
use feedback::CollectFeedback;
use mh_core::controls::{ControlAggregator, ControlLayout};
use mh_core::input::{InputState, Key, MouseBtn};
use mh_core::joystick::PointerId;
use mh_core::time::TimeState;
use mh_render::{CpuMesh, FollowCamera, GpuContext, MeshPipeline, MeshVertex};
use mh_sim::{Environment, MoveInput, WindCell, WindState, WindTimer, World};
use mh_ui::{HudState, Overlay, OverlayStats};
use scene_mesh::{clear_color, SceneMeshBuilder};
use watcher::FileWatcher;

/// Per-session state, created once the window exists.
///
///  - **Core systems** (time, input, controls, camera) -- updated every frame
///  - **Session** (world, wind, avatar model, feedback) -- the game itself
///  - **GPU resources** (mesh buffers, scene uniform) -- refreshed every frame
struct GameState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    controls: ControlAggregator,
    camera: FollowCamera,
    mesh_pipeline: MeshPipeline,
    overlay: Overlay,

    // --- Session -------------------------------------------------------------
    world: World,
    scene_builder: SceneMeshBuilder,
    wind_cell: Arc<WindCell>,
    wind_timer: WindTimer,
    avatar_loader: AvatarLoader,
    avatar_model: Option<AvatarModel>,
    feedback: CollectFeedback,
    config: GameConfig,
    config_watcher: FileWatcher,
    paused: bool,
    single_step_requested: bool,

    // --- Per-frame GPU mesh state -------------------------------------------
    // Buffers grow (power-of-two) but never shrink.
    frame_mesh: CpuMesh,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl GameState {
    fn new(window: Arc<Window>, config: GameConfig, config_path: PathBuf) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let mut time = TimeState::with_mode(config.time.step_mode, config.time.fixed_dt);
        time.max_accumulator = config.time.max_frame_time;
        let input = InputState::new();
        let controls = ControlAggregator::new(ControlLayout::for_viewport(gpu.size.0, gpu.size.1));
        let camera = FollowCamera::new(gpu.size.0, gpu.size.1);
        let mesh_pipeline = MeshPipeline::new(&gpu.device, gpu.surface_format);
        let overlay = Overlay::new(&gpu.device, gpu.surface_format, &window);

        let environment = Environment::load(&config.environment, &config.motion);
        log::info!(
            "Environment ready: {} mountains, {} clouds, {} boxes worth {} points",
            environment.mountains.len(),
            environment.clouds.len(),
            environment.collectibles.len(),
            environment.total_points()
        );
        let scene_builder = SceneMeshBuilder::new(&environment);
        let world = World::new(config.motion, environment.collectibles);

        let wind_cell = Arc::new(WindCell::new(WindState::CALM));
        let wind_timer = WindTimer::new(&config.wind);
        let avatar_loader = AvatarLoader::spawn(
            PathBuf::from(&config.avatar_model_path),
            Vec3::from_array(config.motion.avatar_size),
        );

        let scene_uniform = camera.build_uniform();
        let scene_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Uniform Buffer"),
                contents: bytemuck::cast_slice(&[scene_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let scene_bind_group = mesh_pipeline.create_scene_bind_group(&gpu.device, &scene_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        Ok(Self {
            window,
            gpu,
            time,
            input,
            controls,
            camera,
            mesh_pipeline,
            overlay,
            world,
            scene_builder,
            wind_cell,
            wind_timer,
            avatar_loader,
            avatar_model: None,
            feedback: CollectFeedback::new(),
            config,
            config_watcher: FileWatcher::new(config_path),
            paused: false,
            single_step_requested: false,
            frame_mesh: CpuMesh::new(),
            vertex_buffer,
            index_buffer,
            scene_buffer,
            scene_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
        })
    }

    /// Only `motion` is applied live; the running config keeps every other
    /// section so later reloads keep reporting them.
    fn reload_config(&mut self, reason: &str) {
        let path = self.config_watcher.path().to_path_buf();
        let candidate = match load_config_from_path(&path) {
            Ok(candidate) => candidate,
            Err(err) => {
                log::error!("Config reload ({reason}) failed: {err}. Keeping current config.");
                return;
            }
        };

        if candidate.motion != self.config.motion {
            let resized = candidate.motion.avatar_size != self.config.motion.avatar_size;
            self.config.motion = candidate.motion;
            self.world.set_motion_config(candidate.motion);
            if resized {
                let size = Vec3::from_array(candidate.motion.avatar_size);
                if let Some(model) = self.avatar_model.as_mut() {
                    if model.refit_fallback(size) {
                        log::info!("Fallback avatar box resized to {:?}", size);
                    }
                }
            }
            log::info!("Config reload ({reason}): motion applied");
        } else {
            log::info!("Config reload ({reason}): motion unchanged");
        }
        let pending = restart_only_changes(&self.config, &candidate);
        if !pending.is_empty() {
            log::warn!(
                "Config reload ({reason}): {} changed, takes effect on restart",
                pending.join(", ")
            );
        }
    }

    fn poll_avatar_model(&mut self) {
        if self.avatar_loader.is_finished() {
            return;
        }
        let Some(mut model) = self.avatar_loader.poll() else {
            return;
        };
        // The size may have been reloaded while the import was running.
        model.refit_fallback(Vec3::from_array(self.config.motion.avatar_size));
        let position = self.world.spawn_avatar().position;
        self.camera.snap_to(position);
        log::info!("Avatar spawned at {:?} using {}", position, model.source_label());
        self.avatar_model = Some(model);
    }

    /// Edge-triggered keys. Returns true when the game should quit.
    fn handle_key_edges(&mut self) -> bool {
        if self.input.is_just_pressed(Key::Escape) {
            return true;
        }
        if self.input.is_just_pressed(Key::F3) {
            self.overlay.toggle();
        }
        if self.input.is_just_pressed(Key::P) {
            self.toggle_pause();
        }
        if self.input.is_just_pressed(Key::N) && self.paused {
            self.single_step_requested = true;
        }
        if self.input.is_just_pressed(Key::R) {
            self.reload_config("manual trigger (R)");
        }
        false
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        log::info!(
            "Simulation {}",
            if self.paused { "PAUSED" } else { "RESUMED" }
        );
    }

    fn run_steps(&mut self) -> bool {
        while self.time.should_step() {
            // Edges are consumed by the first step of a frame only, so a
            // multi-step frame cannot toggle twice.
            if self.time.steps_this_frame == 1 && self.handle_key_edges() {
                return true;
            }
            if self.paused && !self.single_step_requested {
                break;
            }
            self.single_step_requested = false;

            let sample = self.controls.sample(&self.input);
            let input = MoveInput::new(sample.move_x, sample.move_y, sample.jump_pressed);
            let wind = self.wind_cell.load();
            let report = self.world.step(self.time.step_dt() as f32, input, wind);
            for event in &report.collected {
                self.feedback.trigger(event);
            }
            if let Some(avatar) = self.world.avatar() {
                self.camera.follow(avatar.position);
            }
        }
        false
    }

    fn overlay_stats(&self) -> OverlayStats {
        let avatar = self.world.avatar();
        let wind = self.wind_cell.load();
        OverlayStats {
            avatar_position: avatar.map(|a| a.position.to_array()),
            avatar_velocity: avatar.map(|a| a.velocity.to_array()),
            grounded: avatar.is_some_and(|a| a.grounded),
            wind: [wind.x, wind.z],
            collected: self.world.collected_count(),
            collectible_count: self.world.collectibles().len(),
            score: self.world.score(),
            triangles: (self.frame_mesh.indices.len() / 3) as u32,
            model_source: self
                .avatar_model
                .as_ref()
                .map_or_else(|| "loading...".to_string(), AvatarModel::source_label),
            step_mode: self.time.mode.label().to_string(),
            paused: self.paused,
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn upload_frame_mesh(&mut self) {
        let mut mesh = std::mem::take(&mut self.frame_mesh);
        self.scene_builder.build(
            &self.world,
            self.avatar_model.as_ref().map(|m| &m.mesh),
            &self.feedback,
            &mut mesh,
        );
        self.ensure_mesh_capacity(mesh.vertices.len(), mesh.indices.len());
        if !mesh.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&mesh.indices));
        }
        self.frame_mesh = mesh;
    }

    fn pointer_down(&mut self, pointer: PointerId, position: Vec2) {
        if self.controls.pointer_down(pointer, position) {
            log::trace!("{:?} grabbed an on-screen control", pointer);
        }
    }
}

struct App {
    config: GameConfig,
    config_path: PathBuf,
    state: Option<GameState>,
}

impl App {
    fn new(config_path: PathBuf) -> Self {
        Self {
            config: load_or_default(&config_path),
            config_path,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let platform = self.config.window.to_platform();
        let window = mh_platform::window::create_window(event_loop, &platform)
            .expect("Failed to create window");
        log::info!("Window created: {}x{}", platform.width, platform.height);
        let state = GameState::new(window, self.config.clone(), self.config_path.clone())
            .expect("Failed to initialise renderer");
        self.state = Some(state);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state.overlay.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    state.controls.relayout(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.mouse_position = (position.x, position.y);
                state.controls.pointer_moved(
                    PointerId::Mouse,
                    Vec2::new(position.x as f32, position.y as f32),
                );
            }

            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed if !egui_consumed && !state.overlay.wants_pointer() => {
                    state.input.mouse_down(MouseBtn::Left);
                    let (x, y) = state.input.mouse_position;
                    state.pointer_down(PointerId::Mouse, Vec2::new(x as f32, y as f32));
                }
                ElementState::Pressed => {}
                ElementState::Released => {
                    state.input.mouse_up(MouseBtn::Left);
                    state.controls.pointer_up(PointerId::Mouse);
                }
            },

            WindowEvent::Touch(touch) => {
                let pointer = PointerId::Touch(touch.id);
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started if !egui_consumed => state.pointer_down(pointer, position),
                    TouchPhase::Started => {}
                    TouchPhase::Moved => state.controls.pointer_moved(pointer, position),
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        state.controls.pointer_up(pointer)
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                state.time.begin_frame();
                let real_dt = state.time.real_dt;
                state.wind_timer.pump(real_dt, &state.wind_cell);
                state.feedback.advance(real_dt);
                state.poll_avatar_model();

                // Hot reload at the frame boundary (safe point).
                if state.config_watcher.should_reload() {
                    state.reload_config("file watcher");
                }

                if state.run_steps() {
                    log::info!("Escape pressed, exiting.");
                    event_loop.exit();
                    return;
                }
                state.time.end_frame();

                state.upload_frame_mesh();
                let scene_uniform = state.camera.build_uniform();
                state.gpu.queue.write_buffer(
                    &state.scene_buffer,
                    0,
                    bytemuck::cast_slice(&[scene_uniform]),
                );

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let stats = state.overlay_stats();
                let hud = HudState::from_controls(state.world.score(), &state.controls);
                let (egui_primitives, egui_textures_delta, overlay_actions) =
                    state
                        .overlay
                        .prepare(&state.window, &state.time, &stats, &hud);

                if overlay_actions.toggle_pause {
                    state.toggle_pause();
                }
                if overlay_actions.single_step {
                    state.single_step_requested = true;
                }
                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(clear_color()),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &state.gpu.depth_view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(1.0),
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        }),
                        ..Default::default()
                    });

                    let index_count = state.frame_mesh.indices.len() as u32;
                    if index_count > 0 {
                        render_pass.set_pipeline(&state.mesh_pipeline.render_pipeline);
                        render_pass.set_bind_group(0, &state.scene_bind_group, &[]);
                        render_pass.set_vertex_buffer(0, state.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(
                            state.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        render_pass.draw_indexed(0..index_count, 0, 0..1);
                    }
                }

                state.overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("egui Render Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                // Only clear edge-triggered input after at least one step
                // consumed it. Otherwise a press that lands on a frame with 0
                // simulation steps is silently lost.
                if state.time.steps_this_frame > 0 {
                    state.input.end_frame();
                }
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<MeshVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyN => Some(Key::N),
        KeyCode::KeyR => Some(Key::R),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Marshand starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(PathBuf::from(config::CONFIG_PATH));
    event_loop.run_app(&mut app).expect("Event loop error");
}
