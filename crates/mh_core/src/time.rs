use serde::Deserialize;
use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// How wall-clock frame time is turned into simulation steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    /// Constant `fixed_dt` slices fed from an accumulator. Deterministic.
    #[default]
    Fixed,
    /// One step per rendered frame using the measured frame time. Motion
    /// tracks the wall clock exactly but replays are not reproducible.
    Measured,
}

impl StepMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Measured => "measured",
        }
    }
}

pub struct TimeState {
    pub mode: StepMode,
    pub fixed_dt: f64,
    pub max_accumulator: f64,
    accumulator: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,
    pub interpolation_alpha: f64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self::with_mode(StepMode::Fixed, 1.0 / 60.0)
    }

    pub fn with_mode(mode: StepMode, fixed_dt: f64) -> Self {
        Self {
            mode,
            fixed_dt,
            max_accumulator: 0.25,
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            interpolation_alpha: 0.0,
            fps_samples: [fixed_dt; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1.0 / fixed_dt,
            smoothed_frame_time_ms: fixed_dt * 1000.0,
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance_frame(elapsed);
    }

    /// Feed one frame of `elapsed` wall time. `begin_frame` measures it; tests
    /// call this directly.
    pub fn advance_frame(&mut self, elapsed: f64) {
        self.real_dt = elapsed;

        // Spiral-of-death cap
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms, capping to {}ms",
                self.real_dt * 1000.0,
                self.max_accumulator * 1000.0
            );
            self.real_dt = self.max_accumulator;
        }

        self.accumulator = match self.mode {
            StepMode::Fixed => (self.accumulator + self.real_dt).min(self.max_accumulator),
            StepMode::Measured => self.real_dt,
        };
        self.steps_this_frame = 0;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    /// Duration of the step `should_step` just granted.
    pub fn step_dt(&self) -> f64 {
        match self.mode {
            StepMode::Fixed => self.fixed_dt,
            StepMode::Measured => self.real_dt,
        }
    }

    pub fn should_step(&mut self) -> bool {
        match self.mode {
            StepMode::Fixed => {
                if self.accumulator >= self.fixed_dt {
                    self.accumulator -= self.fixed_dt;
                    self.record_step(self.fixed_dt);
                    true
                } else {
                    false
                }
            }
            StepMode::Measured => {
                if self.steps_this_frame == 0 && self.accumulator > 0.0 {
                    self.accumulator = 0.0;
                    self.record_step(self.real_dt);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn end_frame(&mut self) {
        self.interpolation_alpha = match self.mode {
            StepMode::Fixed => self.accumulator / self.fixed_dt,
            StepMode::Measured => 0.0,
        };
    }

    fn record_step(&mut self, dt: f64) {
        self.total_time += dt;
        self.fixed_step_count += 1;
        self.steps_this_frame += 1;
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}
