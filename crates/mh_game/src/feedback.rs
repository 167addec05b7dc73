use std::collections::HashMap;

use mh_sim::CollectionEvent;

pub const PULSE_SCALE: f32 = 1.2;
pub const PULSE_SECS: f64 = 0.2;

/// Short scale-up pulse on freshly collected boxes, timed in wall-clock
/// seconds so it looks the same regardless of step rate.
#[derive(Debug, Default)]
pub struct CollectFeedback {
    remaining: HashMap<u32, f64>,
}

impl CollectFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&mut self, event: &CollectionEvent) {
        self.remaining.insert(event.id, PULSE_SECS);
    }

    pub fn advance(&mut self, dt: f64) {
        self.remaining.retain(|_, left| {
            *left -= dt.max(0.0);
            *left > 0.0
        });
    }

    pub fn scale(&self, id: u32) -> f32 {
        if self.remaining.contains_key(&id) {
            PULSE_SCALE
        } else {
            1.0
        }
    }

    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.remaining.len()
    }
}
