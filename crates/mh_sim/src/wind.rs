//! Environmental wind.
//!
//! The wind is re-randomized by a timer that runs on wall-clock time,
//! independently of simulation steps. Both components live in one atomic word
//! ([`WindCell`]) so a step always reads a complete `{x, z}` pair, even if the
//! timer is later moved to its own thread.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindState {
    pub x: f32,
    pub z: f32,
}

impl WindState {
    pub const CALM: WindState = WindState { x: 0.0, z: 0.0 };

    fn to_bits(self) -> u64 {
        ((self.x.to_bits() as u64) << 32) | self.z.to_bits() as u64
    }

    fn from_bits(bits: u64) -> Self {
        Self {
            x: f32::from_bits((bits >> 32) as u32),
            z: f32::from_bits(bits as u32),
        }
    }
}

/// Single mutation point for the shared wind value.
#[derive(Debug)]
pub struct WindCell(AtomicU64);

impl WindCell {
    pub fn new(initial: WindState) -> Self {
        Self(AtomicU64::new(initial.to_bits()))
    }

    pub fn load(&self) -> WindState {
        WindState::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, wind: WindState) {
        self.0.store(wind.to_bits(), Ordering::Release);
    }
}

impl Default for WindCell {
    fn default() -> Self {
        Self::new(WindState::CALM)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    pub min_interval_secs: f64,
    pub max_interval_secs: f64,
    /// Each component is drawn from `[-strength / 2, strength / 2)`.
    pub strength: f32,
    /// `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 3.0,
            max_interval_secs: 7.0,
            strength: 200.0 / 3600.0,
            seed: None,
        }
    }
}

impl WindConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_interval_secs.is_nan() || self.min_interval_secs <= 0.0 {
            return Err("Wind validation failed: min_interval_secs must be > 0".to_string());
        }
        if self.max_interval_secs < self.min_interval_secs {
            return Err(
                "Wind validation failed: max_interval_secs must be >= min_interval_secs"
                    .to_string(),
            );
        }
        if !self.strength.is_finite() || self.strength < 0.0 {
            return Err("Wind validation failed: strength must be finite and >= 0".to_string());
        }
        Ok(())
    }
}

/// Repeating gust timer. The interval is chosen once when the timer is
/// created and then kept for the whole session.
#[derive(Debug)]
pub struct WindTimer {
    interval: f64,
    elapsed: f64,
    strength: f32,
    rng: StdRng,
}

impl WindTimer {
    pub fn new(config: &WindConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let interval = if config.max_interval_secs > config.min_interval_secs {
            rng.gen_range(config.min_interval_secs..config.max_interval_secs)
        } else {
            config.min_interval_secs
        };
        log::debug!("Wind gusts every {:.2}s", interval);
        Self {
            interval,
            elapsed: 0.0,
            strength: config.strength,
            rng,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Advance by `dt` seconds of wall time. Returns the new wind if at least
    /// one interval boundary was crossed; several missed boundaries collapse
    /// into one gust.
    pub fn advance(&mut self, dt: f64) -> Option<WindState> {
        self.elapsed += dt.max(0.0);
        if self.elapsed < self.interval {
            return None;
        }
        self.elapsed %= self.interval;
        let x = (self.rng.gen::<f32>() - 0.5) * self.strength;
        let z = (self.rng.gen::<f32>() - 0.5) * self.strength;
        Some(WindState { x, z })
    }

    /// Advance and publish any new gust into `cell`.
    pub fn pump(&mut self, dt: f64, cell: &WindCell) -> bool {
        match self.advance(dt) {
            Some(wind) => {
                cell.store(wind);
                log::debug!("Wind changed to ({:.4}, {:.4})", wind.x, wind.z);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> WindConfig {
        WindConfig {
            seed: Some(42),
            ..WindConfig::default()
        }
    }

    #[test]
    fn cell_round_trips_both_components_exactly() {
        let cell = WindCell::default();
        assert_eq!(cell.load(), WindState::CALM);
        let wind = WindState {
            x: -0.0277,
            z: f32::MIN_POSITIVE,
        };
        cell.store(wind);
        assert_eq!(cell.load(), wind);
        cell.store(WindState { x: 1.5, z: -2.25 });
        assert_eq!(cell.load(), WindState { x: 1.5, z: -2.25 });
    }

    #[test]
    fn interval_is_within_configured_range() {
        for seed in 0..32 {
            let timer = WindTimer::new(&WindConfig {
                seed: Some(seed),
                ..WindConfig::default()
            });
            assert!(timer.interval() >= 3.0 && timer.interval() < 7.0);
        }
    }

    #[test]
    fn timer_fires_only_after_interval() {
        let mut timer = WindTimer::new(&seeded());
        let interval = timer.interval();
        assert!(timer.advance(interval * 0.5).is_none());
        assert!(timer.advance(interval * 0.25).is_none());
        let gust = timer.advance(interval * 0.5).expect("interval elapsed");
        let half = WindConfig::default().strength * 0.5;
        assert!(gust.x.abs() <= half && gust.z.abs() <= half);
        // Remainder carried: a quarter interval was left over.
        assert!(timer.advance(interval * 0.5).is_none());
        assert!(timer.advance(interval * 0.3).is_some());
    }

    #[test]
    fn long_stall_produces_single_gust() {
        let mut timer = WindTimer::new(&seeded());
        let interval = timer.interval();
        assert!(timer.advance(interval * 10.5).is_some());
        assert!(timer.advance(interval * 0.4).is_none());
    }

    #[test]
    fn same_seed_same_gusts() {
        let mut a = WindTimer::new(&seeded());
        let mut b = WindTimer::new(&seeded());
        for _ in 0..5 {
            assert_eq!(a.advance(10.0), b.advance(10.0));
        }
    }

    #[test]
    fn pump_publishes_into_cell() {
        let cell = WindCell::default();
        let mut timer = WindTimer::new(&WindConfig {
            strength: 1.0,
            ..seeded()
        });
        assert!(!timer.pump(0.1, &cell));
        assert_eq!(cell.load(), WindState::CALM);
        assert!(timer.pump(timer.interval(), &cell));
        assert_ne!(cell.load(), WindState::CALM);
    }

    #[test]
    fn validate_rejects_inverted_interval() {
        let config = WindConfig {
            min_interval_secs: 5.0,
            max_interval_secs: 2.0,
            ..WindConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(WindConfig::default().validate().is_ok());
    }
}
