// src/annealing/schedule.rs

use crate::core::constants::decision_constants::{COMPLEXITY_SLOPE, DRIFT_THRESHOLD, FAST_COOLING, SLOW_COOLING};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// External signal describing how the objective is moving.
pub trait DriftSource: Send + Sync {
    /// Rate at which the objective drifts between runs; above 0.1 selects slow cooling.
    fn drift_rate(&self) -> f64;
    /// Energy-landscape complexity in `[0, 1]`; 0.5 is neutral.
    fn landscape_complexity(&self) -> f64;
}

/// A fixed drift/complexity reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandscapeSignal {
    pub drift_rate: f64,
    pub complexity: f64,
}

impl LandscapeSignal {
    pub fn new(drift_rate: f64, complexity: f64) -> Self {
        Self { drift_rate, complexity }
    }
}

impl DriftSource for LandscapeSignal {
    fn drift_rate(&self) -> f64 {
        self.drift_rate
    }

    fn landscape_complexity(&self) -> f64 {
        self.complexity
    }
}

/// One schedule handed out by an [`AdaptiveScheduler`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRecord {
    pub initial_temperature: f64,
    pub drift_rate: f64,
    pub complexity: f64,
    pub alpha: f64,
    pub steps: usize,
}

/// `T_i = T_0 · α^i` for `i in 0..steps`.
pub fn exponential_schedule(initial_temperature: f64, alpha: f64, steps: usize) -> Vec<f64> {
    std::iter::successors(Some(initial_temperature), |t| Some(t * alpha)).take(steps).collect()
}

/// Cooling factor for a drift/complexity reading.
///
/// Drift above the threshold selects 0.95, otherwise 0.90; complexity
/// (clamped into `[0, 1]`) then shifts α by `-(complexity - 0.5) · 0.05`.
pub fn cooling_factor(drift_rate: f64, complexity: f64) -> f64 {
    let base = if drift_rate > DRIFT_THRESHOLD { SLOW_COOLING } else { FAST_COOLING };
    base - (complexity.clamp(0.0, 1.0) - 0.5) * COMPLEXITY_SLOPE
}

/// Produces cooling schedules that react to a [`DriftSource`].
///
/// Shared across parallel annealing workers; the log of produced schedules is
/// append-only behind a lock.
pub struct AdaptiveScheduler {
    source: Box<dyn DriftSource>,
    log: Mutex<Vec<ScheduleRecord>>,
}

impl std::fmt::Debug for AdaptiveScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveScheduler")
            .field("drift_rate", &self.source.drift_rate())
            .field("complexity", &self.source.landscape_complexity())
            .field("schedules", &self.log.lock().len())
            .finish()
    }
}

impl AdaptiveScheduler {
    pub fn new(source: impl DriftSource + 'static) -> Self {
        Self { source: Box::new(source), log: Mutex::new(Vec::new()) }
    }

    /// Full schedule of `steps` temperatures starting at `initial_temperature`.
    pub fn generate_schedule(&self, initial_temperature: f64, steps: usize) -> Vec<f64> {
        let drift_rate = self.source.drift_rate();
        let complexity = self.source.landscape_complexity();
        let alpha = cooling_factor(drift_rate, complexity);
        self.log.lock().push(ScheduleRecord { initial_temperature, drift_rate, complexity, alpha, steps });
        exponential_schedule(initial_temperature, alpha, steps)
    }

    /// Every schedule produced so far, oldest first.
    pub fn history(&self) -> Vec<ScheduleRecord> {
        self.log.lock().clone()
    }
}
