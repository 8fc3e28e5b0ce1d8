// src/annealing/mod.rs

//! Simulated annealing over a discrete candidate list, with a tunneling
//! escape that accepts worse moves at a fixed rate regardless of temperature.

mod schedule;

pub use schedule::{AdaptiveScheduler, DriftSource, LandscapeSignal, ScheduleRecord, cooling_factor, exponential_schedule};

use crate::core::constants::decision_constants::{
    DEFAULT_INITIAL_TEMPERATURE, DEFAULT_MAX_ITERATIONS, DEFAULT_MIN_TEMPERATURE, DEFAULT_TUNNELING_RATE, FAST_COOLING,
    TEMPERATURE_FLOOR,
};
use crate::core::{Choice, DecisionError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Objective scoring one candidate; lower is better. `None` or NaN marks a
/// non-numeric energy.
pub type EnergyFn = dyn Fn(&Choice) -> Option<f64> + Send + Sync;

/// Annealing parameters, loadable from JSON.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConstraints {
    pub initial_temperature: f64,
    /// The run stops once the scheduled temperature drops below this.
    pub min_temperature: f64,
    pub max_iterations: usize,
    /// Probability of accepting a move regardless of its energy.
    pub tunneling_rate: f64,
    /// Used when no objective is passed to [`anneal`] directly.
    #[serde(skip)]
    pub energy_function: Option<Arc<EnergyFn>>,
}

impl Default for AnnealingConstraints {
    fn default() -> Self {
        Self {
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            min_temperature: DEFAULT_MIN_TEMPERATURE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tunneling_rate: DEFAULT_TUNNELING_RATE,
            energy_function: None,
        }
    }
}

impl fmt::Debug for AnnealingConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnealingConstraints")
            .field("initial_temperature", &self.initial_temperature)
            .field("min_temperature", &self.min_temperature)
            .field("max_iterations", &self.max_iterations)
            .field("tunneling_rate", &self.tunneling_rate)
            .field("energy_function", &self.energy_function.is_some())
            .finish()
    }
}

impl AnnealingConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_tunneling_rate(mut self, rate: f64) -> Self {
        self.tunneling_rate = rate;
        self
    }

    pub fn with_energy_function<F>(mut self, f: F) -> Self
    where
        F: Fn(&Choice) -> Option<f64> + Send + Sync + 'static,
    {
        self.energy_function = Some(Arc::new(f));
        self
    }
}

/// Run bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnealingMetadata {
    /// Last temperature a neighbor was evaluated at; the initial temperature
    /// if no step ran.
    pub final_temperature: f64,
    pub tunneling_rate: f64,
    pub schedule: Vec<f64>,
    /// Worse moves accepted by the tunneling draw alone.
    pub tunneling_acceptances: usize,
    pub initial_index: usize,
    pub initial_energy: f64,
}

/// Outcome of an annealing run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnealingResult {
    pub solution: Choice,
    pub solution_index: usize,
    pub energy: f64,
    /// Neighbor evaluations performed, accepted or not.
    pub evaluations: usize,
    /// Initial energy followed by the energy of every accepted move.
    pub energy_history: Vec<f64>,
    pub metadata: AnnealingMetadata,
}

fn evaluate(objective: &EnergyFn, candidate: &Choice) -> Result<f64> {
    match objective(candidate) {
        Some(e) if !e.is_nan() => Ok(e),
        _ => Err(DecisionError::NonNumericEnergy { candidate: candidate.label().to_string() }),
    }
}

/// Uniform draw over every index except `current`; a draw landing on
/// `current` shifts to the next index.
fn pick_neighbor<R: Rng + ?Sized>(current: usize, len: usize, rng: &mut R) -> usize {
    if len < 2 {
        return current;
    }
    let drawn = rng.random_range(0..len);
    if drawn == current { (drawn + 1) % len } else { drawn }
}

/// Searches `candidates` for the lowest energy.
///
/// The run starts from the first candidate. `objective` takes precedence over
/// `constraints.energy_function`. With a scheduler the full temperature
/// schedule is requested once up front; otherwise `T_i = T_0 · 0.9^i`.
///
/// # Errors
/// * `DecisionError::EmptySearchSpace` if `candidates` is empty.
/// * `DecisionError::MissingObjective` if no energy function is available.
/// * `DecisionError::NonNumericEnergy` if the objective yields `None` or NaN.
/// * `DecisionError::InvalidRange` if `tunneling_rate` is outside `[0, 1]`.
pub fn anneal<R: Rng + ?Sized>(
    objective: Option<&EnergyFn>,
    candidates: &[Choice],
    constraints: &AnnealingConstraints,
    scheduler: Option<&AdaptiveScheduler>,
    rng: &mut R,
) -> Result<AnnealingResult> {
    if candidates.is_empty() {
        return Err(DecisionError::EmptySearchSpace);
    }
    let objective = objective.or(constraints.energy_function.as_deref()).ok_or(DecisionError::MissingObjective)?;
    let tunneling_rate = DecisionError::check_unit_interval("tunneling_rate", constraints.tunneling_rate)?;

    let schedule = match scheduler {
        Some(s) => s.generate_schedule(constraints.initial_temperature, constraints.max_iterations),
        None => exponential_schedule(constraints.initial_temperature, FAST_COOLING, constraints.max_iterations),
    };

    let initial_index = 0;
    let initial_energy = evaluate(objective, &candidates[initial_index])?;
    let (mut current, mut current_energy) = (initial_index, initial_energy);
    let (mut best, mut best_energy) = (current, current_energy);
    let mut energy_history = vec![initial_energy];
    let mut evaluations = 0;
    let mut tunneling_acceptances = 0;
    let mut final_temperature = constraints.initial_temperature;

    for step in 0..constraints.max_iterations {
        let temperature = schedule.get(step).copied().unwrap_or(constraints.min_temperature);
        if temperature < constraints.min_temperature {
            break;
        }
        final_temperature = temperature;

        let neighbor = pick_neighbor(current, candidates.len(), rng);
        let energy = evaluate(objective, &candidates[neighbor])?;
        evaluations += 1;

        let delta = energy - current_energy;
        let accepted = if delta < 0.0 {
            true
        } else {
            let metropolis = rng.random::<f64>() < (-delta / temperature.max(TEMPERATURE_FLOOR)).exp();
            let tunneled = rng.random::<f64>() < tunneling_rate;
            if tunneled && !metropolis {
                tunneling_acceptances += 1;
            }
            metropolis || tunneled
        };

        if accepted {
            current = neighbor;
            current_energy = energy;
            energy_history.push(energy);
            if energy < best_energy {
                best = neighbor;
                best_energy = energy;
            }
        }
    }

    debug!(
        best = candidates[best].label(),
        energy = best_energy,
        evaluations,
        accepted = energy_history.len() - 1,
        tunneling_acceptances,
        final_temperature,
        "annealing finished"
    );

    Ok(AnnealingResult {
        solution: candidates[best].clone(),
        solution_index: best,
        energy: best_energy,
        evaluations,
        energy_history,
        metadata: AnnealingMetadata { final_temperature, tunneling_rate, schedule, tunneling_acceptances, initial_index, initial_energy },
    })
}

/// Runs one independent search per seed in parallel, each worker owning its
/// own `StdRng`. Results are in seed order.
pub fn anneal_parallel(
    objective: Option<&EnergyFn>,
    candidates: &[Choice],
    constraints: &AnnealingConstraints,
    scheduler: Option<&AdaptiveScheduler>,
    seeds: &[u64],
) -> Result<Vec<AnnealingResult>> {
    seeds
        .par_iter()
        .map(|seed| anneal(objective, candidates, constraints, scheduler, &mut StdRng::seed_from_u64(*seed)))
        .collect()
}

/// Lowest-energy result; ties go to the earliest.
pub fn best_of(results: &[AnnealingResult]) -> Option<&AnnealingResult> {
    results.iter().reduce(|best, r| if r.energy < best.energy { r } else { best })
}
