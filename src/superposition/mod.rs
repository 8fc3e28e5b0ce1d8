// src/superposition/mod.rs

//! Builds a normalized [`SuperpositionState`] from candidate options and a
//! [`Context`] by running the amplitude model over every option, applying the
//! context's interference events in order, and renormalizing.

use crate::amplitude;
use crate::core::constants::decision_constants::COHERENCE_PENALTY;
use crate::core::{Choice, Context, DecisionError, Result, SuperpositionState};
use rand::Rng;
use tracing::debug;

/// Orchestrates the amplitude model into a finished state.
#[derive(Debug, Clone)]
pub struct SuperpositionBuilder {
    /// Coherence lost per applied interference event.
    coherence_penalty: f64,
}

impl Default for SuperpositionBuilder {
    fn default() -> Self {
        Self { coherence_penalty: COHERENCE_PENALTY }
    }
}

impl SuperpositionBuilder {
    /// Creates a builder with the default coherence penalty (0.05 per event).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coherence_penalty(mut self, penalty: f64) -> Self {
        self.coherence_penalty = penalty;
        self
    }

    /// Builds the state for `options` under `context`.
    ///
    /// Interference events are applied in list order, each reading the
    /// amplitudes left by the previous one. Events with unknown labels or zero
    /// strength are skipped and do not count toward the coherence penalty.
    ///
    /// # Errors
    /// * `DecisionError::EmptyInput` if `options` is empty.
    pub fn create_state<R: Rng + ?Sized>(&self, options: &[Choice], context: &Context, rng: &mut R) -> Result<SuperpositionState> {
        if options.is_empty() {
            return Err(DecisionError::EmptyInput);
        }

        let mut amplitudes: Vec<_> = options
            .iter()
            .enumerate()
            .map(|(i, option)| amplitude::compute_amplitude(i, option, context, rng))
            .collect();

        let mut trace = Vec::with_capacity(context.interference.len());
        for event in &context.interference {
            amplitude::apply_interference(event, &mut amplitudes, options, &mut trace);
        }

        let coherence = (1.0 - self.coherence_penalty * trace.len() as f64).clamp(0.0, 1.0);
        debug!(options = options.len(), interference = trace.len(), coherence, "superposition built");

        Ok(SuperpositionState::from_parts(options.to_vec(), amplitudes, trace, coherence))
    }
}

/// Builds a state with the default [`SuperpositionBuilder`].
pub fn build_superposition<R: Rng + ?Sized>(options: &[Choice], context: &Context, rng: &mut R) -> Result<SuperpositionState> {
    SuperpositionBuilder::new().create_state(options, context, rng)
}
