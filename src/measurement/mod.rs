// src/measurement/mod.rs

//! Collapses a [`SuperpositionState`] into one selected option.
//!
//! A collapse resolves the context's bias into a weighted distribution,
//! selects an index (sampled or argmax), then produces a decayed residual
//! state in which the selected option keeps a real-valued `√(1-d)` amplitude
//! and every other amplitude is damped by the same factor before
//! renormalization.

mod results;

pub use results::{MeasurementMetadata, MeasurementResult};

use crate::amplitude;
use crate::core::constants::decision_constants::{DEFAULT_DECOHERENCE, DEFAULT_PREFERRED_WEIGHT};
use crate::core::{Context, DecisionError, Result, SelectionMode, SuperpositionState};
use num_complex::Complex;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::debug;

/// Collapses `state` under `context`.
///
/// The RNG is drawn from exactly once in stochastic mode and never in argmax
/// mode.
///
/// # Errors
/// * `DecisionError::EmptyState` if the state has no options.
pub fn collapse<R: Rng + ?Sized>(state: &SuperpositionState, context: &Context, rng: &mut R) -> Result<MeasurementResult> {
    if state.is_empty() {
        return Err(DecisionError::EmptyState);
    }

    let effective_bias = effective_bias(context);
    let probabilities = biased_probabilities(state, &effective_bias);

    let selected_index = match context.mode {
        SelectionMode::Argmax => amplitude::argmax(&probabilities).unwrap_or(0),
        SelectionMode::Stochastic => sample_index(&probabilities, rng),
    };

    let decoherence = context.decoherence.filter(|d| d.is_finite()).unwrap_or(DEFAULT_DECOHERENCE).clamp(0.0, 1.0);
    let post_state = decay(state, selected_index, decoherence);

    let selected = state.options()[selected_index].clone();
    debug!(selected = selected.label(), index = selected_index, mode = %context.mode, decoherence, "collapsed superposition");

    Ok(MeasurementResult {
        selected_index,
        probability: probabilities[selected_index],
        post_state,
        metadata: MeasurementMetadata {
            context: context.clone(),
            effective_bias,
            probabilities,
            selected_label: selected.label().to_string(),
            decoherence,
        },
        selected,
    })
}

/// `context.bias` plus `preferred_weight` (default 2.0) added onto the
/// preferred label's entry.
pub fn effective_bias(context: &Context) -> BTreeMap<String, f64> {
    let mut bias = context.bias.clone();
    if let Some(preferred) = &context.preferred_option {
        let boost = context.preferred_weight.unwrap_or(DEFAULT_PREFERRED_WEIGHT);
        *bias.entry(preferred.clone()).or_insert(0.0) += boost;
    }
    bias
}

/// Normalized `max(0, p_i · (1 + bias[label_i]))`; uniform when the total is zero.
pub fn biased_probabilities(state: &SuperpositionState, bias: &BTreeMap<String, f64>) -> Vec<f64> {
    let weighted: Vec<f64> = state
        .options()
        .iter()
        .zip(state.probabilities())
        .map(|(option, p)| (p * (1.0 + bias.get(option.label()).copied().unwrap_or(0.0))).max(0.0))
        .collect();

    let total: f64 = weighted.iter().sum();
    if total > 0.0 && total.is_finite() {
        weighted.into_iter().map(|w| w / total).collect()
    } else {
        debug!(len = weighted.len(), "biased distribution sums to zero, falling back to uniform");
        vec![1.0 / weighted.len() as f64; weighted.len()]
    }
}

/// Draws `u ~ U(0,1)` and returns the first index whose cumulative
/// probability reaches `u`; the last index if rounding leaves none.
pub(crate) fn sample_index<R: Rng + ?Sized>(probabilities: &[f64], rng: &mut R) -> usize {
    let u: f64 = rng.random();
    let mut cumulative = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if cumulative >= u {
            return i;
        }
    }
    probabilities.len().saturating_sub(1)
}

/// Damps every amplitude by `√(1-d)`, pins the selected one to the real value
/// `√(1-d)`, then renormalizes.
fn decay(state: &SuperpositionState, selected_index: usize, decoherence: f64) -> SuperpositionState {
    let retained = (1.0 - decoherence).sqrt();
    let mut amplitudes: Vec<Complex<f64>> = state.amplitudes().iter().map(|a| *a * retained).collect();
    amplitudes[selected_index] = Complex::new(retained, 0.0);

    let mut post_state = state.clone();
    post_state.set_amplitudes(amplitudes);
    post_state
}
