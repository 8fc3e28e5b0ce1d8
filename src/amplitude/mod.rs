// src/amplitude/mod.rs

//! Pure functions over amplitude vectors paired with candidate options:
//! weight extraction, bias, phase assignment, interference, normalization.
//!
//! Nothing here owns state. The superposition builder, the collapse engine and
//! the entanglement engine all funnel their amplitude updates through
//! [`normalize`] so the `Σ|a_i|² = 1` invariant holds after every step.

use crate::core::constants::decision_constants::{TAU, ZERO_NORM_EPSILON};
use crate::core::{Choice, Context, InterferenceEvent, InterferenceRecord};
use num_complex::Complex;
use rand::Rng;
use std::collections::hash_map::DefaultHasher;
use std::f64::consts::PI;
use std::hash::{Hash, Hasher};
use tracing::{debug, trace};

/// Raw weight of an option (`weight`, `score`, `confidence`, `priority`, else 1.0).
pub fn extract_weight(option: &Choice) -> f64 {
    option.weight()
}

/// Bias for the option's label, falling back to `context.global_bias`.
pub fn contextual_bias(option: &Choice, context: &Context) -> f64 {
    context.bias.get(option.label()).copied().unwrap_or(context.global_bias)
}

/// Phase of the option at `index`.
///
/// Precedence: explicit `phase` field, then `context.phase_bias[label]`, then a
/// phase in `[0, 2π)` hashed from `(label, index, phase_seed)`. A positive
/// `phase_noise` then shifts the result by a uniform draw in
/// `[-phase_noise, phase_noise]` (capped at `π`); this is the only RNG draw.
pub fn resolve_phase<R: Rng + ?Sized>(index: usize, option: &Choice, context: &Context, rng: &mut R) -> f64 {
    let phase = option
        .phase()
        .or_else(|| context.phase_bias.get(option.label()).copied())
        .unwrap_or_else(|| hashed_phase(option.label(), index, context.phase_seed));

    // capped at π; NaN and negative values disable the noise
    let noise = context.phase_noise.clamp(0.0, PI);
    if noise > 0.0 {
        phase + rng.random_range(-noise..=noise)
    } else {
        phase
    }
}

/// Deterministic phase in `[0, 2π)`.
fn hashed_phase(label: &str, index: usize, seed: Option<u64>) -> f64 {
    let mut hasher = DefaultHasher::new();
    label.hash(&mut hasher);
    index.hash(&mut hasher);
    seed.hash(&mut hasher);
    // top 53 bits -> [0, 1)
    let unit = (hasher.finish() >> 11) as f64 / (1u64 << 53) as f64;
    unit * TAU
}

/// `max(0, weight · (1 + bias)) · e^{i·phase}`.
pub fn compute_amplitude<R: Rng + ?Sized>(index: usize, option: &Choice, context: &Context, rng: &mut R) -> Complex<f64> {
    let magnitude = (extract_weight(option) * (1.0 + contextual_bias(option, context))).max(0.0);
    let phase = resolve_phase(index, option, context, rng);
    Complex::from_polar(magnitude, phase)
}

/// Applies one interference event in place.
///
/// Moves `strength · cos(Δφ) · a_target` from the target to the source. Not
/// norm-preserving; callers renormalize afterwards. Returns `false` (and leaves
/// `trace` untouched) when either label is unknown or `strength == 0`.
pub fn apply_interference(
    event: &InterferenceEvent,
    amplitudes: &mut [Complex<f64>],
    options: &[Choice],
    trace: &mut Vec<InterferenceRecord>,
) -> bool {
    let source_index = options.iter().position(|c| c.label() == event.source);
    let target_index = options.iter().position(|c| c.label() == event.target);
    let (Some(si), Some(ti)) = (source_index, target_index) else {
        trace!(source = %event.source, target = %event.target, "interference skipped: unresolved label");
        return false;
    };
    if event.strength == 0.0 {
        trace!(source = %event.source, target = %event.target, "interference skipped: zero strength");
        return false;
    }

    let alignment = (amplitudes[si].arg() - amplitudes[ti].arg()).cos();
    let delta = amplitudes[ti] * (event.strength * alignment);
    amplitudes[si] += delta;
    amplitudes[ti] -= delta;

    trace.push(InterferenceRecord {
        source: event.source.clone(),
        target: event.target.clone(),
        source_index: si,
        target_index: ti,
        strength: event.strength,
        alignment,
        delta,
    });
    true
}

/// Scales `amplitudes` to unit norm and derives `|a_i|²` per entry.
///
/// A zero (or non-finite) norm falls back to the uniform real vector
/// `1/√n`, so the result is always a usable state. Empty input stays empty.
pub fn normalize(amplitudes: &[Complex<f64>]) -> (Vec<Complex<f64>>, Vec<f64>) {
    let norm_sq: f64 = amplitudes.iter().map(|a| a.norm_sqr()).sum();
    let normalized = if norm_sq > ZERO_NORM_EPSILON && norm_sq.is_finite() {
        let norm = norm_sq.sqrt();
        amplitudes.iter().map(|a| *a / norm).collect()
    } else {
        if !amplitudes.is_empty() {
            debug!(len = amplitudes.len(), norm_sq, "zero-norm amplitude vector, falling back to uniform");
        }
        uniform(amplitudes.len())
    };
    let probabilities = probabilities(&normalized);
    (normalized, probabilities)
}

/// `|a_i|²` per entry.
pub fn probabilities(amplitudes: &[Complex<f64>]) -> Vec<f64> {
    amplitudes.iter().map(|a| a.norm_sqr()).collect()
}

/// Real uniform unit vector of length `n`.
pub fn uniform(n: usize) -> Vec<Complex<f64>> {
    if n == 0 {
        return Vec::new();
    }
    vec![Complex::new(1.0 / (n as f64).sqrt(), 0.0); n]
}

/// Index of the first maximum.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
