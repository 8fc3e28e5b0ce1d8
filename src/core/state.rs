// src/core/state.rs

use super::choice::Choice;
use super::error::{DecisionError, Result};
use crate::amplitude;
use num_complex::Complex;
use serde::Serialize;
use std::fmt;

/// Record of one interference event actually applied while building a state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterferenceRecord {
    pub source: String,
    pub target: String,
    pub source_index: usize,
    pub target_index: usize,
    pub strength: f64,
    /// `cos(arg(a_source) - arg(a_target))` before the event.
    pub alignment: f64,
    /// Amount added to the source and subtracted from the target.
    pub delta: Complex<f64>,
}

/// Options paired 1:1 with complex amplitudes.
///
/// Invariants held by every constructor and mutation path:
/// - `options.len() == amplitudes.len() == probabilities.len()`
/// - `Σ|amplitudes[i]|² ≈ 1` for non-empty states
/// - `probabilities[i] == |amplitudes[i]|²`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SuperpositionState {
    options: Vec<Choice>,
    amplitudes: Vec<Complex<f64>>,
    probabilities: Vec<f64>,
    interference: Vec<InterferenceRecord>,
    coherence: f64,
}

impl SuperpositionState {
    /// Builds a state from caller-supplied amplitudes, renormalizing them.
    /// Coherence starts at 1.0 since no interference was applied.
    pub fn from_amplitudes(options: Vec<Choice>, amplitudes: Vec<Complex<f64>>) -> Result<Self> {
        if options.len() != amplitudes.len() {
            return Err(DecisionError::LengthMismatch { options: options.len(), amplitudes: amplitudes.len() });
        }
        Ok(Self::from_parts(options, amplitudes, Vec::new(), 1.0))
    }

    pub(crate) fn from_parts(
        options: Vec<Choice>,
        amplitudes: Vec<Complex<f64>>,
        interference: Vec<InterferenceRecord>,
        coherence: f64,
    ) -> Self {
        let (amplitudes, probabilities) = amplitude::normalize(&amplitudes);
        Self { options, amplitudes, probabilities, interference, coherence }
    }

    /// Assembles a state verbatim, skipping normalization.
    #[cfg(test)]
    pub(crate) fn from_raw_parts(options: Vec<Choice>, amplitudes: Vec<Complex<f64>>, probabilities: Vec<f64>) -> Self {
        Self { options, amplitudes, probabilities, interference: Vec::new(), coherence: 1.0 }
    }

    pub fn options(&self) -> &[Choice] {
        &self.options
    }

    /// Provides read-only access to the amplitude vector.
    pub fn amplitudes(&self) -> &[Complex<f64>] {
        &self.amplitudes
    }

    /// `|amplitude|²` per option.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn interference(&self) -> &[InterferenceRecord] {
        &self.interference
    }

    /// Heuristic score in `[0, 1]`; lower means more interference was applied.
    pub fn coherence(&self) -> f64 {
        self.coherence
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(Choice::label)
    }

    /// Index of the first option with the given label.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.options.iter().position(|c| c.label() == label)
    }

    /// Index of the highest probability; ties go to the lowest index.
    pub fn most_probable(&self) -> Option<usize> {
        amplitude::argmax(&self.probabilities)
    }

    /// Shannon entropy (nats) of the probability vector.
    pub fn entropy(&self) -> f64 {
        -self.probabilities.iter().filter(|p| **p > 0.0).map(|p| p * p.ln()).sum::<f64>()
    }

    /// Replaces the amplitude vector, then renormalizes and refreshes the
    /// probabilities. Length must match; callers inside the crate guarantee it.
    pub(crate) fn set_amplitudes(&mut self, amplitudes: Vec<Complex<f64>>) {
        debug_assert_eq!(amplitudes.len(), self.options.len());
        let (amplitudes, probabilities) = amplitude::normalize(&amplitudes);
        self.amplitudes = amplitudes;
        self.probabilities = probabilities;
    }
}

impl fmt::Display for SuperpositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Superposition[")?;
        for (i, (choice, amp)) in self.options.iter().zip(&self.amplitudes).enumerate() {
            write!(f, "{}{}: {:.4} (p={:.4})", if i > 0 { ", " } else { "" }, choice.label(), amp, self.probabilities[i])?;
        }
        write!(f, "] coherence={:.3}", self.coherence)
    }
}
