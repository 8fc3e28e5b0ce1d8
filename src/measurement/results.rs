// src/measurement/results.rs
use crate::core::{Choice, Context, SuperpositionState};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Bookkeeping attached to a collapse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementMetadata {
    /// The context exactly as passed to the collapse.
    pub context: Context,
    /// `context.bias` merged with the `preferred_option` boost.
    pub effective_bias: BTreeMap<String, f64>,
    /// Normalized bias-adjusted distribution the outcome was drawn from.
    pub probabilities: Vec<f64>,
    pub selected_label: String,
    /// Decoherence actually applied, after clamping into `[0, 1]`.
    pub decoherence: f64,
}

/// Outcome of collapsing a superposition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementResult {
    pub selected_index: usize,
    pub selected: Choice,
    /// Bias-adjusted probability of the selected option at selection time.
    pub probability: f64,
    /// Decayed, renormalized residual state.
    pub post_state: SuperpositionState,
    pub metadata: MeasurementMetadata,
}

impl MeasurementResult {
    pub fn selected_label(&self) -> &str {
        &self.metadata.selected_label
    }
}

impl fmt::Display for MeasurementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Measurement Result:")?;
        writeln!(f, "  Selected: {} (index {}, p={:.4})", self.selected.label(), self.selected_index, self.probability)?;
        writeln!(f, "  Decoherence: {:.3}", self.metadata.decoherence)?;
        write!(f, "  Post-state: {}", self.post_state)
    }
}
