// src/core/context.rs

use super::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a collapse picks its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SelectionMode {
    /// Sample from the bias-adjusted distribution.
    #[default]
    Stochastic,
    /// Take the highest bias-adjusted probability; ties go to the lowest index.
    Argmax,
}

impl From<String> for SelectionMode {
    // Anything but "argmax" samples.
    fn from(mode: String) -> Self {
        if mode.eq_ignore_ascii_case("argmax") {
            SelectionMode::Argmax
        } else {
            SelectionMode::Stochastic
        }
    }
}

impl From<SelectionMode> for String {
    fn from(mode: SelectionMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Stochastic => write!(f, "stochastic"),
            SelectionMode::Argmax => write!(f, "argmax"),
        }
    }
}

/// A pairwise interference instruction between two labelled options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterferenceEvent {
    pub source: String,
    pub target: String,
    pub strength: f64,
}

impl InterferenceEvent {
    pub fn new(source: impl Into<String>, target: impl Into<String>, strength: f64) -> Self {
        Self { source: source.into(), target: target.into(), strength }
    }
}

/// Caller-supplied context for building and collapsing a superposition.
///
/// Every key is optional; a missing key takes the documented default. The
/// struct deserializes from the JSON key/value form (`bias`, `global_bias`,
/// `preferred_option`, `preferred_weight`, `mode`, `decoherence`,
/// `phase_bias`, `phase_seed`, `phase_noise`, `interference`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    /// Additive bias per option label.
    pub bias: BTreeMap<String, f64>,
    /// Bias for labels absent from `bias`.
    pub global_bias: f64,
    /// Label that receives an extra `preferred_weight` bias at collapse.
    pub preferred_option: Option<String>,
    /// Defaults to 2.0.
    pub preferred_weight: Option<f64>,
    pub mode: SelectionMode,
    /// Clamped into `[0, 1]`; defaults to 0.18.
    pub decoherence: Option<f64>,
    /// Phase per label, used when the option has no explicit `phase`.
    pub phase_bias: BTreeMap<String, f64>,
    pub phase_seed: Option<u64>,
    /// Half-width of the uniform phase perturbation; 0 disables it.
    pub phase_noise: f64,
    /// Applied in list order.
    pub interference: Vec<InterferenceEvent>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a context from its JSON form.
    pub fn from_json(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn with_bias(mut self, label: impl Into<String>, bias: f64) -> Self {
        self.bias.insert(label.into(), bias);
        self
    }

    pub fn with_global_bias(mut self, bias: f64) -> Self {
        self.global_bias = bias;
        self
    }

    pub fn with_preferred(mut self, label: impl Into<String>, weight: Option<f64>) -> Self {
        self.preferred_option = Some(label.into());
        self.preferred_weight = weight;
        self
    }

    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_decoherence(mut self, decoherence: f64) -> Self {
        self.decoherence = Some(decoherence);
        self
    }

    pub fn with_phase_bias(mut self, label: impl Into<String>, phase: f64) -> Self {
        self.phase_bias.insert(label.into(), phase);
        self
    }

    pub fn with_phase_seed(mut self, seed: u64) -> Self {
        self.phase_seed = Some(seed);
        self
    }

    pub fn with_phase_noise(mut self, noise: f64) -> Self {
        self.phase_noise = noise;
        self
    }

    pub fn with_interference(mut self, source: impl Into<String>, target: impl Into<String>, strength: f64) -> Self {
        self.interference.push(InterferenceEvent::new(source, target, strength));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_with_defaults() -> Result<()> {
        let ctx = Context::from_json(
            r#"{"mode": "argmax", "bias": {"b": 5.0}, "interference": [{"source": "a", "target": "b", "strength": 0.3}]}"#,
        )?;
        assert_eq!(ctx.mode, SelectionMode::Argmax);
        assert_eq!(ctx.bias.get("b"), Some(&5.0));
        assert_eq!(ctx.interference, vec![InterferenceEvent::new("a", "b", 0.3)]);
        assert_eq!(ctx.decoherence, None);
        assert_eq!(ctx.global_bias, 0.0);
        Ok(())
    }

    #[test]
    fn unknown_mode_means_stochastic() -> Result<()> {
        assert_eq!(Context::from_json(r#"{"mode": "whatever"}"#)?.mode, SelectionMode::Stochastic);
        Ok(())
    }

    #[test]
    fn malformed_json_is_an_invalid_context() {
        assert!(matches!(
            Context::from_json("{not json"),
            Err(crate::DecisionError::InvalidContext { .. })
        ));
    }
}
