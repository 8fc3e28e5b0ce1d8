// src/entanglement/link.rs

use crate::core::constants::decision_constants::{
    ANTI_CORRELATED_ENTROPY_FACTOR, CONDITIONAL_ENTROPY_FACTOR, CORRELATED_ENTROPY_FACTOR, FEEDBACK_ENTROPY_FACTOR,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

/// How a measurement on one endpoint reshapes the other endpoint's amplitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntanglementType {
    /// Adds the measured amplitude (phase-shifted) at the matching index.
    Correlated,
    /// Damps the matching index by the measured magnitude.
    AntiCorrelated,
    /// Boosts the matching index and damps every other index.
    Conditional,
    /// Half-strength correlated boost plus a weak boost everywhere else.
    Feedback,
}

impl EntanglementType {
    /// Fixed per-type factor of the entropy proxy.
    pub fn entropy_factor(self) -> f64 {
        match self {
            EntanglementType::Correlated => CORRELATED_ENTROPY_FACTOR,
            EntanglementType::AntiCorrelated => ANTI_CORRELATED_ENTROPY_FACTOR,
            EntanglementType::Conditional => CONDITIONAL_ENTROPY_FACTOR,
            EntanglementType::Feedback => FEEDBACK_ENTROPY_FACTOR,
        }
    }
}

impl fmt::Display for EntanglementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntanglementType::Correlated => "correlated",
            EntanglementType::AntiCorrelated => "anti_correlated",
            EntanglementType::Conditional => "conditional",
            EntanglementType::Feedback => "feedback",
        };
        write!(f, "{}", name)
    }
}

/// An edge between two registered states.
///
/// Held by both endpoints; effects flow from whichever endpoint is measured to
/// the other one. Only `strength` changes after creation (decoherence decay).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntanglementLink {
    /// Position in the manager's link arena.
    pub id: usize,
    pub source: String,
    pub target: String,
    pub kind: EntanglementType,
    /// In `[0, 1]`.
    pub strength: f64,
    /// Radians.
    pub phase_offset: f64,
    pub created_at: SystemTime,
    pub metadata: BTreeMap<String, Value>,
}

impl EntanglementLink {
    /// The endpoint opposite `id`, or `None` if `id` is not an endpoint.
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }

    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

impl fmt::Display for EntanglementLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-{}-> {} (s={:.3}, φ={:.3})", self.source, self.kind, self.target, self.strength, self.phase_offset)
    }
}
