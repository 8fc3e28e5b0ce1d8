// src/history/mod.rs

//! Fixed-capacity log of past collapses, used to suggest a bias correction
//! for future collapses of the same state under the same context.

use crate::core::constants::decision_constants::DEFAULT_HISTORY_CAPACITY;
use crate::core::{Context, SuperpositionState};
use crate::measurement::MeasurementResult;
use serde::Serialize;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::time::SystemTime;
use tracing::trace;

// Context keys that steer a single collapse and do not identify the situation.
const VOLATILE_CONTEXT_KEYS: [&str; 3] = ["bias", "preferred_option", "preferred_weight"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: SystemTime,
    pub state_signature: String,
    pub context_signature: String,
    pub outcome: String,
    pub probability: f64,
}

/// Signature of a state: hash of its sorted option labels.
pub fn state_signature(state: &SuperpositionState) -> String {
    let mut labels: Vec<&str> = state.labels().collect();
    labels.sort_unstable();
    let mut hasher = DefaultHasher::new();
    labels.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Signature of a context with its volatile keys removed.
pub fn context_signature(context: &Context) -> String {
    let mut value = serde_json::to_value(context).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        for key in VOLATILE_CONTEXT_KEYS {
            map.remove(key);
        }
    }
    let mut hasher = DefaultHasher::new();
    value.to_string().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// FIFO ring of [`HistoryEntry`]; the oldest entry is evicted at capacity.
#[derive(Debug, Clone)]
pub struct MeasurementHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for MeasurementHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl MeasurementHistory {
    /// A history holding at most `capacity` entries. Zero capacity records nothing.
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)), capacity }
    }

    pub fn record(&mut self, state: &SuperpositionState, context: &Context, outcome: impl Into<String>, probability: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        let entry = HistoryEntry {
            timestamp: SystemTime::now(),
            state_signature: state_signature(state),
            context_signature: context_signature(context),
            outcome: outcome.into(),
            probability,
        };
        trace!(outcome = %entry.outcome, state = %entry.state_signature, context = %entry.context_signature, "recorded outcome");
        self.entries.push_back(entry);
    }

    /// Records a collapse outcome under the context it was made with.
    pub fn record_measurement(&mut self, result: &MeasurementResult) {
        self.record(&result.post_state, &result.metadata.context, result.selected_label(), result.probability);
    }

    /// Empirical outcome frequency minus `1 / state.len()` for each label seen
    /// under matching signatures. Empty when nothing matches; unseen labels
    /// are omitted.
    pub fn estimate_future_bias(&self, state: &SuperpositionState, context: &Context) -> BTreeMap<String, f64> {
        let (state_sig, context_sig) = (state_signature(state), context_signature(context));
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut total = 0usize;
        for entry in self.entries.iter().filter(|e| e.state_signature == state_sig && e.context_signature == context_sig) {
            *counts.entry(entry.outcome.clone()).or_insert(0) += 1;
            total += 1;
        }
        if total == 0 || state.is_empty() {
            return BTreeMap::new();
        }
        let baseline = 1.0 / state.len() as f64;
        counts.into_iter().map(|(label, n)| (label, n as f64 / total as f64 - baseline)).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Choice, SelectionMode};
    use num_complex::Complex;

    fn state(labels: &[&str]) -> SuperpositionState {
        let options = labels.iter().map(|l| Choice::weighted(l, 1.0)).collect();
        SuperpositionState::from_amplitudes(options, vec![Complex::new(1.0, 0.0); labels.len()]).unwrap()
    }

    #[test]
    fn state_signature_ignores_option_order() {
        assert_eq!(state_signature(&state(&["a", "b"])), state_signature(&state(&["b", "a"])));
        assert_ne!(state_signature(&state(&["a", "b"])), state_signature(&state(&["a", "c"])));
    }

    #[test]
    fn context_signature_ignores_volatile_keys() {
        let base = Context::new().with_decoherence(0.3);
        let steered = base.clone().with_bias("a", 2.0).with_preferred("b", Some(1.0));
        assert_eq!(context_signature(&base), context_signature(&steered));
        assert_ne!(context_signature(&base), context_signature(&base.clone().with_mode(SelectionMode::Argmax)));
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let mut history = MeasurementHistory::new(2);
        let s = state(&["a", "b"]);
        let ctx = Context::new();
        for outcome in ["a", "b", "b"] {
            history.record(&s, &ctx, outcome, 0.5);
        }
        assert_eq!(history.len(), 2);
        assert!(history.entries().all(|e| e.outcome == "b"));
        let mut none = MeasurementHistory::new(0);
        none.record(&s, &ctx, "a", 0.5);
        assert!(none.is_empty());
    }

    #[test]
    fn bias_estimate_is_frequency_minus_uniform_baseline() {
        let mut history = MeasurementHistory::default();
        let s = state(&["a", "b", "c", "d"]);
        let ctx = Context::new();
        for outcome in ["a", "a", "a", "b"] {
            history.record(&s, &ctx, outcome, 0.25);
        }
        history.record(&state(&["x", "y"]), &ctx, "x", 0.5);

        let bias = history.estimate_future_bias(&s, &ctx);
        assert_eq!(bias.len(), 2);
        assert!((bias["a"] - 0.5).abs() < 1e-12);
        assert!((bias["b"] - 0.0).abs() < 1e-12);
        assert!(!bias.contains_key("c"));
        assert!(history.estimate_future_bias(&s, &ctx.clone().with_decoherence(0.9)).is_empty());
    }
}
