// src/core/choice.rs

use super::constants::decision_constants::DEFAULT_WEIGHT;
use super::error::{DecisionError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::warn;

/// Fields searched, in order, for the identity of a choice.
pub const LABEL_FIELDS: [&str; 4] = ["id", "label", "name", "action"];
/// Fields searched, in order, for the raw weight of a choice.
pub const WEIGHT_FIELDS: [&str; 4] = ["weight", "score", "confidence", "priority"];
/// Field holding an explicit phase (radians).
pub const PHASE_FIELD: &str = "phase";

/// One candidate option: an immutable, key-sorted map of named fields.
///
/// Label, weight and explicit phase are resolved once at construction so the
/// engines never search the map again. A `Choice` is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Choice {
    fields: Map<String, Value>,
    label: String,
    weight: f64,
    phase: Option<f64>,
}

impl Choice {
    /// Builds a choice from its field map, resolving label, weight and phase.
    pub fn new(fields: Map<String, Value>) -> Self {
        let label = resolve_label(&fields);
        let weight = resolve_weight(&label, &fields);
        let phase = fields.get(PHASE_FIELD).and_then(Value::as_f64);
        Self { fields, label, weight, phase }
    }

    /// Builds a choice from `(key, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Shorthand for the common `{id, weight}` pair.
    pub fn weighted(id: &str, weight: f64) -> Self {
        Self::from_pairs([("id", Value::from(id)), ("weight", Value::from(weight))])
    }

    /// Parses a choice from a JSON object document.
    pub fn from_json(document: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(document)?;
        Self::try_from(value)
    }

    /// Identity of the choice: the first of `id`, `label`, `name`, `action`
    /// holding a string or number, else a structural hash of all fields.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// First numeric value among `weight`, `score`, `confidence`, `priority`,
    /// or `1.0`.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Explicit `phase` field, if numeric.
    pub fn phase(&self) -> Option<f64> {
        self.phase
    }

    /// Read-only access to the underlying fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Numeric value of a field, if present and numeric.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }
}

fn resolve_label(fields: &Map<String, Value>) -> String {
    for key in LABEL_FIELDS {
        match fields.get(key) {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    // Map keys are sorted, so the rendered object is a stable structural form.
    let rendered = Value::Object(fields.clone()).to_string();
    let mut hasher = DefaultHasher::new();
    rendered.hash(&mut hasher);
    format!("option-{:016x}", hasher.finish())
}

fn resolve_weight(label: &str, fields: &Map<String, Value>) -> f64 {
    for key in WEIGHT_FIELDS {
        let Some(value) = fields.get(key) else { continue };
        match value.as_f64() {
            Some(weight) => return weight,
            None => warn!(option = label, field = key, %value, "non-numeric weight field ignored"),
        }
    }
    DEFAULT_WEIGHT
}

impl From<Map<String, Value>> for Choice {
    fn from(fields: Map<String, Value>) -> Self {
        Choice::new(fields)
    }
}

impl From<Choice> for Map<String, Value> {
    fn from(choice: Choice) -> Self {
        choice.fields
    }
}

impl TryFrom<Value> for Choice {
    type Error = DecisionError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Choice::new(fields)),
            other => Err(DecisionError::InvalidContext {
                message: format!("a choice must be a JSON object, got {}", other),
            }),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(w={:.4})", self.label, self.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn choice(value: Value) -> Choice {
        Choice::try_from(value).expect("object literal")
    }

    #[test]
    fn label_follows_field_order() {
        assert_eq!(choice(json!({"name": "n", "label": "l", "action": "a"})).label(), "l");
        assert_eq!(choice(json!({"id": 7, "name": "n"})).label(), "7");
        assert_eq!(choice(json!({"action": "go"})).label(), "go");
    }

    #[test]
    fn label_falls_back_to_stable_structural_hash() {
        let a = choice(json!({"x": 1, "y": 2}));
        let b = choice(json!({"y": 2, "x": 1}));
        assert!(a.label().starts_with("option-"));
        assert_eq!(a.label(), b.label());
        assert_ne!(a.label(), choice(json!({"x": 2, "y": 2})).label());
    }

    #[test]
    fn weight_searches_in_order_and_defaults() {
        assert_eq!(choice(json!({"id": "a", "score": 3.0, "priority": 9})).weight(), 3.0);
        assert_eq!(choice(json!({"id": "a", "confidence": 0.4})).weight(), 0.4);
        assert_eq!(choice(json!({"id": "a"})).weight(), 1.0);
    }

    #[test]
    fn non_numeric_weight_is_skipped_not_an_error() {
        let c = choice(json!({"id": "a", "weight": "heavy", "score": 2.5}));
        assert_eq!(c.weight(), 2.5);
        let d = choice(json!({"id": "b", "weight": "heavy"}));
        assert_eq!(d.weight(), DEFAULT_WEIGHT);
    }

    #[test]
    fn serde_round_trip_keeps_fields_and_resolution() {
        let c = Choice::from_json(r#"{"id": "a", "weight": 2, "phase": 0.5}"#).unwrap();
        assert_eq!(c.phase(), Some(0.5));
        let back: Choice = serde_json::from_value(serde_json::to_value(&c).unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(matches!(Choice::from_json("[1, 2]"), Err(DecisionError::InvalidContext { .. })));
    }
}
