// src/entanglement/manager.rs

use super::link::{EntanglementLink, EntanglementType};
use crate::core::{DecisionError, Result, SuperpositionState};
use crate::measurement;
use num_complex::Complex;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;
use tracing::debug;

/// One measurement taken on a registered state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub state_id: String,
    pub option_index: usize,
    /// Amplitude of the measured option at measurement time.
    pub amplitude: Complex<f64>,
    pub probability: f64,
    pub timestamp: SystemTime,
}

/// A registered state, the ids of the links touching it, and its
/// append-only measurement history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntangledSuperpositionState {
    pub id: String,
    pub state: SuperpositionState,
    /// Indices into the manager's link arena.
    pub links: Vec<usize>,
    pub measurements: Vec<MeasurementRecord>,
}

/// Change of one amplitude in a target state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmplitudeChange {
    pub index: usize,
    pub before: Complex<f64>,
    /// Value after the renormalization that closes the effect.
    pub after: Complex<f64>,
}

/// One link's effect on its non-measured endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntanglementEffect {
    pub link_id: usize,
    pub target: String,
    pub kind: EntanglementType,
    /// Indices the link type touched, in ascending order.
    pub changes: Vec<AmplitudeChange>,
}

/// Result of [`QuantumEntanglementManager::measure_with_entanglement`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntangledMeasurement {
    pub record: MeasurementRecord,
    pub label: String,
    /// One entry per link of the measured state, in link creation order.
    pub effects: Vec<EntanglementEffect>,
}

#[derive(Debug)]
struct Registry<R> {
    states: BTreeMap<String, EntangledSuperpositionState>,
    links: Vec<EntanglementLink>,
    adjacency: BTreeMap<String, BTreeSet<String>>,
    rng: R,
}

/// Registry of states and typed links between them.
///
/// Everything lives behind one lock: a measurement reads the measured state
/// and rewrites every linked state in a single transaction, so two
/// measurements never interleave. Links live in an arena and are referred to
/// by index; states refer to links, never to each other.
#[derive(Debug)]
pub struct QuantumEntanglementManager<R = StdRng> {
    inner: Mutex<Registry<R>>,
}

impl<R: Rng> QuantumEntanglementManager<R> {
    /// Creates an empty manager drawing measurement samples from `rng`.
    pub fn new(rng: R) -> Self {
        Self { inner: Mutex::new(Registry { states: BTreeMap::new(), links: Vec::new(), adjacency: BTreeMap::new(), rng }) }
    }

    /// Registers `state` under `id`.
    ///
    /// # Errors
    /// * `DecisionError::DuplicateId` if `id` is already registered.
    pub fn register_state(&self, id: impl Into<String>, state: SuperpositionState) -> Result<()> {
        let id = id.into();
        let mut reg = self.inner.lock();
        if reg.states.contains_key(&id) {
            return Err(DecisionError::DuplicateId { id });
        }
        reg.adjacency.entry(id.clone()).or_default();
        reg.states.insert(id.clone(), EntangledSuperpositionState { id, state, links: Vec::new(), measurements: Vec::new() });
        Ok(())
    }

    /// Links `a` and `b` and returns the new link's id.
    ///
    /// # Errors
    /// * `DecisionError::UnknownId` if either endpoint is unregistered.
    /// * `DecisionError::SelfEntanglement` if `a == b`.
    /// * `DecisionError::InvalidRange` if `strength` is outside `[0, 1]`.
    pub fn create_entanglement(&self, a: &str, b: &str, kind: EntanglementType, strength: f64, phase_offset: f64) -> Result<usize> {
        self.create_entanglement_with_metadata(a, b, kind, strength, phase_offset, BTreeMap::new())
    }

    /// [`Self::create_entanglement`] with free-form metadata attached to the link.
    pub fn create_entanglement_with_metadata(
        &self,
        a: &str,
        b: &str,
        kind: EntanglementType,
        strength: f64,
        phase_offset: f64,
        metadata: BTreeMap<String, Value>,
    ) -> Result<usize> {
        let mut reg = self.inner.lock();
        for id in [a, b] {
            if !reg.states.contains_key(id) {
                return Err(DecisionError::UnknownId { id: id.to_string() });
            }
        }
        if a == b {
            return Err(DecisionError::SelfEntanglement { id: a.to_string() });
        }
        let strength = DecisionError::check_unit_interval("strength", strength)?;

        let link_id = reg.links.len();
        reg.links.push(EntanglementLink {
            id: link_id,
            source: a.to_string(),
            target: b.to_string(),
            kind,
            strength,
            phase_offset,
            created_at: SystemTime::now(),
            metadata,
        });
        for (from, to) in [(a, b), (b, a)] {
            if let Some(entry) = reg.states.get_mut(from) {
                entry.links.push(link_id);
            }
            reg.adjacency.entry(from.to_string()).or_default().insert(to.to_string());
        }
        debug!(link_id, source = a, target = b, %kind, strength, "created entanglement link");
        Ok(link_id)
    }

    /// Measures state `id` and propagates the outcome over every link.
    ///
    /// With `option_index == None` the index is sampled from the state's
    /// probabilities. The measured state keeps its amplitudes; only its
    /// history grows.
    ///
    /// # Errors
    /// * `DecisionError::UnknownId` if `id` is unregistered.
    /// * `DecisionError::EmptyState` if the state has no options.
    /// * `DecisionError::IndexOutOfRange` if `option_index` is out of range.
    pub fn measure_with_entanglement(&self, id: &str, option_index: Option<usize>) -> Result<EntangledMeasurement> {
        let mut guard = self.inner.lock();
        let reg = &mut *guard;

        let entry = reg.states.get(id).ok_or_else(|| DecisionError::UnknownId { id: id.to_string() })?;
        let state = &entry.state;
        if state.is_empty() {
            return Err(DecisionError::EmptyState);
        }
        let index = match option_index {
            Some(i) if i >= state.len() => return Err(DecisionError::IndexOutOfRange { index: i, len: state.len() }),
            Some(i) => i,
            None => measurement::sample_index(state.probabilities(), &mut reg.rng),
        };

        let record = MeasurementRecord {
            state_id: id.to_string(),
            option_index: index,
            amplitude: state.amplitudes()[index],
            probability: state.probabilities()[index],
            timestamp: SystemTime::now(),
        };
        let label = state.options()[index].label().to_string();
        let link_ids = entry.links.clone();

        let mut effects = Vec::with_capacity(link_ids.len());
        for link_id in link_ids {
            let link = &reg.links[link_id];
            let Some(target_id) = link.other(id) else { continue };
            let Some(target) = reg.states.get_mut(target_id) else { continue };
            let changes = apply_entanglement_effect(link, &mut target.state, index, record.amplitude);
            debug!(link_id, source = id, target = target_id, kind = %link.kind, changed = changes.len(), "propagated entanglement effect");
            effects.push(EntanglementEffect { link_id, target: target_id.to_string(), kind: link.kind, changes });
        }

        if let Some(entry) = reg.states.get_mut(id) {
            entry.measurements.push(record.clone());
        }
        Ok(EntangledMeasurement { record, label, effects })
    }

    /// Simplified entropy proxy: `strength · type_factor` of the first link
    /// joining `a` and `b`, or 0 when they are not linked.
    pub fn calculate_entanglement_entropy(&self, a: &str, b: &str) -> f64 {
        let reg = self.inner.lock();
        reg.links
            .iter()
            .find(|link| link.connects(a, b))
            .map_or(0.0, |link| link.strength * link.kind.entropy_factor())
    }

    /// Multiplies one link's strength by `1 - rate`.
    ///
    /// # Errors
    /// * `DecisionError::IndexOutOfRange` if `link_id` does not exist.
    /// * `DecisionError::InvalidRange` if `rate` is outside `[0, 1]`.
    pub fn decay_link(&self, link_id: usize, rate: f64) -> Result<f64> {
        let rate = DecisionError::check_unit_interval("rate", rate)?;
        let mut reg = self.inner.lock();
        let len = reg.links.len();
        let link = reg.links.get_mut(link_id).ok_or(DecisionError::IndexOutOfRange { index: link_id, len })?;
        link.strength *= 1.0 - rate;
        Ok(link.strength)
    }

    /// Multiplies every link's strength by `1 - rate`.
    pub fn decay_links(&self, rate: f64) -> Result<()> {
        let rate = DecisionError::check_unit_interval("rate", rate)?;
        let mut reg = self.inner.lock();
        for link in reg.links.iter_mut() {
            link.strength *= 1.0 - rate;
        }
        Ok(())
    }

    /// Snapshot of the state registered under `id`.
    pub fn state(&self, id: &str) -> Option<SuperpositionState> {
        self.inner.lock().states.get(id).map(|e| e.state.clone())
    }

    /// Snapshot of the full registry entry for `id`.
    pub fn entry(&self, id: &str) -> Option<EntangledSuperpositionState> {
        self.inner.lock().states.get(id).cloned()
    }

    /// Links touching `id`, in creation order.
    pub fn links(&self, id: &str) -> Result<Vec<EntanglementLink>> {
        let reg = self.inner.lock();
        let entry = reg.states.get(id).ok_or_else(|| DecisionError::UnknownId { id: id.to_string() })?;
        Ok(entry.links.iter().map(|&l| reg.links[l].clone()).collect())
    }

    pub fn link(&self, link_id: usize) -> Option<EntanglementLink> {
        self.inner.lock().links.get(link_id).cloned()
    }

    /// Ids adjacent to `id`, sorted.
    pub fn neighbors(&self, id: &str) -> Result<Vec<String>> {
        let reg = self.inner.lock();
        reg.adjacency
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .ok_or_else(|| DecisionError::UnknownId { id: id.to_string() })
    }

    pub fn measurement_history(&self, id: &str) -> Result<Vec<MeasurementRecord>> {
        let reg = self.inner.lock();
        reg.states
            .get(id)
            .map(|e| e.measurements.clone())
            .ok_or_else(|| DecisionError::UnknownId { id: id.to_string() })
    }

    pub fn len(&self) -> usize {
        self.inner.lock().states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().states.is_empty()
    }
}

impl Default for QuantumEntanglementManager<StdRng> {
    fn default() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

/// Applies `link`'s effect of measuring option `index` (amplitude `measured`)
/// onto `target`, renormalizing afterwards.
///
/// An `index` outside the target leaves Correlated and AntiCorrelated links
/// without effect; Conditional and Feedback links still apply their
/// "elsewhere" factors to every index.
pub fn apply_entanglement_effect(
    link: &EntanglementLink,
    target: &mut SuperpositionState,
    index: usize,
    measured: Complex<f64>,
) -> Vec<AmplitudeChange> {
    let before = target.amplitudes().to_vec();
    let mut amplitudes = before.clone();
    let s = link.strength;
    let magnitude = measured.norm();
    let rotated = measured * Complex::from_polar(1.0, link.phase_offset);

    let touched: Vec<usize> = match link.kind {
        EntanglementType::Correlated => match amplitudes.get_mut(index) {
            Some(a) => {
                *a += rotated * s;
                vec![index]
            }
            None => Vec::new(),
        },
        EntanglementType::AntiCorrelated => match amplitudes.get_mut(index) {
            Some(a) => {
                *a *= 1.0 - s * magnitude;
                vec![index]
            }
            None => Vec::new(),
        },
        EntanglementType::Conditional => {
            for (i, a) in amplitudes.iter_mut().enumerate() {
                let factor = if i == index { 1.0 + s * magnitude } else { 1.0 - 0.5 * s * magnitude };
                *a *= factor;
            }
            (0..amplitudes.len()).collect()
        }
        EntanglementType::Feedback => {
            let boost = rotated * (0.5 * s);
            for (i, a) in amplitudes.iter_mut().enumerate() {
                *a += if i == index { boost } else { boost * 0.1 };
            }
            (0..amplitudes.len()).collect()
        }
    };

    target.set_amplitudes(amplitudes);
    touched
        .into_iter()
        .map(|i| AmplitudeChange { index: i, before: before[i], after: target.amplitudes()[i] })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Choice;
    use crate::validation::validate_state;

    fn state(amps: &[f64]) -> SuperpositionState {
        let options = (0..amps.len()).map(|i| Choice::weighted(&format!("o{}", i), 1.0)).collect();
        SuperpositionState::from_amplitudes(options, amps.iter().map(|a| Complex::new(*a, 0.0)).collect()).unwrap()
    }

    fn link(kind: EntanglementType, strength: f64) -> EntanglementLink {
        EntanglementLink {
            id: 0,
            source: "a".into(),
            target: "b".into(),
            kind,
            strength,
            phase_offset: 0.0,
            created_at: SystemTime::now(),
            metadata: BTreeMap::new(),
        }
    }

    fn manager() -> QuantumEntanglementManager {
        QuantumEntanglementManager::new(StdRng::seed_from_u64(7))
    }

    #[test]
    fn duplicate_registration_is_rejected() -> Result<()> {
        let m = manager();
        m.register_state("a", state(&[1.0]))?;
        assert_eq!(m.register_state("a", state(&[1.0])), Err(DecisionError::DuplicateId { id: "a".into() }));
        assert_eq!(m.len(), 1);
        Ok(())
    }

    #[test]
    fn link_validation() -> Result<()> {
        let m = manager();
        m.register_state("a", state(&[1.0]))?;
        m.register_state("b", state(&[1.0]))?;
        assert_eq!(m.create_entanglement("a", "z", EntanglementType::Correlated, 0.5, 0.0), Err(DecisionError::UnknownId { id: "z".into() }));
        assert_eq!(m.create_entanglement("a", "a", EntanglementType::Correlated, 0.5, 0.0), Err(DecisionError::SelfEntanglement { id: "a".into() }));
        assert!(matches!(m.create_entanglement("a", "b", EntanglementType::Correlated, 1.5, 0.0), Err(DecisionError::InvalidRange { .. })));
        assert!(m.links("a")?.is_empty());
        Ok(())
    }

    #[test]
    fn correlated_adds_phase_shifted_amplitude_at_matching_index() {
        let mut target = state(&[1.0, 1.0]);
        let mut l = link(EntanglementType::Correlated, 1.0);
        l.phase_offset = std::f64::consts::PI;
        let measured = Complex::new(0.5_f64.sqrt(), 0.0);
        let changes = apply_entanglement_effect(&l, &mut target, 0, measured);
        // e^{iπ} cancels the matching amplitude entirely
        assert_eq!(changes.len(), 1);
        assert!(target.probabilities()[0] < 1e-12);
        assert!(validate_state(&target, None).is_ok());
    }

    #[test]
    fn anti_correlated_damps_matching_index() {
        let mut target = state(&[1.0, 1.0]);
        apply_entanglement_effect(&link(EntanglementType::AntiCorrelated, 0.5), &mut target, 1, Complex::new(1.0, 0.0));
        // b scaled by 0.5 -> probabilities 1 : 0.25
        assert!((target.probabilities()[0] - 0.8).abs() < 1e-12);
        assert!((target.probabilities()[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn conditional_boosts_match_and_damps_the_rest() {
        let mut target = state(&[1.0, 1.0, 1.0]);
        let changes = apply_entanglement_effect(&link(EntanglementType::Conditional, 1.0), &mut target, 2, Complex::new(0.5, 0.0));
        assert_eq!(changes.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        // factors 0.75, 0.75, 1.5
        let total = 2.0 * 0.75_f64.powi(2) + 1.5_f64.powi(2);
        assert!((target.probabilities()[2] - 1.5_f64.powi(2) / total).abs() < 1e-12);
        assert!(validate_state(&target, None).is_ok());
    }

    #[test]
    fn feedback_boosts_everything_mostly_the_match() {
        let mut target = state(&[1.0, 1.0]);
        apply_entanglement_effect(&link(EntanglementType::Feedback, 1.0), &mut target, 0, Complex::new(1.0, 0.0));
        let a = 0.5_f64.sqrt() + 0.5;
        let b = 0.5_f64.sqrt() + 0.05;
        assert!((target.probabilities()[0] - a * a / (a * a + b * b)).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_index_only_applies_elsewhere_factors() {
        let mut target = state(&[1.0, 3.0]);
        let before = target.clone();
        assert!(apply_entanglement_effect(&link(EntanglementType::Correlated, 1.0), &mut target, 5, Complex::new(1.0, 0.0)).is_empty());
        for (p, q) in target.probabilities().iter().zip(before.probabilities()) {
            assert!((p - q).abs() < 1e-12);
        }
        let changes = apply_entanglement_effect(&link(EntanglementType::Conditional, 1.0), &mut target, 5, Complex::new(1.0, 0.0));
        assert_eq!(changes.len(), 2);
        // uniform damping keeps the ratio
        assert!((target.probabilities()[1] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn measurement_records_history_and_rejects_bad_index() -> Result<()> {
        let m = manager();
        m.register_state("a", state(&[1.0, 1.0]))?;
        assert_eq!(m.measure_with_entanglement("a", Some(2)).unwrap_err(), DecisionError::IndexOutOfRange { index: 2, len: 2 });
        assert_eq!(m.measure_with_entanglement("ghost", None).unwrap_err(), DecisionError::UnknownId { id: "ghost".into() });
        let out = m.measure_with_entanglement("a", Some(1))?;
        assert_eq!(out.label, "o1");
        assert!(out.effects.is_empty());
        let history = m.measurement_history("a")?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].option_index, 1);
        assert!((history[0].probability - 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn link_decay() -> Result<()> {
        let m = manager();
        m.register_state("a", state(&[1.0]))?;
        m.register_state("b", state(&[1.0]))?;
        let id = m.create_entanglement("a", "b", EntanglementType::Feedback, 0.8, 0.0)?;
        assert!((m.decay_link(id, 0.5)? - 0.4).abs() < 1e-12);
        assert!((m.calculate_entanglement_entropy("b", "a") - 0.6).abs() < 1e-12);
        m.decay_links(1.0)?;
        assert_eq!(m.calculate_entanglement_entropy("a", "b"), 0.0);
        assert!(matches!(m.decay_link(9, 0.1), Err(DecisionError::IndexOutOfRange { .. })));
        assert!(matches!(m.decay_links(-0.1), Err(DecisionError::InvalidRange { .. })));
        Ok(())
    }
}
