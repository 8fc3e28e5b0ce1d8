// src/entanglement/system.rs

//! Matrix-based entanglement for small groups of states.
//!
//! Measuring one state collapses it through [`crate::measurement::collapse`]
//! and *projects* an outcome onto every other state from the sign of its
//! correlation entry. Amplitudes of the other states are left untouched; the
//! graph-based [`super::QuantumEntanglementManager`] is the strategy that
//! mutates linked states.

use crate::core::{Choice, Context, DecisionError, Result, SuperpositionState};
use crate::measurement::{self, MeasurementResult};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

/// A group of states tied together by a symmetric correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntangledSystem {
    states: Vec<SuperpositionState>,
    /// Square, symmetric, unit diagonal, entries in `[-1, 1]`.
    correlations: Vec<Vec<f64>>,
}

/// Outcome projected onto a non-measured state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedOutcome {
    pub state_index: usize,
    pub option_index: usize,
    pub option: Choice,
    /// Correlation between the measured state and this one.
    pub correlation: f64,
}

/// Result of [`EntangledSystem::measure`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemMeasurement {
    pub measured_index: usize,
    pub primary: MeasurementResult,
    /// One entry per other state, in state order.
    pub projections: Vec<ProjectedOutcome>,
}

/// Builds a system whose off-diagonal correlations are `±1`, one fair draw per
/// unordered pair, mirrored across the diagonal.
///
/// # Errors
/// * `DecisionError::InsufficientStates` for fewer than two states.
/// * `DecisionError::EmptyState` if any state has no options.
pub fn create_entanglement<R: Rng + ?Sized>(states: Vec<SuperpositionState>, rng: &mut R) -> Result<EntangledSystem> {
    check_states(&states)?;
    let n = states.len();
    let mut correlations = vec![vec![0.0; n]; n];
    for i in 0..n {
        correlations[i][i] = 1.0;
        for j in (i + 1)..n {
            let c = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            correlations[i][j] = c;
            correlations[j][i] = c;
        }
    }
    debug!(states = n, "created entangled system with random correlations");
    Ok(EntangledSystem { states, correlations })
}

fn check_states(states: &[SuperpositionState]) -> Result<()> {
    if states.len() < 2 {
        return Err(DecisionError::InsufficientStates { found: states.len() });
    }
    if states.iter().any(SuperpositionState::is_empty) {
        return Err(DecisionError::EmptyState);
    }
    Ok(())
}

impl EntangledSystem {
    /// Builds a system from a caller-specified correlation matrix.
    ///
    /// # Errors
    /// * `DecisionError::InsufficientStates` / `DecisionError::EmptyState` as for [`create_entanglement`].
    /// * `DecisionError::InvalidCorrelationMatrix` if the matrix is not square
    ///   over the states, not symmetric, lacks a unit diagonal or has an entry
    ///   outside `[-1, 1]`.
    pub fn with_correlations(states: Vec<SuperpositionState>, correlations: Vec<Vec<f64>>) -> Result<Self> {
        check_states(&states)?;
        let n = states.len();
        let invalid = |message: String| Err(DecisionError::InvalidCorrelationMatrix { message });

        if correlations.len() != n || correlations.iter().any(|row| row.len() != n) {
            return invalid(format!("expected a {n}x{n} matrix"));
        }
        for i in 0..n {
            if correlations[i][i] != 1.0 {
                return invalid(format!("diagonal entry ({i},{i}) is {}, expected 1", correlations[i][i]));
            }
            for j in 0..n {
                let c = correlations[i][j];
                if !(-1.0..=1.0).contains(&c) {
                    return invalid(format!("entry ({i},{j}) = {c} is outside [-1, 1]"));
                }
                if c != correlations[j][i] {
                    return invalid(format!("entries ({i},{j}) and ({j},{i}) differ"));
                }
            }
        }
        Ok(Self { states, correlations })
    }

    pub fn states(&self) -> &[SuperpositionState] {
        &self.states
    }

    pub fn correlations(&self) -> &[Vec<f64>] {
        &self.correlations
    }

    pub fn correlation(&self, i: usize, j: usize) -> Option<f64> {
        self.correlations.get(i).and_then(|row| row.get(j)).copied()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Collapses state `measured_index` and projects an outcome onto every
    /// other state.
    ///
    /// With `m = measured_index` and `n` the other state's option count, a
    /// positive correlation projects option `m mod n` and a non-positive one
    /// projects `(n - 1 - m) mod n`.
    ///
    /// # Errors
    /// * `DecisionError::IndexOutOfRange` if `measured_index` is not a state.
    pub fn measure<R: Rng + ?Sized>(&self, measured_index: usize, context: &Context, rng: &mut R) -> Result<SystemMeasurement> {
        let measured = self
            .states
            .get(measured_index)
            .ok_or(DecisionError::IndexOutOfRange { index: measured_index, len: self.states.len() })?;
        let primary = measurement::collapse(measured, context, rng)?;

        let projections = self
            .states
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != measured_index)
            .map(|(i, state)| {
                let n = state.len();
                let correlation = self.correlations[measured_index][i];
                let m = measured_index % n;
                let option_index = if correlation > 0.0 { m } else { (n + n - 1 - m) % n };
                ProjectedOutcome { state_index: i, option_index, option: state.options()[option_index].clone(), correlation }
            })
            .collect();

        Ok(SystemMeasurement { measured_index, primary, projections })
    }

    /// Scales every off-diagonal correlation by `1 - strength`.
    ///
    /// # Errors
    /// * `DecisionError::InvalidRange` if `strength` is outside `[0, 1]`.
    pub fn apply_decoherence(&mut self, strength: f64) -> Result<()> {
        let strength = DecisionError::check_unit_interval("strength", strength)?;
        let factor = 1.0 - strength;
        for (i, row) in self.correlations.iter_mut().enumerate() {
            for (j, c) in row.iter_mut().enumerate() {
                if i != j {
                    *c *= factor;
                }
            }
        }
        Ok(())
    }
}

/// Free-function form of [`EntangledSystem::measure`].
pub fn measure_system<R: Rng + ?Sized>(system: &EntangledSystem, measured_index: usize, context: &Context, rng: &mut R) -> Result<SystemMeasurement> {
    system.measure(measured_index, context, rng)
}

/// Free-function form of [`EntangledSystem::apply_decoherence`].
pub fn apply_decoherence(system: &mut EntangledSystem, strength: f64) -> Result<()> {
    system.apply_decoherence(strength)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SelectionMode;
    use num_complex::Complex;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn state(weights: &[f64]) -> SuperpositionState {
        let options = (0..weights.len()).map(|i| Choice::weighted(&format!("o{}", i), 1.0)).collect();
        SuperpositionState::from_amplitudes(options, weights.iter().map(|w| Complex::new(*w, 0.0)).collect()).unwrap()
    }

    #[test]
    fn fewer_than_two_states_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(create_entanglement(vec![state(&[1.0])], &mut rng), Err(DecisionError::InsufficientStates { found: 1 }));
        assert_eq!(create_entanglement(vec![state(&[1.0]), SuperpositionState::default()], &mut rng), Err(DecisionError::EmptyState));
    }

    #[test]
    fn random_matrix_is_symmetric_with_unit_diagonal() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(11);
        let system = create_entanglement(vec![state(&[1.0, 1.0]), state(&[1.0]), state(&[1.0, 2.0, 3.0]), state(&[1.0])], &mut rng)?;
        for i in 0..4 {
            assert_eq!(system.correlation(i, i), Some(1.0));
            for j in 0..4 {
                let c = system.correlations()[i][j];
                assert_eq!(c, system.correlations()[j][i]);
                if i != j {
                    assert!(c == 1.0 || c == -1.0);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn malformed_matrices_are_rejected() {
        let states = || vec![state(&[1.0]), state(&[1.0])];
        for matrix in [
            vec![vec![1.0, 0.5]],
            vec![vec![1.0, 0.5], vec![0.4, 1.0]],
            vec![vec![0.9, 0.5], vec![0.5, 1.0]],
            vec![vec![1.0, 1.5], vec![1.5, 1.0]],
        ] {
            assert!(matches!(EntangledSystem::with_correlations(states(), matrix), Err(DecisionError::InvalidCorrelationMatrix { .. })));
        }
    }

    #[test]
    fn positive_correlation_projects_same_index() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        let system = EntangledSystem::with_correlations(vec![state(&[1.0, 1.0]), state(&[0.1, 1.0, 0.1])], vec![vec![1.0, 0.3], vec![0.3, 1.0]])?;
        let m = system.measure(1, &Context::new().with_mode(SelectionMode::Argmax), &mut rng)?;
        assert_eq!(m.primary.selected_index, 1);
        assert_eq!(m.projections.len(), 1);
        assert_eq!(m.projections[0].state_index, 0);
        assert_eq!(m.projections[0].option_index, 1);
        assert_eq!(m.projections[0].option.label(), "o1");
        Ok(())
    }

    #[test]
    fn anti_correlation_mirrors_the_measured_state_index() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        let states = vec![state(&[1.0, 1.0, 1.0]), state(&[3.0, 0.1, 0.1]), state(&[1.0, 1.0, 1.0, 1.0])];
        let matrix = vec![vec![1.0, -1.0, 0.5], vec![-1.0, 1.0, -0.2], vec![0.5, -0.2, 1.0]];
        let system = EntangledSystem::with_correlations(states, matrix)?;
        let m = system.measure(1, &Context::new().with_mode(SelectionMode::Argmax), &mut rng)?;
        // the collapse picks option 0, but the projection follows the state index
        assert_eq!(m.primary.selected_index, 0);
        // (3 - 1 - 1) mod 3
        assert_eq!(m.projections[0].option_index, 1);
        // (4 - 1 - 1) mod 4
        assert_eq!(m.projections[1].state_index, 2);
        assert_eq!(m.projections[1].option_index, 2);
        Ok(())
    }

    #[test]
    fn projection_wraps_into_smaller_state() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        let states = vec![state(&[1.0]), state(&[1.0]), state(&[1.0]), state(&[1.0, 1.0])];
        let mut matrix = vec![vec![1.0; 4]; 4];
        let system = EntangledSystem::with_correlations(states.clone(), matrix.clone())?;
        let m = system.measure(2, &Context::new(), &mut rng)?;
        // 2 mod 1 and 2 mod 2
        assert_eq!(m.projections.iter().map(|p| p.option_index).collect::<Vec<_>>(), vec![0, 0, 0]);

        matrix[2][3] = -1.0;
        matrix[3][2] = -1.0;
        let anti = EntangledSystem::with_correlations(states, matrix)?;
        let m = anti.measure(2, &Context::new(), &mut rng)?;
        // (2 - 1 - 2) mod 2
        assert_eq!(m.projections[2].option_index, 1);
        Ok(())
    }

    #[test]
    fn measure_rejects_unknown_state_index() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        let system = create_entanglement(vec![state(&[1.0]), state(&[1.0])], &mut rng)?;
        assert_eq!(system.measure(2, &Context::new(), &mut rng), Err(DecisionError::IndexOutOfRange { index: 2, len: 2 }));
        Ok(())
    }

    #[test]
    fn measurement_leaves_other_states_untouched() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(4);
        let system = create_entanglement(vec![state(&[1.0, 2.0]), state(&[3.0, 1.0])], &mut rng)?;
        let before = system.clone();
        system.measure(0, &Context::new(), &mut rng)?;
        assert_eq!(system, before);
        Ok(())
    }

    #[test]
    fn decoherence_rejects_out_of_range_strength() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        let mut system = create_entanglement(vec![state(&[1.0]), state(&[1.0])], &mut rng)?;
        assert!(matches!(system.apply_decoherence(-0.1), Err(DecisionError::InvalidRange { .. })));
        assert!(matches!(apply_decoherence(&mut system, 1.1), Err(DecisionError::InvalidRange { .. })));
        Ok(())
    }
}
