// src/validation/mod.rs

//! Checks the invariants every [`SuperpositionState`] must hold after
//! construction, collapse and entanglement-effect application.

use crate::core::constants::decision_constants::NORM_TOLERANCE;
use crate::core::{DecisionError, SuperpositionState};

// Probabilities are derived from amplitudes in one pass, so they should agree
// to within rounding of a single multiply-add.
const DEFAULT_PROBABILITY_TOLERANCE: f64 = 1e-12;

/// Checks that the state vector is normalized (`Σ|a_i|² ≈ 1`).
///
/// Empty states are accepted; they carry no distribution to normalize.
///
/// # Arguments
/// * `state` - The `SuperpositionState` to check.
/// * `tolerance` - Allowed deviation from 1.0. Defaults to 1e-9.
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(DecisionError::Incoherence)` if normalization fails.
pub fn check_normalization(state: &SuperpositionState, tolerance: Option<f64>) -> Result<(), DecisionError> {
    if state.is_empty() {
        return Ok(());
    }
    let effective_tolerance = tolerance.unwrap_or(NORM_TOLERANCE);
    let norm_sq: f64 = state.amplitudes().iter().map(|c| c.norm_sqr()).sum();
    if (norm_sq - 1.0).abs() > effective_tolerance || !norm_sq.is_finite() {
        Err(DecisionError::Incoherence {
            message: format!("State vector normalization failed. Sum(|a_i|^2) = {} (Deviation > {})", norm_sq, effective_tolerance),
        })
    } else {
        Ok(())
    }
}

/// Checks that options, amplitudes and probabilities are index-aligned and
/// that `probabilities[i] == |amplitudes[i]|²`.
pub fn check_probability_consistency(state: &SuperpositionState) -> Result<(), DecisionError> {
    let (n_opt, n_amp, n_prob) = (state.len(), state.amplitudes().len(), state.probabilities().len());
    if n_opt != n_amp || n_amp != n_prob {
        return Err(DecisionError::Incoherence {
            message: format!("Length mismatch: {} options, {} amplitudes, {} probabilities", n_opt, n_amp, n_prob),
        });
    }

    for (i, (a, p)) in state.amplitudes().iter().zip(state.probabilities()).enumerate() {
        if (a.norm_sqr() - p).abs() > DEFAULT_PROBABILITY_TOLERANCE {
            return Err(DecisionError::Incoherence {
                message: format!("Probability {} at index {} disagrees with |a|^2 = {}", p, i, a.norm_sqr()),
            });
        }
    }
    Ok(())
}

/// Runs every invariant check on `state`.
///
/// # Arguments
/// * `state` - The `SuperpositionState` to validate.
/// * `norm_tolerance` - Optional allowed deviation from 1.0 for normalization.
pub fn validate_state(state: &SuperpositionState, norm_tolerance: Option<f64>) -> Result<(), DecisionError> {
    check_probability_consistency(state)?;
    check_normalization(state, norm_tolerance)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Choice;
    use num_complex::Complex;

    fn state(amps: Vec<Complex<f64>>) -> SuperpositionState {
        let options = (0..amps.len()).map(|i| Choice::weighted(&format!("o{}", i), 1.0)).collect();
        SuperpositionState::from_amplitudes(options, amps).unwrap()
    }

    #[test]
    fn normalized_states_pass() {
        let s = state(vec![Complex::new(1.0, 1.0), Complex::new(-2.0, 0.5), Complex::new(0.0, 0.0)]);
        assert!(validate_state(&s, None).is_ok());
        assert!(validate_state(&SuperpositionState::default(), None).is_ok());
    }

    fn choices(n: usize) -> Vec<Choice> {
        (0..n).map(|i| Choice::weighted(&format!("o{}", i), 1.0)).collect()
    }

    #[test]
    fn unnormalized_vector_is_incoherent() {
        let amps = vec![Complex::new(1.0, 0.0), Complex::new(1.0, 0.0)];
        let s = SuperpositionState::from_raw_parts(choices(2), amps, vec![1.0, 1.0]);
        assert!(check_probability_consistency(&s).is_ok());
        assert!(matches!(check_normalization(&s, None), Err(DecisionError::Incoherence { .. })));
        assert!(matches!(validate_state(&s, None), Err(DecisionError::Incoherence { .. })));
        // a loose enough tolerance accepts it
        assert!(check_normalization(&s, Some(1.5)).is_ok());
    }

    #[test]
    fn stale_probabilities_are_incoherent() {
        let amps = vec![Complex::new(0.6, 0.0), Complex::new(0.0, 0.8)];
        let s = SuperpositionState::from_raw_parts(choices(2), amps.clone(), vec![0.5, 0.5]);
        assert!(check_normalization(&s, None).is_ok());
        assert!(matches!(check_probability_consistency(&s), Err(DecisionError::Incoherence { .. })));

        let short = SuperpositionState::from_raw_parts(choices(2), amps, vec![0.36]);
        assert!(matches!(validate_state(&short, None), Err(DecisionError::Incoherence { .. })));
    }

    #[test]
    fn tight_tolerance_still_passes_renormalized_vector() {
        let s = state(vec![Complex::new(0.3, 0.0), Complex::new(0.0, 0.4)]);
        assert!(check_normalization(&s, Some(1e-14)).is_ok());
    }
}
