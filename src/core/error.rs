//! Error handling logic

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DecisionError>;

/// Failures surfaced by the builder, collapse, entanglement and annealing engines.
///
/// Designed fallbacks (zero-norm vectors, zero-sum biased probabilities,
/// unresolvable interference labels, non-numeric weights) never produce one of
/// these; they degrade to a uniform or default value instead.
#[derive(Debug, Clone, PartialEq, Error)] // PartialEq useful for testing error variants
pub enum DecisionError {
    /// No options were supplied to the superposition builder.
    #[error("Empty input: at least one option is required to build a superposition")]
    EmptyInput,

    /// No candidates were supplied to the annealing optimizer.
    #[error("Empty search space: annealing requires at least one candidate")]
    EmptySearchSpace,

    /// A collapse was requested on a state without options.
    #[error("Empty state: cannot collapse a superposition with no options")]
    EmptyState,

    /// Options and amplitudes supplied for one state differ in length.
    #[error("Length mismatch: {options} options but {amplitudes} amplitudes")]
    LengthMismatch {
        /// Number of options
        options: usize,
        /// Number of amplitudes
        amplitudes: usize,
    },

    /// Entanglement requested with fewer than two states.
    #[error("Insufficient states: entanglement needs at least 2 states, got {found}")]
    InsufficientStates {
        /// Number of states actually supplied
        found: usize,
    },

    /// An index does not address an element of the referenced collection.
    #[error("Index {index} out of range for collection of length {len}")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Length of the addressed collection
        len: usize,
    },

    /// A state identifier is not registered with the entanglement manager.
    #[error("Unknown state id '{id}'")]
    UnknownId {
        /// Unregistered identifier
        id: String,
    },

    /// A state identifier is already registered.
    #[error("Duplicate state id '{id}'")]
    DuplicateId {
        /// Identifier that was registered twice
        id: String,
    },

    /// A link was requested from a state to itself.
    #[error("State '{id}' cannot be entangled with itself")]
    SelfEntanglement {
        /// Identifier used on both ends of the link
        id: String,
    },

    /// Neither an explicit objective nor `constraints.energy_function` was given.
    #[error("Missing objective: supply an energy function directly or through the constraints")]
    MissingObjective,

    /// The objective returned no value or a NaN for a candidate.
    #[error("Objective returned a non-numeric energy for candidate '{candidate}'")]
    NonNumericEnergy {
        /// Label of the candidate being evaluated
        candidate: String,
    },

    /// A strength or decoherence argument fell outside `[0, 1]`.
    #[error("Parameter '{parameter}' = {value} is outside the allowed range [0, 1]")]
    InvalidRange {
        /// Parameter name
        parameter: String,
        /// Rejected value
        value: f64,
    },

    /// A caller-supplied correlation matrix is malformed.
    #[error("Invalid correlation matrix: {message}")]
    InvalidCorrelationMatrix {
        /// Description of the violated constraint
        message: String,
    },

    /// A context or constraints document could not be parsed.
    #[error("Invalid context: {message}")]
    InvalidContext {
        /// Parser message
        message: String,
    },

    /// A state violates the normalization or probability-consistency invariant.
    #[error("Incoherence Violation: {message}")]
    Incoherence {
        /// Incoherence failure message
        message: String,
    },
}

impl DecisionError {
    /// Builds an [`DecisionError::InvalidRange`] for a named parameter.
    pub(crate) fn invalid_range(parameter: &str, value: f64) -> Self {
        DecisionError::InvalidRange { parameter: parameter.to_string(), value }
    }

    /// Returns `Ok(value)` when `value` lies in the closed unit interval.
    pub(crate) fn check_unit_interval(parameter: &str, value: f64) -> Result<f64> {
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(Self::invalid_range(parameter, value))
        }
    }
}

impl From<serde_json::Error> for DecisionError {
    fn from(err: serde_json::Error) -> Self {
        DecisionError::InvalidContext { message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_accepts_bounds_and_rejects_outside() {
        assert_eq!(DecisionError::check_unit_interval("strength", 0.0), Ok(0.0));
        assert_eq!(DecisionError::check_unit_interval("strength", 1.0), Ok(1.0));
        assert_eq!(
            DecisionError::check_unit_interval("strength", 1.5),
            Err(DecisionError::InvalidRange { parameter: "strength".to_string(), value: 1.5 })
        );
        assert!(DecisionError::check_unit_interval("strength", f64::NAN).is_err());
    }

    #[test]
    fn display_names_the_offending_value() {
        let err = DecisionError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "Index 4 out of range for collection of length 2");
    }
}
