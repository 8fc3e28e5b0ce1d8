//! Numeric defaults shared by the engines.

/// Defaults and fixed coefficients used across the crate
pub mod decision_constants {
    /// Used for phase angles (`e^(iθ)`)
    pub const TAU: f64 = std::f64::consts::TAU;

    /// Allowed deviation of `Σ|a_i|²` from 1.0.
    pub const NORM_TOLERANCE: f64 = 1e-9;
    /// Squared norm below which an amplitude vector is treated as zero.
    pub const ZERO_NORM_EPSILON: f64 = 1e-300;

    /// Weight used when an option carries no numeric weight-like field.
    pub const DEFAULT_WEIGHT: f64 = 1.0;
    /// Coherence lost per applied interference event.
    pub const COHERENCE_PENALTY: f64 = 0.05;

    /// Decoherence applied by a collapse when the context gives none.
    pub const DEFAULT_DECOHERENCE: f64 = 0.18;
    /// Bias added for `preferred_option` when `preferred_weight` is absent.
    pub const DEFAULT_PREFERRED_WEIGHT: f64 = 2.0;

    /// Capacity of the bounded measurement history.
    pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

    pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 1.0;
    pub const DEFAULT_MIN_TEMPERATURE: f64 = 0.01;
    pub const DEFAULT_MAX_ITERATIONS: usize = 128;
    pub const DEFAULT_TUNNELING_RATE: f64 = 0.12;
    /// Lower bound on the temperature in the Metropolis exponent.
    pub const TEMPERATURE_FLOOR: f64 = 1e-9;

    /// Cooling factor of the fixed exponential schedule.
    pub const FAST_COOLING: f64 = 0.90;
    /// Cooling factor selected when the drift signal exceeds [`DRIFT_THRESHOLD`].
    pub const SLOW_COOLING: f64 = 0.95;
    pub const DRIFT_THRESHOLD: f64 = 0.1;
    /// α shift per unit of landscape complexity above 0.5.
    pub const COMPLEXITY_SLOPE: f64 = 0.05;

    /// Entropy proxy factors per link type.
    pub const CORRELATED_ENTROPY_FACTOR: f64 = 1.0;
    pub const ANTI_CORRELATED_ENTROPY_FACTOR: f64 = 0.8;
    pub const CONDITIONAL_ENTROPY_FACTOR: f64 = 1.2;
    pub const FEEDBACK_ENTROPY_FACTOR: f64 = 1.5;
}
