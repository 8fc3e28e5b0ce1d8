// src/lib.rs

//! `qdecide` - Probabilistic selection among weighted candidate options
//!
//! Candidates are placed in a normalized complex-amplitude superposition,
//! collapsed under contextual bias, linked to other candidate sets so that one
//! selection reshapes another, or searched for a low-energy pick with
//! simulated annealing plus a tunneling escape.

pub mod core;
pub mod amplitude;
pub mod superposition;
pub mod measurement;
pub mod entanglement;
pub mod annealing;
pub mod history;
pub mod validation;

// Re-export the most common types for easier top-level use
pub use core::{Choice, Context, DecisionError, InterferenceEvent, SelectionMode, SuperpositionState};
pub use superposition::{SuperpositionBuilder, build_superposition};
pub use measurement::{MeasurementResult, collapse};
pub use entanglement::{EntangledSystem, EntanglementLink, EntanglementType, QuantumEntanglementManager};
pub use annealing::{AdaptiveScheduler, AnnealingConstraints, AnnealingResult, EnergyFn, LandscapeSignal, anneal};
pub use history::MeasurementHistory;
pub use validation::{check_normalization, check_probability_consistency, validate_state};

// Example 1: Build, bias and collapse
// Three equally weighted options give a uniform distribution; an argmax
// collapse with a strong bias on "b" always selects it.
/// ```
/// use qdecide::{build_superposition, collapse, Choice, Context, DecisionError, SelectionMode};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let options: Vec<Choice> = ["a", "b", "c"].iter().map(|id| Choice::weighted(id, 1.0)).collect();
///
/// let state = build_superposition(&options, &Context::new(), &mut rng)?;
/// for p in state.probabilities() {
///     assert!((p - 1.0 / 3.0).abs() < 1e-9);
/// }
///
/// let ctx = Context::new().with_mode(SelectionMode::Argmax).with_bias("b", 5.0);
/// let result = collapse(&state, &ctx, &mut rng)?;
/// println!("{}", result);
/// assert_eq!(result.selected_label(), "b");
/// # Ok::<(), DecisionError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: Annealing with tunneling
// The search starts from the first candidate and settles on the minimum of x².
/// ```
/// use qdecide::{anneal, AnnealingConstraints, Choice, DecisionError};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use serde_json::json;
///
/// let candidates: Vec<Choice> = (-10..=10).map(|x| Choice::from_pairs([("x", json!(x))])).collect();
/// let square = |c: &Choice| c.get_f64("x").map(|x| x * x);
/// let constraints = AnnealingConstraints::new().with_max_iterations(400).with_min_temperature(1e-12);
///
/// let result = anneal(Some(&square), &candidates, &constraints, None, &mut StdRng::seed_from_u64(7))?;
/// assert_eq!(result.solution.get_f64("x"), Some(0.0));
/// assert_eq!(result.energy, 0.0);
/// # Ok::<(), DecisionError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item
