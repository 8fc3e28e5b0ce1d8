// src/entanglement/mod.rs

//! Relationship engine propagating measurements between states.
//!
//! Two strategies are kept side by side:
//! - [`EntangledSystem`]: a small group of states and a correlation matrix;
//!   measuring one state projects outcomes onto the others without touching
//!   their amplitudes.
//! - [`QuantumEntanglementManager`]: a registry of states joined by typed
//!   [`EntanglementLink`]s; measuring one state rewrites the amplitudes of
//!   every linked state.

mod link;
mod manager;
mod system;

pub use link::{EntanglementLink, EntanglementType};
pub use manager::{
    AmplitudeChange, EntangledMeasurement, EntangledSuperpositionState, EntanglementEffect, MeasurementRecord,
    QuantumEntanglementManager, apply_entanglement_effect,
};
pub use system::{EntangledSystem, ProjectedOutcome, SystemMeasurement, apply_decoherence, create_entanglement, measure_system};
