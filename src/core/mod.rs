// src/core/mod.rs

//! Core data structures and types

// Declare modules within core
pub mod choice;
pub mod context;
pub mod error;
pub mod state;

// Re-export public types for convenient access via `qdecide::core::TypeName`
pub use choice::Choice;
pub use context::{Context, InterferenceEvent, SelectionMode};
pub use error::{DecisionError, Result};
pub use state::{InterferenceRecord, SuperpositionState};

pub mod constants;
pub use constants::decision_constants::{DEFAULT_DECOHERENCE, NORM_TOLERANCE}; // Re-export
