//! Lifecycle Controller (spec.md §4.1): advances a session through seven
//! ordered phases, accepting `complete_phase(evidence, status)` as its only
//! mutation.

pub mod controller;
pub mod error;
pub mod gates;

pub use controller::{LifecycleController, PhaseEvidenceRecord};
pub use error::LifecycleError;
pub use gates::{gate_for, validate_phase_evidence, PhaseGate};
