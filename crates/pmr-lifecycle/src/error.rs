use pmr_types::Phase;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("cannot complete {attempted}: session is currently at {current}")]
    PhaseTransitionInvalid { current: Phase, attempted: Phase },

    /// Fatal for the phase: session status becomes INVALID and later phases
    /// are not attempted, though the evidence itself is still recorded.
    #[error("evidence for {phase} failed its minimum schema: {reason}")]
    MalformedEvidence { phase: Phase, reason: String },

    #[error("session has already completed the REPORT phase")]
    SessionAlreadyComplete,
}
