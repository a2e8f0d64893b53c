//! Evidence store and file verifier.
//!
//! Evidence is the only thing the rest of the system is allowed to treat as
//! authoritative; everything the executor says about itself is narrative
//! until confirmed here.

pub mod error;
pub mod hash;
pub mod store;
pub mod verifier;

pub use error::EvidenceError;
pub use hash::{compute_content_hash, verify_content_hash};
pub use store::{evidence_root_for, verify_evidence_hash, EvidenceStore};
pub use verifier::{detect_modified, reconcile_claims, snapshot, verify_file, Snapshot, CONTENT_PREVIEW_CAP_BYTES};
