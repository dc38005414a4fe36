//! Per-patient review workflow — the state machine and its derived status.

pub mod state;
pub mod status;

pub use state::{FinalDecision, ReviewError, ReviewState, ReviewStep};
pub use status::{status_map, status_of, PatientStatus};
