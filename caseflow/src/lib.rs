//! Clinician review workflow core.
//!
//! This library holds the reviewer-facing workflow of the prediction
//! console: the per-patient review state machine, the attribution ranking
//! behind the explanation chart, the roster query engine, and the session
//! orchestration tying them together.
//!
//! It performs no I/O of its own. The HTTP backend and the audit log are
//! external collaborators reached through narrow contracts — the
//! [`events::AuditSink`] trait and the wire types consumed by the
//! `review-console` crate.

pub mod attribution;
pub mod events;
pub mod risk;
pub mod roster;
pub mod session;
pub mod workflow;

// Re-export the types most callers need.
pub use attribution::{rank, AttributionItem, FeatureValue, InvalidAttributionData};
pub use events::{ActionRecord, AuditEvent, AuditSink, NullAuditSink};
pub use roster::{merge_results, PatientRecord, RosterFilter, RosterPage, RosterQuery, RosterRow};
pub use session::{
    ActiveView, Credentials, FetchTicket, SessionContext, SessionError, SessionOrchestrator,
};
pub use workflow::{
    status_of, FinalDecision, PatientStatus, ReviewError, ReviewState, ReviewStep,
};
