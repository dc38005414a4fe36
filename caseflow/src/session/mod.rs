//! Session-scoped state: the login context and the per-session
//! orchestration of patient reviews.

pub mod context;
pub mod orchestrator;

pub use context::{Credentials, SessionContext};
pub use orchestrator::{ActiveView, FetchTicket, SessionError, SessionOrchestrator};
