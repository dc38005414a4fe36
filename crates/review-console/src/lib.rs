//! Console client for the clinician review workflow.
//!
//! Pairs the pure `caseflow` core with its concrete collaborators: the
//! reqwest backend client, the fire-and-forget audit sink, configuration,
//! and the application driver the binary runs.

pub mod app;
pub mod audit;
pub mod client;
pub mod config;

pub use app::{Panel, PatientPanels, ReviewApp};
pub use audit::HttpAuditSink;
pub use client::{filter_vitals, ApiClient, ApiError, Vitals};
pub use config::ConsoleConfig;
