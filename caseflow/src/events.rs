//! Audit events — what the workflow reports to the action log.
//!
//! Dispatch is fire-and-forget by contract: a sink must never block the
//! transition that raised the event, and delivery failure stays invisible
//! to the workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::workflow::FinalDecision;

/// Marker merged into every action payload, identifying this client build.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// All actions reported to the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    LoginSucceeded {
        user: String,
    },
    LoginFailed {
        user: String,
    },
    Logout {
        user: String,
    },
    PatientSelected {
        patient_id: String,
    },
    ReturnedToRoster {
        from_patient_id: String,
    },
    /// The confirmed initial estimate; `None` means "unsure".
    InitialDecision {
        patient_id: String,
        decision: Option<f64>,
    },
    PredictionViewed {
        patient_id: String,
    },
    DecisionMade {
        patient_id: String,
        decision: FinalDecision,
        reason: Option<String>,
    },
}

impl AuditEvent {
    /// Action name as recorded by the audit backend.
    pub fn action(&self) -> &'static str {
        match self {
            Self::LoginSucceeded { .. } => "login_success",
            Self::LoginFailed { .. } => "login_failed",
            Self::Logout { .. } => "logout",
            Self::PatientSelected { .. } => "select_patient",
            Self::ReturnedToRoster { .. } => "return_to_patient_list",
            Self::InitialDecision { .. } => "initial_decision",
            Self::PredictionViewed { .. } => "view_ai_prediction",
            Self::DecisionMade { .. } => "decision_made",
        }
    }

    /// Patient this event concerns, when it is patient-scoped.
    pub fn patient_id(&self) -> Option<&str> {
        match self {
            Self::PatientSelected { patient_id }
            | Self::InitialDecision { patient_id, .. }
            | Self::PredictionViewed { patient_id }
            | Self::DecisionMade { patient_id, .. } => Some(patient_id),
            Self::ReturnedToRoster { from_patient_id } => Some(from_patient_id),
            Self::LoginSucceeded { .. } | Self::LoginFailed { .. } | Self::Logout { .. } => None,
        }
    }

    /// Payload sent as the `details` object, always carrying the client
    /// version marker.
    pub fn details(&self) -> serde_json::Value {
        let mut details = match self {
            Self::LoginSucceeded { user } | Self::LoginFailed { user } | Self::Logout { user } => {
                json!({ "user": user })
            }
            Self::PatientSelected { patient_id } => json!({ "patient_id": patient_id }),
            Self::ReturnedToRoster { from_patient_id } => {
                json!({ "from_patient_id": from_patient_id })
            }
            Self::InitialDecision {
                patient_id,
                decision,
            } => json!({ "id_patient": patient_id, "decision": decision }),
            Self::PredictionViewed { patient_id } => json!({ "id_patient": patient_id }),
            Self::DecisionMade {
                patient_id,
                decision,
                reason,
            } => json!({
                "id_patient": patient_id,
                "decision": decision.label(),
                "reason": reason,
            }),
        };
        details["app_version"] = json!(APP_VERSION);
        details
    }
}

/// Wire record for the action log endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub username: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

impl ActionRecord {
    /// Stamp an event for delivery on behalf of the given user.
    pub fn stamp(username: &str, event: &AuditEvent) -> Self {
        Self {
            username: username.to_string(),
            action: event.action().to_string(),
            timestamp: Utc::now(),
            details: event.details(),
        }
    }
}

/// Best-effort receiver for audit events.
///
/// Implementations must return promptly and swallow delivery failures;
/// the workflow never learns whether an event arrived.
pub trait AuditSink: Send + Sync {
    fn dispatch(&self, event: AuditEvent);
}

/// Sink that drops every event. Useful for tests and headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn dispatch(&self, _event: AuditEvent) {}
}
