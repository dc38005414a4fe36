//! Session orchestration — view routing, per-patient state ownership, and
//! audit emission on workflow transitions.
//!
//! The orchestrator owns the patient-id → review state map and drives the
//! selected patient's state machine. It never performs I/O itself: audit
//! events go through the injected sink, and fetch results come back in via
//! the ticket-checked `apply_*` methods.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::events::{AuditEvent, AuditSink};
use crate::workflow::{status_map, FinalDecision, PatientStatus, ReviewError, ReviewState};

/// Which top-level view the user is on, derived purely from whether a
/// selection exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveView {
    /// No patient selected: the paginated roster.
    Roster,
    /// A patient is selected: that patient's review.
    Review(String),
}

/// Ticket identifying the selection a fetch was started for.
///
/// Every selection change bumps the epoch, so a result carrying an older
/// ticket is stale and gets discarded. The last-selected patient's fetch
/// always wins; stale results are never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    patient_id: String,
    epoch: u64,
}

impl FetchTicket {
    /// Patient the fetch was started for.
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }
}

/// Error for session-level operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("no patient is selected")]
    NoSelection,
    #[error(transparent)]
    Review(#[from] ReviewError),
}

/// Owns the review states and routes actions to the selected patient.
pub struct SessionOrchestrator {
    states: HashMap<String, ReviewState>,
    selected: Option<String>,
    epoch: u64,
    sink: Arc<dyn AuditSink>,
}

impl SessionOrchestrator {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            states: HashMap::new(),
            selected: None,
            epoch: 0,
            sink,
        }
    }

    /// Current view.
    pub fn active_view(&self) -> ActiveView {
        match &self.selected {
            Some(id) => ActiveView::Review(id.clone()),
            None => ActiveView::Roster,
        }
    }

    /// Select a patient, creating their review state on first visit.
    ///
    /// Re-selecting a known patient keeps the existing state untouched;
    /// the selection epoch still advances so in-flight fetches from the
    /// previous selection are discarded and fresh ones take over.
    pub fn select_patient(&mut self, patient_id: &str) -> &ReviewState {
        self.epoch += 1;
        self.selected = Some(patient_id.to_string());
        self.sink.dispatch(AuditEvent::PatientSelected {
            patient_id: patient_id.to_string(),
        });
        self.states
            .entry(patient_id.to_string())
            .or_insert_with(ReviewState::new)
    }

    /// Return to the roster. Emits the navigation event when a patient
    /// was open.
    pub fn clear_selection(&mut self) {
        self.epoch += 1;
        if let Some(id) = self.selected.take() {
            self.sink.dispatch(AuditEvent::ReturnedToRoster {
                from_patient_id: id,
            });
        }
    }

    /// Ticket for a fetch started against the current selection.
    pub fn fetch_ticket(&self) -> Option<FetchTicket> {
        self.selected.as_ref().map(|id| FetchTicket {
            patient_id: id.clone(),
            epoch: self.epoch,
        })
    }

    /// Whether a fetch result may still be applied.
    pub fn admits(&self, ticket: &FetchTicket) -> bool {
        ticket.epoch == self.epoch
            && self.selected.as_deref() == Some(ticket.patient_id.as_str())
    }

    /// Apply a fetched prediction probability (`None` for a failed fetch),
    /// unless the ticket went stale. Returns whether it was applied.
    pub fn apply_probability(
        &mut self,
        ticket: &FetchTicket,
        probability: Option<f64>,
    ) -> Result<bool, ReviewError> {
        if !self.admits(ticket) {
            debug!(patient = %ticket.patient_id, "discarding stale prediction result");
            return Ok(false);
        }
        self.states
            .entry(ticket.patient_id.clone())
            .or_default()
            .set_probability(probability)?;
        Ok(true)
    }

    /// Record the initial estimate for the selected patient.
    pub fn record_estimate(&mut self, estimate: Option<f64>) -> Result<(), SessionError> {
        let id = self.selected_id()?;
        self.state_entry(&id).record_estimate(estimate)?;
        Ok(())
    }

    /// Ask to advance past the assessment step.
    pub fn request_advance(&mut self) -> Result<(), SessionError> {
        let id = self.selected_id()?;
        self.state_entry(&id).request_advance()?;
        Ok(())
    }

    /// Confirm the initial estimate and emit the `initial_decision` event.
    pub fn confirm_initial(&mut self) -> Result<(), SessionError> {
        let id = self.selected_id()?;
        let state = self.state_entry(&id);
        state.confirm_initial()?;
        let decision = state.initial_decision;
        self.sink.dispatch(AuditEvent::InitialDecision {
            patient_id: id,
            decision,
        });
        Ok(())
    }

    /// Close the confirmation dialog without committing.
    pub fn cancel_confirmation(&mut self) -> Result<(), SessionError> {
        let id = self.selected_id()?;
        self.state_entry(&id).cancel_confirmation()?;
        Ok(())
    }

    /// Acknowledge the explanation view; emits `view_ai_prediction` on the
    /// first acknowledgement only.
    pub fn acknowledge_explanation(&mut self) -> Result<(), SessionError> {
        let id = self.selected_id()?;
        if self.state_entry(&id).acknowledge_explanation()? {
            self.sink
                .dispatch(AuditEvent::PredictionViewed { patient_id: id });
        }
        Ok(())
    }

    /// Record the final decision and emit the `decision_made` event.
    pub fn submit_final(
        &mut self,
        decision: FinalDecision,
        reason: Option<String>,
    ) -> Result<(), SessionError> {
        let id = self.selected_id()?;
        self.state_entry(&id)
            .submit_final(decision, reason.clone())?;
        self.sink.dispatch(AuditEvent::DecisionMade {
            patient_id: id,
            decision,
            reason,
        });
        Ok(())
    }

    /// Review state of the selected patient.
    pub fn selected_state(&self) -> Option<&ReviewState> {
        self.selected.as_ref().and_then(|id| self.states.get(id))
    }

    /// Review state of any known patient.
    pub fn state(&self, patient_id: &str) -> Option<&ReviewState> {
        self.states.get(patient_id)
    }

    /// Review status per known patient, derived fresh on every call.
    pub fn status_map(&self) -> HashMap<String, PatientStatus> {
        status_map(&self.states)
    }

    fn selected_id(&self) -> Result<String, SessionError> {
        self.selected.clone().ok_or(SessionError::NoSelection)
    }

    fn state_entry(&mut self, patient_id: &str) -> &mut ReviewState {
        self.states
            .entry(patient_id.to_string())
            .or_default()
    }
}
